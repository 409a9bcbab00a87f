//! Profile enrichment of aggregated candidates.

use crate::screener::data_sources::{normalize_chain_id, MarketDataProvider};
use crate::screener::types::{DebugRecord, ScanOptions};
use crate::types::{Candidate, ProfileFields};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Index profile records of `chain_id` by lowercased token address.
///
/// A later record for the same token replaces an earlier one.
pub fn index_profiles(records: &[Value], chain_id: &str) -> HashMap<String, ProfileFields> {
    records
        .iter()
        .filter(|record| {
            normalize_chain_id(record.get("chainId").and_then(Value::as_str).unwrap_or(""))
                == chain_id
        })
        .filter_map(|record| {
            let address = record.get("tokenAddress")?.as_str()?.trim().to_lowercase();
            (!address.is_empty()).then(|| (address, ProfileFields::from_record(record)))
        })
        .collect()
}

/// Fill empty profile fields of each candidate from `profiles`. Never removes a candidate.
pub fn apply_profiles(candidates: &mut [Candidate], profiles: &HashMap<String, ProfileFields>) -> usize {
    let mut enriched = 0;
    for candidate in candidates.iter_mut() {
        if let Some(profile) = profiles.get(&candidate.key()) {
            candidate.profile.fill_from(profile);
            enriched += 1;
        }
    }
    enriched
}

/// Fetch the latest profiles (when enabled) and enrich `candidates` in place.
#[instrument(skip_all, fields(candidates = candidates.len()))]
pub async fn enrich_profiles(
    provider: &dyn MarketDataProvider,
    opts: &ScanOptions,
    candidates: &mut [Candidate],
    debug: &mut DebugRecord,
) {
    if !opts.include_profiles {
        return;
    }

    let fetched = provider.fetch_profiles_latest().await;
    debug.api_debug.profiles_latest = Some(fetched.debug);
    debug.counts.profiles_raw = fetched.records.len();

    let profiles = index_profiles(&fetched.records, &normalize_chain_id(&opts.chain_id));
    let enriched = apply_profiles(candidates, &profiles);
    debug!("Enriched {} of {} candidates with profiles", enriched, candidates.len());
}
