//! Candidate aggregation across the promotion sources.
//!
//! Boost, ad and community-takeover records are turned into minimal
//! candidates and folded into one candidate per token with
//! [`Candidate::merged`]. The table remembers first-seen order so the final
//! stable sort is reproducible for a given provider response.

use crate::screener::coerce::{first_present, opt_string, safe_float, safe_float_or};
use crate::screener::data_sources::{normalize_chain_id, MarketDataProvider};
use crate::screener::types::{DebugRecord, ScanOptions, NO_CANDIDATES};
use crate::types::{Candidate, ProfileFields, Source};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// Chain and trimmed token address of a record, if it belongs to `chain_id`.
fn record_identity(record: &Value, chain_id: &str) -> Option<(String, String)> {
    let chain = normalize_chain_id(record.get("chainId").and_then(Value::as_str).unwrap_or(""));
    if chain != chain_id {
        return None;
    }
    let token_address = record
        .get("tokenAddress")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|address| !address.is_empty())?;
    Some((chain, token_address.to_string()))
}

/// Candidate from a boost record.
pub fn candidate_from_boost(record: &Value, chain_id: &str) -> Option<Candidate> {
    let (chain, token_address) = record_identity(record, chain_id)?;
    let mut candidate = Candidate::new(&chain, &token_address, Source::Boosts);

    let amount = first_present(record, &["amount", "boostAmount", "activeBoosts"]);
    candidate.boost_amount = safe_float(amount);
    candidate.boost_total = safe_float_or(
        first_present(record, &["totalAmount", "boostTotal", "totalBoosts"]),
        candidate.boost_amount,
    );
    candidate.boost_type = opt_string(first_present(record, &["type", "boostType"]));
    candidate.profile.profile_url = opt_string(record.get("url"));

    Some(candidate)
}

/// Candidate from a sponsored ad record.
pub fn candidate_from_ad(record: &Value, chain_id: &str) -> Option<Candidate> {
    let (chain, token_address) = record_identity(record, chain_id)?;
    let mut candidate = Candidate::new(&chain, &token_address, Source::Ads);

    candidate.ad_type = opt_string(record.get("type"));
    candidate.ad_date = opt_string(record.get("date"));
    candidate.ad_duration_hours = record
        .get("durationHours")
        .filter(|value| !value.is_null())
        .map(|value| safe_float(Some(value)));
    candidate.profile.profile_url = opt_string(record.get("url"));

    Some(candidate)
}

/// Candidate from a community takeover record.
pub fn candidate_from_cto(record: &Value, chain_id: &str) -> Option<Candidate> {
    let (chain, token_address) = record_identity(record, chain_id)?;
    let mut candidate = Candidate::new(&chain, &token_address, Source::Cto);

    candidate.is_cto = true;
    let profile = ProfileFields::from_record(record);
    candidate.profile = ProfileFields {
        icon: None,
        header: None,
        ..profile
    };

    Some(candidate)
}

/// Per-token candidate table in first-seen order.
#[derive(Debug, Default)]
pub struct CandidateTable {
    index: HashMap<String, usize>,
    candidates: Vec<Candidate>,
}

impl CandidateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a candidate into the table.
    pub fn merge(&mut self, candidate: Candidate) {
        let key = candidate.key();
        match self.index.get(&key) {
            Some(&slot) => {
                let existing = &mut self.candidates[slot];
                *existing = existing.clone().merged(&candidate);
            }
            None => {
                self.index.insert(key, self.candidates.len());
                self.candidates.push(candidate);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn get(&self, token_address: &str) -> Option<&Candidate> {
        self.index
            .get(&token_address.to_lowercase())
            .map(|&slot| &self.candidates[slot])
    }

    /// Sort by `(source priority, boost amount)` descending and keep at most `max` (at least 1).
    pub fn into_ranked(self, max: usize) -> Vec<Candidate> {
        let mut candidates = self.candidates;
        candidates.sort_by(|a, b| candidate_order(b, a));
        candidates.truncate(max.max(1));
        candidates
    }
}

fn candidate_order(a: &Candidate, b: &Candidate) -> Ordering {
    a.source
        .priority()
        .cmp(&b.source.priority())
        .then_with(|| a.boost_amount.total_cmp(&b.boost_amount))
}

/// Pull every enabled promotion source and build the ranked candidate list.
///
/// An empty result sets the `no_candidates` reason on `debug`.
#[instrument(skip(provider, opts, debug))]
pub async fn aggregate(
    provider: &dyn MarketDataProvider,
    opts: &ScanOptions,
    debug: &mut DebugRecord,
) -> Vec<Candidate> {
    let chain_id = normalize_chain_id(&opts.chain_id);
    let mut table = CandidateTable::new();

    if opts.include_boosts {
        let latest = provider.fetch_boosts_latest().await;
        debug.api_debug.token_boosts_latest = Some(latest.debug);
        let mut boosts = latest.records;

        if opts.pump_mode {
            let top = provider.fetch_boosts_top().await;
            debug.api_debug.token_boosts_top = Some(top.debug);
            boosts.extend(top.records);
        }

        debug.counts.boost_items_raw = boosts.len();
        boosts
            .iter()
            .filter_map(|record| candidate_from_boost(record, &chain_id))
            .for_each(|candidate| table.merge(candidate));
    }

    if opts.include_ads {
        let ads = provider.fetch_ads_latest().await;
        debug.api_debug.ads_latest = Some(ads.debug);
        debug.counts.ads_items_raw = ads.records.len();
        ads.records
            .iter()
            .filter_map(|record| candidate_from_ad(record, &chain_id))
            .for_each(|candidate| table.merge(candidate));
    }

    if opts.include_cto {
        let ctos = provider.fetch_community_takeovers_latest().await;
        debug.api_debug.cto_latest = Some(ctos.debug);
        debug.counts.cto_items_raw = ctos.records.len();
        ctos.records
            .iter()
            .filter_map(|record| candidate_from_cto(record, &chain_id))
            .for_each(|candidate| table.merge(candidate));
    }

    debug!("Candidate table holds {} unique tokens", table.len());

    let candidates = table.into_ranked(opts.candidates_max);
    debug.counts.candidates_unique = candidates.len();

    if candidates.is_empty() {
        info!("No promoted candidates found");
        debug.why = Some(NO_CANDIDATES.to_string());
    }

    candidates
}
