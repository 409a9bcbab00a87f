//! Pair resolution: batched lookups, single-token fallback and best-pair choice.

use crate::screener::data_sources::MarketDataProvider;
use crate::screener::types::DebugRecord;
use crate::types::PairSnapshot;
use nonempty::NonEmpty;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// Maximum token addresses per batched request.
pub const BATCH_SIZE: usize = 30;

/// Maximum single-token fallback requests per scan.
pub const FALLBACK_LIMIT: usize = 15;

/// Pair snapshots keyed by lowercased token address.
#[derive(Debug, Default)]
pub struct PairIndex {
    by_token: HashMap<String, NonEmpty<PairSnapshot>>,
}

impl PairIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a snapshot under `token_address`. Blank keys are ignored.
    pub fn insert(&mut self, token_address: &str, pair: PairSnapshot) {
        let key = token_address.trim().to_lowercase();
        if key.is_empty() {
            return;
        }
        match self.by_token.get_mut(&key) {
            Some(pairs) => pairs.push(pair),
            None => {
                self.by_token.insert(key, NonEmpty::new(pair));
            }
        }
    }

    /// Index a snapshot under both its base and its quote token.
    pub fn insert_both_sides(&mut self, pair: PairSnapshot) {
        let base = pair.base_token.address.clone();
        let quote = pair.quote_token.address.clone();
        if !quote.trim().is_empty() && !quote.trim().eq_ignore_ascii_case(base.trim()) {
            self.insert(&quote, pair.clone());
        }
        self.insert(&base, pair);
    }

    pub fn contains(&self, token_address: &str) -> bool {
        self.by_token.contains_key(&token_address.trim().to_lowercase())
    }

    pub fn pairs_for(&self, token_address: &str) -> Option<&NonEmpty<PairSnapshot>> {
        self.by_token.get(&token_address.trim().to_lowercase())
    }

    /// Best snapshot of a token, if any was indexed.
    pub fn best_pair(&self, token_address: &str) -> Option<&PairSnapshot> {
        self.pairs_for(token_address).map(select_best)
    }

    pub fn len(&self) -> usize {
        self.by_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_token.is_empty()
    }
}

/// Highest `(liquidity, 24h volume)`; the earliest snapshot wins ties.
pub fn select_best(pairs: &NonEmpty<PairSnapshot>) -> &PairSnapshot {
    let mut best = &pairs.head;
    for pair in pairs.tail.iter() {
        if (pair.liquidity_usd, pair.volume_h24) > (best.liquidity_usd, best.volume_h24) {
            best = pair;
        }
    }
    best
}

/// Resolve pairs for every token, recording call diagnostics on `debug`.
#[instrument(skip(provider, token_addresses, debug), fields(tokens = token_addresses.len()))]
pub async fn resolve_pairs(
    provider: &dyn MarketDataProvider,
    chain_id: &str,
    token_addresses: &[String],
    debug: &mut DebugRecord,
) -> PairIndex {
    let mut index = PairIndex::new();
    let mut batch_calls = Vec::new();
    let mut pairs_returned = 0;

    for chunk in token_addresses.chunks(BATCH_SIZE) {
        let fetched = provider.fetch_pairs_batch(chain_id, chunk).await;
        pairs_returned += fetched.records.len();
        batch_calls.push(fetched.debug);

        for pair in fetched.records.iter().filter_map(PairSnapshot::from_record) {
            index.insert_both_sides(pair);
        }
    }

    debug.api_debug.pairs_batch_calls = Some(batch_calls);
    debug.counts.pairs_returned = pairs_returned;

    let missing: Vec<&String> = token_addresses
        .iter()
        .filter(|address| !index.contains(address))
        .collect();
    debug.counts.tokens_missing_from_batch = missing.len();

    if !missing.is_empty() {
        info!(
            "{} tokens missing from batch results, falling back for up to {}",
            missing.len(),
            FALLBACK_LIMIT
        );
    }

    for address in missing.into_iter().take(FALLBACK_LIMIT) {
        let fetched = provider.fetch_pairs_fallback(chain_id, address).await;
        if let Some(status) = fetched.debug.status.filter(|_| fetched.debug.is_http_error()) {
            let prefix: String = address.chars().take(6).collect();
            debug.push_error(format!("pairs_fallback {}.. status={}", prefix, status));
        }

        debug!("Fallback returned {} pairs for {}", fetched.records.len(), address);
        for pair in fetched.records.iter().filter_map(PairSnapshot::from_record) {
            index.insert(address, pair);
        }
    }

    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TokenRef;

    fn snapshot(pair: &str, base: &str, quote: &str, liq: f64, vol24: f64) -> PairSnapshot {
        PairSnapshot {
            pair_address: pair.to_string(),
            base_token: TokenRef {
                address: base.to_string(),
                ..Default::default()
            },
            quote_token: TokenRef {
                address: quote.to_string(),
                ..Default::default()
            },
            liquidity_usd: liq,
            volume_h24: vol24,
            ..Default::default()
        }
    }

    #[test]
    fn test_index_both_sides_case_insensitive() {
        let mut index = PairIndex::new();
        index.insert_both_sides(snapshot("P1", "TokenA", "So111", 10.0, 1.0));

        assert!(index.contains("tokena"));
        assert!(index.contains("SO111"));
        assert!(!index.contains("TokenB"));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_select_best_liquidity_then_volume() {
        let pairs = NonEmpty::from_vec(vec![
            snapshot("P1", "A", "Q", 1_000.0, 50.0),
            snapshot("P2", "A", "Q", 5_000.0, 10.0),
            snapshot("P3", "A", "Q", 5_000.0, 20.0),
        ])
        .unwrap();
        assert_eq!(select_best(&pairs).pair_address, "P3");
    }

    #[test]
    fn test_select_best_first_wins_ties() {
        let pairs = NonEmpty::from_vec(vec![
            snapshot("P1", "A", "Q", 5_000.0, 20.0),
            snapshot("P2", "A", "Q", 5_000.0, 20.0),
        ])
        .unwrap();
        assert_eq!(select_best(&pairs).pair_address, "P1");
    }

    #[test]
    fn test_blank_keys_are_ignored() {
        let mut index = PairIndex::new();
        index.insert_both_sides(snapshot("P1", "TokenA", "", 10.0, 1.0));
        index.insert("  ", snapshot("P2", "", "", 1.0, 1.0));
        assert_eq!(index.len(), 1);
        assert_eq!(index.pairs_for("TOKENA").map(|p| p.len()), Some(1));
    }
}
