//! Metrics derivation from a pair snapshot.

use crate::types::{MetricsRecord, PairSnapshot};

/// Age reported for pairs without a usable creation timestamp.
pub const AGE_UNKNOWN_MIN: f64 = 999_999.0;

const MS_PER_MINUTE: f64 = 60_000.0;

/// Minutes elapsed since pair creation, never negative.
pub fn age_minutes(pair_created_at_ms: i64, now_ms: i64) -> f64 {
    if pair_created_at_ms <= 0 {
        return AGE_UNKNOWN_MIN;
    }
    let elapsed_ms = now_ms.saturating_sub(pair_created_at_ms).max(0);
    elapsed_ms as f64 / MS_PER_MINUTE
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Build the explorer link of a pair on the scanned chain. Empty without a pair address.
pub fn dexscreener_url(chain_id: &str, pair_address: &str) -> String {
    if pair_address.is_empty() {
        return String::new();
    }
    let chain = if chain_id.is_empty() { "solana" } else { chain_id };
    format!("https://dexscreener.com/{}/{}", chain, pair_address)
}

/// Derive the normalized metrics record of a pair on `chain_id` at time `now_ms`.
pub fn compute_metrics(pair: &PairSnapshot, chain_id: &str, now_ms: i64) -> MetricsRecord {
    let liquidity_usd = pair.liquidity_usd;
    let turnover_1h_over_liq = if liquidity_usd > 0.0 {
        pair.volume_h1 / liquidity_usd
    } else {
        0.0
    };

    MetricsRecord {
        pair_address: pair.pair_address.clone(),
        dex_id: pair.dex_id.clone(),
        price_usd: pair.price_usd.clone(),
        liquidity_usd,
        fdv: pair.fdv,
        market_cap: pair.market_cap,
        vol_5m: pair.volume_m5,
        vol_1h: pair.volume_h1,
        vol_24h: pair.volume_h24,
        buys_5m: pair.buys_m5,
        sells_5m: pair.sells_m5,
        net_buy_5m: pair.buys_m5.saturating_sub(pair.sells_m5),
        m5_pct: pair.price_change_m5,
        h1_pct: pair.price_change_h1,
        h6_pct: pair.price_change_h6,
        h24_pct: pair.price_change_h24,
        age_min: age_minutes(pair.pair_created_at_ms, now_ms),
        turnover_1h_over_liq,
        base_token_symbol: pair.base_token.symbol.clone(),
        base_token_name: pair.base_token.name.clone(),
        base_token_address: pair.base_token.address.clone(),
        quote_token_symbol: pair.quote_token.symbol.clone(),
        quote_token_address: pair.quote_token.address.clone(),
        url_dexscreener: dexscreener_url(chain_id, &pair.pair_address),
    }
}
