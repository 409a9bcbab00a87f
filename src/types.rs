//! Core types and data structures for the paid runners screener.

use crate::screener::coerce::{array_len, opt_string, safe_float, safe_int, string_or_empty};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A token address as reported by the provider (case preserved).
pub type TokenAddress = String;

/// Promotion category that mentioned a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Paid boosts
    Boosts,
    /// Sponsored ads
    Ads,
    /// Community takeovers
    Cto,
    /// Token profiles
    Profiles,
}

impl Source {
    /// Fixed priority used both for the primary `source` and for candidate ordering.
    pub fn priority(&self) -> u8 {
        match self {
            Source::Boosts => 3,
            Source::Ads => 2,
            Source::Cto => 1,
            Source::Profiles => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Boosts => "boosts",
            Source::Ads => "ads",
            Source::Cto => "cto",
            Source::Profiles => "profiles",
        }
    }
}

/// Descriptive profile metadata. Every field is fill-once on merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFields {
    pub profile_url: Option<String>,
    pub profile_description: Option<String>,
    /// `None` when unknown or zero
    pub profile_links_count: Option<usize>,
    pub icon: Option<String>,
    pub header: Option<String>,
}

impl ProfileFields {
    /// Build from a raw profile-shaped record (`url`, `description`, `links`, `icon`, `header`).
    pub fn from_record(record: &Value) -> Self {
        let links = array_len(record.get("links"));
        Self {
            profile_url: opt_string(record.get("url")),
            profile_description: opt_string(record.get("description")),
            profile_links_count: (links > 0).then_some(links),
            icon: opt_string(record.get("icon")),
            header: opt_string(record.get("header")),
        }
    }

    /// Take each of `other`'s fields only where this one is still empty.
    pub fn fill_from(&mut self, other: &ProfileFields) {
        fill_once(&mut self.profile_url, &other.profile_url);
        fill_once(&mut self.profile_description, &other.profile_description);
        fill_once(&mut self.profile_links_count, &other.profile_links_count);
        fill_once(&mut self.icon, &other.icon);
        fill_once(&mut self.header, &other.header);
    }
}

fn fill_once<T: Clone>(dst: &mut Option<T>, src: &Option<T>) {
    if dst.is_none() {
        dst.clone_from(src);
    }
}

/// One promoted token, accumulated across promotion sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub chain_id: String,
    pub token_address: TokenAddress,
    /// Highest-priority category that mentioned the token
    pub source: Source,
    /// Every category that mentioned the token, first mention first
    pub sources: Vec<Source>,
    pub boost_amount: f64,
    pub boost_total: f64,
    pub boost_type: Option<String>,
    #[serde(rename = "isCTO")]
    pub is_cto: bool,
    #[serde(flatten)]
    pub profile: ProfileFields,
    pub ad_type: Option<String>,
    pub ad_date: Option<String>,
    pub ad_duration_hours: Option<f64>,
}

impl Candidate {
    /// Minimal candidate mentioned by a single source.
    pub fn new(chain_id: &str, token_address: &str, source: Source) -> Self {
        Self {
            chain_id: chain_id.to_string(),
            token_address: token_address.to_string(),
            source,
            sources: vec![source],
            boost_amount: 0.0,
            boost_total: 0.0,
            boost_type: None,
            is_cto: false,
            profile: ProfileFields::default(),
            ad_type: None,
            ad_date: None,
            ad_duration_hours: None,
        }
    }

    /// Aggregation key: the lowercased token address.
    pub fn key(&self) -> String {
        self.token_address.to_lowercase()
    }

    /// Merge `other` into this candidate.
    ///
    /// Boost numbers take the maximum, `is_cto` is OR-ed, descriptive fields
    /// are fill-once and `source` moves only to a strictly higher priority.
    /// These rules make the numeric and flag fields commutative and idempotent.
    pub fn merged(mut self, other: &Candidate) -> Candidate {
        for source in std::iter::once(&other.source).chain(other.sources.iter()) {
            if !self.sources.contains(source) {
                self.sources.push(*source);
            }
        }

        if other.source.priority() > self.source.priority() {
            self.source = other.source;
        }

        self.boost_amount = self.boost_amount.max(other.boost_amount);
        self.boost_total = self.boost_total.max(other.boost_total);
        fill_once(&mut self.boost_type, &other.boost_type);
        self.is_cto = self.is_cto || other.is_cto;

        self.profile.fill_from(&other.profile);
        fill_once(&mut self.ad_type, &other.ad_type);
        fill_once(&mut self.ad_date, &other.ad_date);
        fill_once(&mut self.ad_duration_hours, &other.ad_duration_hours);

        self
    }
}

/// One side of a trading pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenRef {
    pub address: String,
    pub name: String,
    pub symbol: String,
}

impl TokenRef {
    fn from_record(record: Option<&Value>) -> Self {
        match record {
            Some(token) => Self {
                address: string_or_empty(token.get("address")),
                name: string_or_empty(token.get("name")),
                symbol: string_or_empty(token.get("symbol")),
            },
            None => Self::default(),
        }
    }
}

/// Market snapshot of one trading pair, read-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PairSnapshot {
    pub chain_id: String,
    pub dex_id: String,
    pub pair_address: String,
    pub base_token: TokenRef,
    pub quote_token: TokenRef,
    pub price_usd: Option<String>,
    pub liquidity_usd: f64,
    pub volume_m5: f64,
    pub volume_h1: f64,
    pub volume_h24: f64,
    pub buys_m5: i64,
    pub sells_m5: i64,
    pub price_change_m5: f64,
    pub price_change_h1: f64,
    pub price_change_h6: f64,
    pub price_change_h24: f64,
    /// Milliseconds since epoch; `0` when missing or unparseable
    pub pair_created_at_ms: i64,
    pub fdv: f64,
    pub market_cap: f64,
}

impl PairSnapshot {
    /// Parse a raw pair record. Returns `None` only when the record is not an object.
    pub fn from_record(record: &Value) -> Option<Self> {
        if !record.is_object() {
            return None;
        }

        let nested = |outer: &str, inner: &str| record.get(outer).and_then(|o| o.get(inner));

        Some(Self {
            chain_id: string_or_empty(record.get("chainId")),
            dex_id: string_or_empty(record.get("dexId")),
            pair_address: string_or_empty(record.get("pairAddress")),
            base_token: TokenRef::from_record(record.get("baseToken")),
            quote_token: TokenRef::from_record(record.get("quoteToken")),
            price_usd: opt_string(record.get("priceUsd")),
            liquidity_usd: safe_float(nested("liquidity", "usd")),
            volume_m5: safe_float(nested("volume", "m5")),
            volume_h1: safe_float(nested("volume", "h1")),
            volume_h24: safe_float(nested("volume", "h24")),
            buys_m5: safe_int(record.get("txns").and_then(|t| t.get("m5")).and_then(|m| m.get("buys"))),
            sells_m5: safe_int(record.get("txns").and_then(|t| t.get("m5")).and_then(|m| m.get("sells"))),
            price_change_m5: safe_float(nested("priceChange", "m5")),
            price_change_h1: safe_float(nested("priceChange", "h1")),
            price_change_h6: safe_float(nested("priceChange", "h6")),
            price_change_h24: safe_float(nested("priceChange", "h24")),
            pair_created_at_ms: safe_int(record.get("pairCreatedAt")),
            fdv: safe_float(record.get("fdv")),
            market_cap: safe_float(record.get("marketCap")),
        })
    }
}

/// Normalized metrics derived from a token's best pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsRecord {
    pub pair_address: String,
    pub dex_id: String,
    pub price_usd: Option<String>,
    pub liquidity_usd: f64,
    pub fdv: f64,
    pub market_cap: f64,
    #[serde(rename = "vol5m")]
    pub vol_5m: f64,
    #[serde(rename = "vol1h")]
    pub vol_1h: f64,
    #[serde(rename = "vol24h")]
    pub vol_24h: f64,
    #[serde(rename = "buys5m")]
    pub buys_5m: i64,
    #[serde(rename = "sells5m")]
    pub sells_5m: i64,
    #[serde(rename = "netBuy5m")]
    pub net_buy_5m: i64,
    #[serde(rename = "m5pct")]
    pub m5_pct: f64,
    #[serde(rename = "h1pct")]
    pub h1_pct: f64,
    #[serde(rename = "h6pct")]
    pub h6_pct: f64,
    #[serde(rename = "h24pct")]
    pub h24_pct: f64,
    pub age_min: f64,
    #[serde(rename = "turnover_1h_over_liq")]
    pub turnover_1h_over_liq: f64,
    pub base_token_symbol: String,
    pub base_token_name: String,
    pub base_token_address: String,
    pub quote_token_symbol: String,
    pub quote_token_address: String,
    pub url_dexscreener: String,
}

/// Heuristic scores. Dimensionless, not probabilities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Scores {
    pub score: f64,
    pub spike_score: f64,
}

/// A candidate joined with its metrics and scores, qualified for one mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub symbol: String,
    pub name: String,
    #[serde(flatten)]
    pub metrics: MetricsRecord,
    #[serde(flatten)]
    pub scores: Scores,
    pub mode: String,
    #[serde(rename = "urlGMGN")]
    pub url_gmgn: String,
    #[serde(rename = "orders_count", skip_serializing_if = "Option::is_none")]
    pub orders_count: Option<usize>,
    #[serde(rename = "isDexPaid", skip_serializing_if = "Option::is_none")]
    pub is_dex_paid: Option<bool>,
}

impl Row {
    pub fn token_address(&self) -> &str {
        &self.candidate.token_address
    }

    pub fn liquidity_usd(&self) -> f64 {
        self.metrics.liquidity_usd
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn boosted(amount: f64) -> Candidate {
        let mut c = Candidate::new("solana", "TokenA", Source::Boosts);
        c.boost_amount = amount;
        c.boost_total = amount * 2.0;
        c.boost_type = Some("boost".to_string());
        c
    }

    fn advertised() -> Candidate {
        let mut c = Candidate::new("solana", "tokena", Source::Ads);
        c.ad_type = Some("tokenAd".to_string());
        c.profile.profile_url = Some("https://example.com/ad".to_string());
        c
    }

    #[test]
    fn test_source_priority_order() {
        assert!(Source::Boosts.priority() > Source::Ads.priority());
        assert!(Source::Ads.priority() > Source::Cto.priority());
        assert!(Source::Cto.priority() > Source::Profiles.priority());
    }

    #[test]
    fn test_merge_keeps_higher_priority_source_in_both_orders() {
        let ab = boosted(50.0).merged(&advertised());
        let ba = advertised().merged(&boosted(50.0));

        assert_eq!(ab.source, Source::Boosts);
        assert_eq!(ba.source, Source::Boosts);
        assert_eq!(ab.sources, vec![Source::Boosts, Source::Ads]);
        assert_eq!(ba.sources, vec![Source::Ads, Source::Boosts]);
        assert_eq!(ab.boost_amount, 50.0);
        assert_eq!(ba.boost_amount, 50.0);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let once = boosted(10.0).merged(&advertised());
        let twice = once.clone().merged(&advertised());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_merge_cto_flag_never_reverts() {
        let mut cto = Candidate::new("solana", "TokenA", Source::Cto);
        cto.is_cto = true;
        let merged = cto.merged(&boosted(5.0));
        assert!(merged.is_cto);
        assert_eq!(merged.source, Source::Boosts);
    }

    #[test]
    fn test_profile_fill_once() {
        let mut existing = ProfileFields {
            profile_url: Some("https://first".to_string()),
            ..Default::default()
        };
        let incoming = ProfileFields {
            profile_url: Some("https://second".to_string()),
            profile_description: Some("desc".to_string()),
            profile_links_count: Some(3),
            ..Default::default()
        };
        existing.fill_from(&incoming);

        assert_eq!(existing.profile_url.as_deref(), Some("https://first"));
        assert_eq!(existing.profile_description.as_deref(), Some("desc"));
        assert_eq!(existing.profile_links_count, Some(3));
    }

    #[test]
    fn test_pair_snapshot_from_record() {
        let record = json!({
            "chainId": "solana",
            "dexId": "raydium",
            "pairAddress": "PairX",
            "baseToken": {"address": "TokenA", "name": "Alpha", "symbol": "ALP"},
            "quoteToken": {"address": "So111", "name": "Wrapped SOL", "symbol": "SOL"},
            "priceUsd": "0.0012",
            "liquidity": {"usd": "25,000"},
            "volume": {"m5": 300, "h1": 1500.5, "h24": null},
            "txns": {"m5": {"buys": 9, "sells": "4"}},
            "priceChange": {"m5": 5.0, "h1": "-2"},
            "pairCreatedAt": 1_700_000_000_000_i64,
            "marketCap": 90000
        });

        let pair = PairSnapshot::from_record(&record).unwrap();
        assert_eq!(pair.liquidity_usd, 25_000.0);
        assert_eq!(pair.volume_h24, 0.0);
        assert_eq!(pair.sells_m5, 4);
        assert_eq!(pair.price_change_h1, -2.0);
        assert_eq!(pair.fdv, 0.0);
        assert_eq!(pair.base_token.symbol, "ALP");
        assert_eq!(pair.price_usd.as_deref(), Some("0.0012"));
        assert!(PairSnapshot::from_record(&json!("not a pair")).is_none());
    }

    #[test]
    fn test_candidate_serializes_flat_profile() {
        let value = serde_json::to_value(advertised()).unwrap();
        assert_eq!(value["source"], "ads");
        assert_eq!(value["profileUrl"], "https://example.com/ad");
        assert_eq!(value["isCTO"], false);
    }
}
