//! Scan options, provider results and the debug record.

use crate::types::Row;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The only chain this deployment screens.
pub const DEFAULT_CHAIN_ID: &str = "solana";

/// Debug reason set when no promotion source produced a candidate.
pub const NO_CANDIDATES: &str = "no_candidates";

/// Maximum verbose rejection entries kept in the debug record.
pub const WHY_FILTERED_CAP: usize = 400;

/// Maximum error lines kept in the debug record.
pub const ERRORS_CAP: usize = 50;

/// Strategy profile with its own eligibility thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    UltraEarly,
    EarlyStrict,
    Early,
    Strict,
    Degen,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::UltraEarly => "ultra_early",
            Mode::EarlyStrict => "early_strict",
            Mode::Early => "early",
            Mode::Strict => "strict",
            Mode::Degen => "degen",
        }
    }

    /// Returns all available modes.
    pub fn all() -> [Mode; 5] {
        [
            Mode::UltraEarly,
            Mode::EarlyStrict,
            Mode::Early,
            Mode::Strict,
            Mode::Degen,
        ]
    }

    /// Look up a mode by name. Unrecognized names fall back to `Degen`.
    pub fn from_name(name: &str) -> Mode {
        let name = name.trim().to_lowercase();
        Mode::all()
            .into_iter()
            .find(|mode| mode.as_str() == name)
            .unwrap_or(Mode::Degen)
    }
}

/// Every knob of one scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Requested mode names, trimmed and lowercased
    pub selected_modes: Vec<String>,
    /// Result cap (at least 1 row is kept)
    pub top_n: usize,
    /// Candidate cap after aggregation (at least 1)
    pub candidates_max: usize,
    pub anti_dead: bool,
    pub include_boosts: bool,
    pub include_profiles: bool,
    pub include_cto: bool,
    pub include_ads: bool,
    /// Query paid orders for the finalists
    pub include_orders: bool,
    pub unique_per_token: bool,
    pub trending_filters: bool,
    pub trending_min_liquidity: f64,
    pub trending_min_vol1h: f64,
    pub trending_min_vol5m: f64,
    pub trending_min_netbuy5m: i64,
    pub spike_score_min: f64,
    /// Spike floor of the `promoted_no_real_buy` rule
    pub promoted_spike_floor: f64,
    /// Spike floor of the `m5_non_positive` rule
    pub m5_spike_floor: f64,
    /// Keep the per-token rejection trail in the debug record
    pub verbose_debug: bool,
    /// Loosen thresholds and weight 5-minute momentum more
    pub pump_mode: bool,
    /// Rank by spike score instead of score
    pub sort_by_spike: bool,
    pub chain_id: String,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            selected_modes: Vec::new(),
            top_n: 20,
            candidates_max: 250,
            anti_dead: true,
            include_boosts: true,
            include_profiles: true,
            include_cto: true,
            include_ads: false,
            include_orders: false,
            unique_per_token: true,
            trending_filters: true,
            trending_min_liquidity: 15_000.0,
            trending_min_vol1h: 1_000.0,
            trending_min_vol5m: 500.0,
            trending_min_netbuy5m: 2,
            spike_score_min: 0.25,
            promoted_spike_floor: 0.40,
            m5_spike_floor: 0.55,
            verbose_debug: false,
            pump_mode: false,
            sort_by_spike: true,
            chain_id: DEFAULT_CHAIN_ID.to_string(),
        }
    }
}

/// Out-of-band diagnostics of one provider call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FetchDebug {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_s: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_snippet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl FetchDebug {
    pub fn for_url(url: &str) -> Self {
        Self {
            url: Some(url.to_string()),
            ..Default::default()
        }
    }

    pub fn with_note(note: &str) -> Self {
        Self {
            note: Some(note.to_string()),
            ..Default::default()
        }
    }

    /// The call reached the server and got an HTTP error status.
    pub fn is_http_error(&self) -> bool {
        self.status.is_some_and(|status| status >= 400)
    }
}

/// Records returned by a provider call. Failures yield no records and a
/// populated [`FetchDebug`]; they are never raised.
#[derive(Debug, Clone, Default)]
pub struct Fetched {
    pub records: Vec<Value>,
    pub debug: FetchDebug,
}

impl Fetched {
    pub fn new(records: Vec<Value>, debug: FetchDebug) -> Self {
        Self { records, debug }
    }

    pub fn empty(debug: FetchDebug) -> Self {
        Self {
            records: Vec::new(),
            debug,
        }
    }
}

/// Provider diagnostics per call site.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApiDebug {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_boosts_latest: Option<FetchDebug>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_boosts_top: Option<FetchDebug>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ads_latest: Option<FetchDebug>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cto_latest: Option<FetchDebug>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profiles_latest: Option<FetchDebug>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pairs_batch_calls: Option<Vec<FetchDebug>>,
    /// Keyed by the first six characters of the token address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orders: Option<BTreeMap<String, FetchDebug>>,
}

/// Per-source raw counts and per-stage counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanCounts {
    pub boost_items_raw: usize,
    pub ads_items_raw: usize,
    pub cto_items_raw: usize,
    pub candidates_unique: usize,
    pub profiles_raw: usize,
    pub pairs_returned: usize,
    pub tokens_missing_from_batch: usize,
    pub rows_after_filters: usize,
}

/// One verbose "why filtered" entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilteredEntry {
    #[serde(rename = "tokenAddress")]
    pub token_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    pub reason: String,
}

/// Diagnostics of one scan, returned next to the rows.
#[derive(Debug, Clone, Serialize)]
pub struct DebugRecord {
    pub ts_utc: String,
    pub opts: ScanOptions,
    pub api_debug: ApiDebug,
    pub counts: ScanCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub why: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub why_filtered_list: Option<Vec<FilteredEntry>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl DebugRecord {
    pub fn new(opts: &ScanOptions) -> Self {
        Self {
            ts_utc: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            opts: opts.clone(),
            api_debug: ApiDebug::default(),
            counts: ScanCounts::default(),
            why: None,
            why_filtered_list: None,
            errors: Vec::new(),
        }
    }

    pub fn is_no_candidates(&self) -> bool {
        self.why.as_deref() == Some(NO_CANDIDATES)
    }

    /// Append an error line, dropping anything past the cap.
    pub fn push_error(&mut self, line: String) {
        if self.errors.len() < ERRORS_CAP {
            self.errors.push(line);
        }
    }
}

/// Final ranked rows plus the scan's debug record.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub rows: Vec<Row>,
    pub debug: DebugRecord,
}
