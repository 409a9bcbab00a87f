//! Filter pipeline: anti-dead prefilter, trending filter and per-mode gating.

use crate::screener::types::{FilteredEntry, Mode, ScanOptions, WHY_FILTERED_CAP};
use crate::types::{MetricsRecord, Scores};
use std::fmt;

/// Tokens older than this are always treated as dead (10 days).
const ANTI_DEAD_MAX_AGE_MIN: f64 = 10.0 * 24.0 * 60.0;

/// Minimum turnover for a boosted token to count as really traded.
const PROMOTED_MIN_TURNOVER: f64 = 0.01;

/// Eligibility thresholds of one mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeThresholds {
    pub min_liq: f64,
    pub min_vol5: f64,
    pub min_netbuy5: i64,
    pub max_age_min: f64,
    pub min_score: f64,
}

const fn thresholds(
    min_liq: f64,
    min_vol5: f64,
    min_netbuy5: i64,
    max_age_min: f64,
    min_score: f64,
) -> ModeThresholds {
    ModeThresholds {
        min_liq,
        min_vol5,
        min_netbuy5,
        max_age_min,
        min_score,
    }
}

const DAY_MIN: f64 = 24.0 * 60.0;
const WEEK_MIN: f64 = 7.0 * DAY_MIN;

/// Indexed by mode, then `[pump_mode, normal]`.
static THRESHOLD_TABLE: [[ModeThresholds; 2]; 5] = [
    // ultra_early
    [
        thresholds(2_500.0, 40.0, 0, 240.0, 0.15),
        thresholds(4_000.0, 80.0, 1, 240.0, 0.15),
    ],
    // early_strict
    [
        thresholds(6_000.0, 120.0, 1, DAY_MIN, 0.45),
        thresholds(12_000.0, 250.0, 2, DAY_MIN, 0.45),
    ],
    // early
    [
        thresholds(3_500.0, 80.0, 0, DAY_MIN, 0.25),
        thresholds(8_000.0, 160.0, 1, DAY_MIN, 0.25),
    ],
    // strict
    [
        thresholds(15_000.0, 250.0, 2, WEEK_MIN, 0.85),
        thresholds(25_000.0, 500.0, 3, WEEK_MIN, 0.85),
    ],
    // degen
    [
        thresholds(2_500.0, 60.0, 0, WEEK_MIN, 0.20),
        thresholds(5_000.0, 120.0, 1, WEEK_MIN, 0.20),
    ],
];

impl Mode {
    fn table_index(&self) -> usize {
        match self {
            Mode::UltraEarly => 0,
            Mode::EarlyStrict => 1,
            Mode::Early => 2,
            Mode::Strict => 3,
            Mode::Degen => 4,
        }
    }

    /// Eligibility thresholds of this mode.
    pub fn thresholds(&self, pump_mode: bool) -> ModeThresholds {
        THRESHOLD_TABLE[self.table_index()][if pump_mode { 0 } else { 1 }]
    }
}

/// Quick prefilter against dead pairs. Young tokens always pass.
pub fn anti_dead_pass(metrics: &MetricsRecord, opts: &ScanOptions) -> bool {
    let pump = opts.pump_mode;

    if metrics.age_min <= if pump { 90.0 } else { 60.0 } {
        return true;
    }

    let scale = if pump { 0.75 } else { 0.85 };

    let liq_floor = (opts.trending_min_liquidity * scale).max(1_200.0);
    if metrics.liquidity_usd < liq_floor {
        return false;
    }

    let txns_5m = metrics.buys_5m.saturating_add(metrics.sells_5m);
    let vol_floor = (opts.trending_min_vol5m * scale).max(40.0);
    if txns_5m < if pump { 1 } else { 2 } && metrics.vol_5m < vol_floor {
        return false;
    }

    metrics.age_min <= ANTI_DEAD_MAX_AGE_MIN
}

/// A named trending-filter rejection with the value that triggered it.
#[derive(Debug, Clone, PartialEq)]
pub enum RejectionReason {
    LowLiquidity(f64),
    LowVolume { vol_1h: f64, vol_5m: f64 },
    LowNetBuy(i64),
    LowSpike(f64),
    PromotedNoRealBuy,
    M5NonPositive,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::LowLiquidity(liq) => write!(f, "low_liq:{:.0}", liq),
            RejectionReason::LowVolume { vol_1h, vol_5m } => {
                write!(f, "low_vol:1h={:.0},5m={:.0}", vol_1h, vol_5m)
            }
            RejectionReason::LowNetBuy(net) => write!(f, "low_netbuy:{}", net),
            RejectionReason::LowSpike(spike) => write!(f, "low_spike:{:.3}", spike),
            RejectionReason::PromotedNoRealBuy => f.write_str("promoted_no_real_buy"),
            RejectionReason::M5NonPositive => f.write_str("m5_non_positive"),
        }
    }
}

/// Collect every trending rejection reason. Empty means the token passes.
pub fn trending_reasons(
    metrics: &MetricsRecord,
    scores: &Scores,
    boost_amount: f64,
    opts: &ScanOptions,
) -> Vec<RejectionReason> {
    let mut reasons = Vec::new();
    let spike = scores.spike_score;

    if metrics.liquidity_usd < opts.trending_min_liquidity {
        reasons.push(RejectionReason::LowLiquidity(metrics.liquidity_usd));
    }

    if metrics.vol_1h < opts.trending_min_vol1h && metrics.vol_5m < opts.trending_min_vol5m {
        reasons.push(RejectionReason::LowVolume {
            vol_1h: metrics.vol_1h,
            vol_5m: metrics.vol_5m,
        });
    }

    if metrics.net_buy_5m < opts.trending_min_netbuy5m {
        reasons.push(RejectionReason::LowNetBuy(metrics.net_buy_5m));
    }

    if spike < opts.spike_score_min {
        reasons.push(RejectionReason::LowSpike(spike));
    }

    // Paid visibility without real flow
    if boost_amount > 0.0
        && metrics.net_buy_5m <= 0
        && metrics.turnover_1h_over_liq < PROMOTED_MIN_TURNOVER
        && spike < opts.spike_score_min.max(opts.promoted_spike_floor)
    {
        reasons.push(RejectionReason::PromotedNoRealBuy);
    }

    if metrics.m5_pct <= 0.0 && spike < opts.spike_score_min.max(opts.m5_spike_floor) {
        reasons.push(RejectionReason::M5NonPositive);
    }

    reasons
}

/// Join reasons the way they appear in the debug trail.
pub fn join_reasons(reasons: &[RejectionReason]) -> String {
    reasons
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Whether a token meets every threshold of `mode`.
pub fn qualifies(metrics: &MetricsRecord, scores: &Scores, mode: Mode, pump_mode: bool) -> bool {
    let t = mode.thresholds(pump_mode);
    metrics.liquidity_usd >= t.min_liq
        && metrics.vol_5m >= t.min_vol5
        && metrics.net_buy_5m >= t.min_netbuy5
        && metrics.age_min <= t.max_age_min
        && scores.score >= t.min_score
}

/// Bounded accumulator of per-token rejection reasons.
///
/// Only records when enabled; entries past the cap are dropped.
#[derive(Debug, Default)]
pub struct RejectionTrail {
    enabled: bool,
    entries: Vec<FilteredEntry>,
}

impl RejectionTrail {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: Vec::new(),
        }
    }

    pub fn record(&mut self, token_address: &str, symbol: Option<&str>, reason: impl Into<String>) {
        if !self.enabled || self.entries.len() >= WHY_FILTERED_CAP {
            return;
        }
        self.entries.push(FilteredEntry {
            token_address: token_address.to_string(),
            symbol: symbol.map(str::to_string),
            reason: reason.into(),
        });
    }

    /// Consume the trail. `None` when verbose debugging is off.
    pub fn finish(self) -> Option<Vec<FilteredEntry>> {
        self.enabled.then_some(self.entries)
    }
}
