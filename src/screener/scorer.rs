//! Spike and composite scoring.
//!
//! Both scores are dimensionless heuristics. Logarithmic terms damp the
//! liquidity, volume and flow inputs; the spike score caps turnover and flow
//! so a single extreme input cannot dominate the ranking.

use crate::types::{MetricsRecord, Scores};

/// 5-minute momentum weight with and without pump mode.
const M5_WEIGHT_PUMP: f64 = 1.15;
const M5_WEIGHT_NORMAL: f64 = 0.85;
const H1_WEIGHT: f64 = 0.35;

const SPIKE_MOMENTUM_WEIGHT: f64 = 0.55;
const SPIKE_TURNOVER_WEIGHT: f64 = 0.30;
const SPIKE_TURNOVER_CAP: f64 = 2.5;
const SPIKE_FLOW_WEIGHT: f64 = 0.25;
const SPIKE_FLOW_CAP: f64 = 2.0;

const SCORE_LIQUIDITY_WEIGHT: f64 = 0.30;
const SCORE_VOLUME_WEIGHT: f64 = 0.25;
const SCORE_SPIKE_WEIGHT: f64 = 1.15;
const SCORE_GREEN_M5_BONUS: f64 = 0.15;

fn log_scale(x: f64) -> f64 {
    (1.0 + x.max(0.0)).log10()
}

fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

/// Score a metrics record.
pub fn score(metrics: &MetricsRecord, pump_mode: bool) -> Scores {
    let m5_pct = finite_or_zero(metrics.m5_pct);
    let h1_pct = finite_or_zero(metrics.h1_pct);
    let turnover = finite_or_zero(metrics.turnover_1h_over_liq);

    let liq_s = log_scale(finite_or_zero(metrics.liquidity_usd));
    let vol_s = log_scale(finite_or_zero(metrics.vol_1h));
    let flow_s = log_scale(metrics.net_buy_5m as f64);

    let m5_weight = if pump_mode {
        M5_WEIGHT_PUMP
    } else {
        M5_WEIGHT_NORMAL
    };
    let mom = m5_pct * m5_weight + h1_pct * H1_WEIGHT;

    let spike_score = SPIKE_MOMENTUM_WEIGHT * (mom / 10.0).max(0.0)
        + SPIKE_TURNOVER_WEIGHT * (turnover * 12.0).min(SPIKE_TURNOVER_CAP)
        + SPIKE_FLOW_WEIGHT * (flow_s / 2.0).min(SPIKE_FLOW_CAP);

    let green_bonus = if m5_pct > 0.0 {
        SCORE_GREEN_M5_BONUS
    } else {
        0.0
    };
    let score = SCORE_LIQUIDITY_WEIGHT * liq_s
        + SCORE_VOLUME_WEIGHT * vol_s
        + SCORE_SPIKE_WEIGHT * spike_score
        + green_bonus;

    Scores { score, spike_score }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// liquidity 20k, vol5m 300, vol1h 1500, net buy 3, m5 +5%, h1 +2%
    fn runner_metrics() -> MetricsRecord {
        MetricsRecord {
            liquidity_usd: 20_000.0,
            vol_5m: 300.0,
            vol_1h: 1_500.0,
            buys_5m: 5,
            sells_5m: 2,
            net_buy_5m: 3,
            m5_pct: 5.0,
            h1_pct: 2.0,
            age_min: 30.0,
            turnover_1h_over_liq: 1_500.0 / 20_000.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_runner_scores_pump_mode() {
        let s = score(&runner_metrics(), true);

        // mom = 5*1.15 + 2*0.35 = 6.45
        let expected_spike = 0.55 * 0.645 + 0.30 * 0.9 + 0.25 * (4f64.log10() / 2.0);
        assert!((s.spike_score - expected_spike).abs() < 1e-12);
        assert!((s.spike_score - 0.7000).abs() < 1e-3);

        let expected_score = 0.30 * 20_001f64.log10()
            + 0.25 * 1_501f64.log10()
            + 1.15 * expected_spike
            + 0.15;
        assert!((s.score - expected_score).abs() < 1e-12);
        assert!(s.score > 3.0 && s.score < 3.1);
    }

    #[test]
    fn test_pump_mode_weights_m5_more() {
        let pump = score(&runner_metrics(), true);
        let normal = score(&runner_metrics(), false);
        assert!(pump.spike_score > normal.spike_score);
        assert!(pump.score > normal.score);
    }

    #[test]
    fn test_all_zero_metrics_are_finite() {
        let s = score(&MetricsRecord::default(), false);
        assert_eq!(s.spike_score, 0.0);
        assert_eq!(s.score, 0.0);
    }

    #[test]
    fn test_hostile_inputs_stay_finite() {
        let metrics = MetricsRecord {
            liquidity_usd: f64::NAN,
            vol_1h: -50.0,
            net_buy_5m: -40,
            m5_pct: f64::INFINITY,
            h1_pct: -500.0,
            turnover_1h_over_liq: f64::NEG_INFINITY,
            ..Default::default()
        };
        for pump in [true, false] {
            let s = score(&metrics, pump);
            assert!(s.score.is_finite());
            assert!(s.spike_score.is_finite());
            assert!(s.spike_score >= 0.0);
        }
    }

    #[test]
    fn test_spike_caps() {
        let metrics = MetricsRecord {
            liquidity_usd: 1_000.0,
            vol_1h: 1_000_000.0,
            net_buy_5m: 1_000_000_000,
            turnover_1h_over_liq: 1_000.0,
            ..Default::default()
        };
        let s = score(&metrics, false);
        // turnover and flow both capped, no momentum
        assert!((s.spike_score - (0.30 * 2.5 + 0.25 * 2.0)).abs() < 1e-12);
    }
}
