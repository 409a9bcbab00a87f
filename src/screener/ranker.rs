//! Ranking, per-token deduplication and truncation of qualifying rows.

use crate::types::Row;
use std::cmp::Ordering;
use std::collections::HashSet;

/// `(primary, score, liquidity)`; primary is the spike score or the score.
pub fn rank_key(row: &Row, sort_by_spike: bool) -> (f64, f64, f64) {
    let primary = if sort_by_spike {
        row.scores.spike_score
    } else {
        row.scores.score
    };
    (primary, row.scores.score, row.liquidity_usd())
}

fn compare_desc(a: &Row, b: &Row, sort_by_spike: bool) -> Ordering {
    let (ka, kb) = (rank_key(a, sort_by_spike), rank_key(b, sort_by_spike));
    kb.0.total_cmp(&ka.0)
        .then_with(|| kb.1.total_cmp(&ka.1))
        .then_with(|| kb.2.total_cmp(&ka.2))
}

/// Stable descending sort by rank key.
pub fn sort_rows(rows: &mut [Row], sort_by_spike: bool) {
    rows.sort_by(|a, b| compare_desc(a, b, sort_by_spike));
}

/// Keep the first row per token address (case-insensitive); rows without an address are dropped.
pub fn unique_per_token(rows: Vec<Row>) -> Vec<Row> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| {
            let key = row.token_address().to_lowercase();
            !key.is_empty() && seen.insert(key)
        })
        .collect()
}

/// Sort, optionally dedupe, then keep at most `top_n` rows (at least 1).
pub fn rank_rows(mut rows: Vec<Row>, sort_by_spike: bool, dedupe: bool, top_n: usize) -> Vec<Row> {
    sort_rows(&mut rows, sort_by_spike);

    if dedupe {
        rows = unique_per_token(rows);
        sort_rows(&mut rows, sort_by_spike);
    }

    rows.truncate(top_n.max(1));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Candidate, MetricsRecord, Scores, Source};

    fn row(token: &str, mode: &str, score: f64, spike: f64, liq: f64) -> Row {
        Row {
            candidate: Candidate::new("solana", token, Source::Boosts),
            symbol: token.to_uppercase(),
            name: token.to_string(),
            metrics: MetricsRecord {
                liquidity_usd: liq,
                ..Default::default()
            },
            scores: Scores {
                score,
                spike_score: spike,
            },
            mode: mode.to_string(),
            url_gmgn: String::new(),
            orders_count: None,
            is_dex_paid: None,
        }
    }

    #[test]
    fn test_top_n_truncates_sorted() {
        let rows: Vec<Row> = (0..20)
            .map(|i| row(&format!("T{}", i), "degen", (i % 7) as f64, (i * 37 % 20) as f64 / 10.0, 1_000.0))
            .collect();

        let ranked = rank_rows(rows, true, true, 5);
        assert_eq!(ranked.len(), 5);
        for pair in ranked.windows(2) {
            assert!(rank_key(&pair[0], true) >= rank_key(&pair[1], true));
        }
    }

    #[test]
    fn test_sort_by_score_uses_score_first() {
        let rows = vec![
            row("A", "degen", 1.0, 0.9, 10.0),
            row("B", "degen", 2.0, 0.1, 10.0),
        ];
        let by_spike = rank_rows(rows.clone(), true, false, 10);
        assert_eq!(by_spike[0].token_address(), "A");
        let by_score = rank_rows(rows, false, false, 10);
        assert_eq!(by_score[0].token_address(), "B");
    }

    #[test]
    fn test_liquidity_breaks_ties() {
        let rows = vec![
            row("Thin", "degen", 1.0, 0.5, 100.0),
            row("Deep", "degen", 1.0, 0.5, 90_000.0),
        ];
        assert_eq!(rank_rows(rows, true, false, 10)[0].token_address(), "Deep");
    }

    #[test]
    fn test_unique_per_token_keeps_best_row() {
        let rows = vec![
            row("TokenA", "degen", 1.0, 0.3, 10.0),
            row("tokena", "early", 1.5, 0.8, 10.0),
            row("TokenB", "degen", 1.2, 0.5, 10.0),
            row("", "degen", 9.0, 9.0, 10.0),
        ];
        let before = rows.len();
        let ranked = rank_rows(rows, true, true, 10);

        assert!(ranked.len() <= before);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].mode, "early");
        assert_eq!(ranked[1].token_address(), "TokenB");
    }

    #[test]
    fn test_without_dedupe_all_modes_survive() {
        let rows = vec![
            row("TokenA", "degen", 1.0, 0.3, 10.0),
            row("TokenA", "early", 1.0, 0.3, 10.0),
        ];
        let ranked = rank_rows(rows, true, false, 10);
        assert_eq!(ranked.len(), 2);
        // stable: equal keys keep input order
        assert_eq!(ranked[0].mode, "degen");
    }

    #[test]
    fn test_top_n_zero_keeps_one() {
        let rows = vec![row("A", "degen", 1.0, 0.3, 10.0), row("B", "degen", 2.0, 0.3, 10.0)];
        assert_eq!(rank_rows(rows, true, true, 0).len(), 1);
    }
}
