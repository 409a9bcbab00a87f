//! Post-scan blacklist filter.

use crate::types::Row;
use std::collections::HashSet;

/// Drop rows whose token address matches a blacklist entry.
///
/// Entries are trimmed and compared case-insensitively; blank entries are ignored.
/// Returns the kept rows and how many were removed.
pub fn apply_blacklist<S: AsRef<str>>(rows: Vec<Row>, entries: &[S]) -> (Vec<Row>, usize) {
    let blocked: HashSet<String> = entries
        .iter()
        .map(|entry| entry.as_ref().trim().to_lowercase())
        .filter(|entry| !entry.is_empty())
        .collect();

    if blocked.is_empty() {
        return (rows, 0);
    }

    let before = rows.len();
    let kept: Vec<Row> = rows
        .into_iter()
        .filter(|row| !blocked.contains(&row.token_address().trim().to_lowercase()))
        .collect();
    let removed = before - kept.len();
    (kept, removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Candidate, MetricsRecord, Scores, Source};

    fn row(token: &str) -> Row {
        Row {
            candidate: Candidate::new("solana", token, Source::Boosts),
            symbol: String::new(),
            name: String::new(),
            metrics: MetricsRecord::default(),
            scores: Scores::default(),
            mode: "degen".to_string(),
            url_gmgn: String::new(),
            orders_count: None,
            is_dex_paid: None,
        }
    }

    #[test]
    fn test_blacklist_case_insensitive_and_trimmed() {
        let rows = vec![row("TokenA"), row("TokenB"), row("TokenC")];
        let (kept, removed) = apply_blacklist(rows, &[" tokena ", "TOKENC", ""]);
        assert_eq!(removed, 2);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].token_address(), "TokenB");
    }

    #[test]
    fn test_empty_blacklist_keeps_everything() {
        let rows = vec![row("TokenA")];
        let (kept, removed) = apply_blacklist(rows, &Vec::<String>::new());
        assert_eq!(removed, 0);
        assert_eq!(kept.len(), 1);
    }
}
