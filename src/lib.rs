//! Paid Runners - DexScreener promotion screener for Solana
//!
//! This crate ranks tokens that are receiving paid promotion (boosts, ads,
//! community takeovers) and show short-term trading momentum, producing a
//! ranked table for manual inspection. It never executes trades.

pub mod types;
pub mod screener;

// Re-export main types for convenience
pub use types::{Candidate, MetricsRecord, PairSnapshot, Row, Scores, Source};
pub use screener::{RunnerScanner, ScanOptions, ScanOptionsBuilder, ScanResult};
