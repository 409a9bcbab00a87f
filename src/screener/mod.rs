//! Screener module - paid runners scan pipeline.
//!
//! Promotion records are aggregated into candidates, enriched with profiles,
//! resolved to their best trading pair, scored, filtered per mode and ranked.
//! Every network call goes through [`MarketDataProvider`].

pub mod types;
pub mod coerce;
pub mod rate_limit;
pub mod data_sources;
pub mod aggregator;
pub mod enricher;
pub mod pairs;
pub mod metrics;
pub mod scorer;
pub mod filters;
pub mod ranker;
pub mod orders;
pub mod blacklist;
pub mod scan;

// Re-export the scan entry point and its configuration
pub use scan::{ProgressCallback, RunnerScanner};
pub use types::{DebugRecord, FetchDebug, Fetched, Mode, ScanCounts, ScanOptions, ScanResult};

// Re-export key components for advanced usage
pub use blacklist::apply_blacklist;
pub use data_sources::{ClientConfig, DexScreenerClient, MarketDataProvider};
pub use filters::{ModeThresholds, RejectionReason};
pub use rate_limit::{Bucket, EndpointRateLimiter};

/// Scan options builder with the documented defaults.
pub struct ScanOptionsBuilder {
    options: ScanOptions,
}

impl ScanOptionsBuilder {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self {
            options: ScanOptions::default(),
        }
    }

    /// Set the requested modes. Names are trimmed and lowercased.
    pub fn with_modes<I, S>(mut self, modes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.options.selected_modes = modes
            .into_iter()
            .map(|mode| mode.as_ref().trim().to_lowercase())
            .collect();
        self
    }

    /// Set the result cap.
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.options.top_n = top_n;
        self
    }

    /// Set the candidate cap.
    pub fn with_candidates_max(mut self, candidates_max: usize) -> Self {
        self.options.candidates_max = candidates_max;
        self
    }

    /// Choose which promotion sources are queried.
    pub fn with_sources(mut self, boosts: bool, ads: bool, cto: bool, profiles: bool) -> Self {
        self.options.include_boosts = boosts;
        self.options.include_ads = ads;
        self.options.include_cto = cto;
        self.options.include_profiles = profiles;
        self
    }

    /// Query paid orders for the finalists.
    pub fn with_orders(mut self, include_orders: bool) -> Self {
        self.options.include_orders = include_orders;
        self
    }

    pub fn with_anti_dead(mut self, anti_dead: bool) -> Self {
        self.options.anti_dead = anti_dead;
        self
    }

    pub fn with_unique_per_token(mut self, unique: bool) -> Self {
        self.options.unique_per_token = unique;
        self
    }

    /// Configure the trending filter thresholds.
    pub fn with_trending_filters(
        mut self,
        enabled: bool,
        min_liquidity: f64,
        min_vol1h: f64,
        min_vol5m: f64,
        min_netbuy5m: i64,
    ) -> Self {
        self.options.trending_filters = enabled;
        self.options.trending_min_liquidity = min_liquidity;
        self.options.trending_min_vol1h = min_vol1h;
        self.options.trending_min_vol5m = min_vol5m;
        self.options.trending_min_netbuy5m = min_netbuy5m;
        self
    }

    pub fn with_spike_score_min(mut self, spike_score_min: f64) -> Self {
        self.options.spike_score_min = spike_score_min;
        self
    }

    /// Set the spike floors of the `promoted_no_real_buy` and `m5_non_positive` rules.
    pub fn with_spike_floors(mut self, promoted: f64, m5: f64) -> Self {
        self.options.promoted_spike_floor = promoted;
        self.options.m5_spike_floor = m5;
        self
    }

    pub fn with_pump_mode(mut self, pump_mode: bool) -> Self {
        self.options.pump_mode = pump_mode;
        self
    }

    pub fn with_sort_by_spike(mut self, sort_by_spike: bool) -> Self {
        self.options.sort_by_spike = sort_by_spike;
        self
    }

    /// Keep the per-token rejection trail.
    pub fn with_verbose_debug(mut self, verbose: bool) -> Self {
        self.options.verbose_debug = verbose;
        self
    }

    pub fn with_chain_id(mut self, chain_id: &str) -> Self {
        self.options.chain_id = data_sources::normalize_chain_id(chain_id);
        self
    }

    /// Build the scan options.
    pub fn build(self) -> ScanOptions {
        self.options
    }
}

impl Default for ScanOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_options_builder() {
        let opts = ScanOptionsBuilder::new()
            .with_modes([" Early_Strict", "DEGEN "])
            .with_top_n(5)
            .with_pump_mode(true)
            .with_sources(true, true, false, false)
            .with_chain_id("sol")
            .build();

        assert_eq!(opts.selected_modes, vec!["early_strict", "degen"]);
        assert_eq!(opts.top_n, 5);
        assert!(opts.pump_mode);
        assert!(opts.include_ads);
        assert!(!opts.include_cto);
        assert!(!opts.include_profiles);
        assert_eq!(opts.chain_id, "solana");
    }

    #[test]
    fn test_scan_options_builder_defaults() {
        let opts = ScanOptionsBuilder::new().build();
        assert_eq!(opts, ScanOptions::default());
        assert!(opts.sort_by_spike);
        assert_eq!(opts.spike_score_min, 0.25);
    }
}
