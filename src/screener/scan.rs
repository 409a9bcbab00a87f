//! Scan orchestration: one call runs every pipeline stage in order.

use crate::screener::aggregator::aggregate;
use crate::screener::data_sources::{normalize_chain_id, MarketDataProvider};
use crate::screener::enricher::enrich_profiles;
use crate::screener::filters::{
    anti_dead_pass, join_reasons, qualifies, trending_reasons, RejectionTrail,
};
use crate::screener::metrics::{compute_metrics, now_ms};
use crate::screener::orders::augment_with_orders;
use crate::screener::pairs::{resolve_pairs, PairIndex};
use crate::screener::ranker::rank_rows;
use crate::screener::scorer::score;
use crate::screener::types::{DebugRecord, Mode, ScanOptions, ScanResult};
use crate::types::{Candidate, PairSnapshot, Row};
use anyhow::{bail, Result};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Called once per evaluated token with `(tokens_done, tokens_total)`.
pub type ProgressCallback<'a> = &'a mut (dyn FnMut(usize, usize) + Send + 'a);

/// Counts evaluated tokens and reports each step to an optional callback.
pub struct ProgressTicker<'a> {
    done: usize,
    total: usize,
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressTicker<'a> {
    pub fn new(total: usize, callback: Option<ProgressCallback<'a>>) -> Self {
        Self {
            done: 0,
            total,
            callback,
        }
    }

    pub fn tick(&mut self) {
        self.done = (self.done + 1).min(self.total);
        if let Some(callback) = self.callback.as_mut() {
            callback(self.done, self.total);
        }
    }

    pub fn done(&self) -> usize {
        self.done
    }
}

/// GMGN trading link of a token.
pub fn gmgn_url(token_address: &str) -> String {
    if token_address.is_empty() {
        return String::new();
    }
    format!("https://gmgn.ai/sol/token/{}", token_address)
}

/// Symbol and name of the token within its pair, preferring the quote side
/// when the token is the pair's quote token.
fn token_identity(pair: &PairSnapshot, token_address: &str) -> (String, String) {
    let token = token_address.to_lowercase();
    let base = &pair.base_token;
    let quote = &pair.quote_token;

    let is_quote = base.address.trim().to_lowercase() != token
        && quote.address.trim().to_lowercase() == token;

    if is_quote {
        let symbol = if quote.symbol.is_empty() { &base.symbol } else { &quote.symbol };
        let name = if quote.name.is_empty() { &base.name } else { &quote.name };
        (symbol.clone(), name.clone())
    } else {
        (base.symbol.clone(), base.name.clone())
    }
}

/// Trim and lowercase requested mode names, dropping blanks.
fn normalize_modes(modes: &[String]) -> Vec<String> {
    modes
        .iter()
        .map(|mode| mode.trim().to_lowercase())
        .filter(|mode| !mode.is_empty())
        .collect()
}

/// Runs scans against a market data provider.
pub struct RunnerScanner {
    provider: Arc<dyn MarketDataProvider>,
}

impl RunnerScanner {
    /// Create a new scanner over the given provider.
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { provider }
    }

    /// Run one scan with the current wall clock.
    pub async fn scan(
        &self,
        opts: &ScanOptions,
        progress: Option<ProgressCallback<'_>>,
    ) -> Result<ScanResult> {
        self.scan_at(opts, progress, now_ms()).await
    }

    /// Run one scan, computing pair ages against `now_ms`.
    #[instrument(skip_all, fields(modes = ?opts.selected_modes, pump_mode = opts.pump_mode))]
    pub async fn scan_at(
        &self,
        opts: &ScanOptions,
        progress: Option<ProgressCallback<'_>>,
        now_ms: i64,
    ) -> Result<ScanResult> {
        let chain_id = normalize_chain_id(&opts.chain_id);
        if chain_id.is_empty() {
            bail!("Scan requires a chain id");
        }

        let opts = ScanOptions {
            selected_modes: normalize_modes(&opts.selected_modes),
            chain_id: chain_id.clone(),
            ..opts.clone()
        };
        let mut debug = DebugRecord::new(&opts);
        let provider = self.provider.as_ref();

        info!("Starting scan for modes {:?}", opts.selected_modes);

        let mut candidates = aggregate(provider, &opts, &mut debug).await;
        if candidates.is_empty() {
            return Ok(ScanResult {
                rows: Vec::new(),
                debug,
            });
        }
        info!("Aggregated {} candidates", candidates.len());

        enrich_profiles(provider, &opts, &mut candidates, &mut debug).await;

        let token_addresses: Vec<String> = candidates
            .iter()
            .map(|candidate| candidate.token_address.trim().to_string())
            .filter(|address| !address.is_empty())
            .collect();

        let index = resolve_pairs(provider, &chain_id, &token_addresses, &mut debug).await;
        debug!("Pair index covers {} tokens", index.len());

        let mut trail = RejectionTrail::new(opts.verbose_debug);
        let mut ticker = ProgressTicker::new(token_addresses.len(), progress);
        let mut rows = Vec::new();

        for candidate in candidates.iter().filter(|c| !c.token_address.trim().is_empty()) {
            rows.extend(evaluate_candidate(candidate, &index, &opts, now_ms, &mut trail));
            ticker.tick();
        }

        debug.counts.rows_after_filters = rows.len();
        debug.why_filtered_list = trail.finish();
        info!(
            "{} rows qualified from {} evaluated tokens",
            rows.len(),
            ticker.done()
        );

        if rows.is_empty() {
            return Ok(ScanResult { rows, debug });
        }

        let mut rows = rank_rows(rows, opts.sort_by_spike, opts.unique_per_token, opts.top_n);

        if opts.include_orders {
            augment_with_orders(provider, &chain_id, &mut rows, &mut debug).await;
        }

        info!("Scan finished with {} runners", rows.len());
        Ok(ScanResult { rows, debug })
    }
}

/// Score one candidate and emit a row per qualifying mode.
fn evaluate_candidate(
    candidate: &Candidate,
    index: &PairIndex,
    opts: &ScanOptions,
    now_ms: i64,
    trail: &mut RejectionTrail,
) -> Vec<Row> {
    let token_address = candidate.token_address.trim();

    let Some(pair) = index.best_pair(token_address) else {
        trail.record(token_address, None, "no_pairs_returned");
        return Vec::new();
    };

    let (symbol, name) = token_identity(pair, token_address);
    let metrics = compute_metrics(pair, &opts.chain_id, now_ms);
    let scores = score(&metrics, opts.pump_mode);

    if opts.anti_dead && !anti_dead_pass(&metrics, opts) {
        trail.record(token_address, Some(&symbol), "anti_dead");
        return Vec::new();
    }

    if opts.trending_filters {
        let reasons = trending_reasons(&metrics, &scores, candidate.boost_amount, opts);
        if !reasons.is_empty() {
            trail.record(token_address, Some(&symbol), join_reasons(&reasons));
            return Vec::new();
        }
    }

    opts.selected_modes
        .iter()
        .filter(|mode| qualifies(&metrics, &scores, Mode::from_name(mode), opts.pump_mode))
        .map(|mode| Row {
            candidate: candidate.clone(),
            symbol: symbol.clone(),
            name: name.clone(),
            metrics: metrics.clone(),
            scores,
            mode: mode.clone(),
            url_gmgn: gmgn_url(token_address),
            orders_count: None,
            is_dex_paid: None,
        })
        .collect()
}
