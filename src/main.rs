//! Command-line runner for the paid runners screener.
//!
//! Runs a single scan against the DexScreener API and prints the ranked
//! runners as JSON.

use anyhow::Result;
use clap::Parser;
use paid_runners::screener::{
    apply_blacklist, ClientConfig, DexScreenerClient, ScanOptionsBuilder, ScanResult,
};
use paid_runners::RunnerScanner;
use std::sync::Arc;
use tracing::{error, info, Level};

#[derive(Parser)]
#[command(name = "paid-runners")]
#[command(about = "Rank promoted Solana tokens showing short-term momentum", long_about = None)]
struct Args {
    /// Modes to evaluate (ultra_early, early_strict, early, strict, degen)
    #[arg(short, long, value_delimiter = ',', default_value = "early_strict,degen")]
    modes: Vec<String>,

    /// Maximum number of runners to return
    #[arg(long, default_value = "20")]
    top_n: usize,

    /// Maximum number of candidates to evaluate
    #[arg(long, default_value = "250")]
    candidates_max: usize,

    /// Loosen thresholds and weight 5-minute momentum more
    #[arg(long)]
    pump: bool,

    /// Rank by score instead of spike score
    #[arg(long)]
    sort_by_score: bool,

    /// Include sponsored ads as a promotion source
    #[arg(long)]
    ads: bool,

    #[arg(long)]
    no_boosts: bool,

    #[arg(long)]
    no_cto: bool,

    #[arg(long)]
    no_profiles: bool,

    /// Query paid orders for the finalists
    #[arg(long)]
    orders: bool,

    #[arg(long)]
    no_anti_dead: bool,

    #[arg(long)]
    no_trending: bool,

    /// Keep one row per mode instead of one per token
    #[arg(long)]
    all_modes: bool,

    #[arg(long, default_value = "15000")]
    min_liquidity: f64,

    #[arg(long, default_value = "1000")]
    min_vol1h: f64,

    #[arg(long, default_value = "500")]
    min_vol5m: f64,

    #[arg(long, default_value = "2", allow_negative_numbers = true)]
    min_netbuy5m: i64,

    #[arg(long, default_value = "0.25")]
    spike_score_min: f64,

    /// Token addresses to drop from the results
    #[arg(long, value_delimiter = ',')]
    blacklist: Vec<String>,

    /// Print the debug record after the rows
    #[arg(long)]
    debug_json: bool,

    /// Debug logging and the per-token rejection trail
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    info!("Starting paid runners scan");

    let opts = ScanOptionsBuilder::new()
        .with_modes(&args.modes)
        .with_top_n(args.top_n)
        .with_candidates_max(args.candidates_max)
        .with_sources(!args.no_boosts, args.ads, !args.no_cto, !args.no_profiles)
        .with_orders(args.orders)
        .with_anti_dead(!args.no_anti_dead)
        .with_unique_per_token(!args.all_modes)
        .with_trending_filters(
            !args.no_trending,
            args.min_liquidity,
            args.min_vol1h,
            args.min_vol5m,
            args.min_netbuy5m,
        )
        .with_spike_score_min(args.spike_score_min)
        .with_pump_mode(args.pump)
        .with_sort_by_spike(!args.sort_by_score)
        .with_verbose_debug(args.verbose)
        .build();

    let client = DexScreenerClient::new(ClientConfig::default())?;
    let scanner = RunnerScanner::new(Arc::new(client));

    let mut report_progress = |done: usize, total: usize| {
        if done == total || done % 25 == 0 {
            info!("Evaluated {}/{} tokens", done, total);
        }
    };

    let ScanResult { rows, debug } = match scanner.scan(&opts, Some(&mut report_progress)).await {
        Ok(result) => result,
        Err(e) => {
            error!("Scan failed: {:#}", e);
            println!("[]");
            return Ok(());
        }
    };

    if debug.is_no_candidates() {
        info!("No promoted candidates; enable more sources or retry later");
    }

    let (rows, removed) = apply_blacklist(rows, &args.blacklist);
    if removed > 0 {
        info!("Blacklist removed {} rows", removed);
    }

    for (rank, row) in rows.iter().enumerate() {
        info!(
            "#{} {} [{}] spike={:.3} score={:.3} liq=${:.0} vol1h=${:.0} netBuy5m={} m5={:.1}%",
            rank + 1,
            if row.symbol.is_empty() { row.token_address() } else { &row.symbol },
            row.mode,
            row.scores.spike_score,
            row.scores.score,
            row.metrics.liquidity_usd,
            row.metrics.vol_1h,
            row.metrics.net_buy_5m,
            row.metrics.m5_pct,
        );
    }

    println!("{}", serde_json::to_string_pretty(&rows)?);
    if args.debug_json {
        println!("{}", serde_json::to_string_pretty(&debug)?);
    }

    info!("Scan complete: {} runners", rows.len());
    Ok(())
}
