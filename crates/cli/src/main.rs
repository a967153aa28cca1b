//! assetfetch entry point.
//!
//! Fetches each URL through the cache-backed asset fetcher and prints one
//! JSON line per result on stdout, followed by a cache summary.
//! Logging goes to stderr so stdout stays machine-readable.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use assetfetch_client::AssetFetcher;
use assetfetch_core::{AppConfig, AssetCache};
use clap::Parser;
use tokio::task::JoinSet;
use tracing_subscriber::EnvFilter;

mod report;

use report::{FetchReport, StatsReport};

/// Fetch images through the resilient asset cache.
#[derive(Debug, Parser)]
#[command(name = "assetfetch", version, about)]
struct Args {
    /// TOML configuration file (takes precedence over ASSETFETCH_CONFIG_FILE).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fetch the URL list this many times; later rounds are served from the cache.
    #[arg(long, default_value_t = 1)]
    repeat: usize,

    /// Asset URLs to fetch.
    #[arg(required = true)]
    urls: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => AppConfig::load_from(Some(path.as_path())),
        None => AppConfig::load(),
    }
    .context("failed to load configuration")?;

    let cache = Arc::new(AssetCache::new(config.cache_capacity, config.cache_max_bytes));
    let fetcher = Arc::new(AssetFetcher::new(&config, Arc::clone(&cache)).context("failed to build asset fetcher")?);

    tracing::info!(urls = args.urls.len(), repeat = args.repeat, "starting assetfetch");

    for round in 0..args.repeat.max(1) {
        let mut tasks = JoinSet::new();
        for (index, url) in args.urls.iter().cloned().enumerate() {
            let fetcher = Arc::clone(&fetcher);
            tasks.spawn(async move {
                let start = Instant::now();
                let outcome = fetcher.fetch_outcome(&url).await;
                (index, FetchReport::new(round, url, &outcome, start.elapsed()))
            });
        }

        let mut reports = Vec::with_capacity(args.urls.len());
        while let Some(joined) = tasks.join_next().await {
            reports.push(joined.context("fetch task panicked")?);
        }
        reports.sort_by_key(|(index, _)| *index);

        for (_, report) in reports {
            println!("{}", serde_json::to_string(&report)?);
        }
    }

    let stats = StatsReport { cache: cache.stats().await };
    println!("{}", serde_json::to_string(&stats)?);

    Ok(())
}
