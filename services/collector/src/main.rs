use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use collector::{
    default_tiers, load_tiers, CollectOptions, Collector, CollectorConfig, OutputLayout, RedditSource,
};

#[derive(Parser)]
#[command(name = "collector", about = "Collect image posts and top roast comments", version)]
struct Cli {
    /// Output directory (overrides COLLECTOR_OUTPUT_DIR)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Delete ledger, images, record store and metadata before collecting
    #[arg(long)]
    reset: bool,

    /// Stop after this many new records (overrides COLLECTOR_TARGET)
    #[arg(long)]
    target: Option<usize>,

    /// Delay between submissions in milliseconds (overrides COLLECTOR_DELAY_MS)
    #[arg(long)]
    delay_ms: Option<u64>,

    /// JSON tier list replacing the built-in tiers
    #[arg(long)]
    tiers: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut cfg = CollectorConfig::from_env()?;
    if let Some(dir) = cli.output_dir {
        cfg.output_dir = dir;
    }
    if let Some(t) = cli.target {
        cfg.target_total = t;
    }
    if let Some(ms) = cli.delay_ms {
        cfg.request_delay = Duration::from_millis(ms);
    }

    let tiers = match &cli.tiers {
        Some(path) => load_tiers(path).with_context(|| format!("Failed to load tiers {}", path.display()))?,
        None => default_tiers(),
    };

    let layout = OutputLayout::new(&cfg.output_dir);
    if cli.reset {
        layout.reset().context("Failed to reset collection")?;
    }

    let source = RedditSource::new(&cfg).context("Failed to build Reddit client")?;
    let opts = CollectOptions {
        target_total: cfg.target_total,
        request_delay: cfg.request_delay,
        source_label: format!("r/{}", cfg.subreddit),
        ..Default::default()
    };

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing current item");
            on_signal.cancel();
        }
    });

    let mut collector = Collector::open(source, layout, opts, cancel)?;
    info!(tiers = tiers.len(), target = cfg.target_total, "collection starting");
    let summary = collector.run(&tiers).await?;

    if summary.interrupted {
        warn!(collected = summary.collected, "interrupted; progress saved, run again to resume");
    } else {
        info!(
            collected = summary.collected,
            skipped = summary.skipped,
            store_total = summary.store_total,
            "collection complete"
        );
    }
    Ok(())
}
