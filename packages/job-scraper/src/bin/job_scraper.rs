//! Job scraper runner
//!
//! Loads the config, builds the enabled sources and the store, and runs the
//! pipeline once or on an interval until interrupted.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use job_scraper::{
    configured_sources, run_once, Aggregator, FirebaseStore, JobStore, MemoryStore, ScraperConfig,
};

#[derive(Parser)]
#[command(name = "job-scraper")]
#[command(about = "Aggregate job postings from LinkedIn and Indeed into date buckets")]
struct Cli {
    /// Path to the JSON config file
    #[arg(long, env = "SCRAPER_CONFIG", default_value = "config.json")]
    config: PathBuf,

    /// Run every N seconds instead of once
    #[arg(long, value_name = "SECS")]
    interval: Option<u64>,

    /// Keep results in memory and print bucket counts
    #[arg(long)]
    dry_run: bool,

    /// Drop partial results when interrupted
    #[arg(long)]
    discard_on_cancel: bool,
}

enum Target {
    Remote(FirebaseStore),
    Memory(MemoryStore),
}

impl Target {
    fn store(&self) -> &dyn JobStore {
        match self {
            Target::Remote(store) => store,
            Target::Memory(store) => store,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before clap reads SCRAPER_CONFIG
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,job_scraper=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let cli = Cli::parse();

    let config = ScraperConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;

    let sources = configured_sources(&config).context("Failed to configure sources")?;
    let mut aggregator =
        Aggregator::with_sources(sources).with_discard_on_cancel(cli.discard_on_cancel);

    let target = match (&config.database, cli.dry_run) {
        (Some(database), false) => {
            info!(url = %database.url, collection = %database.collection, "Using Firebase store");
            Target::Remote(
                FirebaseStore::from_config(database).context("Failed to configure store")?,
            )
        }
        (None, false) => {
            warn!("No database configured, results are kept in memory");
            Target::Memory(MemoryStore::new())
        }
        (_, true) => Target::Memory(MemoryStore::new()),
    };

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, finishing current step");
                cancel.cancel();
            }
        }
    });

    let request = config.search_request();
    info!(
        titles = config.search.job_title.len(),
        levels = config.search.job_level.len(),
        sources = aggregator.sources().len(),
        "Starting job scraper"
    );

    loop {
        let summary = run_once(&mut aggregator, target.store(), &request, &cancel)
            .await
            .context("Run aborted")?;

        if let Target::Memory(store) = &target {
            for key in store.bucket_keys() {
                println!("{}: {} postings", key, store.bucket(&key).len());
            }
        }

        if summary.cancelled {
            break;
        }

        let Some(interval) = cli.interval else {
            break;
        };

        info!(next_run_in_secs = interval, "Waiting for next run");
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(Duration::from_secs(interval)) => {}
        }
    }

    info!("Job scraper stopped");
    Ok(())
}
