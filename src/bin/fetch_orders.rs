//! Fetch the order feed once and store every order it contains.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use order_feed_ingest::ingest::providers::{FixtureFeed, HttpFeed};
use order_feed_ingest::{run_once, BatchPolicy, ConflictPolicy, FeedSource, IngestConfig, OrderStore};

/// Fetch orders from the aggregator XML feed and save them to the store
#[derive(Parser)]
#[command(name = "fetch-orders")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Feed URL (defaults to the configured feed_url)
    url: Option<String>,

    /// Read the feed from a local file instead of HTTP
    #[arg(long, conflicts_with = "url")]
    file: Option<PathBuf>,

    /// Path to an ingest TOML config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// What to do after a failed order
    #[arg(long, value_parser = parse_batch_policy)]
    policy: Option<BatchPolicy>,

    /// What to do with an order_id that is already stored
    #[arg(long, value_parser = parse_conflict_policy)]
    on_duplicate: Option<ConflictPolicy>,

    /// JSON snapshot the store is loaded from and written back to
    #[arg(long)]
    store: Option<PathBuf>,
}

fn parse_batch_policy(s: &str) -> Result<BatchPolicy, String> {
    s.parse()
}

fn parse_conflict_policy(s: &str) -> Result<ConflictPolicy, String> {
    s.parse()
}

fn load_config(cli: &Cli) -> anyhow::Result<IngestConfig> {
    let mut cfg = match &cli.config {
        Some(p) => {
            let mut c = IngestConfig::load_from(p)?;
            c.apply_env()?;
            c
        }
        None => IngestConfig::load_default()?,
    };
    if let Some(url) = &cli.url {
        cfg.feed_url = url.clone();
    }
    if let Some(p) = cli.policy {
        cfg.batch_policy = p;
    }
    if let Some(p) = cli.on_duplicate {
        cfg.on_duplicate = p;
    }
    if let Some(p) = &cli.store {
        cfg.store_path = Some(p.clone());
    }
    Ok(cfg)
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let cfg = load_config(&cli)?;
    let builder = cfg.record_builder()?;

    let store = match &cfg.store_path {
        Some(p) => OrderStore::load_from_file(p, cfg.on_duplicate)
            .with_context(|| format!("opening order store {}", p.display()))?,
        None => OrderStore::new(cfg.on_duplicate),
    };

    let source: Box<dyn FeedSource> = match &cli.file {
        Some(path) => Box::new(
            FixtureFeed::from_path(path)
                .with_context(|| format!("reading feed file {}", path.display()))?,
        ),
        None => Box::new(HttpFeed::with_timeout(cfg.feed_url.clone(), cfg.http_timeout())?),
    };

    let report = run_once(source.as_ref(), &builder, &store, cfg.batch_policy).await?;
    store.persist().context("writing order store snapshot")?;

    for f in &report.failures {
        tracing::warn!(index = f.index, order_id = %f.order_id, error = %f.error, "order not stored");
    }
    println!(
        "{}: {} orders seen, {} created, {} replaced, {} failed{}",
        report.source,
        report.orders_seen,
        report.created,
        report.replaced,
        report.failures.len(),
        if report.aborted { " (aborted)" } else { "" }
    );
    Ok(report.is_clean())
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("order_feed_ingest=info,ingest=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_target(false))
        .init();

    match run(Cli::parse()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            tracing::error!(error = ?e, "fetch-orders failed");
            ExitCode::FAILURE
        }
    }
}
