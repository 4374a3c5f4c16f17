//! Order feed service: binary entrypoint.
//! Boots the Axum HTTP server exposing the ingested orders.
//!
//! One-off ingestion from the command line lives in `src/bin/fetch_orders.rs`.

use anyhow::Context;
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use order_feed_ingest::api::{self, AppState};
use order_feed_ingest::metrics::Metrics;
use order_feed_ingest::{IngestConfig, OrderStore};

/// Compact local logs when ORDERS_DEV_LOG=1 (the platform installs its own
/// subscriber otherwise).
fn enable_dev_tracing() {
    let dev_flag = std::env::var("ORDERS_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");
    if !dev_flag {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("order_feed_ingest=info,ingest=info,warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    enable_dev_tracing();

    let config = IngestConfig::load_default()?;
    let store = match &config.store_path {
        Some(path) => OrderStore::load_from_file(path, config.on_duplicate)
            .with_context(|| format!("opening order store {}", path.display()))?,
        None => OrderStore::new(config.on_duplicate),
    };
    tracing::info!(
        orders = store.len(),
        feed = %config.feed_url,
        "order service starting"
    );

    let mut router = api::router(AppState::new(store, config));
    match Metrics::init() {
        Ok(m) => router = router.merge(m.router()),
        Err(e) => tracing::warn!(error = %e, "metrics recorder not installed; /metrics disabled"),
    }

    Ok(router.into())
}
