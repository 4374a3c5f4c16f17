// src/ingest/mod.rs
pub mod builder;
pub mod config;
pub mod convert;
pub mod decode;
pub mod extract;
pub mod mapping;
pub mod providers;
pub mod types;
pub mod xml;

use std::str::FromStr;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::error::FeedError;
use crate::ingest::builder::RecordBuilder;
use crate::ingest::types::FeedSource;
use crate::store::{OrderSink, SaveOutcome};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_orders_seen_total", "Order nodes found in fetched feeds.");
        describe_counter!("ingest_orders_saved_total", "Orders built and stored.");
        describe_counter!(
            "ingest_orders_failed_total",
            "Orders the sink refused to store."
        );
        describe_counter!(
            "ingest_feed_errors_total",
            "Feed retrieval/decoding/parse errors."
        );
        describe_histogram!("ingest_fetch_ms", "Feed retrieval time in milliseconds.");
        describe_histogram!("ingest_parse_ms", "Feed decode + parse time in milliseconds.");
        describe_gauge!("ingest_last_run_ts", "Unix ts when ingestion last ran.");
    });
}

/// What the driving loop does after the sink refuses a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchPolicy {
    /// Stop at the first failing record; earlier records stay stored.
    #[default]
    Abort,
    /// Report the failure and continue with the next record.
    Skip,
}

impl FromStr for BatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(BatchPolicy::Abort),
            "skip" | "continue" => Ok(BatchPolicy::Skip),
            other => Err(format!("unknown batch policy '{other}' (abort|skip)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordFailure {
    /// Position of the order node in the document (0-based).
    pub index: usize,
    /// As built; empty when the node had no order id.
    pub order_id: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub source: String,
    pub orders_seen: usize,
    pub created: usize,
    pub replaced: usize,
    pub failures: Vec<RecordFailure>,
    /// Set when `BatchPolicy::Abort` stopped the run early.
    pub aborted: bool,
}

impl IngestReport {
    pub fn saved(&self) -> usize {
        self.created + self.replaced
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && !self.aborted
    }
}

/// Decode and parse raw feed bytes, then build and store every order.
///
/// Decode/parse failures abort before any record is built. Building itself
/// never fails, so per-order failures all come from the sink.
pub async fn ingest_document(
    source_name: &str,
    bytes: &[u8],
    builder: &RecordBuilder,
    sink: &dyn OrderSink,
    policy: BatchPolicy,
) -> Result<IngestReport, FeedError> {
    ensure_metrics_described();

    let t0 = std::time::Instant::now();
    let parsed = decode::decode_document(bytes).and_then(|text| xml::parse_document(&text));
    let root = match parsed {
        Ok(root) => root,
        Err(e) => {
            tracing::error!(target: "ingest", source = source_name, error = %e, "feed rejected");
            counter!("ingest_feed_errors_total").increment(1);
            return Err(e);
        }
    };
    histogram!("ingest_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

    let orders = xml::find_orders(&root);
    counter!("ingest_orders_seen_total").increment(orders.len() as u64);

    let mut report = IngestReport {
        source: source_name.to_string(),
        orders_seen: orders.len(),
        ..IngestReport::default()
    };

    for (index, node) in orders.into_iter().enumerate() {
        let record = builder.build(node);
        let order_id = record.order_id.clone();

        match sink.save(record).await {
            Ok(saved) => {
                counter!("ingest_orders_saved_total").increment(1);
                match saved {
                    SaveOutcome::Created => report.created += 1,
                    SaveOutcome::Replaced => report.replaced += 1,
                }
                tracing::info!(target: "ingest", order_id = %order_id, outcome = ?saved, "order stored");
            }
            Err(e) => {
                let error = e.to_string();
                counter!("ingest_orders_failed_total").increment(1);
                tracing::warn!(target: "ingest", index, order_id = %order_id, %error, "order failed");
                report.failures.push(RecordFailure {
                    index,
                    order_id,
                    error,
                });
                if policy == BatchPolicy::Abort {
                    report.aborted = true;
                    tracing::error!(
                        target: "ingest",
                        remaining = report.orders_seen - index - 1,
                        "aborting batch after failed order"
                    );
                    break;
                }
            }
        }
    }

    let now = chrono::Utc::now().timestamp().max(0) as u64;
    gauge!("ingest_last_run_ts").set(now as f64);

    tracing::info!(
        target: "ingest",
        source = source_name,
        seen = report.orders_seen,
        created = report.created,
        replaced = report.replaced,
        failed = report.failures.len(),
        aborted = report.aborted,
        "ingest run finished"
    );
    Ok(report)
}

/// Run ingest once: retrieve the feed, then [`ingest_document`].
pub async fn run_once(
    source: &dyn FeedSource,
    builder: &RecordBuilder,
    sink: &dyn OrderSink,
    policy: BatchPolicy,
) -> Result<IngestReport, FeedError> {
    ensure_metrics_described();

    let bytes = match source.fetch().await {
        Ok(b) => b,
        Err(e) => {
            tracing::error!(target: "ingest", source = source.name(), error = %e, "feed retrieval failed");
            return Err(e);
        }
    };
    ingest_document(source.name(), &bytes, builder, sink, policy).await
}
