// src/lib.rs
// Public library surface for the service binary, the fetch command and tests.

pub mod api;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::error::{FeedError, MappingError, PathError, StoreError};
pub use crate::ingest::builder::RecordBuilder;
pub use crate::ingest::config::IngestConfig;
pub use crate::ingest::convert::{to_datetime, to_datetime_or, to_decimal, LocalZone};
pub use crate::ingest::extract::{extract, FieldPath};
pub use crate::ingest::mapping::FieldMapping;
pub use crate::ingest::types::{FeedSource, OrderRecord};
pub use crate::ingest::{run_once, BatchPolicy, IngestReport};
pub use crate::store::{ConflictPolicy, OrderSink, OrderStore};
