//! Error types shared by the ingest engine and the order store.

use thiserror::Error;

/// Run-level failures: nothing is built when one of these occurs.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Transport failure talking to the feed endpoint.
    #[error("feed request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-2xx status.
    #[error("feed {url} answered with status {status}")]
    Status { url: String, status: u16 },

    /// The document declares a character encoding we cannot decode.
    #[error("unsupported feed encoding: {0}")]
    Decode(String),

    /// The document is not well-formed XML.
    #[error("malformed feed document at byte {position}: {message}")]
    Parse { position: u64, message: String },

    /// The document contains no root element.
    #[error("feed document has no root element")]
    EmptyDocument,
}

/// Errors raised by the storage collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique column already holds this value.
    #[error("duplicate {field} '{value}'")]
    Duplicate { field: &'static str, value: String },

    /// Without its natural key a record cannot be stored.
    #[error("order has no order_id")]
    MissingKey,

    #[error("order '{0}' not found")]
    NotFound(String),

    #[error("store snapshot I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("store snapshot format: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Invalid path expression in a mapping override.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("empty path expression")]
    Empty,

    #[error("invalid path expression '{0}'")]
    Invalid(String),
}

/// Invalid override applied to the field-mapping table.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("field '{0}' is not a date/time field")]
    NotTemporal(String),

    #[error("field '{field}': {source}")]
    Path {
        field: String,
        #[source]
        source: PathError,
    },
}
