//! Error types surfaced by the crate.
//!
//! Infrastructure failures (storage, delivery) are swallowed where they
//! happen; these types only show up at API boundaries such as parsing
//! configuration or reading back the persisted snapshot.
use thiserror::Error;

/// Returned when a severity name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown log level '{0}' (expected DEBUG, INFO, WARN or ERROR)")]
pub struct ParseLevelError(pub String);

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("storage failure: {0}")]
    Storage(#[from] anyhow::Error),

    #[error("malformed log snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("storage quota exceeded: {size} bytes written, {quota} allowed")]
    QuotaExceeded { size: usize, quota: usize },

    #[error(transparent)]
    Level(#[from] ParseLevelError),
}
