use std::path::PathBuf;

use thiserror::Error;
use vector_index::IndexError;

/// Failures that abort a whole ingestion run. Per-file problems are reported
/// through [`crate::IngestionReport::failures`] instead.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("invalid ingestion root {path:?}: {reason}")]
    InvalidRoot { path: PathBuf, reason: String },

    #[error("vector index error: {0}")]
    Index(#[from] IndexError),

    #[error("config error: {0}")]
    Config(String),
}
