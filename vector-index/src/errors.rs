//! Unified error types for the crate.

use thiserror::Error;

use crate::config::VectorSpace;

/// Top-level error for vector index operations.
///
/// `Unavailable` and `SchemaMismatch` are fatal for the calling operation and
/// are never retried beyond the connection policy in [`crate::IndexConfig`].
#[derive(Debug, Error)]
pub enum IndexError {
    /// Store is unreachable or the client was closed.
    #[error("vector index unavailable: {0}")]
    Unavailable(String),

    /// Existing collection was created with a different vector space.
    #[error("schema mismatch for collection '{collection}': expected {expected}, found {found}")]
    SchemaMismatch {
        collection: String,
        expected: VectorSpace,
        found: String,
    },

    /// Operation needs a collection that has not been created yet.
    #[error("collection '{0}' does not exist; call ensure_collection first")]
    CollectionMissing(String),

    /// Mismatch in vector dimensionality.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Payload (de)serialization errors.
    #[error("payload error: {0}")]
    Payload(#[from] serde_json::Error),

    /// Other store-side failures (wrapped).
    #[error("backend error: {0}")]
    Backend(String),
}
