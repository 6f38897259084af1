//! Vector index client: collection lifecycle, idempotent upserts and filtered
//! similarity search over image records.
//!
//! Two backends implement [`VectorIndex`]:
//! - [`QdrantIndex`]: the durable store, reached over gRPC.
//! - [`MemoryIndex`]: an exact, in-process index for tests and embedded use.
//!
//! Both guarantee:
//! - upsert by id replaces, never duplicates;
//! - search returns at most `k` hits in descending similarity, ties broken by
//!   insertion order (first inserted wins);
//! - a category filter restricts hits to exact category equality.

mod config;
mod errors;
mod filters;
mod index;
mod memory;
mod payload;
mod qdrant_facade;
mod record;

pub use config::{DistanceKind, IndexBackend, IndexConfig, VectorSpace};
pub use errors::IndexError;
pub use index::VectorIndex;
pub use memory::MemoryIndex;
pub use qdrant_facade::QdrantIndex;
pub use record::{CategoryFilter, ImageMetadata, IndexHit, IndexRecord};

use std::sync::Arc;

use tracing::info;

/// Opens the backend selected by `cfg.backend`.
///
/// # Errors
/// Returns [`IndexError::Config`] for invalid configs and
/// [`IndexError::Unavailable`] if Qdrant stays unreachable after the
/// configured connection retries.
pub async fn open(cfg: IndexConfig) -> Result<Arc<dyn VectorIndex>, IndexError> {
    cfg.validate()?;
    info!(backend = ?cfg.backend, collection = %cfg.collection, "opening vector index");
    match cfg.backend {
        IndexBackend::Qdrant => Ok(Arc::new(QdrantIndex::connect(cfg).await?)),
        IndexBackend::Memory => Ok(Arc::new(MemoryIndex::new(cfg.collection))),
    }
}
