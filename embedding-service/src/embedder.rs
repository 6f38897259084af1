//! Embedding abstraction.

use futures::future::BoxFuture;

use crate::errors::EmbeddingError;

/// Provider interface for multimodal embedding generation.
///
/// Implementations must return L2-normalized vectors of length [`Embedder::dim`]
/// and must be deterministic for identical input. Implement this trait to plug
/// in another backend, or a fake in tests.
pub trait Embedder: Send + Sync {
    /// Embeds a text query.
    fn embed_text<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, EmbeddingError>>;

    /// Embeds encoded image bytes (JPEG, PNG, ...).
    ///
    /// Undecodable bytes yield [`EmbeddingError::Decode`].
    fn embed_image<'a>(
        &'a self,
        bytes: &'a [u8],
    ) -> BoxFuture<'a, Result<Vec<f32>, EmbeddingError>>;

    /// Output dimensionality.
    fn dim(&self) -> usize;
}
