//! Embedding service: maps text and images into one fixed-dimension vector space.
//!
//! - [`Embedder`] is the seam the rest of the system depends on.
//! - [`ClipHttpEmbedder`] talks to a CLIP-style inference server.
//! - Every returned vector is dimension-checked and L2-normalized.
//! - Malformed image bytes fail with [`EmbeddingError::Decode`] before any
//!   network call is made.

mod clip_http;
mod config;
mod embedder;
mod errors;
pub mod preprocess;
pub mod vector_math;

pub use clip_http::ClipHttpEmbedder;
pub use config::EmbeddingConfig;
pub use embedder::Embedder;
pub use errors::EmbeddingError;
pub use vector_math::{cosine_similarity, l2_normalize};
