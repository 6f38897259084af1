//! Query orchestration: translate (text only) -> embed -> filtered search -> ranked results.

mod config;
mod errors;
mod query;
mod retriever;

pub use config::RetrieverConfig;
pub use errors::RetrieverError;
pub use query::{SearchQuery, SearchResult};
pub use retriever::Retriever;
