//! Multimodal image search backend.
//!
//! Ingest a folder of images into a vector index, then search it with free
//! text (rewritten by a language model first) or with an example image.
//!
//! ```no_run
//! use visual_search_backend::{AppConfig, AppState};
//!
//! # async fn run() -> Result<(), visual_search_backend::AppError> {
//! let state = AppState::init(AppConfig::from_env()?).await?;
//! let report = state.ingest("/data/images").await?;
//! println!("{report}");
//! for hit in state.search_by_text("show me a furry feline", 5, None).await? {
//!     println!("{} {} {:.3}", hit.rank, hit.path, hit.score);
//! }
//! state.shutdown().await?;
//! # Ok(())
//! # }
//! ```

mod app_state;
mod config;
mod errors;
pub mod telemetry;

pub use app_state::AppState;
pub use config::AppConfig;
pub use errors::AppError;

pub use image_ingest::{IngestFailure, IngestStage, IngestionReport};
pub use image_retriever::{SearchQuery, SearchResult};
pub use query_translator::{Translation, TranslationOutcome};
