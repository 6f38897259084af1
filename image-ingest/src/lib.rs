//! Folder ingestion: discovery, embedding and idempotent upserts.
//!
//! ```text
//! root/
//!   animals/cat.jpg      -> category "animals"
//!   animals/cats/a.png   -> category "cats" (immediate parent, any depth)
//!   loose.png            -> category INGEST_ROOT_CATEGORY ("uncategorized")
//! ```
//!
//! Record ids are UUIDv5 of the canonical absolute path, so running the same
//! folder twice replaces records instead of duplicating them.

mod config;
mod discovery;
mod errors;
mod ingest;
mod report;

pub use config::IngestConfig;
pub use discovery::{IMAGE_EXTENSIONS, ImageFile, discover_images, is_image_path};
pub use errors::IngestError;
pub use ingest::ImageIngestor;
pub use report::{IngestFailure, IngestStage, IngestionReport};
