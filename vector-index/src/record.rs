//! Core data models stored in and returned by the index.

use serde::{Deserialize, Serialize};

/// Metadata persisted alongside every image vector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub filename: String,
    /// Absolute path of the source image.
    pub path: String,
    /// Immediate parent folder name.
    pub category: String,
    /// blake3 hex digest of the file bytes at ingestion time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    /// Insertion sequence used to break score ties. Assigned by the index
    /// when `None`; callers replacing a record may carry the old value over.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexed_seq: Option<u64>,
}

/// Canonical record written to the index.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexRecord {
    /// Stable UUID string.
    pub id: String,
    pub vector: Vec<f32>,
    pub metadata: ImageMetadata,
}

/// A single search hit.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexHit {
    pub id: String,
    pub score: f32,
    pub metadata: ImageMetadata,
}

/// Restricts search to one category (exact match).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryFilter {
    pub category: String,
}

impl CategoryFilter {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
        }
    }

    pub fn matches(&self, meta: &ImageMetadata) -> bool {
        meta.category == self.category
    }
}
