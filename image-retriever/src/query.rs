use serde::Serialize;

/// What to search with. Built per request and dropped after it.
#[derive(Clone, Debug)]
pub enum SearchQuery {
    /// Free-form text; goes through the translator.
    Text(String),
    /// Text used verbatim, translator skipped.
    Translated(String),
    /// Encoded image bytes.
    Image(Vec<u8>),
}

/// One ranked hit.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchResult {
    pub id: String,
    pub filename: String,
    pub path: String,
    pub category: String,
    pub score: f32,
    /// 1-based position.
    pub rank: usize,
}
