//! Query rewriting for text-to-image search.
//!
//! [`QueryTranslator`] asks a small language model to strip conversational
//! framing ("show me...", "find images of...") so the remaining phrase matches
//! the visual vocabulary of the image embeddings. It never fails: timeouts,
//! provider errors and unusable model output all fall back to the raw query.

mod config;
mod errors;
mod generator;
mod prompt;
mod sanitize;
mod translator;

pub use config::TranslatorConfig;
pub use errors::{TranslationUnavailable, TranslatorError};
pub use generator::TextGenerator;
pub use sanitize::{is_faithful, sanitize};
pub use translator::{QueryTranslator, Translation, TranslationOutcome};
