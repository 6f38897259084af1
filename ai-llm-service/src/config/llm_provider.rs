use crate::error_handler::{AiLlmError, ConfigError};

/// Represents the provider (backend) used for large language model (LLM) inference.
///
/// Adding more providers in the future can be done by extending this enum
/// together with a matching client under [`crate::services`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Local Ollama runtime for on-device inference.
    Ollama,
    /// OpenAI-compatible chat completions API.
    OpenAI,
}

impl LlmProvider {
    /// Parses the `LLM_KIND` value (case-insensitive).
    ///
    /// # Errors
    /// Returns [`ConfigError::UnsupportedProvider`] for unknown values.
    pub fn parse(kind: &str) -> Result<Self, AiLlmError> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(LlmProvider::Ollama),
            "openai" | "chatgpt" => Ok(LlmProvider::OpenAI),
            other => Err(ConfigError::UnsupportedProvider(other.to_string()).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_kinds() {
        assert_eq!(LlmProvider::parse("Ollama").unwrap(), LlmProvider::Ollama);
        assert_eq!(LlmProvider::parse(" openai ").unwrap(), LlmProvider::OpenAI);
        assert_eq!(LlmProvider::parse("chatgpt").unwrap(), LlmProvider::OpenAI);
    }

    #[test]
    fn rejects_unknown_kind() {
        let err = LlmProvider::parse("anthropic").unwrap_err();
        assert!(err.to_string().contains("unsupported provider"));
    }
}
