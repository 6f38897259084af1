use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{AiLlmError, ConfigError, validate_http_endpoint, validate_range_f32};

/// Configuration for an LLM model invocation.
///
/// # Fields
///
/// - `provider`: Which LLM provider/backend to use.
/// - `model`: The model identifier (e.g., `"qwen3:8b"`, `"gpt-4o-mini"`).
/// - `endpoint`: The inference endpoint (local server or remote API URL).
/// - `api_key`: Optional API key for providers that require authentication.
/// - `max_tokens`: Maximum number of tokens to generate (if supported).
/// - `temperature`: Controls randomness (0.0 = deterministic).
/// - `top_p`: Nucleus sampling cutoff.
/// - `timeout_secs`: Optional HTTP request timeout in seconds.
///
/// # Examples
///
/// ```
/// use ai_llm_service::{LlmModelConfig, LlmProvider};
///
/// let cfg = LlmModelConfig {
///     provider: LlmProvider::Ollama,
///     model: "qwen3:8b".to_string(),
///     endpoint: "http://localhost:11434".to_string(),
///     api_key: None,
///     max_tokens: Some(64),
///     temperature: Some(0.0),
///     top_p: None,
///     timeout_secs: Some(10),
/// };
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The LLM provider/backend.
    pub provider: LlmProvider,

    /// Model identifier string.
    pub model: String,

    /// Inference endpoint (remote API URL or local server).
    pub endpoint: String,

    /// Optional API key for authentication (e.g., OpenAI).
    pub api_key: Option<String>,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Optional request timeout (in seconds).
    pub timeout_secs: Option<u64>,
}

impl LlmModelConfig {
    /// Validates the config before any client is built.
    ///
    /// # Errors
    /// Returns [`AiLlmError::Config`] for an empty model, a non-HTTP endpoint,
    /// a missing OpenAI key, or out-of-range sampling parameters.
    pub fn validate(&self) -> Result<(), AiLlmError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel.into());
        }
        validate_http_endpoint("endpoint", self.endpoint.trim())?;
        if self.provider == LlmProvider::OpenAI && self.api_key.is_none() {
            return Err(ConfigError::MissingVar("OPENAI_API_KEY").into());
        }
        if let Some(t) = self.temperature {
            validate_range_f32("temperature", t, 0.0, 2.0)?;
        }
        if let Some(p) = self.top_p {
            validate_range_f32("top_p", p, 0.0, 1.0)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: "qwen3:8b".into(),
            endpoint: "http://localhost:11434".into(),
            api_key: None,
            max_tokens: None,
            temperature: Some(0.0),
            top_p: None,
            timeout_secs: Some(5),
        }
    }

    #[test]
    fn accepts_ollama_without_key() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn openai_requires_key() {
        let cfg = LlmModelConfig {
            provider: LlmProvider::OpenAI,
            ..base()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_bad_endpoint_and_temperature() {
        let cfg = LlmModelConfig {
            endpoint: "localhost:11434".into(),
            ..base()
        };
        assert!(cfg.validate().is_err());

        let cfg = LlmModelConfig {
            temperature: Some(3.5),
            ..base()
        };
        assert!(cfg.validate().is_err());
    }
}
