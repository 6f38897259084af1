//! Provider-agnostic generation client.
//!
//! Construct once at startup, wrap in `Arc` (or clone; the inner HTTP client
//! is shared) and pass to dependents.
//!
//! # Example
//! ```no_run
//! use ai_llm_service::{LlmClient, LlmModelConfig, LlmProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ai_llm_service::AiLlmError> {
//!     let cfg = LlmModelConfig {
//!         provider: LlmProvider::Ollama,
//!         model: "qwen3:8b".into(),
//!         endpoint: "http://localhost:11434".into(),
//!         api_key: None,
//!         max_tokens: Some(48),
//!         temperature: Some(0.0),
//!         top_p: None,
//!         timeout_secs: Some(30),
//!     };
//!     let llm = LlmClient::new(cfg)?;
//!     let txt = llm.generate("find images of a red car", None).await?;
//!     println!("{txt}");
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tracing::debug;

use crate::config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};
use crate::error_handler::AiLlmError;
use crate::services::{ollama_service::OllamaService, open_ai_service::OpenAiService};

#[derive(Debug, Clone)]
enum Backend {
    Ollama(Arc<OllamaService>),
    OpenAI(Arc<OpenAiService>),
}

/// Generation client bound to one model profile.
#[derive(Debug, Clone)]
pub struct LlmClient {
    cfg: LlmModelConfig,
    backend: Backend,
}

impl LlmClient {
    /// Validates `cfg` and builds the provider client.
    ///
    /// # Errors
    /// Returns [`AiLlmError::Config`] for invalid configs and
    /// [`AiLlmError::HttpTransport`] if the HTTP client cannot be built.
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        cfg.validate()?;
        let backend = match cfg.provider {
            LlmProvider::Ollama => Backend::Ollama(Arc::new(OllamaService::new(cfg.clone())?)),
            LlmProvider::OpenAI => Backend::OpenAI(Arc::new(OpenAiService::new(cfg.clone())?)),
        };
        debug!(provider = ?cfg.provider, model = %cfg.model, "LlmClient ready");
        Ok(Self { cfg, backend })
    }

    /// Generates a completion for `prompt`, with an optional system instruction.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if generation fails.
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, AiLlmError> {
        match &self.backend {
            Backend::Ollama(cli) => cli.generate(prompt, system).await,
            Backend::OpenAI(cli) => cli.generate(prompt, system).await,
        }
    }

    /// Returns the profile this client was built from.
    pub fn config(&self) -> &LlmModelConfig {
        &self.cfg
    }
}
