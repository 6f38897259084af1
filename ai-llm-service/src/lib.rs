//! Shared LLM text-generation client.
//!
//! - [`LlmClient`] dispatches a single non-streaming generation call to the
//!   configured provider (Ollama or OpenAI).
//! - [`LlmModelConfig`] describes one model profile; build it by hand or via
//!   [`config::default_config`] from environment variables.
//! - All failures are reported through [`AiLlmError`].
//!
//! The client is cheap to clone and safe to share across tasks.

pub mod config;
pub mod error_handler;
pub mod llm_client;
pub mod services;

pub use config::llm_model_config::LlmModelConfig;
pub use config::llm_provider::LlmProvider;
pub use error_handler::AiLlmError;
pub use llm_client::LlmClient;
