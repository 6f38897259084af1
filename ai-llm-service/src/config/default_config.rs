//! Default LLM configs loaded from environment variables.
//!
//! Only one role is needed by the search backend: the **translator** model
//! that rewrites free-form queries into short visual phrases. It should be a
//! small, fast model; output is short and temperature is pinned to zero.
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_KIND` = provider kind (`ollama` default, `openai`)
//! - `LLM_MAX_TOKENS` = optional max tokens (u32, default 48)
//! - `TRANSLATOR_MODEL` = model name (mandatory)
//!
//! Ollama-specific:
//! - `OLLAMA_URL` or `OLLAMA_PORT` = endpoint (mandatory for Ollama)
//!
//! OpenAI-specific:
//! - `OPENAI_API_KEY` (mandatory for OpenAI)
//! - `OPENAI_URL` (default `https://api.openai.com`)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, ConfigError, env_opt_u32, must_env},
};

/// Default generation budget for a rewritten query.
const DEFAULT_TRANSLATOR_MAX_TOKENS: u32 = 48;

/// Resolves the Ollama endpoint strictly from environment.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
///
/// # Errors
///
/// - [`ConfigError::MissingVar`] if both are missing
/// - [`ConfigError::InvalidNumber`] if `OLLAMA_PORT` is invalid
fn ollama_endpoint() -> Result<String, AiLlmError> {
    if let Ok(url) = std::env::var("OLLAMA_URL") {
        if !url.trim().is_empty() {
            return Ok(url);
        }
    }
    if let Ok(port) = std::env::var("OLLAMA_PORT") {
        if !port.trim().is_empty() {
            let _ = port
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidNumber {
                    var: "OLLAMA_PORT",
                    reason: "expected u16 (1..=65535)",
                })?;
            return Ok(format!("http://localhost:{port}"));
        }
    }
    Err(AiLlmError::Config(ConfigError::MissingVar(
        "OLLAMA_URL or OLLAMA_PORT",
    )))
}

/// Constructs the config for the **translator** model.
///
/// # Env
/// - `LLM_KIND` (optional, default `ollama`)
/// - `TRANSLATOR_MODEL` (required)
/// - `LLM_MAX_TOKENS` (optional)
///
/// # Defaults
/// - `temperature = Some(0.0)` (rewrites must be reproducible)
/// - `timeout_secs = Some(30)`; the translator applies its own, tighter
///   per-attempt deadline on top.
pub fn config_translator() -> Result<LlmModelConfig, AiLlmError> {
    let provider = match std::env::var("LLM_KIND") {
        Ok(kind) if !kind.trim().is_empty() => LlmProvider::parse(&kind)?,
        _ => LlmProvider::Ollama,
    };
    let model = must_env("TRANSLATOR_MODEL")?;
    let max_tokens = env_opt_u32("LLM_MAX_TOKENS")?.or(Some(DEFAULT_TRANSLATOR_MAX_TOKENS));

    let (endpoint, api_key) = match provider {
        LlmProvider::Ollama => (ollama_endpoint()?, None),
        LlmProvider::OpenAI => {
            let key = must_env("OPENAI_API_KEY")?;
            let url = std::env::var("OPENAI_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "https://api.openai.com".to_string());
            (url, Some(key))
        }
    };

    let cfg = LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key,
        max_tokens,
        temperature: Some(0.0),
        top_p: None,
        timeout_secs: Some(30),
    };
    cfg.validate()?;
    Ok(cfg)
}
