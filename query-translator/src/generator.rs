//! Text generation seam.

use ai_llm_service::{AiLlmError, LlmClient};
use futures::FutureExt;
use futures::future::BoxFuture;

/// Anything that turns a prompt into a completion.
pub trait TextGenerator: Send + Sync {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        system: Option<&'a str>,
    ) -> BoxFuture<'a, Result<String, AiLlmError>>;

    /// Model name, for logs.
    fn model(&self) -> &str;
}

impl TextGenerator for LlmClient {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        system: Option<&'a str>,
    ) -> BoxFuture<'a, Result<String, AiLlmError>> {
        LlmClient::generate(self, prompt, system).boxed()
    }

    fn model(&self) -> &str {
        &self.config().model
    }
}
