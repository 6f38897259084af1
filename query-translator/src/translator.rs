//! LLM-backed query rewriting with a fixed fallback policy.

use std::sync::Arc;

use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::config::TranslatorConfig;
use crate::errors::TranslationUnavailable;
use crate::generator::TextGenerator;
use crate::prompt::{SYSTEM_PROMPT, build_prompt};
use crate::sanitize::{foreign_words, is_faithful, sanitize};

/// How the returned text was produced.
#[derive(Debug, Clone, PartialEq)]
pub enum TranslationOutcome {
    /// The model rewrote the query.
    Translated,
    /// Blank query, passed through without a model call.
    Unchanged,
    /// The raw query is used because translation was not possible.
    Fallback(TranslationUnavailable),
}

/// Result of [`QueryTranslator::translate`].
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub text: String,
    pub outcome: TranslationOutcome,
}

impl Translation {
    pub fn is_fallback(&self) -> bool {
        matches!(self.outcome, TranslationOutcome::Fallback(_))
    }
}

/// Rewrites free-form queries into short visual phrases.
///
/// Cheap to clone; the generator is shared.
#[derive(Clone)]
pub struct QueryTranslator {
    generator: Option<Arc<dyn TextGenerator>>,
    cfg: TranslatorConfig,
}

impl QueryTranslator {
    pub fn new(generator: Arc<dyn TextGenerator>, cfg: TranslatorConfig) -> Self {
        Self {
            generator: Some(generator),
            cfg,
        }
    }

    /// A translator that always returns the raw query.
    pub fn disabled() -> Self {
        Self {
            generator: None,
            cfg: TranslatorConfig {
                enabled: false,
                ..Default::default()
            },
        }
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.cfg
    }

    /// Rewrites `raw_query`; never fails.
    ///
    /// A blank query is returned as-is. Otherwise the model gets
    /// `max_attempts` tries, each bounded by `timeout`; the first sanitized,
    /// non-empty answer whose words all occur in the query wins. When none
    /// qualifies, the trimmed raw query is returned with a
    /// [`TranslationOutcome::Fallback`] carrying the last failure.
    #[instrument(skip_all, fields(query_len = raw_query.len()))]
    pub async fn translate(&self, raw_query: &str) -> Translation {
        let query = raw_query.trim();
        if query.is_empty() {
            return Translation {
                text: raw_query.to_string(),
                outcome: TranslationOutcome::Unchanged,
            };
        }

        let generator = match &self.generator {
            Some(g) if self.cfg.enabled => g,
            _ => return fallback(query, TranslationUnavailable::Disabled),
        };

        let prompt = build_prompt(query);
        let mut last = TranslationUnavailable::Malformed("no attempt made".into());

        for attempt in 1..=self.cfg.max_attempts {
            let call = generator.generate(&prompt, Some(SYSTEM_PROMPT));
            let reason = match timeout(self.cfg.timeout, call).await {
                Err(_) => TranslationUnavailable::Timeout(self.cfg.timeout),
                Ok(Err(e)) => TranslationUnavailable::Provider(e.to_string()),
                Ok(Ok(output)) => match self.accept(query, &output) {
                    Ok(text) => {
                        info!(model = generator.model(), attempt, translated = %text, "query translated");
                        return Translation {
                            text,
                            outcome: TranslationOutcome::Translated,
                        };
                    }
                    Err(reason) => reason,
                },
            };
            debug!(attempt, max_attempts = self.cfg.max_attempts, %reason, "translation attempt failed");
            last = reason;
        }

        fallback(query, last)
    }

    /// Convenience wrapper returning only the text to embed.
    pub async fn translate_text(&self, raw_query: &str) -> String {
        self.translate(raw_query).await.text
    }

    fn accept(&self, query: &str, output: &str) -> Result<String, TranslationUnavailable> {
        let text = sanitize(output, self.cfg.max_chars);
        if text.is_empty() {
            return Err(TranslationUnavailable::Malformed("empty after cleanup".into()));
        }
        if !is_faithful(query, &text) {
            let extra = foreign_words(query, &text).join(", ");
            return Err(TranslationUnavailable::Unfaithful(extra));
        }
        Ok(text)
    }
}

fn fallback(query: &str, reason: TranslationUnavailable) -> Translation {
    warn!(%reason, "query translation unavailable, using raw query");
    Translation {
        text: query.to_string(),
        outcome: TranslationOutcome::Fallback(reason),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use ai_llm_service::AiLlmError;
    use futures::FutureExt;
    use futures::future::BoxFuture;

    use super::*;

    enum Step {
        Reply(&'static str),
        Fail,
        Hang,
    }

    struct Scripted {
        steps: Mutex<VecDeque<Step>>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(steps: Vec<Step>) -> Arc<Self> {
            Arc::new(Self {
                steps: Mutex::new(steps.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl TextGenerator for Scripted {
        fn generate<'a>(
            &'a self,
            _prompt: &'a str,
            _system: Option<&'a str>,
        ) -> BoxFuture<'a, Result<String, AiLlmError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let step = self.steps.lock().unwrap().pop_front().unwrap_or(Step::Fail);
            async move {
                match step {
                    Step::Reply(s) => Ok(s.to_string()),
                    Step::Fail => Err(AiLlmError::Timeout(Duration::from_secs(1))),
                    Step::Hang => {
                        tokio::time::sleep(Duration::from_secs(3600)).await;
                        Ok("never".to_string())
                    }
                }
            }
            .boxed()
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    fn translator(generator: Arc<Scripted>) -> QueryTranslator {
        QueryTranslator::new(
            generator,
            TranslatorConfig {
                timeout: Duration::from_millis(50),
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn successful_rewrite_is_used() {
        let g = Scripted::new(vec![Step::Reply("Query: a furry feline")]);
        let t = translator(g.clone());
        let out = t.translate("Show me a furry feline please").await;
        assert_eq!(out.text, "a furry feline");
        assert_eq!(out.outcome, TranslationOutcome::Translated);
        assert_eq!(g.calls(), 1);
    }

    #[tokio::test]
    async fn retries_once_then_falls_back() {
        let g = Scripted::new(vec![Step::Fail, Step::Fail, Step::Reply("unused")]);
        let t = translator(g.clone());
        let out = t.translate("  a red car ").await;
        assert_eq!(out.text, "a red car");
        assert!(out.is_fallback());
        assert_eq!(g.calls(), 2);
    }

    #[tokio::test]
    async fn second_attempt_can_succeed() {
        let g = Scripted::new(vec![Step::Reply(""), Step::Reply("red car")]);
        let t = translator(g.clone());
        let out = t.translate("find images of a red car").await;
        assert_eq!(out.text, "red car");
        assert_eq!(g.calls(), 2);
    }

    #[tokio::test]
    async fn timeout_falls_back() {
        let g = Scripted::new(vec![Step::Hang, Step::Hang]);
        let t = translator(g.clone());
        let out = t.translate("a rose").await;
        assert_eq!(out.text, "a rose");
        assert!(matches!(
            out.outcome,
            TranslationOutcome::Fallback(TranslationUnavailable::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn invented_terms_are_rejected() {
        let g = Scripted::new(vec![Step::Reply("sports car"), Step::Reply("red sports car")]);
        let t = translator(g);
        let out = t.translate("show me a car").await;
        assert_eq!(out.text, "show me a car");
        assert!(matches!(
            out.outcome,
            TranslationOutcome::Fallback(TranslationUnavailable::Unfaithful(_))
        ));
    }

    #[tokio::test]
    async fn rewrite_dropping_a_negation_is_rejected() {
        let g = Scripted::new(vec![Step::Reply("roses"), Step::Reply("garden roses")]);
        let t = translator(g.clone());
        let out = t.translate("show me a garden without any roses").await;
        assert_eq!(out.text, "show me a garden without any roses");
        assert!(matches!(
            out.outcome,
            TranslationOutcome::Fallback(TranslationUnavailable::Unfaithful(ref w)) if w.contains("-without")
        ));
        assert_eq!(g.calls(), 2);
    }

    #[tokio::test]
    async fn rewrite_keeping_the_negation_is_used() {
        let g = Scripted::new(vec![Step::Reply("garden without roses")]);
        let out = translator(g).translate("show me a garden without any roses").await;
        assert_eq!(out.text, "garden without roses");
        assert_eq!(out.outcome, TranslationOutcome::Translated);
    }

    #[tokio::test]
    async fn blank_query_skips_the_model() {
        let g = Scripted::new(vec![Step::Reply("anything")]);
        let t = translator(g.clone());
        let out = t.translate("   ").await;
        assert_eq!(out.text, "   ");
        assert_eq!(out.outcome, TranslationOutcome::Unchanged);
        assert_eq!(g.calls(), 0);
    }

    #[tokio::test]
    async fn disabled_translator_passes_query_through() {
        let t = QueryTranslator::disabled();
        let out = t.translate("pictures of dogs").await;
        assert_eq!(out.text, "pictures of dogs");
        assert_eq!(
            out.outcome,
            TranslationOutcome::Fallback(TranslationUnavailable::Disabled)
        );
        assert_eq!(t.translate_text("dogs").await, "dogs");
    }
}
