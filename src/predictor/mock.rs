//! Mock predictor for tests — returns preconfigured responses

use super::{LlmPredictor, PredictError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
struct Script {
    key: String,
    reply: Result<String, PredictError>,
    delay: Option<Duration>,
}

/// Deterministic predictor keyed on the context text inside the prompt.
///
/// A registered key matches when the prompt contains it. When several keys
/// match, the one whose last occurrence sits furthest into the prompt wins,
/// so a node's own context beats text that also appears in the template's
/// worked example.
pub struct MockPredictor {
    available: bool,
    scripts: Vec<Script>,
    fallback: Option<String>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockPredictor {
    /// Create a mock predictor that reports as available.
    pub fn available() -> Self {
        Self {
            available: true,
            scripts: Vec::new(),
            fallback: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock predictor that reports as unavailable.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::available()
        }
    }

    /// Respond with `response` to prompts carrying `context`.
    pub fn with_response(mut self, context: impl Into<String>, response: impl Into<String>) -> Self {
        self.scripts.push(Script {
            key: context.into(),
            reply: Ok(response.into()),
            delay: None,
        });
        self
    }

    /// Like `with_response`, but sleep first.
    pub fn with_delayed_response(
        mut self,
        context: impl Into<String>,
        response: impl Into<String>,
        delay: Duration,
    ) -> Self {
        self.scripts.push(Script {
            key: context.into(),
            reply: Ok(response.into()),
            delay: Some(delay),
        });
        self
    }

    /// Fail prompts carrying `context` with `error`.
    pub fn with_failure(mut self, context: impl Into<String>, error: PredictError) -> Self {
        self.scripts.push(Script {
            key: context.into(),
            reply: Err(error),
            delay: None,
        });
        self
    }

    /// Response for prompts no key matches.
    pub fn with_default(mut self, response: impl Into<String>) -> Self {
        self.fallback = Some(response.into());
        self
    }

    /// Number of `predict` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    fn find(&self, prompt: &str) -> Option<&Script> {
        self.scripts
            .iter()
            .filter_map(|s| prompt.rfind(s.key.as_str()).map(|pos| (pos, s)))
            .max_by_key(|(pos, s)| (*pos, s.key.len()))
            .map(|(_, s)| s)
    }
}

#[async_trait]
impl LlmPredictor for MockPredictor {
    async fn is_available(&self) -> bool {
        self.available
    }

    async fn predict(&self, prompt: &str) -> Result<String, PredictError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        if !self.available {
            return Err(PredictError::Unavailable(
                "mock predictor configured as unavailable".to_string(),
            ));
        }

        match self.find(prompt) {
            Some(script) => {
                if let Some(delay) = script.delay {
                    tokio::time::sleep(delay).await;
                }
                script.reply.clone()
            }
            None => self.fallback.clone().ok_or_else(|| {
                PredictError::InvocationFailed("no mock response for prompt".to_string())
            }),
        }
    }
}
