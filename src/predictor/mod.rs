//! Model-call collaborator
//!
//! The postprocessor only needs "prompt in, text out". Two implementations:
//! - `CommandPredictor`: pipes the prompt through an external program (production)
//! - `MockPredictor`: returns preconfigured responses (testing)

mod command;
mod mock;

pub use command::{CommandPredictor, DEFAULT_TIMEOUT};
pub use mock::MockPredictor;

use async_trait::async_trait;
use std::time::Duration;

/// Errors raised by a predictor. The postprocessor wraps these as the
/// upstream stage without interpreting them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PredictError {
    #[error("model not available: {0}")]
    Unavailable(String),
    #[error("model call timed out after {0:?}")]
    Timeout(Duration),
    #[error("model invocation failed: {0}")]
    InvocationFailed(String),
    #[error("model returned unusable output: {0}")]
    InvalidOutput(String),
}

/// Client trait for the language model.
///
/// Abstracts over transport (subprocess, HTTP, mock) so the postprocessor
/// doesn't depend on how the model is reached.
#[async_trait]
pub trait LlmPredictor: Send + Sync {
    /// Check if the model is reachable.
    async fn is_available(&self) -> bool;

    /// Send a fully rendered prompt and return the raw response text.
    async fn predict(&self, prompt: &str) -> Result<String, PredictError>;
}
