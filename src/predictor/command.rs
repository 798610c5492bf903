//! Subprocess predictor: pipes the prompt to an external model CLI
//!
//! The program receives the rendered prompt on stdin and must print the
//! model's response on stdout. A non-zero exit status or a timeout is an
//! upstream failure.

use super::{LlmPredictor, PredictError};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

/// Default per-call timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Predictor that runs `program args...` once per prompt.
#[derive(Debug, Clone)]
pub struct CommandPredictor {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandPredictor {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve the program against `PATH` unless it already has a directory part.
    fn resolve(&self) -> Option<PathBuf> {
        if self.program.components().count() > 1 {
            return is_file(&self.program).then(|| self.program.clone());
        }
        let path = std::env::var_os("PATH")?;
        std::env::split_paths(&path)
            .map(|dir| dir.join(&self.program))
            .find(|candidate| is_file(candidate))
    }
}

fn is_file(path: &Path) -> bool {
    path.metadata().map(|m| m.is_file()).unwrap_or(false)
}

#[async_trait]
impl LlmPredictor for CommandPredictor {
    async fn is_available(&self) -> bool {
        self.resolve().is_some()
    }

    async fn predict(&self, prompt: &str) -> Result<String, PredictError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                PredictError::Unavailable(format!(
                    "failed to start '{}': {}",
                    self.program.display(),
                    e
                ))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| PredictError::InvocationFailed("no stdin available".to_string()))?;
        let payload = prompt.to_owned();
        // stdin is fed concurrently with draining stdout
        let writer = tokio::spawn(async move {
            stdin.write_all(payload.as_bytes()).await?;
            stdin.shutdown().await
        });

        let output = timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| PredictError::Timeout(self.timeout))?
            .map_err(|e| PredictError::InvocationFailed(format!("failed to read output: {}", e)))?;

        match writer.await {
            Ok(Ok(())) => {}
            // The program may exit without consuming all of stdin
            Ok(Err(e)) if e.kind() == ErrorKind::BrokenPipe => {}
            Ok(Err(e)) => {
                return Err(PredictError::InvocationFailed(format!(
                    "failed to write prompt: {}",
                    e
                )))
            }
            Err(e) => {
                return Err(PredictError::InvocationFailed(format!(
                    "prompt writer task failed: {}",
                    e
                )))
            }
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PredictError::InvocationFailed(format!(
                "'{}' exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| PredictError::InvalidOutput(format!("response is not UTF-8: {}", e)))
    }
}
