//! YAML configuration for the masking step
//!
//! ```yaml
//! task: "Mask out the PII, replace each PII with a tag, and return the text. Return the mapping in JSON."
//! node_info_key: __pii_node_info__
//! concurrency: 4
//! template_path: ./pii_prompt.txt
//! command:
//!   program: llm
//!   args: ["-m", "gpt-4o-mini"]
//!   timeout_secs: 60
//! ```
//!
//! Every field is optional; missing fields take the built-in defaults.

use crate::postprocessor::DEFAULT_NODE_INFO_KEY;
use crate::predictor::{CommandPredictor, DEFAULT_TIMEOUT};
use crate::prompt::{PromptError, PromptTemplate, DEFAULT_TASK};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid prompt template: {0}")]
    Prompt(#[from] PromptError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// External model program settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandConfig {
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

impl CommandConfig {
    pub fn predictor(&self) -> CommandPredictor {
        CommandPredictor::new(&self.program)
            .with_args(self.args.iter().cloned())
            .with_timeout(Duration::from_secs(self.timeout_secs))
    }
}

/// Masking configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MaskConfig {
    /// Inline prompt template; mutually exclusive with `template_path`
    pub template: Option<String>,
    /// File holding the prompt template, relative paths resolved against the config file
    pub template_path: Option<PathBuf>,
    pub task: String,
    pub node_info_key: String,
    /// Model calls in flight during a batch. 1 = sequential.
    pub concurrency: usize,
    pub command: Option<CommandConfig>,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            template: None,
            template_path: None,
            task: DEFAULT_TASK.to_string(),
            node_info_key: DEFAULT_NODE_INFO_KEY.to_string(),
            concurrency: 1,
            command: None,
        }
    }
}

impl MaskConfig {
    /// Default config file location (`<config_dir>/pii-mask/config.yaml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pii-mask").join("config.yaml"))
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file. A relative `template_path` is resolved against
    /// the file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml(&yaml)?;

        if let (Some(template_path), Some(base)) = (config.template_path.as_mut(), path.parent()) {
            if template_path.is_relative() {
                *template_path = base.join(&*template_path);
            }
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.template.is_some() && self.template_path.is_some() {
            return Err(ConfigError::Invalid(
                "set either 'template' or 'template_path', not both".to_string(),
            ));
        }
        if self.node_info_key.is_empty() {
            return Err(ConfigError::Invalid("'node_info_key' must not be empty".to_string()));
        }
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid("'concurrency' must be at least 1".to_string()));
        }
        if let Some(template) = &self.template {
            PromptTemplate::new(template.as_str())?;
        }
        Ok(())
    }

    /// Resolve the configured prompt template, falling back to the default.
    pub fn prompt_template(&self) -> Result<PromptTemplate, ConfigError> {
        if let Some(template) = &self.template {
            return Ok(PromptTemplate::new(template.as_str())?);
        }
        if let Some(path) = &self.template_path {
            let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            return Ok(PromptTemplate::new(text)?);
        }
        Ok(PromptTemplate::default())
    }
}
