//! Masking failures, tagged with the node and stage that failed

use super::response::ResponseError;
use crate::predictor::PredictError;
use thiserror::Error;

/// Which step of masking a node failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskStage {
    /// The model was never reached or returned an error
    Upstream,
    /// No `Output Mapping:` delimiter in the response
    Format,
    /// The mapping half is not a flat string-to-string JSON object
    Parse,
}

impl std::fmt::Display for MaskStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upstream => write!(f, "upstream"),
            Self::Format => write!(f, "format"),
            Self::Parse => write!(f, "parse"),
        }
    }
}

/// Why masking a single text failed.
#[derive(Debug, Error)]
pub enum MaskFailure {
    #[error("upstream error: {0}")]
    Upstream(#[source] PredictError),

    #[error("format error: response has no \"Output Mapping:\" delimiter")]
    Format,

    #[error("parse error: {0}")]
    Parse(#[source] serde_json::Error),
}

impl MaskFailure {
    pub fn stage(&self) -> MaskStage {
        match self {
            Self::Upstream(_) => MaskStage::Upstream,
            Self::Format => MaskStage::Format,
            Self::Parse(_) => MaskStage::Parse,
        }
    }
}

impl From<ResponseError> for MaskFailure {
    fn from(err: ResponseError) -> Self {
        match err {
            ResponseError::MissingDelimiter => Self::Format,
            ResponseError::InvalidMapping(e) => Self::Parse(e),
        }
    }
}

/// A failure attributed to one node.
#[derive(Debug)]
pub struct MaskError {
    /// The node's label (its id for the built-in `Node`)
    pub node: String,
    /// Position in the batch, when the node was masked as part of one
    pub index: Option<usize>,
    pub failure: MaskFailure,
}

impl MaskError {
    pub fn new(node: impl Into<String>, index: Option<usize>, failure: MaskFailure) -> Self {
        Self {
            node: node.into(),
            index,
            failure,
        }
    }

    pub fn stage(&self) -> MaskStage {
        self.failure.stage()
    }
}

impl std::fmt::Display for MaskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to mask node {}", self.node)?;
        if let Some(index) = self.index {
            write!(f, " (index {})", index)?;
        }
        write!(f, ": {}", self.failure)
    }
}

impl std::error::Error for MaskError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.failure)
    }
}
