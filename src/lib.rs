//! pii-mask: LLM-driven PII masking for retrieval pipeline nodes
//!
//! A postprocessing step that asks a language model to replace personally
//! identifiable information in each node's text with placeholder tags, and
//! records the tag → original mapping in the node's metadata.
//!
//! # Core Concepts
//!
//! - **Nodes**: chunks of source text with free-form metadata
//! - **Predictors**: the model collaborator, prompt in, text out
//! - **Postprocessor**: renders the prompt, parses `masked text` +
//!   `Output Mapping:` + JSON, and emits masked copies of the nodes
//!
//! # Example
//!
//! ```
//! use pii_mask::{MockPredictor, Node, PiiNodePostprocessor, DEFAULT_NODE_INFO_KEY};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let predictor = MockPredictor::available().with_response(
//!     "Call Alice",
//!     "Call [NAME1]\nOutput Mapping:\n{\"NAME1\": \"Alice\"}",
//! );
//! let processor = PiiNodePostprocessor::new(Arc::new(predictor));
//!
//! let masked = processor.mask_one(&Node::new("Call Alice")).await.unwrap();
//! assert_eq!(masked.text, "Call [NAME1]");
//! assert!(masked.pii_mapping(DEFAULT_NODE_INFO_KEY).is_some());
//! # }
//! ```

pub mod config;
mod document;
pub mod postprocessor;
pub mod predictor;
pub mod prompt;

pub use config::{CommandConfig, ConfigError, MaskConfig};
pub use document::{Node, NodeId, Properties, PropertyValue, Relationship, TextNode};
pub use postprocessor::{
    MaskError, MaskFailure, MaskMapping, MaskStage, MaskedResponse, NodePostprocessor,
    PiiNodePostprocessor, ResponseError, DEFAULT_NODE_INFO_KEY,
};
pub use predictor::{CommandPredictor, LlmPredictor, MockPredictor, PredictError};
pub use prompt::{PromptError, PromptTemplate, DEFAULT_TASK, PII_EXAMPLE_PREAMBLE};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
