//! Node postprocessor trait — the contract a retrieval pipeline calls

use super::error::MaskError;
use crate::document::Node;
use async_trait::async_trait;

/// A step that rewrites retrieved nodes before they reach the caller.
#[async_trait]
pub trait NodePostprocessor: Send + Sync {
    /// Unique identifier for this postprocessor
    fn id(&self) -> &str;

    /// Transform `nodes`, returning new nodes in the same order.
    async fn postprocess_nodes(&self, nodes: &[Node]) -> Result<Vec<Node>, MaskError>;
}
