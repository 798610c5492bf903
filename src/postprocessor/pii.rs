//! LLM-backed PII masking for nodes

use super::error::{MaskError, MaskFailure};
use super::response::{parse_response, MaskedResponse};
use super::traits::NodePostprocessor;
use crate::config::{ConfigError, MaskConfig};
use crate::document::{Node, TextNode};
use crate::predictor::LlmPredictor;
use crate::prompt::{PromptTemplate, DEFAULT_TASK};
use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Metadata key the mapping is stored under.
pub const DEFAULT_NODE_INFO_KEY: &str = "__pii_node_info__";

/// Masks PII in node text through one model call per node.
///
/// Input nodes are never modified: each result is a clone with the masked
/// text and the tag mapping under `node_info_key`.
///
/// Batch policy: `mask_many` fails on the first node that fails (in input
/// order) and drops the rest; `mask_each` reports every node independently.
pub struct PiiNodePostprocessor {
    predictor: Arc<dyn LlmPredictor>,
    template: PromptTemplate,
    task: String,
    node_info_key: String,
    /// Maximum model calls in flight during a batch
    concurrency: usize,
}

impl PiiNodePostprocessor {
    pub fn new(predictor: Arc<dyn LlmPredictor>) -> Self {
        Self {
            predictor,
            template: PromptTemplate::default(),
            task: DEFAULT_TASK.to_string(),
            node_info_key: DEFAULT_NODE_INFO_KEY.to_string(),
            concurrency: 1,
        }
    }

    /// Build from a loaded configuration.
    pub fn from_config(
        predictor: Arc<dyn LlmPredictor>,
        config: &MaskConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(predictor)
            .with_template(config.prompt_template()?)
            .with_task(config.task.clone())
            .with_node_info_key(config.node_info_key.clone())
            .with_concurrency(config.concurrency))
    }

    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task = task.into();
        self
    }

    pub fn with_node_info_key(mut self, key: impl Into<String>) -> Self {
        self.node_info_key = key.into();
        self
    }

    /// Set the number of concurrent model calls; 0 is treated as 1.
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit.max(1);
        self
    }

    pub fn node_info_key(&self) -> &str {
        &self.node_info_key
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Mask one piece of text, returning the masked text and its mapping.
    pub async fn mask_pii(&self, text: &str) -> Result<MaskedResponse, MaskFailure> {
        let prompt = self.template.render(text, &self.task);
        debug!(text_len = text.len(), prompt_len = prompt.len(), "requesting PII mask");

        let response = self
            .predictor
            .predict(&prompt)
            .await
            .map_err(MaskFailure::Upstream)?;

        Ok(parse_response(&response)?)
    }

    /// Mask a single node. The input is left untouched.
    pub async fn mask_one<N: TextNode>(&self, node: &N) -> Result<N, MaskError> {
        self.mask_at(node, None).await
    }

    /// Mask a batch, preserving input order. Aborts on the first failure.
    pub async fn mask_many<N: TextNode>(&self, nodes: &[N]) -> Result<Vec<N>, MaskError> {
        let pending: Vec<_> = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| self.mask_at(node, Some(index)))
            .collect();
        let masked: Vec<N> = stream::iter(pending)
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        info!(nodes = masked.len(), "masked PII in batch");
        Ok(masked)
    }

    /// Mask a batch, reporting each node's outcome separately.
    pub async fn mask_each<N: TextNode>(&self, nodes: &[N]) -> Vec<Result<N, MaskError>> {
        let pending: Vec<_> = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| self.mask_at(node, Some(index)))
            .collect();
        let results: Vec<Result<N, MaskError>> = stream::iter(pending)
            .buffered(self.concurrency)
            .collect()
            .await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        info!(nodes = results.len(), failed, "masked PII in batch");
        results
    }

    async fn mask_at<N: TextNode>(&self, node: &N, index: Option<usize>) -> Result<N, MaskError> {
        let label = node.label();

        let masked = self.mask_pii(node.text()).await.map_err(|failure| {
            warn!(
                node = %label,
                index = ?index,
                stage = %failure.stage(),
                error = %failure,
                "PII masking failed"
            );
            MaskError::new(label.clone(), index, failure)
        })?;

        debug!(node = %label, tags = masked.mapping.len(), "node masked");

        let mut out = node.clone();
        out.set_text(masked.text);
        out.metadata_mut()
            .insert(self.node_info_key.clone(), masked.mapping.into());
        Ok(out)
    }
}

#[async_trait]
impl NodePostprocessor for PiiNodePostprocessor {
    fn id(&self) -> &str {
        "pii"
    }

    async fn postprocess_nodes(&self, nodes: &[Node]) -> Result<Vec<Node>, MaskError> {
        self.mask_many(nodes).await
    }
}
