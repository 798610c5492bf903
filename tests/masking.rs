//! End-to-end masking behaviour through `PiiNodePostprocessor`
//!
//! Run with: `cargo test --test masking`

mod common;

use common::*;
use pii_mask::{
    MaskStage, MockPredictor, Node, NodeId, PredictError, Properties, PropertyValue,
    Relationship, TextNode, DEFAULT_NODE_INFO_KEY,
};
use std::time::Duration;

// ============================================================================
// Single node
// ============================================================================

#[tokio::test]
async fn example_scenario() {
    let (_, processor) = processor(
        MockPredictor::available().with_response(EXAMPLE_CONTEXT, EXAMPLE_RESPONSE),
    );

    let masked = processor.mask_one(&Node::new(EXAMPLE_CONTEXT)).await.unwrap();

    assert_eq!(masked.text, "Hello [NAME1], I am [NAME2].");
    assert_eq!(
        masked.pii_mapping(DEFAULT_NODE_INFO_KEY),
        Some(mapping(&[("NAME1", "Zhang Wei"), ("NAME2", "John")]))
    );
}

#[tokio::test]
async fn masked_text_is_trimmed() {
    let (_, processor) = processor(MockPredictor::available().with_default(
        "\n\n  Call [NAME1].  \n Output Mapping: \n {\"NAME1\": \"Dana\"}\n\n",
    ));

    let masked = processor.mask_one(&Node::new("Call Dana.")).await.unwrap();

    assert_eq!(masked.text, "Call [NAME1].");
    assert_eq!(
        masked.pii_mapping(DEFAULT_NODE_INFO_KEY),
        Some(mapping(&[("NAME1", "Dana")]))
    );
}

#[tokio::test]
async fn input_node_is_not_mutated() {
    let (_, processor) = processor(
        MockPredictor::available().with_response(EXAMPLE_CONTEXT, EXAMPLE_RESPONSE),
    );
    let node = Node::new(EXAMPLE_CONTEXT).with_metadata("source", "mail.txt");
    let before = node.clone();

    let masked = processor.mask_one(&node).await.unwrap();

    assert_eq!(node, before);
    assert_ne!(masked.text, node.text);
    assert!(node.pii_mapping(DEFAULT_NODE_INFO_KEY).is_none());
}

#[tokio::test]
async fn other_fields_are_preserved() {
    let (_, processor) = processor(
        MockPredictor::available().with_response(EXAMPLE_CONTEXT, EXAMPLE_RESPONSE),
    );
    let previous = NodeId::from_string("chunk:0");
    let node = Node::new(EXAMPLE_CONTEXT)
        .with_doc_id("inbox/42")
        .with_relationship(Relationship::Previous, previous)
        .with_metadata("page", PropertyValue::Int(2))
        .with_extra("score", serde_json::json!(0.9));

    let masked = processor.mask_one(&node).await.unwrap();

    assert_eq!(masked.id, node.id);
    assert_eq!(masked.doc_id, node.doc_id);
    assert_eq!(masked.relationships, node.relationships);
    assert_eq!(masked.created_at, node.created_at);
    assert_eq!(masked.extra, node.extra);

    let metadata = masked.metadata.as_ref().unwrap();
    assert_eq!(metadata.get("page"), Some(&PropertyValue::Int(2)));
    assert!(metadata.contains_key(DEFAULT_NODE_INFO_KEY));
}

#[tokio::test]
async fn metadata_container_is_created() {
    let (_, processor) = processor(
        MockPredictor::available().with_response(EXAMPLE_CONTEXT, EXAMPLE_RESPONSE),
    );
    let node = Node::new(EXAMPLE_CONTEXT);
    assert!(node.metadata.is_none());

    let masked = processor.mask_one(&node).await.unwrap();

    assert_eq!(masked.metadata.map(|m| m.len()), Some(1));
}

#[tokio::test]
async fn empty_mapping_is_valid() {
    let (_, processor) = processor(
        MockPredictor::available().with_default("The weather is nice.\nOutput Mapping:\n{}"),
    );

    let masked = processor
        .mask_one(&Node::new("The weather is nice."))
        .await
        .unwrap();

    assert_eq!(masked.text, "The weather is nice.");
    let stored = masked.pii_mapping(DEFAULT_NODE_INFO_KEY).unwrap();
    assert!(stored.is_empty());
}

#[tokio::test]
async fn mapping_unmasks_text() {
    let (_, processor) = processor(
        MockPredictor::available().with_response(EXAMPLE_CONTEXT, EXAMPLE_RESPONSE),
    );

    let masked = processor.mask_one(&Node::new(EXAMPLE_CONTEXT)).await.unwrap();
    let stored = masked.pii_mapping(DEFAULT_NODE_INFO_KEY).unwrap();

    assert_eq!(stored.unmask(&masked.text), EXAMPLE_CONTEXT);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn missing_delimiter_is_format_error() {
    let (_, processor) = processor(
        MockPredictor::available().with_default("Hello [NAME1]\n{\"NAME1\": \"Zhang Wei\"}"),
    );

    let err = processor.mask_one(&Node::new("Hello Zhang Wei")).await.unwrap_err();

    assert_eq!(err.stage(), MaskStage::Format);
}

#[tokio::test]
async fn malformed_json_is_parse_error() {
    let (_, processor) = processor(
        MockPredictor::available().with_default("masked text\nOutput Mapping:\nNOT_JSON"),
    );

    let err = processor.mask_one(&Node::new("text")).await.unwrap_err();

    assert_eq!(err.stage(), MaskStage::Parse);
}

#[tokio::test]
async fn non_string_values_are_parse_errors() {
    let (_, processor) = processor(
        MockPredictor::available().with_default("Age [AGE]\nOutput Mapping:\n{\"AGE\": 42}"),
    );

    let err = processor.mask_one(&Node::new("Age 42")).await.unwrap_err();

    assert_eq!(err.stage(), MaskStage::Parse);
}

#[tokio::test]
async fn unavailable_model_is_upstream_error() {
    let (_, processor) = processor(MockPredictor::unavailable());

    let err = processor.mask_one(&Node::new("text")).await.unwrap_err();

    assert_eq!(err.stage(), MaskStage::Upstream);
    assert!(err.to_string().contains("upstream"));
}

// ============================================================================
// Batches
// ============================================================================

#[tokio::test]
async fn batch_preserves_order() {
    let (predictor, processor) = processor(person_predictor());
    let nodes = person_nodes();

    let masked = processor.mask_many(&nodes).await.unwrap();

    let texts: Vec<&str> = masked.iter().map(|n| n.text.as_str()).collect();
    assert_eq!(
        texts,
        vec![
            "Call [NAME1] on [DATE_TIME].",
            "[NAME1] lives in [LOCATION].",
            "[NAME1] paid 40 dollars.",
        ]
    );
    for (input, output) in nodes.iter().zip(&masked) {
        assert_eq!(input.id, output.id);
    }
    assert_eq!(predictor.calls(), 3);
}

#[tokio::test]
async fn concurrent_batch_preserves_order() {
    // First node finishes last
    let predictor = MockPredictor::available()
        .with_delayed_response(
            "Call Alice on Monday.",
            response("Call [NAME1] on Monday.", &[("NAME1", "Alice")]),
            Duration::from_millis(80),
        )
        .with_delayed_response(
            "Bob lives in Paris.",
            response("[NAME1] lives in Paris.", &[("NAME1", "Bob")]),
            Duration::from_millis(40),
        )
        .with_response(
            "Carol paid 40 dollars.",
            response("[NAME1] paid 40 dollars.", &[("NAME1", "Carol")]),
        );
    let (_, processor) = processor(predictor);
    let processor = processor.with_concurrency(3);
    let nodes = person_nodes();

    let masked = processor.mask_many(&nodes).await.unwrap();

    let ids: Vec<NodeId> = masked.iter().map(|n| n.id).collect();
    let expected: Vec<NodeId> = nodes.iter().map(|n| n.id).collect();
    assert_eq!(ids, expected);
    assert_eq!(masked[0].text, "Call [NAME1] on Monday.");
    assert_eq!(masked[2].text, "[NAME1] paid 40 dollars.");
}

#[tokio::test]
async fn batch_aborts_on_first_failure() {
    let predictor = person_predictor().with_failure(
        "Bob lives in Paris.",
        PredictError::InvocationFailed("quota exceeded".to_string()),
    );
    let (predictor, processor) = processor(predictor);
    let nodes = person_nodes();

    let err = processor.mask_many(&nodes).await.unwrap_err();

    assert_eq!(err.index, Some(1));
    assert_eq!(err.node, nodes[1].id.to_string());
    assert_eq!(err.stage(), MaskStage::Upstream);
    // Sequential by default: the third node is never sent
    assert_eq!(predictor.calls(), 2);
}

#[tokio::test]
async fn concurrent_batch_reports_earliest_failing_node() {
    let predictor = MockPredictor::available()
        .with_delayed_response(
            "Call Alice on Monday.",
            "no delimiter here",
            Duration::from_millis(50),
        )
        .with_response("Bob lives in Paris.", "[NAME1]\nOutput Mapping:\nnot json")
        .with_default("x\nOutput Mapping:\n{}");
    let (_, processor) = processor(predictor);
    let processor = processor.with_concurrency(3);

    let err = processor.mask_many(&person_nodes()).await.unwrap_err();

    assert_eq!(err.index, Some(0));
    assert_eq!(err.stage(), MaskStage::Format);
}

#[tokio::test]
async fn mask_each_isolates_failures() {
    let predictor = person_predictor().with_failure(
        "Bob lives in Paris.",
        PredictError::Timeout(Duration::from_secs(30)),
    );
    let (predictor, processor) = processor(predictor);

    let results = processor.mask_each(&person_nodes()).await;

    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    let err = results[1].as_ref().unwrap_err();
    assert_eq!(err.index, Some(1));
    assert_eq!(err.stage(), MaskStage::Upstream);
    assert_eq!(
        results[2].as_ref().unwrap().text,
        "[NAME1] paid 40 dollars."
    );
    assert_eq!(predictor.calls(), 3);
}

// ============================================================================
// Custom node types
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Chunk {
    name: String,
    body: String,
    meta: Option<Properties>,
    score: f32,
}

impl TextNode for Chunk {
    fn text(&self) -> &str {
        &self.body
    }

    fn set_text(&mut self, text: String) {
        self.body = text;
    }

    fn metadata(&self) -> Option<&Properties> {
        self.meta.as_ref()
    }

    fn metadata_mut(&mut self) -> &mut Properties {
        self.meta.get_or_insert_with(Properties::new)
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}

#[tokio::test]
async fn works_with_any_text_node() {
    let (_, processor) = processor(
        MockPredictor::available().with_response(EXAMPLE_CONTEXT, EXAMPLE_RESPONSE),
    );
    let chunk = Chunk {
        name: "chunk-9".to_string(),
        body: EXAMPLE_CONTEXT.to_string(),
        meta: None,
        score: 0.75,
    };

    let masked = processor.mask_one(&chunk).await.unwrap();

    assert_eq!(masked.name, "chunk-9");
    assert_eq!(masked.score, 0.75);
    assert_eq!(masked.body, "Hello [NAME1], I am [NAME2].");
    assert!(masked
        .meta
        .as_ref()
        .unwrap()
        .contains_key(DEFAULT_NODE_INFO_KEY));
    assert!(chunk.meta.is_none());
}

#[tokio::test]
async fn error_uses_node_label() {
    let (_, processor) = processor(MockPredictor::available().with_default("no delimiter"));
    let chunk = Chunk {
        name: "chunk-3".to_string(),
        body: "text".to_string(),
        meta: None,
        score: 0.0,
    };

    let err = processor.mask_many(&[chunk]).await.unwrap_err();

    assert_eq!(err.node, "chunk-3");
    assert!(err.to_string().contains("chunk-3"));
    assert!(err.to_string().contains("index 0"));
}
