//! Shared fixtures for masking integration tests

#![allow(dead_code)]

use pii_mask::{MaskMapping, MockPredictor, Node, PiiNodePostprocessor};
use std::sync::Arc;

pub const EXAMPLE_CONTEXT: &str = "Hello Zhang Wei, I am John.";
pub const EXAMPLE_RESPONSE: &str =
    "Hello [NAME1], I am [NAME2].\nOutput Mapping:\n{\"NAME1\": \"Zhang Wei\", \"NAME2\": \"John\"}";

/// Build a well-formed model response.
pub fn response(masked: &str, mapping: &[(&str, &str)]) -> String {
    let json: serde_json::Map<String, serde_json::Value> = mapping
        .iter()
        .map(|(tag, value)| (tag.to_string(), serde_json::Value::String(value.to_string())))
        .collect();
    format!(
        "{}\nOutput Mapping:\n{}",
        masked,
        serde_json::Value::Object(json)
    )
}

pub fn mapping(entries: &[(&str, &str)]) -> MaskMapping {
    entries
        .iter()
        .map(|(tag, value)| (tag.to_string(), value.to_string()))
        .collect()
}

/// Three nodes whose contexts each have a scripted response.
pub fn person_nodes() -> Vec<Node> {
    vec![
        Node::new("Call Alice on Monday.").with_doc_id("doc-1"),
        Node::new("Bob lives in Paris.").with_doc_id("doc-1"),
        Node::new("Carol paid 40 dollars.").with_doc_id("doc-2"),
    ]
}

pub fn person_predictor() -> MockPredictor {
    MockPredictor::available()
        .with_response(
            "Call Alice on Monday.",
            response("Call [NAME1] on [DATE_TIME].", &[("NAME1", "Alice"), ("DATE_TIME", "Monday")]),
        )
        .with_response(
            "Bob lives in Paris.",
            response("[NAME1] lives in [LOCATION].", &[("NAME1", "Bob"), ("LOCATION", "Paris")]),
        )
        .with_response(
            "Carol paid 40 dollars.",
            response("[NAME1] paid 40 dollars.", &[("NAME1", "Carol")]),
        )
}

pub fn processor(predictor: MockPredictor) -> (Arc<MockPredictor>, PiiNodePostprocessor) {
    let predictor = Arc::new(predictor);
    let processor = PiiNodePostprocessor::new(predictor.clone());
    (predictor, processor)
}
