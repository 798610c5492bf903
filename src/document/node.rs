//! Node representation: one chunk of source text plus metadata

use crate::postprocessor::MaskMapping;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Create a new random NodeId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Deterministic id derived from a string key (UUID v5).
    pub fn from_string(key: impl AsRef<str>) -> Self {
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_ref().as_bytes()))
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Typed metadata values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
    Array(Vec<PropertyValue>),
    Object(HashMap<String, PropertyValue>),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<serde_json::Value> for PropertyValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Array(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => Self::Object(
                map.into_iter().map(|(k, v)| (k, Self::from(v))).collect(),
            ),
        }
    }
}

impl From<MaskMapping> for PropertyValue {
    fn from(mapping: MaskMapping) -> Self {
        Self::Object(
            mapping
                .into_iter()
                .map(|(tag, original)| (tag, Self::String(original)))
                .collect(),
        )
    }
}

/// Metadata collection
pub type Properties = HashMap<String, PropertyValue>;

/// How a node relates to its neighbours in the source document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    Source,
    Previous,
    Next,
    Parent,
    Child,
}

/// A chunk of source text in the retrieval pipeline.
///
/// `Clone` is a full deep copy; the postprocessor relies on it to leave the
/// caller's node untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier
    #[serde(default)]
    pub id: NodeId,
    /// Chunk text
    pub text: String,
    /// Identifier of the document this chunk was cut from
    #[serde(default)]
    pub doc_id: Option<String>,
    /// Free-form metadata; absent until something writes to it
    #[serde(default)]
    pub metadata: Option<Properties>,
    /// Links to neighbouring nodes
    #[serde(default)]
    pub relationships: HashMap<Relationship, NodeId>,
    /// When the node was created
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Fields from upstream stages this crate doesn't model (scores,
    /// embeddings, ...); carried through serialization untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Node {
    /// Create a node holding the given text and no metadata
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            text: text.into(),
            doc_id: None,
            metadata: None,
            relationships: HashMap::new(),
            created_at: Some(chrono::Utc::now()),
            extra: serde_json::Map::new(),
        }
    }

    /// Set the owning document id
    pub fn with_doc_id(mut self, doc_id: impl Into<String>) -> Self {
        self.doc_id = Some(doc_id.into());
        self
    }

    /// Add a metadata entry, creating the container if needed
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.metadata
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Attach an upstream field this crate doesn't model
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Link this node to another
    pub fn with_relationship(mut self, kind: Relationship, target: NodeId) -> Self {
        self.relationships.insert(kind, target);
        self
    }

    /// Read back a mask mapping stored under `key`.
    ///
    /// Returns `None` when the entry is missing or is not a flat
    /// string-to-string object.
    pub fn pii_mapping(&self, key: &str) -> Option<MaskMapping> {
        match self.metadata.as_ref()?.get(key)? {
            PropertyValue::Object(entries) => entries
                .iter()
                .map(|(tag, value)| value.as_str().map(|v| (tag.clone(), v.to_string())))
                .collect::<Option<MaskMapping>>(),
            _ => None,
        }
    }
}
