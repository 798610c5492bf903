//! Node data structures flowing through the postprocessing step

mod node;
mod text_node;

pub use node::{Node, NodeId, Properties, PropertyValue, Relationship};
pub use text_node::TextNode;
