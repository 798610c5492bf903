//! The accessor contract the postprocessor needs from a node type

use super::node::{Node, Properties};

/// A node with text and a metadata map.
///
/// The postprocessor only reads the text, writes the text back, and inserts
/// one metadata entry. Everything else travels through `Clone`.
pub trait TextNode: Clone + Send + Sync {
    fn text(&self) -> &str;

    fn set_text(&mut self, text: String);

    fn metadata(&self) -> Option<&Properties>;

    /// Mutable metadata, created empty if the node had none.
    fn metadata_mut(&mut self) -> &mut Properties;

    /// Short identifier used in error messages and logs.
    fn label(&self) -> String;
}

impl TextNode for Node {
    fn text(&self) -> &str {
        &self.text
    }

    fn set_text(&mut self, text: String) {
        self.text = text;
    }

    fn metadata(&self) -> Option<&Properties> {
        self.metadata.as_ref()
    }

    fn metadata_mut(&mut self) -> &mut Properties {
        self.metadata.get_or_insert_with(Properties::new)
    }

    fn label(&self) -> String {
        self.id.to_string()
    }
}
