//! Placeholder tag → original value mapping

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mapping from placeholder tag (e.g. `NAME1`) to the PII value it replaced.
///
/// Serializes as a flat JSON object, which is exactly what the model emits
/// after the `Output Mapping:` delimiter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaskMapping(BTreeMap<String, String>);

impl MaskMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: impl Into<String>, original: impl Into<String>) -> Option<String> {
        self.0.insert(tag.into(), original.into())
    }

    pub fn get(&self, tag: &str) -> Option<&str> {
        self.0.get(tag).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Restore `[TAG]` placeholders in `text` to their original values.
    ///
    /// Single pass: a restored value is never rescanned, and bracketed text
    /// that isn't a known tag is left alone.
    pub fn unmask(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(open) = rest.find('[') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let Some(close) = after.find(']') else {
                out.push_str(&rest[open..]);
                return out;
            };
            match self.0.get(&after[..close]) {
                Some(original) => {
                    out.push_str(original);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('[');
                    rest = after;
                }
            }
        }

        out.push_str(rest);
        out
    }
}

impl FromIterator<(String, String)> for MaskMapping {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for MaskMapping {
    type Item = (String, String);
    type IntoIter = std::collections::btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
