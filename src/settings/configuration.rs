//! Application configuration tree with case-insensitive path access.

use super::{KeySeparator, PathAccess, flatten_into, path_get, path_set};
use serde_json::{Map, Value};

/// A nested configuration tree whose keys are stored lower-cased at every level.
///
/// This is the usual target of a [`super::DelegatedSettings`] adapter: the
/// application keeps the `Configuration`, the loader writes through the adapter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Configuration {
    root: Map<String, Value>,
    separator: KeySeparator,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an existing value. Non-object values yield an empty tree.
    pub fn from_value(value: Value) -> Self {
        let root = match lower_keys(value) {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            root,
            separator: KeySeparator::default(),
        }
    }

    pub fn with_separator(mut self, separator: KeySeparator) -> Self {
        self.separator = separator;
        self
    }

    pub fn separator(&self) -> &KeySeparator {
        &self.separator
    }

    /// Snapshot of the tree as a JSON value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.root.clone())
    }

    fn segments(&self, path: &str) -> Vec<String> {
        self.separator
            .split(path)
            .into_iter()
            .map(str::to_lowercase)
            .collect()
    }
}

impl PathAccess for Configuration {
    fn path_get(&self, path: &str) -> Option<Value> {
        let segments = self.segments(path);
        let refs: Vec<&str> = segments.iter().map(String::as_str).collect();
        path_get(&self.root, &refs).cloned()
    }

    fn path_set(&mut self, path: &str, value: Value) {
        let segments = self.segments(path);
        let refs: Vec<&str> = segments.iter().map(String::as_str).collect();
        path_set(&mut self.root, &refs, lower_keys(value));
    }

    fn flatten(&self) -> Map<String, Value> {
        let mut out = Map::new();
        flatten_into(&mut out, &mut Vec::new(), &self.root, &self.separator);
        out
    }
}

/// Lower-case object keys at every depth.
fn lower_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k.to_lowercase(), lower_keys(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(lower_keys).collect()),
        other => other,
    }
}
