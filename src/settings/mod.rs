//! Settings stores that parsers write into.
//!
//! All parsers address a store through the [`Settings`] trait. Three variants
//! exist, differing only in case folding and key nesting:
//! - [`NestedSettings`] - case-sensitive, keys are paths split on a [`KeySeparator`]
//! - [`FlatSettings`] - case-insensitive, single level, keys are opaque
//! - [`DelegatedSettings`] - forwards to an external object's path accessor
//!
//! ## Key syntax
//! Flat external keys (environment variables, `.env` files) can address nested
//! paths: `___` becomes the namespace token `\` and `__` becomes the scope token
//! `::`, so `zesk___User__class` addresses `zesk\User::class`.

mod configuration;
mod delegated;
mod flat;
mod nested;

pub use configuration::Configuration;
pub use delegated::{DelegatedSettings, PathAccess};
pub use flat::FlatSettings;
pub use nested::NestedSettings;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Token replacing a run of three underscores in a key.
pub const NAMESPACE_TOKEN: &str = "\\";

/// Token replacing a run of two underscores in a key.
pub const SCOPE_TOKEN: &str = "::";

/// A mutable key/value sink.
///
/// `get` returns `None` iff nothing is reachable at `name`; `has` is true iff
/// something is, even an empty or falsy value.
pub trait Settings {
    /// Check whether a value is reachable at `name`.
    fn has(&self, name: &str) -> bool;

    /// Get the value reachable at `name`.
    fn get(&self, name: &str) -> Option<Value>;

    /// Write `value` at `name`, replacing whatever was there.
    fn set(&mut self, name: &str, value: Value);

    /// All reachable key/value pairs.
    fn variables(&self) -> Map<String, Value>;

    /// Get the value at `name`, or `default` when nothing is reachable.
    fn get_or(&self, name: &str, default: Value) -> Value {
        self.get(name).unwrap_or(default)
    }

    /// Like [`Settings::get_or`], but an empty value also yields `default`.
    fn eget(&self, name: &str, default: Value) -> Value {
        match self.get(name) {
            Some(value) if !is_empty(&value) => value,
            _ => default,
        }
    }
}

impl<S: Settings + ?Sized> Settings for &mut S {
    fn has(&self, name: &str) -> bool {
        (**self).has(name)
    }

    fn get(&self, name: &str) -> Option<Value> {
        (**self).get(name)
    }

    fn set(&mut self, name: &str, value: Value) {
        (**self).set(name, value)
    }

    fn variables(&self) -> Map<String, Value> {
        (**self).variables()
    }
}

impl<S: Settings + ?Sized> Settings for Box<S> {
    fn has(&self, name: &str) -> bool {
        (**self).has(name)
    }

    fn get(&self, name: &str) -> Option<Value> {
        (**self).get(name)
    }

    fn set(&mut self, name: &str, value: Value) {
        (**self).set(name, value)
    }

    fn variables(&self) -> Map<String, Value> {
        (**self).variables()
    }
}

/// The key-path separator shared by nested stores and document flattening.
///
/// Must be the same value everywhere within one process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeySeparator(String);

impl Default for KeySeparator {
    fn default() -> Self {
        Self(SCOPE_TOKEN.to_string())
    }
}

impl KeySeparator {
    pub fn new(separator: impl Into<String>) -> Self {
        Self(separator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split a key into path segments. An empty separator never splits.
    pub fn split<'k>(&self, key: &'k str) -> Vec<&'k str> {
        if self.0.is_empty() {
            vec![key]
        } else {
            key.split(self.0.as_str()).collect()
        }
    }

    /// Join path segments into a key.
    pub fn join<S: AsRef<str>>(&self, segments: &[S]) -> String {
        segments
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<_>>()
            .join(&self.0)
    }
}

impl std::fmt::Display for KeySeparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rewrite underscore runs in a flat key into namespace and scope tokens.
pub fn rewrite_namespace(key: &str) -> String {
    key.replace("___", NAMESPACE_TOKEN).replace("__", SCOPE_TOKEN)
}

/// Whether a value counts as empty for [`Settings::eget`].
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Render a value as the text substituted into other values.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Walk `segments` down nested objects.
pub(crate) fn path_get<'v>(map: &'v Map<String, Value>, segments: &[&str]) -> Option<&'v Value> {
    let (last, parents) = segments.split_last()?;
    let mut current = map;
    for segment in parents {
        current = current.get(*segment)?.as_object()?;
    }
    current.get(*last)
}

/// Write `value` at `segments`, replacing non-object intermediates with objects.
pub(crate) fn path_set(map: &mut Map<String, Value>, segments: &[&str], value: Value) {
    let Some((last, parents)) = segments.split_last() else {
        return;
    };
    let mut current = map;
    for segment in parents {
        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Value::Object(inner) = slot else {
            return;
        };
        current = inner;
    }
    current.insert(last.to_string(), value);
}

/// Flatten nested objects into `prefix<sep>key` leaf pairs.
pub(crate) fn flatten_into(
    out: &mut Map<String, Value>,
    prefix: &mut Vec<String>,
    map: &Map<String, Value>,
    separator: &KeySeparator,
) {
    for (key, value) in map {
        prefix.push(key.clone());
        match value {
            Value::Object(inner) if !inner.is_empty() => {
                flatten_into(out, prefix, inner, separator);
            }
            _ => {
                out.insert(separator.join(prefix.as_slice()), value.clone());
            }
        }
        prefix.pop();
    }
}
