//! Pass-through parser for already-structured values.

use super::{ParseContext, Parser};
use crate::error::Result;
use crate::settings::rewrite_namespace;
use serde_json::{Map, Value};

/// Writes each top-level pair of a structured value, unconditionally.
///
/// No substitution and no dependency records: this is how an embedding
/// application injects values it already holds, such as the process
/// environment.
#[derive(Debug, Clone)]
pub struct PlainParser {
    data: Value,
}

impl PlainParser {
    pub fn new(data: Value) -> Self {
        Self { data }
    }

    /// Decode content as JSON, falling back to the raw text as a scalar.
    pub fn from_content(content: &str) -> Self {
        let data = serde_json::from_str(content)
            .unwrap_or_else(|_| Value::String(content.to_string()));
        Self::new(data)
    }

    /// Build from `(name, value)` string pairs, e.g. `std::env::vars()`.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), Value::String(v.into())))
            .collect();
        Self::new(Value::Object(map))
    }

    /// The data as a mapping: lists are keyed by index, scalars by `0`.
    fn as_mapping(&self) -> Map<String, Value> {
        match &self.data {
            Value::Object(map) => map.clone(),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v.clone()))
                .collect(),
            Value::Null => Map::new(),
            scalar => Map::from_iter([("0".to_string(), scalar.clone())]),
        }
    }
}

impl Parser for PlainParser {
    fn name(&self) -> &str {
        "plain"
    }

    fn validate(&self) -> bool {
        true
    }

    fn process(&mut self, cx: &mut ParseContext<'_>) -> Result<()> {
        for (key, value) in self.as_mapping() {
            cx.settings.set(&rewrite_namespace(&key), value);
        }
        Ok(())
    }
}
