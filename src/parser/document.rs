//! JSON/YAML document parser.
//!
//! Nested objects are flattened into keys joined with the key separator;
//! only leaves are written. Top-level keys are lower-cased (when `lower` is
//! on) but nested keys keep their case.

use super::substitute;
use super::{INCLUDE_KEY, ParseContext, Parser, ParserOptions};
use crate::error::{CascadeError, Result};
use crate::paths::resolve_include;
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

/// Encoding of a structured document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentCodec {
    Json,
    Yaml,
}

impl DocumentCodec {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentCodec::Json => "json",
            DocumentCodec::Yaml => "yaml",
        }
    }

    /// Decode content into a JSON value.
    pub fn decode(&self, content: &str) -> Result<Value> {
        match self {
            DocumentCodec::Json => {
                serde_json::from_str(content).map_err(|e| CascadeError::decode("json", e))
            }
            DocumentCodec::Yaml => {
                serde_yaml::from_str(content).map_err(|e| CascadeError::decode("yaml", e))
            }
        }
    }

    /// Encode a value in this codec's pretty form.
    pub fn encode(&self, value: &Value) -> Result<String> {
        match self {
            DocumentCodec::Json => serde_json::to_string_pretty(value)
                .map(|s| format!("{s}\n"))
                .map_err(|e| CascadeError::decode("json", e)),
            DocumentCodec::Yaml => {
                serde_yaml::to_string(value).map_err(|e| CascadeError::decode("yaml", e))
            }
        }
    }
}

/// Parser for structured documents whose root is a mapping.
#[derive(Debug, Clone)]
pub struct DocumentParser {
    content: String,
    codec: DocumentCodec,
    options: ParserOptions,
}

impl DocumentParser {
    pub fn new(content: impl Into<String>, codec: DocumentCodec, options: ParserOptions) -> Self {
        Self {
            content: content.into(),
            codec,
            options,
        }
    }

    /// Decode the content, requiring an object at the root.
    fn decode_root(&self) -> Result<Map<String, Value>> {
        match self.codec.decode(&self.content)? {
            Value::Object(map) => Ok(map),
            other => Err(CascadeError::decode(
                self.codec.as_str(),
                format!("root is {}, expected an object", kind(&other)),
            )),
        }
    }

    fn queue_includes(&self, include: Value, cx: &mut ParseContext<'_>) {
        let Some(loader) = cx.loader.as_deref_mut() else {
            return;
        };
        let targets: Vec<String> = match include {
            Value::String(s) => vec![s],
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            other => {
                warn!("Ignoring include of type {}", kind(&other));
                return;
            }
        };

        for target in targets {
            match resolve_include(&target, self.options.context.as_deref()) {
                Ok(path) => {
                    debug!(include = %path.display(), "Queueing include");
                    loader.include(path);
                }
                Err(e) => warn!("Ignoring include: {}", e),
            }
        }
    }

    fn merge(&self, path: &mut Vec<String>, map: &Map<String, Value>, cx: &mut ParseContext<'_>) {
        for (key, value) in map {
            path.push(key.clone());
            match value {
                Value::Object(inner) => self.merge(path, inner, cx),
                leaf => {
                    let key = self.options.key_separator.join(path.as_slice());
                    self.write_leaf(&key, leaf, cx);
                }
            }
            path.pop();
        }
    }

    fn write_leaf(&self, key: &str, leaf: &Value, cx: &mut ParseContext<'_>) {
        if !self.options.overwrite && cx.settings.has(key) {
            debug!(key = %key, "Keeping existing value");
            return;
        }
        match leaf {
            Value::String(text) if self.options.interpolate && substitute::has_brace_token(text) => {
                let sub = substitute::interpolate(text, &*cx.settings);
                cx.settings.set(key, Value::String(sub.text));
                cx.dependencies.define(key, &sub.dependencies);
            }
            _ => {
                cx.settings.set(key, leaf.clone());
                cx.dependencies.define(key, &[] as &[&str]);
            }
        }
    }
}

impl Parser for DocumentParser {
    fn name(&self) -> &str {
        self.codec.as_str()
    }

    fn validate(&self) -> bool {
        self.decode_root().is_ok()
    }

    fn process(&mut self, cx: &mut ParseContext<'_>) -> Result<()> {
        let mut root = match self.decode_root() {
            Ok(root) => root,
            Err(e) => {
                error!(
                    context = %self.options.context_name(self.name()),
                    "Nothing applied: {}", e
                );
                return Ok(());
            }
        };

        if self.options.lower {
            root = root
                .into_iter()
                .map(|(k, v)| (k.to_lowercase(), v))
                .collect();
        }

        if cx.loader.is_some()
            && let Some(include) = root.remove(INCLUDE_KEY)
        {
            self.queue_includes(include, cx);
        }

        cx.dependencies
            .push(self.options.context_name(self.name()));
        self.merge(&mut Vec::new(), &root, cx);
        cx.dependencies.pop()?;
        Ok(())
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
