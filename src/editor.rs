//! In-place editing of configuration files.
//!
//! Editors rewrite a file's content so that loading it yields the edited
//! settings, keeping everything else (comments, ordering, other keys) intact
//! where the format allows.

use crate::error::{CascadeError, Result};
use crate::merge::apply_edits;
use crate::parser::{APPEND_MARKER, DocumentCodec, Format, autotype};
use crate::settings::{KeySeparator, path_set};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Rewrites configuration content with new settings values.
pub trait Editor {
    /// Apply `edits` to `content`. Null edits change nothing.
    fn edit(&self, content: &str, edits: &Map<String, Value>) -> Result<String>;
}

/// Editor for `format`, or `None` if the format can't be edited.
pub fn editor_for(format: &str, separator: KeySeparator) -> Option<Box<dyn Editor>> {
    match Format::from_name(format)? {
        Format::Conf => Some(Box::new(ConfEditor::default())),
        Format::Json => Some(Box::new(DocumentEditor::new(DocumentCodec::Json, separator))),
        Format::Yaml => Some(Box::new(DocumentEditor::new(DocumentCodec::Yaml, separator))),
        Format::Plain => None,
    }
}

/// Editor for line-assignment files.
#[derive(Debug, Clone)]
pub struct ConfEditor {
    separator: char,
}

impl Default for ConfEditor {
    fn default() -> Self {
        Self { separator: '=' }
    }
}

impl ConfEditor {
    pub fn with_separator(separator: char) -> Self {
        Self { separator }
    }

    /// Split an assignment line into its `export` flag and raw key.
    fn assignment<'l>(&self, line: &'l str) -> Option<(bool, &'l str)> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }
        let (export, rest) = match trimmed.strip_prefix("export") {
            Some(rest) if rest.starts_with([' ', '\t']) => (true, rest.trim_start()),
            _ => (false, trimmed),
        };
        let (key, _) = rest.split_once(self.separator)?;
        let key = key.trim();
        Some((export, key.strip_suffix(APPEND_MARKER).unwrap_or(key)))
    }

    fn render(&self, export: bool, key: &str, value: &Value) -> Vec<String> {
        let prefix = if export { "export " } else { "" };
        match value {
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    format!(
                        "{prefix}{key}{APPEND_MARKER}{}{}",
                        self.separator,
                        render_scalar(item)
                    )
                })
                .collect(),
            other => vec![format!("{prefix}{key}{}{}", self.separator, render_scalar(other))],
        }
    }
}

impl Editor for ConfEditor {
    fn edit(&self, content: &str, edits: &Map<String, Value>) -> Result<String> {
        let edits: Vec<(String, &String, &Value)> = edits
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(key, value)| (key.to_lowercase(), key, value))
            .collect();
        let mut written: HashSet<String> = HashSet::new();
        let mut lines: Vec<String> = Vec::new();

        for line in content.lines() {
            if let Some((export, key)) = self.assignment(line) {
                let folded = key.to_lowercase();
                if let Some((_, _, value)) = edits.iter().find(|(k, _, _)| *k == folded) {
                    if written.insert(folded) {
                        lines.extend(self.render(export, key, value));
                    }
                    continue;
                }
            }
            lines.push(line.to_string());
        }

        for (folded, key, value) in &edits {
            if !written.contains(folded) {
                lines.extend(self.render(false, key, value));
            }
        }

        let mut out = lines.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        Ok(out)
    }
}

/// Render a value so the conf parser reads it back unchanged.
fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => quote(s),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => format!("'{}'", value),
    }
}

fn quote(text: &str) -> String {
    let bare = !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./:@+,".contains(c))
        && autotype(text).is_string();
    if bare {
        text.to_string()
    } else if (text.contains('$') || text.contains('"')) && !text.contains('\'') {
        format!("'{}'", text)
    } else {
        format!("\"{}\"", text)
    }
}

/// Editor for JSON and YAML documents.
#[derive(Debug, Clone)]
pub struct DocumentEditor {
    codec: DocumentCodec,
    separator: KeySeparator,
}

impl DocumentEditor {
    pub fn new(codec: DocumentCodec, separator: KeySeparator) -> Self {
        Self { codec, separator }
    }
}

impl Editor for DocumentEditor {
    fn edit(&self, content: &str, edits: &Map<String, Value>) -> Result<String> {
        let mut document = if content.trim().is_empty() {
            Value::Object(Map::new())
        } else {
            self.codec.decode(content)?
        };
        if !document.is_object() {
            return Err(CascadeError::decode(
                self.codec.as_str(),
                "root is not an object",
            ));
        }

        let mut overlay = Map::new();
        for (key, value) in edits {
            path_set(&mut overlay, &self.separator.split(key), value.clone());
        }
        apply_edits(&mut document, Value::Object(overlay));
        self.codec.encode(&document)
    }
}
