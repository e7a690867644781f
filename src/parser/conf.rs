//! Shell/.env-style `KEY=value` parser.

use super::substitute::{self, Substitution};
use super::{
    APPEND_MARKER, INCLUDE_KEY, LITERAL_QUOTE, ParseContext, Parser, ParserOptions, autotype,
    unquote,
};
use crate::error::Result;
use crate::paths::{parent_dir, resolve_include};
use crate::settings::{rewrite_namespace, value_to_string};
use serde_json::Value;
use tracing::{debug, warn};

/// Parser for line-assignment files.
///
/// ```text
/// # comment
/// export PATH_PREFIX=/opt
/// DB__HOST=localhost          # key db::host
/// GREETING="Hello ${NAME}"    # substituted
/// TEMPLATE='Hello ${NAME}'    # literal
/// PLUGINS[]=auth              # list append
/// include=local.conf          # queue another file
/// ```
#[derive(Debug, Clone)]
pub struct ConfParser {
    content: String,
    options: ParserOptions,
    lines: Option<Vec<String>>,
}

/// One `key=value` line after key and value post-processing.
#[derive(Debug, Clone, PartialEq)]
struct Assignment {
    key: String,
    value: Value,
    append: bool,
    dependencies: Vec<String>,
}

impl ConfParser {
    pub fn new(content: impl Into<String>, options: ParserOptions) -> Self {
        Self {
            content: content.into(),
            options,
            lines: None,
        }
    }

    /// Split content into logical lines, folding continuations if enabled.
    fn logical_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = Vec::new();
        for line in self.content.lines() {
            let continuation = line.starts_with(' ') || line.starts_with('\t');
            if self.options.multiline
                && continuation
                && let Some(previous) = lines.last_mut()
            {
                previous.push('\n');
                previous.push_str(line.trim_start());
                continue;
            }
            lines.push(line.to_string());
        }
        lines
    }

    /// Split a line into raw key and value, or `None` if it isn't an assignment.
    fn split_line<'l>(&self, line: &'l str) -> Option<(&'l str, &'l str)> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let line = strip_export(line);
        line.split_once(self.options.separator)
    }

    fn parse_line(&self, line: &str, cx: &ParseContext<'_>) -> Option<Assignment> {
        let (key, value) = self.split_line(line)?;
        let key = if self.options.trim_key { key.trim() } else { key };
        let value = if self.options.trim_value {
            value.trim()
        } else {
            value
        };

        let key = if self.options.lower {
            key.to_lowercase()
        } else {
            key.to_string()
        };
        let (key, append) = match key.strip_suffix(APPEND_MARKER) {
            Some(stripped) => (stripped.to_string(), true),
            None => (key, false),
        };
        let key = rewrite_namespace(&key);

        let (value, quote) = unquote(value, &self.options.unquote);
        let Substitution { text, dependencies } = if quote == Some(LITERAL_QUOTE) {
            Substitution {
                text: value.to_string(),
                dependencies: Vec::new(),
            }
        } else {
            substitute::shell(value, &*cx.settings, self.options.lower)
        };
        let value = if quote.is_none() && self.options.autotype {
            autotype(&text)
        } else {
            Value::String(text)
        };

        Some(Assignment {
            key,
            value,
            append,
            dependencies,
        })
    }

    fn apply(&self, assignment: Assignment, cx: &mut ParseContext<'_>) {
        let Assignment {
            key,
            value,
            append,
            dependencies,
        } = assignment;

        if key.eq_ignore_ascii_case(INCLUDE_KEY)
            && let Some(loader) = cx.loader.as_deref_mut()
        {
            let target = value_to_string(&value);
            let base = self
                .options
                .context
                .clone()
                .or_else(|| loader.current().and_then(parent_dir));
            match resolve_include(&target, base.as_deref()) {
                Ok(path) => {
                    debug!(include = %path.display(), "Queueing include");
                    loader.include(path);
                }
                Err(e) => warn!("Ignoring include: {}", e),
            }
            return;
        }

        if append {
            let mut items = match cx.settings.get(&key) {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            };
            items.push(value);
            cx.settings.set(&key, Value::Array(items));
            cx.dependencies.define(&key, &dependencies);
        } else if self.options.overwrite || !cx.settings.has(&key) {
            cx.settings.set(&key, value);
            cx.dependencies.define(&key, &dependencies);
        } else {
            debug!(key = %key, "Keeping existing value");
        }
    }
}

impl Parser for ConfParser {
    fn name(&self) -> &str {
        "conf"
    }

    fn initialize(&mut self) {
        if self.lines.is_none() {
            self.lines = Some(self.logical_lines());
        }
    }

    /// True when every non-comment line is an assignment.
    fn validate(&self) -> bool {
        self.logical_lines().iter().all(|line| {
            let trimmed = line.trim();
            trimmed.is_empty() || trimmed.starts_with('#') || self.split_line(line).is_some()
        })
    }

    fn process(&mut self, cx: &mut ParseContext<'_>) -> Result<()> {
        self.initialize();
        let lines = self.lines.clone().unwrap_or_default();

        cx.dependencies
            .push(self.options.context_name(self.name()));
        for line in &lines {
            if let Some(assignment) = self.parse_line(line, cx) {
                self.apply(assignment, cx);
            }
        }
        cx.dependencies.pop()?;
        Ok(())
    }
}

/// Strip a leading `export` token followed by whitespace.
fn strip_export(line: &str) -> &str {
    match line.strip_prefix("export") {
        Some(rest) if rest.starts_with([' ', '\t']) => rest.trim_start(),
        _ => line,
    }
}
