//! Pluggable configuration format parsers.
//!
//! A parser is built once per file from its raw content and an options bag,
//! `initialize()`d, then `process()`ed against a [`ParseContext`] carrying the
//! shared settings store, the dependency tracker and (when driven by a loader)
//! the loader's file queue for `include` directives.
//!
//! | Format                      | Parser             |
//! |-----------------------------|--------------------|
//! | `conf`, `env`, `sh`, `cfg`  | [`ConfParser`]     |
//! | `json`                      | [`DocumentParser`] |
//! | `yaml`, `yml`               | [`DocumentParser`] |
//! | `plain`, `array`            | [`PlainParser`]    |

mod conf;
mod document;
mod plain;
pub mod substitute;

pub use conf::ConfParser;
pub use document::{DocumentCodec, DocumentParser};
pub use plain::PlainParser;

use crate::deps::DependencyTracker;
use crate::error::Result;
use crate::loader::FileQueue;
use crate::settings::{KeySeparator, Settings};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Quote character that suppresses substitution.
pub const LITERAL_QUOTE: char = '\'';

/// Key suffix marking a list append.
pub const APPEND_MARKER: &str = "[]";

/// Key that names another file to load.
pub const INCLUDE_KEY: &str = "include";

/// Options recognized by the parsers. Each parser ignores what it doesn't use.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    /// Display name pushed as dependency context.
    pub name: Option<String>,
    /// Replace keys that are already set.
    pub overwrite: bool,
    /// Lower-case keys (top-level only for documents).
    pub lower: bool,
    pub trim_key: bool,
    pub trim_value: bool,
    /// Assignment separator for line-assignment files.
    pub separator: char,
    /// Convert unquoted values to booleans, null and numbers.
    pub autotype: bool,
    /// Fold indented lines onto the preceding line.
    pub multiline: bool,
    /// Recognized quote pairs, each an opening and closing character.
    pub unquote: Vec<String>,
    /// Resolve `${name}` in document string leaves.
    pub interpolate: bool,
    /// Base directory for relative document includes.
    pub context: Option<PathBuf>,
    /// Separator joining document paths into keys.
    pub key_separator: KeySeparator,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            name: None,
            overwrite: true,
            lower: true,
            trim_key: true,
            trim_value: true,
            separator: '=',
            autotype: true,
            multiline: true,
            unquote: vec!["''".to_string(), "\"\"".to_string()],
            interpolate: true,
            context: None,
            key_separator: KeySeparator::default(),
        }
    }
}

impl ParserOptions {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_lower(mut self, lower: bool) -> Self {
        self.lower = lower;
        self
    }

    pub fn with_context(mut self, context: impl Into<PathBuf>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_key_separator(mut self, separator: KeySeparator) -> Self {
        self.key_separator = separator;
        self
    }

    /// Context label, falling back to a generated one.
    pub(crate) fn context_name(&self, format: &str) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("<{}>", format))
    }
}

/// Everything a parser mutates while processing one file.
pub struct ParseContext<'a> {
    pub settings: &'a mut dyn Settings,
    pub dependencies: &'a mut DependencyTracker,
    /// Queue to send discovered includes to. `None` disables include handling.
    pub loader: Option<&'a mut FileQueue>,
}

impl<'a> ParseContext<'a> {
    pub fn new(settings: &'a mut dyn Settings, dependencies: &'a mut DependencyTracker) -> Self {
        Self {
            settings,
            dependencies,
            loader: None,
        }
    }

    pub fn with_loader(mut self, loader: &'a mut FileQueue) -> Self {
        self.loader = Some(loader);
        self
    }
}

/// A configuration format parser.
pub trait Parser {
    /// Format name, used for logging and default context labels.
    fn name(&self) -> &str;

    /// Prepare the content before processing.
    fn initialize(&mut self) {}

    /// Cheap shape check of the content. Not used by the loader.
    fn validate(&self) -> bool;

    /// Apply the content to the settings store.
    fn process(&mut self, cx: &mut ParseContext<'_>) -> Result<()>;
}

/// Known formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Conf,
    Json,
    Yaml,
    Plain,
}

impl Format {
    /// Look up a format by name. Case and punctuation are ignored.
    pub fn from_name(name: &str) -> Option<Self> {
        let sanitized: String = name
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match sanitized.as_str() {
            "conf" | "env" | "sh" | "cfg" => Some(Format::Conf),
            "json" => Some(Format::Json),
            "yaml" | "yml" => Some(Format::Yaml),
            "plain" | "array" => Some(Format::Plain),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Conf => "conf",
            Format::Json => "json",
            Format::Yaml => "yaml",
            Format::Plain => "plain",
        }
    }
}

/// Format name derived from a file's extension (empty if it has none).
pub fn format_of(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Build a parser for `format`, or `None` if the format is unrecognized.
pub fn factory(
    format: &str,
    content: impl Into<String>,
    options: ParserOptions,
) -> Option<Box<dyn Parser>> {
    let content = content.into();
    let parser: Box<dyn Parser> = match Format::from_name(format)? {
        Format::Conf => Box::new(ConfParser::new(content, options)),
        Format::Json => Box::new(DocumentParser::new(content, DocumentCodec::Json, options)),
        Format::Yaml => Box::new(DocumentParser::new(content, DocumentCodec::Yaml, options)),
        Format::Plain => Box::new(PlainParser::from_content(&content)),
    };
    Some(parser)
}

static INTEGER: LazyLock<regex_lite::Regex> =
    LazyLock::new(|| regex_lite::Regex::new(r"^[+-]?\d+$").expect("valid integer pattern"));

static FLOAT: LazyLock<regex_lite::Regex> = LazyLock::new(|| {
    regex_lite::Regex::new(r"^[+-]?(\d+\.\d*|\.\d+|\d+)([eE][+-]?\d+)?$")
        .expect("valid float pattern")
});

/// Convert text to the most specific scalar it resembles.
pub fn autotype(text: &str) -> Value {
    let lowered = text.to_ascii_lowercase();
    match lowered.as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" => return Value::Null,
        _ => {}
    }
    if INTEGER.is_match(text)
        && let Ok(n) = text.parse::<i64>()
    {
        return Value::Number(n.into());
    }
    if FLOAT.is_match(text)
        && let Ok(f) = text.parse::<f64>()
        && let Some(n) = Number::from_f64(f)
    {
        return Value::Number(n);
    }
    Value::String(text.to_string())
}

/// Strip a matching quote pair, returning the inner text and the opening quote.
pub fn unquote<'v>(value: &'v str, pairs: &[String]) -> (&'v str, Option<char>) {
    for pair in pairs {
        let mut chars = pair.chars();
        let Some(open) = chars.next() else {
            continue;
        };
        let close = chars.next().unwrap_or(open);
        if value.len() >= open.len_utf8() + close.len_utf8()
            && value.starts_with(open)
            && value.ends_with(close)
        {
            let inner = &value[open.len_utf8()..value.len() - close.len_utf8()];
            return (inner, Some(open));
        }
    }
    (value, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_autotype_scalars() {
        assert_eq!(autotype("true"), json!(true));
        assert_eq!(autotype("FALSE"), json!(false));
        assert_eq!(autotype("null"), json!(null));
        assert_eq!(autotype("42"), json!(42));
        assert_eq!(autotype("-7"), json!(-7));
        assert_eq!(autotype("3.14"), json!(3.14));
        assert_eq!(autotype("1e3"), json!(1000.0));
    }

    #[test]
    fn test_autotype_leaves_text() {
        assert_eq!(autotype("inf"), json!("inf"));
        assert_eq!(autotype("NaN"), json!("NaN"));
        assert_eq!(autotype("/usr/bin"), json!("/usr/bin"));
        assert_eq!(autotype("1.2.3"), json!("1.2.3"));
        assert_eq!(autotype(""), json!(""));
    }

    #[test]
    fn test_unquote_pairs() {
        let pairs = ParserOptions::default().unquote;
        assert_eq!(unquote("'abc'", &pairs), ("abc", Some('\'')));
        assert_eq!(unquote("\"abc\"", &pairs), ("abc", Some('"')));
        assert_eq!(unquote("\"abc'", &pairs), ("\"abc'", None));
        assert_eq!(unquote("\"", &pairs), ("\"", None));
        assert_eq!(unquote("''", &pairs), ("", Some('\'')));
    }

    #[test]
    fn test_format_lookup_is_sanitized() {
        assert_eq!(Format::from_name("JSON"), Some(Format::Json));
        assert_eq!(Format::from_name(".conf"), Some(Format::Conf));
        assert_eq!(Format::from_name("yml"), Some(Format::Yaml));
        assert_eq!(Format::from_name("txt"), None);
        assert_eq!(format_of(Path::new("/etc/app/a.Conf")), "conf");
        assert_eq!(format_of(Path::new("/etc/app/README")), "");
    }

    #[test]
    fn test_factory_unknown_format() {
        assert!(factory("txt", "", ParserOptions::default()).is_none());
        let parser = factory("json", "{}", ParserOptions::default()).unwrap();
        assert_eq!(parser.name(), "json");
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: ParserOptions =
            serde_json::from_value(json!({"overwrite": false, "separator": ":"})).unwrap();
        assert!(!options.overwrite);
        assert_eq!(options.separator, ':');
        assert!(options.lower);
        assert_eq!(options.key_separator.as_str(), "::");
    }
}
