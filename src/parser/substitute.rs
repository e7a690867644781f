//! Variable substitution against the settings store.
//!
//! Line-assignment values use shell syntax: `$NAME`, `${NAME}`,
//! `${NAME:-default}` and `${NAME:=default}`. Document strings only
//! recognize `${name}`.

use crate::settings::{Settings, is_empty, value_to_string};
use regex_lite::{Captures, Regex};
use std::sync::LazyLock;

static SHELL_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:\{([^}:]+(?:::[^}:]+)*)(?::([-=])([^}]*))?\}|([A-Za-z_][A-Za-z0-9_]*))")
        .expect("valid shell token pattern")
});

static BRACE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid brace token pattern"));

/// Substituted text plus the keys it referenced, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Substitution {
    pub text: String,
    pub dependencies: Vec<String>,
}

impl Substitution {
    fn reference(&mut self, name: &str) {
        if !self.dependencies.iter().any(|d| d == name) {
            self.dependencies.push(name.to_string());
        }
    }
}

/// Expand shell-style references in `text`.
///
/// Absent keys expand to the empty string, or to the default when one is given.
/// With `lower`, names are lower-cased so they match lower-cased keys.
pub fn shell(text: &str, settings: &dyn Settings, lower: bool) -> Substitution {
    let mut result = Substitution::default();
    let expanded = SHELL_TOKEN.replace_all(text, |caps: &Captures<'_>| {
        let raw = caps
            .get(1)
            .or_else(|| caps.get(4))
            .map(|m| m.as_str())
            .unwrap_or_default();
        let name = if lower {
            raw.to_lowercase()
        } else {
            raw.to_string()
        };
        result.reference(&name);

        let current = settings.get(&name).filter(|v| !is_empty(v));
        match (current, caps.get(3)) {
            (Some(value), _) => value_to_string(&value),
            (None, Some(default)) => default.as_str().to_string(),
            (None, None) => String::new(),
        }
    });
    result.text = expanded.into_owned();
    result
}

/// Expand `${name}` references in `text`.
pub fn interpolate(text: &str, settings: &dyn Settings) -> Substitution {
    let mut result = Substitution::default();
    let expanded = BRACE_TOKEN.replace_all(text, |caps: &Captures<'_>| {
        let name = &caps[1];
        result.reference(name);
        settings
            .get(name)
            .map(|value| value_to_string(&value))
            .unwrap_or_default()
    });
    result.text = expanded.into_owned();
    result
}

/// Whether `text` contains at least one `${name}` reference.
pub fn has_brace_token(text: &str) -> bool {
    BRACE_TOKEN.is_match(text)
}
