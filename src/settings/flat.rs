//! Case-insensitive single-level store.

use super::Settings;
use serde_json::{Map, Value};
use std::borrow::BorrowMut;

/// Flat, case-insensitive settings. Keys are lower-cased on read and write
/// and are never split, so `a::b` is one opaque key.
#[derive(Debug, Clone, Default)]
pub struct FlatSettings<M = Map<String, Value>> {
    map: M,
}

impl FlatSettings<Map<String, Value>> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<M: BorrowMut<Map<String, Value>>> FlatSettings<M> {
    pub fn with_map(map: M) -> Self {
        Self { map }
    }

    pub fn map(&self) -> &Map<String, Value> {
        self.map.borrow()
    }

    pub fn into_inner(self) -> M {
        self.map
    }
}

impl<M: BorrowMut<Map<String, Value>>> Settings for FlatSettings<M> {
    fn has(&self, name: &str) -> bool {
        self.map.borrow().contains_key(&name.to_lowercase())
    }

    fn get(&self, name: &str) -> Option<Value> {
        self.map.borrow().get(&name.to_lowercase()).cloned()
    }

    fn set(&mut self, name: &str, value: Value) {
        self.map.borrow_mut().insert(name.to_lowercase(), value);
    }

    fn variables(&self) -> Map<String, Value> {
        self.map.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keys_fold_case() {
        let mut settings = FlatSettings::new();
        settings.set("HOME", json!("/root"));
        assert!(settings.has("home"));
        assert_eq!(settings.get("Home"), Some(json!("/root")));
        assert_eq!(settings.variables().keys().collect::<Vec<_>>(), vec!["home"]);
    }

    #[test]
    fn test_separator_is_opaque() {
        let mut settings = FlatSettings::new();
        settings.set("db::host", json!("x"));
        assert!(settings.has("DB::HOST"));
        assert!(!settings.has("db"));
    }
}
