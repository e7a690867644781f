//! Case-sensitive store addressing nested maps by key path.

use super::{KeySeparator, Settings, path_get, path_set};
use serde_json::{Map, Value};
use std::borrow::BorrowMut;

/// Nested, case-sensitive settings.
///
/// Owns its map, or mutates a caller-owned map through `&mut`; either way
/// writes are visible to whoever holds the map as soon as `set` returns.
#[derive(Debug, Clone, Default)]
pub struct NestedSettings<M = Map<String, Value>> {
    map: M,
    separator: KeySeparator,
}

impl NestedSettings<Map<String, Value>> {
    /// Create an empty store with the default separator.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<M: BorrowMut<Map<String, Value>>> NestedSettings<M> {
    /// Wrap an existing map.
    pub fn with_map(map: M, separator: KeySeparator) -> Self {
        Self { map, separator }
    }

    pub fn separator(&self) -> &KeySeparator {
        &self.separator
    }

    pub fn map(&self) -> &Map<String, Value> {
        self.map.borrow()
    }

    pub fn into_inner(self) -> M {
        self.map
    }
}

impl<M: BorrowMut<Map<String, Value>>> Settings for NestedSettings<M> {
    fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    fn get(&self, name: &str) -> Option<Value> {
        path_get(self.map.borrow(), &self.separator.split(name)).cloned()
    }

    fn set(&mut self, name: &str, value: Value) {
        let segments = self.separator.split(name);
        path_set(self.map.borrow_mut(), &segments, value);
    }

    fn variables(&self) -> Map<String, Value> {
        self.map.borrow().clone()
    }
}
