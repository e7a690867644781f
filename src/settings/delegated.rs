//! Store that forwards to an external configuration object.

use super::Settings;
use serde_json::{Map, Value};

/// Nested-path accessor exposed by an application configuration object.
///
/// The object owns its own path syntax; the store passes keys through untouched.
pub trait PathAccess {
    fn path_get(&self, path: &str) -> Option<Value>;

    fn path_set(&mut self, path: &str, value: Value);

    fn path_exists(&self, path: &str) -> bool {
        self.path_get(path).is_some()
    }

    /// Flattened view of every leaf, keyed by full path.
    fn flatten(&self) -> Map<String, Value>;
}

impl<T: PathAccess + ?Sized> PathAccess for &mut T {
    fn path_get(&self, path: &str) -> Option<Value> {
        (**self).path_get(path)
    }

    fn path_set(&mut self, path: &str, value: Value) {
        (**self).path_set(path, value)
    }

    fn path_exists(&self, path: &str) -> bool {
        (**self).path_exists(path)
    }

    fn flatten(&self) -> Map<String, Value> {
        (**self).flatten()
    }
}

/// Settings backed by an opaque [`PathAccess`] object.
#[derive(Debug, Clone, Default)]
pub struct DelegatedSettings<C> {
    inner: C,
}

impl<C: PathAccess> DelegatedSettings<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: PathAccess> Settings for DelegatedSettings<C> {
    fn has(&self, name: &str) -> bool {
        self.inner.path_exists(name)
    }

    fn get(&self, name: &str) -> Option<Value> {
        self.inner.path_get(name)
    }

    fn set(&mut self, name: &str, value: Value) {
        self.inner.path_set(name, value)
    }

    fn variables(&self) -> Map<String, Value> {
        self.inner.flatten()
    }
}
