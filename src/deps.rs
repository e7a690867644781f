//! Dependency tracking across a cascade.
//!
//! Every write a parser makes is recorded as a definition, along with the
//! keys its value was computed from. Keys referenced before anything defined
//! them are collected as externals: inputs the cascade expects from outside,
//! such as the process environment or deployment secrets.

use crate::error::{CascadeError, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// Context label used when nothing has been pushed.
const NO_CONTEXT: &str = "";

/// A recorded write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Definition {
    /// Context on top of the stack when the key was written.
    pub context: String,
    /// Keys referenced while computing the value.
    pub dependencies: Vec<String>,
}

/// Records definitions and externals for one loader run.
#[derive(Debug, Clone, Default)]
pub struct DependencyTracker {
    definitions: BTreeMap<String, Definition>,
    externals: BTreeMap<String, String>,
    context_stack: Vec<String>,
}

impl DependencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a provenance scope, conventionally a file name.
    pub fn push(&mut self, context: impl Into<String>) {
        self.context_stack.push(context.into());
    }

    /// Leave the current scope.
    pub fn pop(&mut self) -> Result<String> {
        self.context_stack
            .pop()
            .ok_or(CascadeError::UnbalancedContext)
    }

    /// The current top-of-stack context, if any.
    pub fn context(&self) -> Option<&str> {
        self.context_stack.last().map(String::as_str)
    }

    /// Record that `key` was just written from `dependencies`.
    ///
    /// Dependencies with no definition of their own become externals. A key
    /// defined without dependencies is no longer external; one defined from
    /// other keys stays external if it already was, since its value still
    /// carries whatever was supplied from outside.
    pub fn define<S: AsRef<str>>(&mut self, key: &str, dependencies: &[S]) {
        let context = self.context().unwrap_or(NO_CONTEXT).to_string();
        for dependency in dependencies {
            let dependency = dependency.as_ref();
            if !self.definitions.contains_key(dependency) {
                self.externals
                    .entry(dependency.to_string())
                    .or_insert_with(|| context.clone());
            }
        }
        self.definitions.insert(
            key.to_string(),
            Definition {
                context,
                dependencies: dependencies.iter().map(|d| d.as_ref().to_string()).collect(),
            },
        );
        if dependencies.is_empty() {
            self.externals.remove(key);
        }
    }

    /// Names referenced somewhere in the cascade but never defined by it.
    pub fn externals(&self) -> Vec<String> {
        self.externals.keys().cloned().collect()
    }

    /// Context in which an external was first referenced.
    pub fn external_context(&self, key: &str) -> Option<&str> {
        self.externals.get(key).map(String::as_str)
    }

    pub fn definition(&self, key: &str) -> Option<&Definition> {
        self.definitions.get(key)
    }

    pub fn definitions(&self) -> &BTreeMap<String, Definition> {
        &self.definitions
    }
}
