//! Named helper functions callable from compiled templates.
//!
//! A helper receives the render context as its receiver and the positional
//! arguments chosen by the template. Lookup is by name, and a name with no
//! registered helper is not an error: the dispatcher in
//! [`crate::runtime::helper`] prints nothing for it. The same silent policy
//! applies to helpers that fail, panic, or return a falsy value.

use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Error a helper may return. The dispatcher logs it and prints nothing.
#[derive(Error, Debug)]
pub enum HelperError {
    #[error("{0}")]
    Message(String),

    #[error("missing argument at position {position}")]
    MissingArgument { position: usize },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HelperError {
    pub fn msg(message: impl std::fmt::Display) -> Self {
        HelperError::Message(message.to_string())
    }
}

/// A registered helper: `(this, args) -> value`.
pub type Helper =
    Arc<dyn Fn(&Value, &[Value]) -> Result<Value, HelperError> + Send + Sync>;

/// Mapping from helper name to helper.
///
/// Entries are only ever inserted or overwritten; the last registration for a
/// name wins. Cloning is cheap since helpers are reference counted.
#[derive(Clone, Default)]
pub struct HelperTable {
    entries: IndexMap<String, Helper>,
}

impl HelperTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a helper closure under `name`, replacing any previous one.
    pub fn register<F>(&mut self, name: impl Into<String>, helper: F)
    where
        F: Fn(&Value, &[Value]) -> Result<Value, HelperError> + Send + Sync + 'static,
    {
        self.insert(name, Arc::new(helper));
    }

    /// Inserts an already shared helper under `name`, replacing any previous one.
    pub fn insert(&mut self, name: impl Into<String>, helper: Helper) {
        self.entries.insert(name.into(), helper);
    }

    pub fn get(&self, name: &str) -> Option<&Helper> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Helper names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|name| name.as_str())
    }
}

impl std::fmt::Debug for HelperTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HelperTable")
            .field("helpers", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}
