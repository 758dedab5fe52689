use crate::helpers::HelperTable;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

/// Normalizes empty values to an empty string. See [`super::guard`].
pub type Guard = fn(Value) -> Value;

/// Walks a mapping or sequence. See [`super::iter`].
pub type Iter =
    fn(&Value, &mut dyn FnMut(&str, usize, usize, &Value) -> String) -> String;

/// Invokes a named helper. See [`super::helper`].
pub type HelperCall = fn(&Value, &HelperTable, &str, &[Value]) -> String;

/// Calling convention every compiled template honors:
/// `(helpers, context, guard, iter, helper) -> output`.
pub type TemplateFn =
    dyn Fn(&HelperTable, &Value, Guard, Iter, HelperCall) -> Value + Send + Sync;

/// A precompiled template produced by a loader.
///
/// Wraps the template callable together with its named blocks, each of which
/// is a template of its own with the same calling convention. Immutable once
/// built; cloning shares the underlying callables.
#[derive(Clone)]
pub struct CompiledTemplate {
    func: Arc<TemplateFn>,
    blocks: IndexMap<String, CompiledTemplate>,
}

impl CompiledTemplate {
    /// Wraps a template callable.
    ///
    /// # Arguments
    /// * `func` - Callable producing the template output from the helper
    ///   table, the render context and the three runtime primitives
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&HelperTable, &Value, Guard, Iter, HelperCall) -> Value
            + Send
            + Sync
            + 'static,
    {
        Self { func: Arc::new(func), blocks: IndexMap::new() }
    }

    /// Returns the template with `block` attached under `name`.
    pub fn with_block(mut self, name: impl Into<String>, block: CompiledTemplate) -> Self {
        self.blocks.insert(name.into(), block);
        self
    }

    /// Returns the block called `name`, if the template has one.
    pub fn block(&self, name: &str) -> Option<&CompiledTemplate> {
        self.blocks.get(name)
    }

    /// Block names in the order they were attached.
    pub fn block_names(&self) -> impl Iterator<Item = &str> {
        self.blocks.keys().map(|name| name.as_str())
    }

    /// Invokes the template callable directly.
    ///
    /// Prefer [`super::run`], which supplies the primitives and prints the
    /// result.
    ///
    /// # Arguments
    /// * `helpers` - Helper table the template dispatches to
    /// * `context` - Render context
    /// * `guard`, `iter`, `helper` - Runtime primitives
    ///
    /// # Returns
    /// * `Value` - Raw template result, not yet guarded
    pub fn call(
        &self,
        helpers: &HelperTable,
        context: &Value,
        guard: Guard,
        iter: Iter,
        helper: HelperCall,
    ) -> Value {
        (self.func)(helpers, context, guard, iter, helper)
    }
}

impl std::fmt::Debug for CompiledTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledTemplate")
            .field("blocks", &self.blocks.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
