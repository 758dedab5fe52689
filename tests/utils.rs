#![allow(dead_code)]

use benchpress::loader::{LoadFuture, TemplateLoader};
use benchpress::{CompiledTemplate, LoadError};
use futures::channel::oneshot;
use futures::FutureExt;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Loader that serves fixed templates and counts how often each name is loaded.
#[derive(Clone, Default)]
pub struct CountingLoader {
    templates: Arc<Mutex<HashMap<String, CompiledTemplate>>>,
    calls: Arc<Mutex<HashMap<String, usize>>>,
    failures: Arc<AtomicUsize>,
}

impl CountingLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, name: &str, template: CompiledTemplate) -> Self {
        self.templates.lock().unwrap().insert(name.to_string(), template);
        self
    }

    /// Makes the next `count` loads fail.
    pub fn failing(self, count: usize) -> Self {
        self.failures.store(count, Ordering::SeqCst);
        self
    }

    pub fn calls(&self, name: &str) -> usize {
        self.calls.lock().unwrap().get(name).copied().unwrap_or(0)
    }
}

impl TemplateLoader for CountingLoader {
    fn load(&self, name: &str) -> LoadFuture {
        *self.calls.lock().unwrap().entry(name.to_string()).or_default() += 1;

        let fail = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        let result = if fail {
            Err(LoadError::failed(format!("cannot fetch '{name}'")))
        } else {
            Ok(self.templates.lock().unwrap().get(name).cloned())
        };
        async move { result }.boxed()
    }
}

/// Loader whose loads stay pending until released by the test.
#[derive(Clone, Default)]
pub struct GatedLoader {
    inner: CountingLoader,
    gates: Arc<Mutex<Vec<oneshot::Sender<()>>>>,
}

impl GatedLoader {
    pub fn new(inner: CountingLoader) -> Self {
        Self { inner, gates: Arc::default() }
    }

    pub fn calls(&self, name: &str) -> usize {
        self.inner.calls(name)
    }

    /// Lets every load started so far complete.
    pub fn release(&self) {
        for gate in self.gates.lock().unwrap().drain(..) {
            let _ = gate.send(());
        }
    }
}

impl TemplateLoader for GatedLoader {
    fn load(&self, name: &str) -> LoadFuture {
        let (sender, receiver) = oneshot::channel();
        self.gates.lock().unwrap().push(sender);
        let pending = self.inner.load(name);
        async move {
            let _ = receiver.await;
            pending.await
        }
        .boxed()
    }
}

/// Template printing a fixed string.
pub fn text(output: &'static str) -> CompiledTemplate {
    CompiledTemplate::new(move |_, _, _, _, _| Value::String(output.to_string()))
}

/// Template printing its whole context as JSON.
pub fn echo() -> CompiledTemplate {
    CompiledTemplate::new(|_, ctx, _, _, _| Value::String(ctx.to_string()))
}
