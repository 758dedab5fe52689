//! The render orchestrator.
//!
//! [`Runtime`] owns everything a render needs: the helper table, the global
//! data, the registered loader and the template cache. A render merges the
//! global data with the per-call data, fetches the compiled template from
//! the cache (asking the loader on a miss), and runs it.
//!
//! Runtimes are independent: two `Runtime::new()` values share no state.
//! Cloning a runtime yields another handle to the same state.

use crate::cache::{CacheLookup, CachePolicy, TemplateCache};
use crate::config::Config;
use crate::constants::{legacy, ESCAPE_HELPER};
use crate::error::{Error, LoadError, Result};
use crate::helpers::{Helper, HelperError, HelperTable};
use crate::loader::{LoadFuture, TemplateLoader};
use crate::runtime::{escape_helper, run};
use futures::channel::oneshot;
use futures::FutureExt;
use log::{debug, error, warn};
use serde_json::{Map, Value};
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Render context: global data overlaid with per-call data.
pub type Context = Map<String, Value>;

/// Template runtime with its own helpers, globals, loader and cache.
///
/// # Example
///
/// ```rust
/// use benchpress::{loader, CompiledTemplate, Runtime};
/// use serde_json::{json, Value};
///
/// let runtime = Runtime::new();
/// runtime.set_global("site", json!("Docs"));
/// runtime.register_loader(loader::from_fn(|_: &str| async {
///     Ok(Some(CompiledTemplate::new(|_, ctx, _, _, _| {
///         Value::String(format!("{} / {}", ctx["site"].as_str().unwrap_or(""), ctx["page"].as_str().unwrap_or("")))
///     })))
/// }));
///
/// let output = futures::executor::block_on(runtime.render("title", json!({"page": "Intro"}), None)).unwrap();
/// assert_eq!(output, "Docs / Intro");
/// ```
#[derive(Clone)]
pub struct Runtime {
    inner: Arc<Inner>,
}

struct Inner {
    helpers: RwLock<HelperTable>,
    globals: RwLock<Context>,
    loader: RwLock<Option<Arc<dyn TemplateLoader>>>,
    cache: Mutex<TemplateCache>,
    cache_policy: CachePolicy,
}

impl Runtime {
    /// Creates a runtime with the default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a runtime from `config`.
    pub fn with_config(config: Config) -> Self {
        let mut helpers = HelperTable::new();
        if config.escape_helper {
            helpers.register(ESCAPE_HELPER, escape_helper);
        }

        Self {
            inner: Arc::new(Inner {
                helpers: RwLock::new(helpers),
                globals: RwLock::new(config.globals),
                loader: RwLock::new(None),
                cache: Mutex::new(TemplateCache::new()),
                cache_policy: config.cache_policy,
            }),
        }
    }

    /// Registers a helper under `name`. The last registration for a name wins.
    pub fn register_helper<F>(&self, name: impl Into<String>, helper: F)
    where
        F: Fn(&Value, &[Value]) -> Result<Value, HelperError> + Send + Sync + 'static,
    {
        write(&self.inner.helpers).register(name, helper);
    }

    /// Registers an already shared helper under `name`.
    pub fn register_helper_arc(&self, name: impl Into<String>, helper: Helper) {
        write(&self.inner.helpers).insert(name, helper);
    }

    /// Snapshot of the current helper table.
    pub fn helpers(&self) -> HelperTable {
        read(&self.inner.helpers).clone()
    }

    /// Sets a global value visible to every later render.
    pub fn set_global(&self, key: impl Into<String>, value: Value) {
        write(&self.inner.globals).insert(key.into(), value);
    }

    /// Returns the global data overlaid with `data`.
    ///
    /// Keys of `data` win. Only the top level is merged, and data that is not
    /// an object contributes nothing.
    pub fn add_globals(&self, data: impl Into<Option<Value>>) -> Context {
        let mut context = read(&self.inner.globals).clone();
        if let Some(Value::Object(data)) = data.into() {
            context.extend(data);
        }
        context
    }

    /// Replaces the loader. The previous one, if any, is discarded.
    pub fn register_loader<L>(&self, loader: L)
    where
        L: TemplateLoader + 'static,
    {
        *write(&self.inner.loader) = Some(Arc::new(loader));
    }

    /// Whether a loader has been registered.
    pub fn has_loader(&self) -> bool {
        read(&self.inner.loader).is_some()
    }

    /// Empties the template cache.
    ///
    /// Renders already waiting on a load are unaffected; the next render of
    /// any name asks the loader again.
    pub fn flush(&self) {
        let mut cache = lock(&self.inner.cache);
        debug!("Flushing {} cached template(s)", cache.len());
        cache.clear();
    }

    /// Whether a load for `name` is cached, pending or settled.
    pub fn is_cached(&self, name: &str) -> bool {
        lock(&self.inner.cache).contains(name)
    }

    /// Renders the template `name` with `data`, or only its block `block`.
    ///
    /// The cache slot for `name` is resolved before this returns: on a miss
    /// the loader is invoked right away, and renders issued while that load is
    /// pending share it. A missing block, or a loader that had nothing for
    /// `name`, renders as an empty string. An empty block name renders the
    /// whole template.
    ///
    /// # Arguments
    /// * `name` - Template name handed to the loader
    /// * `data` - Per-call data, overriding global data
    /// * `block` - Optional block of the template to render instead
    ///
    /// # Returns
    /// * `Future<Result<String>>` - Rendered output, the loader failure, or
    ///   [`Error::TemplateRenderError`] when the template panics
    pub fn render(
        &self,
        name: &str,
        data: impl Into<Option<Value>>,
        block: Option<&str>,
    ) -> impl Future<Output = Result<String>> + Send + 'static {
        let context = Value::Object(self.add_globals(data));
        let lookup = self.lookup(name);
        let inner = Arc::clone(&self.inner);
        let name = name.to_string();
        let block = block.filter(|block| !block.is_empty()).map(str::to_string);

        async move {
            let CacheLookup { generation, handle, .. } = lookup?;
            let loaded = match handle.await {
                Ok(loaded) => loaded,
                Err(source) => {
                    if inner.cache_policy == CachePolicy::EvictOnError
                        && lock(&inner.cache).evict(&name, generation)
                    {
                        debug!("Evicted failed load of '{name}'");
                    }
                    return Err(Error::TemplateLoadError { name, source });
                }
            };

            let Some(template) = loaded else {
                debug!("Loader returned no template for '{name}'");
                return Ok(String::new());
            };
            let template = match block.as_deref() {
                None => template,
                Some(block) => match template.block(block) {
                    Some(found) => found.clone(),
                    None => {
                        debug!("Template '{name}' has no block '{block}'");
                        return Ok(String::new());
                    }
                },
            };

            let helpers = read(&inner.helpers).clone();
            panic::catch_unwind(AssertUnwindSafe(|| run(&helpers, &context, &template))).map_err(
                |_| {
                    warn!("Template '{name}' panicked while rendering");
                    Error::TemplateRenderError { name }
                },
            )
        }
    }

    /// Resolves the cache slot for `name`, starting a load on a miss.
    ///
    /// The slot is reserved under the cache lock and the loader is invoked
    /// after the lock is released, so a loader may call back into this
    /// runtime from `load`.
    fn lookup(&self, name: &str) -> Result<CacheLookup> {
        let loader = read(&self.inner.loader)
            .clone()
            .ok_or_else(|| Error::LoaderNotRegisteredError { name: name.to_string() })?;

        let (deliver, delivered) = oneshot::channel::<LoadFuture>();
        let lookup = lock(&self.inner.cache).get_or_insert_with(name, || {
            async move {
                match delivered.await {
                    Ok(load) => load.await,
                    Err(_) => Err(LoadError::Abandoned),
                }
            }
            .boxed()
        });

        if lookup.hit {
            debug!("Template '{name}' served from cache");
        } else {
            debug!("Loading template '{name}'");
            let _ = deliver.send(loader.load(name));
        }
        Ok(lookup)
    }

    /// Callback flavor of [`Runtime::render`].
    ///
    /// Arguments are positional and loosely typed: when `callback` is
    /// [`ParseArg::None`], `block` holds data and `data` holds the callback,
    /// they are shifted into place. The callback must end up callable or an
    /// [`Error::InvalidArgumentsError`] is returned right away.
    ///
    /// An empty `name` calls back immediately with `""`. Otherwise the render
    /// runs on the current Tokio runtime and the callback is invoked after
    /// yielding once. A failed render is logged and the callback is not called.
    #[deprecated(note = "use `Runtime::render` instead")]
    pub fn parse(
        &self,
        name: &str,
        block: impl Into<ParseArg>,
        data: impl Into<ParseArg>,
        callback: impl Into<ParseArg>,
    ) -> Result<()> {
        let (mut block, mut data, mut callback) = (block.into(), data.into(), callback.into());
        if matches!(callback, ParseArg::None)
            && matches!(block, ParseArg::Data(_))
            && matches!(data, ParseArg::Callback(_))
        {
            callback = std::mem::replace(&mut data, ParseArg::None);
            data = std::mem::replace(&mut block, ParseArg::None);
        }

        let ParseArg::Callback(callback) = callback else {
            return Err(Error::InvalidArgumentsError(legacy::CALLBACK_NOT_CALLABLE.to_string()));
        };

        if name.is_empty() {
            callback(String::new());
            return Ok(());
        }

        let executor =
            tokio::runtime::Handle::try_current().map_err(|_| Error::NoExecutorError)?;

        let data = match data {
            ParseArg::Data(data) => Some(data),
            _ => None,
        };
        let rendering = match block {
            ParseArg::None => Some(self.render(name, data, None)),
            ParseArg::Block(block) => Some(self.render(name, data, Some(&block))),
            // Only a block name can select a block.
            ParseArg::Data(_) | ParseArg::Callback(_) => None,
        };

        executor.spawn(async move {
            let output = match rendering {
                Some(rendering) => rendering.await,
                None => Ok(String::new()),
            };
            match output {
                Ok(output) => {
                    tokio::task::yield_now().await;
                    callback(output);
                }
                Err(err) => error!("{err}"),
            }
        });
        Ok(())
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("helpers", &*read(&self.inner.helpers))
            .field("globals", &*read(&self.inner.globals))
            .field("has_loader", &self.has_loader())
            .field("cache", &*lock(&self.inner.cache))
            .field("cache_policy", &self.inner.cache_policy)
            .finish()
    }
}

/// Callback taking the rendered output, for [`Runtime::parse`].
pub type ParseCallback = Box<dyn FnOnce(String) + Send + 'static>;

/// One positional argument of [`Runtime::parse`].
pub enum ParseArg {
    /// Argument not given.
    None,
    /// Name of the block to render.
    Block(String),
    /// Render data.
    Data(Value),
    /// Callback receiving the output.
    Callback(ParseCallback),
}

impl ParseArg {
    /// Wraps a closure as a [`ParseArg::Callback`].
    pub fn callback<F>(callback: F) -> Self
    where
        F: FnOnce(String) + Send + 'static,
    {
        ParseArg::Callback(Box::new(callback))
    }
}

impl From<&str> for ParseArg {
    fn from(block: &str) -> Self {
        ParseArg::Block(block.to_string())
    }
}

impl From<String> for ParseArg {
    fn from(block: String) -> Self {
        ParseArg::Block(block)
    }
}

impl From<Value> for ParseArg {
    fn from(data: Value) -> Self {
        ParseArg::Data(data)
    }
}

impl<T: Into<ParseArg>> From<Option<T>> for ParseArg {
    fn from(arg: Option<T>) -> Self {
        arg.map_or(ParseArg::None, Into::into)
    }
}

impl std::fmt::Debug for ParseArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseArg::None => f.write_str("None"),
            ParseArg::Block(block) => f.debug_tuple("Block").field(block).finish(),
            ParseArg::Data(data) => f.debug_tuple("Data").field(data).finish(),
            ParseArg::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
