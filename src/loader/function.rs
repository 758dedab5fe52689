use super::interface::{LoadCallback, LoadFuture, LoadResult, TemplateLoader};
use crate::error::LoadError;
use futures::future::{self, Either, FutureExt};
use std::future::Future;

/// Loader backed by a function returning a future.
pub struct FnLoader<F> {
    func: F,
}

/// Loader backed by a function that reports through a [`LoadCallback`].
pub struct CallbackLoader<F> {
    func: F,
}

/// Loader backed by a function that may use either convention per call.
///
/// The function receives a [`LoadCallback`] and may also return a future.
/// When it returns one, whichever of the callback and the future settles
/// first decides the load. When it returns `None`, the callback does.
pub struct DualLoader<F> {
    func: F,
}

/// Adapts a future-returning function into a [`TemplateLoader`].
///
/// # Example
///
/// ```rust
/// use benchpress::loader::{self, TemplateLoader};
/// use benchpress::CompiledTemplate;
/// use serde_json::Value;
///
/// let loader = loader::from_fn(|name: &str| {
///     let name = name.to_string();
///     async move {
///         Ok(Some(CompiledTemplate::new(move |_, _, _, _, _| Value::String(name.clone()))))
///     }
/// });
/// let _pending = loader.load("header");
/// ```
pub fn from_fn<F, Fut>(func: F) -> FnLoader<F>
where
    F: Fn(&str) -> Fut + Send + Sync,
    Fut: Future<Output = LoadResult> + Send + 'static,
{
    FnLoader { func }
}

/// Adapts a callback-style function into a [`TemplateLoader`].
pub fn from_callback<F>(func: F) -> CallbackLoader<F>
where
    F: Fn(&str, LoadCallback) + Send + Sync,
{
    CallbackLoader { func }
}

/// Adapts a function supporting both conventions into a [`TemplateLoader`].
pub fn from_dual<F>(func: F) -> DualLoader<F>
where
    F: Fn(&str, LoadCallback) -> Option<LoadFuture> + Send + Sync,
{
    DualLoader { func }
}

impl<F, Fut> TemplateLoader for FnLoader<F>
where
    F: Fn(&str) -> Fut + Send + Sync,
    Fut: Future<Output = LoadResult> + Send + 'static,
{
    fn load(&self, name: &str) -> LoadFuture {
        (self.func)(name).boxed()
    }
}

impl<F> TemplateLoader for CallbackLoader<F>
where
    F: Fn(&str, LoadCallback) + Send + Sync,
{
    fn load(&self, name: &str) -> LoadFuture {
        let (callback, receiver) = LoadCallback::channel();
        (self.func)(name, callback);
        receiver.map(|delivered| delivered.map_err(|_| LoadError::Abandoned)).boxed()
    }
}

impl<F> TemplateLoader for DualLoader<F>
where
    F: Fn(&str, LoadCallback) -> Option<LoadFuture> + Send + Sync,
{
    fn load(&self, name: &str) -> LoadFuture {
        let (callback, receiver) = LoadCallback::channel();
        let Some(pending) = (self.func)(name, callback) else {
            return receiver
                .map(|delivered| delivered.map_err(|_| LoadError::Abandoned))
                .boxed();
        };

        async move {
            match future::select(pending, receiver).await {
                Either::Left((result, _)) => result,
                Either::Right((Ok(template), _)) => Ok(template),
                // Callback dropped unused: the returned future decides.
                Either::Right((Err(_), pending)) => pending.await,
            }
        }
        .boxed()
    }
}
