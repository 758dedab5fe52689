use crate::error::LoadError;
use crate::runtime::CompiledTemplate;
use futures::channel::oneshot;
use futures::future::BoxFuture;

/// Outcome of a load. `Ok(None)` means the loader had nothing for the name,
/// which renders as empty output rather than failing.
pub type LoadResult = Result<Option<CompiledTemplate>, LoadError>;

/// Pending load handed back by a [`TemplateLoader`].
pub type LoadFuture = BoxFuture<'static, LoadResult>;

/// Trait for producing compiled templates by name.
///
/// This is the single shape the runtime deals with. Callback-style and
/// future-style loader functions are adapted to it once, when they are
/// registered (see [`super::from_fn`], [`super::from_callback`] and
/// [`super::from_dual`]).
///
/// `load` is called synchronously on a cache miss, after the runtime has
/// reserved the slot for `name` and released its cache lock. It may call back
/// into the same runtime; a render of `name` issued from inside `load` waits
/// on the load being started.
pub trait TemplateLoader: Send + Sync {
    /// Starts loading the template called `name`.
    ///
    /// # Returns
    /// * `LoadFuture` - Resolves to the compiled template
    fn load(&self, name: &str) -> LoadFuture;
}

/// One-shot handle through which a callback-style loader delivers a template.
///
/// Dropping it without calling [`LoadCallback::call`] fails the load with
/// [`LoadError::Abandoned`].
#[derive(Debug)]
pub struct LoadCallback {
    sender: oneshot::Sender<Option<CompiledTemplate>>,
}

impl LoadCallback {
    pub(crate) fn channel() -> (Self, oneshot::Receiver<Option<CompiledTemplate>>) {
        let (sender, receiver) = oneshot::channel();
        (Self { sender }, receiver)
    }

    /// Delivers the loaded template, or `None` when there is nothing to render.
    pub fn call(self, template: impl Into<Option<CompiledTemplate>>) {
        // The receiving side is gone once another path already settled the load.
        let _ = self.sender.send(template.into());
    }
}
