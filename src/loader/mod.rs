//! Sources of compiled templates.
//!
//! The runtime talks to exactly one [`TemplateLoader`] at a time. Loader
//! functions in either calling convention are adapted here:
//!
//! - [`from_fn`]: `loader(name) -> future`
//! - [`from_callback`]: `loader(name, callback)`
//! - [`from_dual`]: `loader(name, callback) -> Option<future>`, either one settles
//!
//! [`MiniJinjaLoader`] compiles MiniJinja sources into templates.

mod function;
pub mod interface;
pub mod minijinja;

pub use function::{from_callback, from_dual, from_fn, CallbackLoader, DualLoader, FnLoader};
pub use interface::{LoadCallback, LoadFuture, LoadResult, TemplateLoader};
pub use self::minijinja::MiniJinjaLoader;
