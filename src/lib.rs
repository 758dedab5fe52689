//! # benchpress
//!
//! Runtime for precompiled HTML templates. A template compiler (external to
//! this crate) turns template source into a callable; this crate executes
//! that callable against data, with named helpers, global data, built-in HTML
//! escaping, and a cached asynchronous loader.
//!
//! ```rust
//! use benchpress::{loader, CompiledTemplate, Runtime};
//! use serde_json::{json, Value};
//!
//! let runtime = Runtime::new();
//! runtime.register_helper("upper", |_, args| {
//!     Ok(json!(args[0].as_str().unwrap_or_default().to_uppercase()))
//! });
//! runtime.register_loader(loader::from_fn(|_: &str| async {
//!     Ok(Some(CompiledTemplate::new(|helpers, ctx, _guard, iter, helper| {
//!         let items = iter(&ctx["items"], &mut |_, _, _, item| {
//!             format!("<li>{}</li>", helper(ctx, helpers, "__escape", &[item.clone()]))
//!         });
//!         Value::String(format!("{}<ul>{items}</ul>", helper(ctx, helpers, "upper", &[ctx["title"].clone()])))
//!     })))
//! }));
//!
//! let html = futures::executor::block_on(
//!     runtime.render("list", json!({"title": "groceries", "items": ["a<b", "c"]}), None),
//! )
//! .unwrap();
//! assert_eq!(html, "GROCERIES<ul><li>a&lt;b</li><li>c</li></ul>");
//! ```

/// Template cache with one shared load per template name.
pub mod cache;

/// Runtime configuration.
pub mod config;

/// Names and defaults.
pub mod constants;

/// Defines custom error types.
pub mod error;

/// Named helper functions.
pub mod helpers;

/// An abstraction that allows implementing a source for compiled templates.
pub mod loader;

/// Render orchestration.
pub mod render;

/// Primitives compiled templates call back into.
pub mod runtime;

/// Truthiness and printing of template data.
pub mod value;

pub use cache::CachePolicy;
pub use config::Config;
pub use error::{Error, LoadError, Result};
pub use helpers::{Helper, HelperError, HelperTable};
pub use loader::{LoadCallback, MiniJinjaLoader, TemplateLoader};
pub use render::{Context, ParseArg, ParseCallback, Runtime};
pub use runtime::{escape_html, guard, helper, iter, run, CompiledTemplate};
