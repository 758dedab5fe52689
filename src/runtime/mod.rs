//! The template runtime: the primitives a compiled template calls back into.
//!
//! A compiled template is handed three functions alongside the helper table
//! and the render context:
//!
//! - [`guard`] turns `null` and empty sequences into an empty string
//! - [`iter`] walks a mapping or sequence and concatenates per-entry output
//! - [`helper`] runs a named helper, printing nothing if it is unknown or fails
//!
//! [`run`] executes a template once with these primitives.

pub mod escape;
mod primitives;
pub mod template;

pub use escape::{escape_helper, escape_html, ESCAPE_CHAR_MAP};
pub use primitives::{guard, helper, iter, run};
pub use template::{CompiledTemplate, Guard, HelperCall, Iter, TemplateFn};
