//! Constants used throughout the runtime

/// Name under which the HTML escape helper is registered
pub const ESCAPE_HELPER: &str = "__escape";

/// Config file extensions understood by [`crate::config::Config::load`]
pub const CONFIG_EXTENSIONS: &[&str] = &["json", "yaml", "yml"];

/// Legacy callback API messages
pub mod legacy {
    pub const CALLBACK_NOT_CALLABLE: &str = "callback must be a function";
}
