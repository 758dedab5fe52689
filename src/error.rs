use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}.")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse JSON config. Original error: {0}")]
    JsonConfigError(#[from] serde_json::Error),

    #[error("Failed to parse YAML config. Original error: {0}")]
    YamlConfigError(#[from] serde_yaml::Error),

    #[error("Unsupported config file '{path}'. Expected one of: {extensions}.")]
    UnsupportedConfigError { path: String, extensions: String },

    /// The loader failed to produce the template. Every render waiting on the
    /// same load receives this error.
    #[error("Failed to load template '{name}'. Original error: {source}")]
    TemplateLoadError {
        name: String,
        #[source]
        source: LoadError,
    },

    /// The compiled template panicked while rendering.
    #[error("Template '{name}' panicked while rendering.")]
    TemplateRenderError { name: String },

    #[error("Cannot load template '{name}': no loader registered.")]
    LoaderNotRegisteredError { name: String },

    #[error("Invalid Arguments: {0}")]
    InvalidArgumentsError(String),

    #[error("Cannot schedule the render: not running inside a Tokio runtime.")]
    NoExecutorError,
}

/// Failure reported by a loader.
///
/// Cloneable because a single load outcome is shared by every render that
/// requested the template while it was in flight.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("{0}")]
    Failed(String),

    /// The loader dropped its callback without ever calling it.
    #[error("loader dropped the callback without providing a template")]
    Abandoned,
}

impl LoadError {
    pub fn failed(message: impl std::fmt::Display) -> Self {
        LoadError::Failed(message.to_string())
    }
}

impl From<anyhow::Error> for LoadError {
    fn from(err: anyhow::Error) -> Self {
        LoadError::Failed(format!("{err:#}"))
    }
}

impl From<minijinja::Error> for LoadError {
    fn from(err: minijinja::Error) -> Self {
        LoadError::Failed(err.to_string())
    }
}

/// Convenience type alias for Results with the crate error as the error type.
///
/// # Type Parameters
/// * `T` - The type of the success value
pub type Result<T, E = Error> = std::result::Result<T, E>;
