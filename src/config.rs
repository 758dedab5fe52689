//! Runtime configuration loading

use crate::cache::CachePolicy;
use crate::constants::CONFIG_EXTENSIONS;
use crate::error::{Error, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

/// Settings a [`crate::Runtime`] is built from.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Register the `__escape` helper on construction
    pub escape_helper: bool,
    /// What to do with cache entries whose load failed
    pub cache_policy: CachePolicy,
    /// Initial global data, merged under every render's data
    pub globals: Map<String, Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            escape_helper: true,
            cache_policy: CachePolicy::default(),
            globals: Map::new(),
        }
    }
}

impl Config {
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Loads a config file, picking the format from its extension.
    ///
    /// # Arguments
    /// * `path` - Path to a `.json`, `.yaml` or `.yml` file
    ///
    /// # Returns
    /// * `Result<Config>` - Parsed configuration
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or_default();
        if !CONFIG_EXTENSIONS.contains(&extension) {
            return Err(Error::UnsupportedConfigError {
                path: path.display().to_string(),
                extensions: CONFIG_EXTENSIONS.join(", "),
            });
        }

        let content = std::fs::read_to_string(path)?;
        match extension {
            "json" => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }
}
