use crate::constants;
use crate::error::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Runtime configuration, loaded from an optional `config.toml`.
///
/// Every field has a default, so running without a config file works out of
/// the box against the public Open Food Facts API.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub search_base: String,
    pub product_base: String,
    /// Timeout for keyword searches, in seconds.
    pub search_timeout_seconds: u64,
    /// Timeout for single-barcode lookups, in seconds.
    pub lookup_timeout_seconds: u64,
    /// How long cached responses stay valid, in minutes. Zero disables caching.
    pub cache_ttl_minutes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            search_base: constants::API_SEARCH_BASE.to_string(),
            product_base: constants::API_PRODUCT_BASE.to_string(),
            search_timeout_seconds: 15,
            lookup_timeout_seconds: 10,
            cache_ttl_minutes: 30,
        }
    }
}

impl Config {
    /// Load `config.toml` from the working directory, falling back to
    /// defaults when the file does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from("config.toml")
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        if !path.as_ref().exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
