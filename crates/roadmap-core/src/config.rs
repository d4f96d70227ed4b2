//! Client configuration
//!
//! Resolution order: defaults, then an optional TOML file, then environment
//! variables, then whatever the caller sets with the `with_*` builders.

use crate::error::ConfigError;
use roadmap_layout::LayoutConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding [`ClientConfig::stream_base_url`]
pub const ENV_STREAM_URL: &str = "ROADMAP_STREAM_URL";
/// Environment variable overriding [`ClientConfig::persistence_base_url`]
pub const ENV_API_URL: &str = "ROADMAP_API_URL";
/// Environment variable overriding [`ClientConfig::access_token`]
pub const ENV_ACCESS_TOKEN: &str = "ROADMAP_ACCESS_TOKEN";
/// Environment variable overriding [`ClientConfig::user_api_key`]
pub const ENV_USER_API_KEY: &str = "ROADMAP_USER_API_KEY";

/// Client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the generation service (`/api/generate` is appended)
    pub stream_base_url: String,
    /// Base URL of the saved-roadmap API (`/roadmaps` is appended)
    pub persistence_base_url: String,
    /// Bearer token for both services
    pub access_token: Option<String>,
    /// Caller's own model API key, forwarded to the generation service
    pub user_api_key: Option<String>,
    /// Timeout for persistence calls and for connecting the stream
    pub request_timeout_secs: u64,
    /// Layout parameters
    pub layout: LayoutConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            stream_base_url: "http://localhost:8000".to_string(),
            persistence_base_url: "http://localhost:8000/api".to_string(),
            access_token: None,
            user_api_key: None,
            request_timeout_secs: 30,
            layout: LayoutConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With generation service URL
    #[inline]
    #[must_use]
    pub fn with_stream_base_url(mut self, url: impl Into<String>) -> Self {
        self.stream_base_url = url.into();
        self
    }

    /// With saved-roadmap API URL
    #[inline]
    #[must_use]
    pub fn with_persistence_base_url(mut self, url: impl Into<String>) -> Self {
        self.persistence_base_url = url.into();
        self
    }

    /// With bearer token
    #[inline]
    #[must_use]
    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token;
        self
    }

    /// With user API key
    #[inline]
    #[must_use]
    pub fn with_user_api_key(mut self, key: Option<String>) -> Self {
        self.user_api_key = key;
        self
    }

    /// With layout parameters
    #[inline]
    #[must_use]
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    /// Request timeout as a duration
    #[inline]
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Parse a TOML document; missing keys keep their defaults
    ///
    /// # Errors
    /// `ConfigError::Parse` on invalid TOML or mistyped values.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Defaults, then `path` if given, then the environment
    ///
    /// # Errors
    /// Read, parse or validation failures.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&content)?
            }
            None => Self::default(),
        };
        let config = config.apply_env_from(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup
    #[must_use]
    pub fn apply_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = get(ENV_STREAM_URL) {
            self.stream_base_url = url;
        }
        if let Some(url) = get(ENV_API_URL) {
            self.persistence_base_url = url;
        }
        if let Some(token) = get(ENV_ACCESS_TOKEN) {
            self.access_token = Some(token);
        }
        if let Some(key) = get(ENV_USER_API_KEY) {
            self.user_api_key = Some(key);
        }
        self
    }

    /// Check URLs and layout dimensions
    ///
    /// # Errors
    /// The first invalid setting found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_url("stream_base_url", &self.stream_base_url)?;
        check_url("persistence_base_url", &self.persistence_base_url)?;
        self.layout.validate()?;
        Ok(())
    }
}

fn check_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidUrl {
            field,
            value: value.to_string(),
        })
    }
}
