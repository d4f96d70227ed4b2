//! Error types for the roadmap workspace
//!
//! Provides error handling for:
//! - Saved-roadmap API calls
//! - Configuration and preference files
//! - Workspace operations that wrap the above

use roadmap_layout::LayoutConfigError;
use roadmap_stream::{StreamError, TransportFailure};
use std::path::PathBuf;

/// Persistence failures
///
/// A failed save never changes the graph's recorded remote id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    /// Server answered with a non-2xx status
    #[error("API Error {status}: {body}")]
    Api {
        /// HTTP status
        status: u16,
        /// Response body
        body: String,
    },

    /// Request never got a response
    #[error("network error: {0}")]
    Network(String),

    /// Response body could not be decoded
    #[error("invalid response: {0}")]
    Decode(String),

    /// A stream session is still writing to the graph
    #[error("roadmap is still generating")]
    StillGenerating,
}

impl PersistenceError {
    /// Check if the same call may succeed later
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::Network(_) | Self::StillGenerating => true,
            Self::Decode(_) => false,
        }
    }

    /// Check if the roadmap does not exist (or is not visible to the caller)
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }

    /// Check if the server wants credentials
    #[inline]
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status: 401 | 403, .. })
    }
}

impl From<reqwest::Error> for PersistenceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// File is not valid TOML for this schema
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A URL setting is not http(s)
    #[error("{field} must be an http(s) URL, got {value:?}")]
    InvalidUrl {
        /// Setting name
        field: &'static str,
        /// Offending value
        value: String,
    },

    /// Layout section is invalid
    #[error(transparent)]
    Layout(#[from] LayoutConfigError),
}

/// User preference file errors
#[derive(Debug, thiserror::Error)]
pub enum PrefsError {
    /// Read or write failed
    #[error("preferences file {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// File content is not valid JSON
    #[error("invalid preferences file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Workspace errors
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    /// Generation could not start
    #[error("stream error: {0}")]
    Stream(#[from] StreamError),

    /// Saved-roadmap call failed
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// HTTP client could not be built
    #[error("transport setup failed: {0}")]
    Transport(#[from] TransportFailure),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl WorkspaceError {
    /// Check if retrying the operation may succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Stream(err) => err.is_retryable(),
            Self::Persistence(err) => err.is_retryable(),
            Self::Transport(_) | Self::Config(_) => false,
        }
    }
}
