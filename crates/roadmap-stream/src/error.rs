//! Error types for stream ingestion
//!
//! Two families:
//! - [`MessageError`]: one message could not be turned into an event. The
//!   message is dropped and counted; the session carries on.
//! - [`StreamError`]: the session itself ended badly. Retained on the
//!   session status until the next start.

use roadmap_graph::ValidationError;

/// Failure reported by a transport
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}{}", status_prefix(.status), .message)]
pub struct TransportFailure {
    /// HTTP status, when the server answered
    pub status: Option<u16>,
    /// Response body or client error text
    pub message: String,
}

impl TransportFailure {
    /// Failure without an HTTP status (connect, read, decode)
    #[inline]
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    /// Non-2xx response
    #[inline]
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: body.into(),
        }
    }

    /// HTTP 429, or a message carrying a rate-limit marker
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        if self.status == Some(429) {
            return true;
        }
        let lower = self.message.to_lowercase();
        lower.contains("429") || lower.contains("rate limit")
    }
}

fn status_prefix(status: &Option<u16>) -> String {
    status.map(|s| format!("HTTP {s}: ")).unwrap_or_default()
}

impl From<reqwest::Error> for TransportFailure {
    fn from(err: reqwest::Error) -> Self {
        Self {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

/// Terminal session error, or a refused start
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// The server refused because of rate limiting
    #[error("rate limited: {0}")]
    RateLimited(TransportFailure),

    /// Network failure or non-2xx response
    #[error("transport failed: {0}")]
    Transport(TransportFailure),

    /// Blank query
    #[error("query must not be empty")]
    EmptyQuery,
}

impl StreamError {
    /// Check if this is a rate-limit failure
    #[inline]
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }

    /// Check if starting again may succeed without changing the request
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited(_) => true,
            Self::Transport(failure) => failure.status.map_or(true, |s| s >= 500),
            Self::EmptyQuery => false,
        }
    }

    /// Underlying transport failure
    #[must_use]
    pub fn failure(&self) -> Option<&TransportFailure> {
        match self {
            Self::RateLimited(f) | Self::Transport(f) => Some(f),
            Self::EmptyQuery => None,
        }
    }
}

impl From<TransportFailure> for StreamError {
    fn from(failure: TransportFailure) -> Self {
        if failure.is_rate_limited() {
            Self::RateLimited(failure)
        } else {
            Self::Transport(failure)
        }
    }
}

/// A single message that could not be applied
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    /// Body is not JSON, or a field has the wrong shape
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),

    /// A required field is absent
    #[error("{kind} event has no {field}")]
    MissingField {
        /// Event type
        kind: &'static str,
        /// Missing field
        field: &'static str,
    },

    /// Graph model rejected the event
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}
