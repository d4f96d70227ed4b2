//! Session identity and observable status

use crate::error::StreamError;
use crate::state_machine::SessionState;
use std::fmt;
use ulid::Ulid;

/// Identity of one generation session
///
/// Every event is tagged with the session that produced it; events whose
/// session is no longer active are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(Ulid);

impl SessionId {
    /// Fresh id
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-session message accounting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestCounters {
    /// Messages that reached the graph model
    pub applied: u64,
    /// Malformed messages and events the model refused
    pub rejected: u64,
    /// Messages with an unhandled type
    pub ignored: u64,
}

impl IngestCounters {
    /// Messages seen in total
    #[inline]
    #[must_use]
    pub fn total(&self) -> u64 {
        self.applied + self.rejected + self.ignored
    }
}

/// Snapshot published to observers on every change
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestStatus {
    /// Current or most recent session
    pub session: Option<SessionId>,
    /// Query of that session
    pub query: Option<String>,
    /// Protocol state
    pub state: SessionState,
    /// True from start until close, failure or cancel
    pub is_generating: bool,
    /// Message accounting
    pub counters: IngestCounters,
    /// Error that ended the session, retained until the next start
    pub last_error: Option<StreamError>,
}

impl IngestStatus {
    /// Status of a session that has just been started
    #[must_use]
    pub fn connecting(session: SessionId, query: impl Into<String>) -> Self {
        Self {
            session: Some(session),
            query: Some(query.into()),
            state: SessionState::Connecting,
            is_generating: true,
            counters: IngestCounters::default(),
            last_error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[test]
    fn connecting_status() {
        let id = SessionId::new();
        let status = IngestStatus::connecting(id, "rust");
        assert!(status.is_generating);
        assert_eq!(status.state, SessionState::Connecting);
        assert_eq!(status.counters.total(), 0);
    }
}
