//! Session state machine
//!
//! ```text
//! Idle ──► Connecting ──► Streaming ──► Closed
//!              │              │
//!              └──────────────┴───────► Errored
//! ```
//!
//! A finished session (`Closed` or `Errored`) may be restarted, which moves
//! it back to `Connecting`. Cancellation bypasses the table: it forces
//! `Closed` from any state.

use serde::Serialize;
use std::fmt;

/// Lifecycle state of a stream session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Nothing started yet
    #[default]
    Idle,
    /// Request sent, waiting for the stream to open
    Connecting,
    /// Receiving events
    Streaming,
    /// Ended normally or cancelled
    Closed,
    /// Ended by a transport failure
    Errored,
}

impl SessionState {
    /// Every state, for exhaustive checks
    pub const ALL: [Self; 5] = [
        Self::Idle,
        Self::Connecting,
        Self::Streaming,
        Self::Closed,
        Self::Errored,
    ];

    /// Whether the session is still attached to a transport
    #[inline]
    #[must_use]
    pub fn is_live(self) -> bool {
        matches!(self, Self::Connecting | Self::Streaming)
    }

    /// Whether the session reached an end state
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Errored)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Streaming => "streaming",
            Self::Closed => "closed",
            Self::Errored => "errored",
        };
        f.write_str(name)
    }
}

/// Transition not in the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal session transition {from} -> {to}")]
pub struct IllegalTransition {
    /// Current state
    pub from: SessionState,
    /// Requested state
    pub to: SessionState,
}

/// Validate a state transition
///
/// # Errors
/// Returns `IllegalTransition` when `to` is not reachable from `from`.
pub fn validate_transition(from: SessionState, to: SessionState) -> Result<(), IllegalTransition> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(IllegalTransition { from, to })
    }
}

/// States reachable in one step from `from`
#[must_use]
pub fn allowed_transitions(from: SessionState) -> &'static [SessionState] {
    use SessionState::{Closed, Connecting, Errored, Idle, Streaming};
    match from {
        Idle | Closed | Errored => &[Connecting],
        Connecting => &[Streaming, Closed, Errored],
        Streaming => &[Closed, Errored],
    }
}
