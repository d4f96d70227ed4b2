//! Roadmap Stream
//!
//! Ingests a streamed concept roadmap into a shared [`roadmap_graph::GraphModel`]:
//! - [`protocol`]: `meta` / `concept` / `edge` message decoding
//! - [`sse`]: incremental `text/event-stream` framing
//! - [`transport`]: the [`EventTransport`] seam and its HTTP implementation
//! - [`state_machine`]: `Idle → Connecting → Streaming → Closed | Errored`
//! - [`StreamIngestor`]: one live session at a time, stale events discarded
//!
//! Malformed messages are dropped and counted; only a transport failure ends
//! a session early.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod ingestor;
pub mod protocol;
pub mod session;
pub mod sse;
pub mod state_machine;
pub mod transport;

pub use error::{MessageError, StreamError, TransportFailure};
pub use ingestor::{StreamIngestor, DEFAULT_CHANNEL_CAPACITY};
pub use protocol::{parse_message, ConceptData, ConceptRecord, EdgeRecord, StreamEvent};
pub use session::{IngestCounters, IngestStatus, SessionId};
pub use sse::{SseDecoder, SseFrame};
pub use state_machine::{allowed_transitions, validate_transition, IllegalTransition, SessionState};
pub use transport::{EventTransport, GenerateRequest, HttpSseTransport, TransportEvent};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
