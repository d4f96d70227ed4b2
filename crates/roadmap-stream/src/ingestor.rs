//! Stream ingestor
//!
//! Runs at most one session at a time. Each session is two tasks joined by
//! an mpsc channel:
//! - the producer drives an [`EventTransport`]
//! - the consumer applies events to the shared graph, one message at a time
//!
//! Starting or cancelling aborts both tasks. Because an aborted task only
//! stops at its next await point, every event is checked against the active
//! session id under the graph write lock before it is applied; anything from
//! a superseded session is discarded.
//!
//! Lock order is graph, then active session.

use crate::error::{MessageError, StreamError};
use crate::protocol::{parse_message, StreamEvent};
use crate::session::{IngestStatus, SessionId};
use crate::state_machine::{validate_transition, SessionState};
use crate::transport::{EventTransport, GenerateRequest, TransportEvent};
use parking_lot::Mutex;
use roadmap_graph::SharedGraph;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Default capacity of the transport event channel
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

const APPLIED_TOTAL: &str = "roadmap_stream_events_applied_total";
const REJECTED_TOTAL: &str = "roadmap_stream_events_rejected_total";
const IGNORED_TOTAL: &str = "roadmap_stream_events_ignored_total";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

#[derive(Debug)]
enum Outcome {
    Applied,
    Rejected(MessageError),
    Ignored(String),
}

/// State reachable from the consumer task
struct Shared {
    graph: SharedGraph,
    active: Mutex<Option<SessionId>>,
    status: watch::Sender<IngestStatus>,
}

impl Shared {
    /// Move the published state forward; caller holds the active lock
    fn advance(&self, session: SessionId, to: SessionState) -> bool {
        self.status.send_if_modified(|status| match validate_transition(status.state, to) {
            Ok(()) => {
                tracing::info!(session = %session, from = ?status.state, to = ?to, "session state changed");
                status.state = to;
                true
            }
            Err(err) => {
                tracing::debug!(session = %session, %err, "transition ignored");
                false
            }
        })
    }

    fn open(&self, session: SessionId) -> Flow {
        let active = self.active.lock();
        if *active != Some(session) {
            return Flow::Stop;
        }
        self.advance(session, SessionState::Streaming);
        Flow::Continue
    }

    fn ingest(&self, session: SessionId, text: &str) -> Flow {
        let parsed = parse_message(text);

        let mut graph = self.graph.write();
        let active = self.active.lock();
        if *active != Some(session) {
            tracing::debug!(session = %session, "dropping event from superseded session");
            return Flow::Stop;
        }

        let state = self.status.borrow().state;
        match state {
            SessionState::Streaming => {}
            // Some transports never report the open explicitly.
            SessionState::Connecting => {
                self.advance(session, SessionState::Streaming);
            }
            _ => return Flow::Stop,
        }

        let outcome = match parsed {
            Ok(StreamEvent::Meta { id }) => {
                tracing::debug!(session = %session, remote_id = %id, "remote id assigned");
                graph.set_remote_id(Some(id));
                Outcome::Applied
            }
            Ok(StreamEvent::Concept(patch)) => match graph.apply_node(patch) {
                Ok(_) => Outcome::Applied,
                Err(err) => Outcome::Rejected(err.into()),
            },
            Ok(StreamEvent::Edge(patch)) => match graph.apply_edge(patch) {
                Ok(_) => Outcome::Applied,
                Err(err) => Outcome::Rejected(err.into()),
            },
            Ok(StreamEvent::Ignored { kind }) => Outcome::Ignored(kind),
            Err(err) => Outcome::Rejected(err),
        };
        drop(graph);

        self.record(session, outcome);
        Flow::Continue
    }

    fn record(&self, session: SessionId, outcome: Outcome) {
        match outcome {
            Outcome::Applied => {
                metrics::counter!(APPLIED_TOTAL).increment(1);
                self.status.send_modify(|s| s.counters.applied += 1);
            }
            Outcome::Rejected(err) => {
                tracing::warn!(session = %session, error = %err, "message rejected");
                metrics::counter!(REJECTED_TOTAL).increment(1);
                self.status.send_modify(|s| s.counters.rejected += 1);
            }
            Outcome::Ignored(kind) => {
                tracing::debug!(session = %session, kind = %kind, "message type ignored");
                metrics::counter!(IGNORED_TOTAL).increment(1);
                self.status.send_modify(|s| s.counters.ignored += 1);
            }
        }
    }

    fn finish(&self, session: SessionId, error: Option<StreamError>) -> Flow {
        let mut active = self.active.lock();
        if *active != Some(session) {
            return Flow::Stop;
        }
        *active = None;

        let to = if error.is_some() {
            SessionState::Errored
        } else {
            SessionState::Closed
        };
        self.advance(session, to);
        self.status.send_modify(|status| {
            status.is_generating = false;
            if let Some(err) = error {
                tracing::warn!(session = %session, error = %err, rate_limited = err.is_rate_limited(), "session failed");
                status.last_error = Some(err);
            }
            tracing::info!(
                session = %session,
                applied = status.counters.applied,
                rejected = status.counters.rejected,
                ignored = status.counters.ignored,
                "session finished"
            );
        });
        Flow::Stop
    }
}

async fn consume(shared: Arc<Shared>, session: SessionId, mut events: mpsc::Receiver<TransportEvent>) {
    while let Some(event) = events.recv().await {
        let flow = match event {
            TransportEvent::Opened => shared.open(session),
            TransportEvent::Message(text) => shared.ingest(session, &text),
            TransportEvent::Closed => shared.finish(session, None),
            TransportEvent::Failed(failure) => shared.finish(session, Some(failure.into())),
        };
        if flow == Flow::Stop {
            return;
        }
    }
    // Producer went away without a terminal event.
    shared.finish(session, None);
}

struct SessionTasks {
    producer: JoinHandle<()>,
    consumer: JoinHandle<()>,
}

impl SessionTasks {
    fn abort(self) {
        self.producer.abort();
        self.consumer.abort();
    }
}

/// Applies one stream session at a time to a shared graph
pub struct StreamIngestor {
    shared: Arc<Shared>,
    transport: Arc<dyn EventTransport>,
    tasks: Mutex<Option<SessionTasks>>,
    channel_capacity: usize,
}

impl std::fmt::Debug for StreamIngestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamIngestor")
            .field("status", &*self.shared.status.borrow())
            .field("channel_capacity", &self.channel_capacity)
            .finish_non_exhaustive()
    }
}

impl StreamIngestor {
    /// Create an idle ingestor writing into `graph`
    #[must_use]
    pub fn new(graph: SharedGraph, transport: Arc<dyn EventTransport>) -> Self {
        let (status, _) = watch::channel(IngestStatus::default());
        Self {
            shared: Arc::new(Shared {
                graph,
                active: Mutex::new(None),
                status,
            }),
            transport,
            tasks: Mutex::new(None),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// With event channel capacity (at least 1)
    #[inline]
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Graph this ingestor writes into
    #[inline]
    #[must_use]
    pub fn graph(&self) -> &SharedGraph {
        &self.shared.graph
    }

    /// Subscribe to status changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<IngestStatus> {
        self.shared.status.subscribe()
    }

    /// Current status
    #[must_use]
    pub fn status(&self) -> IngestStatus {
        self.shared.status.borrow().clone()
    }

    /// Whether a session is generating
    #[must_use]
    pub fn is_generating(&self) -> bool {
        self.shared.status.borrow().is_generating
    }

    /// Session whose events are currently accepted
    #[must_use]
    pub fn active_session(&self) -> Option<SessionId> {
        *self.shared.active.lock()
    }

    /// Start a new session, superseding any previous one
    ///
    /// Clears the graph and records the query as its topic. Must be called
    /// from within a tokio runtime.
    ///
    /// # Errors
    /// `StreamError::EmptyQuery` when the query is blank; nothing changes.
    pub fn start(&self, request: GenerateRequest) -> Result<SessionId, StreamError> {
        let query = request.query.trim().to_string();
        if query.is_empty() {
            return Err(StreamError::EmptyQuery);
        }

        self.abort_tasks();
        let session = SessionId::new();
        {
            let mut graph = self.shared.graph.write();
            let mut active = self.shared.active.lock();
            if let Some(previous) = active.replace(session) {
                tracing::info!(session = %previous, superseded_by = %session, "session superseded");
            }
            graph.reset();
            graph.set_topic_query(Some(query.clone()));
            self.shared.status.send_replace(IngestStatus::connecting(session, query.clone()));
        }

        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let transport = Arc::clone(&self.transport);
        let request = GenerateRequest { query, ..request };
        let producer = tokio::spawn(async move { transport.run(request, tx).await });
        let consumer = tokio::spawn(consume(Arc::clone(&self.shared), session, rx));
        *self.tasks.lock() = Some(SessionTasks { producer, consumer });

        tracing::info!(session = %session, "session started");
        Ok(session)
    }

    /// Stop the current session and force `Closed`
    ///
    /// Idempotent. The graph keeps whatever was applied so far.
    pub fn cancel(&self) {
        self.abort_tasks();

        let _graph = self.shared.graph.write();
        let mut active = self.shared.active.lock();
        let previous = active.take();
        self.shared.status.send_if_modified(|status| {
            let changed = status.state != SessionState::Closed || status.is_generating;
            status.state = SessionState::Closed;
            status.is_generating = false;
            changed
        });
        if let Some(session) = previous {
            tracing::info!(session = %session, "session cancelled");
        }
    }

    /// Wait until no session is generating and return the final status
    pub async fn wait_until_finished(&self) -> IngestStatus {
        let mut rx = self.subscribe();
        let finished = rx.wait_for(|status| !status.is_generating).await.map(|s| s.clone());
        finished.unwrap_or_else(|_| self.status())
    }

    fn abort_tasks(&self) {
        if let Some(tasks) = self.tasks.lock().take() {
            tasks.abort();
        }
    }
}

impl Drop for StreamIngestor {
    fn drop(&mut self) {
        self.abort_tasks();
    }
}
