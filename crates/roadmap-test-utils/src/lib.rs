//! Testing utilities for the roadmap workspace
//!
//! Scripted transports, an in-memory saved-roadmap store, message fixtures
//! and a canned-response HTTP server for the real clients.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use roadmap_core::{NewRoadmap, PersistenceError, RoadmapDocument, RoadmapStore, RoadmapSummary, RoadmapUpdate};
use roadmap_graph::RoadmapId;
use roadmap_stream::{EventTransport, GenerateRequest, TransportEvent, TransportFailure};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

pub const CREATED_AT: &str = "2025-01-01T00:00:00";

// ---------------------------------------------------------------------------
// Message fixtures
// ---------------------------------------------------------------------------

pub fn meta(id: &str) -> String {
    format!(r#"{{"type":"meta","id":"{id}"}}"#)
}

pub fn concept(id: &str, label: &str) -> String {
    format!(r#"{{"type":"concept","id":"{id}","data":{{"label":"{label}"}}}}"#)
}

pub fn edge(id: &str, source: &str, target: &str) -> String {
    format!(r#"{{"type":"edge","id":"{id}","source":"{source}","target":"{target}"}}"#)
}

pub fn msg(text: impl Into<String>) -> Step {
    Step::Emit(TransportEvent::Message(text.into()))
}

/// meta g1, concepts n1 and n2, edge n1 -> n2, closed
pub fn scenario_steps() -> Vec<Step> {
    vec![
        Step::Emit(TransportEvent::Opened),
        msg(meta("g1")),
        msg(concept("n1", "Basics")),
        msg(concept("n2", "Advanced")),
        msg(edge("e1", "n1", "n2")),
        Step::Emit(TransportEvent::Closed),
    ]
}

pub fn rate_limited_steps() -> Vec<Step> {
    vec![Step::Emit(TransportEvent::Failed(TransportFailure::http(
        429,
        "Rate limit exceeded. Add your own API key.",
    )))]
}

// ---------------------------------------------------------------------------
// Scripted transport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Step {
    Emit(TransportEvent),
    Sleep(Duration),
    /// Never finish; the session stays open until cancelled or superseded
    Hang,
}

/// Plays a per-query script of transport events
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    scripts: HashMap<String, Vec<Step>>,
    fallback: Vec<Step>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script played for every query without its own
    pub fn with_default(mut self, steps: Vec<Step>) -> Self {
        self.fallback = steps;
        self
    }

    pub fn with_script(mut self, query: &str, steps: Vec<Step>) -> Self {
        self.scripts.insert(query.to_string(), steps);
        self
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl EventTransport for ScriptedTransport {
    async fn run(&self, request: GenerateRequest, events: mpsc::Sender<TransportEvent>) {
        let steps = self
            .scripts
            .get(&request.query)
            .unwrap_or(&self.fallback)
            .clone();
        self.requests.lock().push(request);

        for step in steps {
            match step {
                Step::Emit(event) => {
                    if events.send(event).await.is_err() {
                        return;
                    }
                }
                Step::Sleep(duration) => tokio::time::sleep(duration).await,
                Step::Hang => std::future::pending::<()>().await,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    List,
    Get(RoadmapId),
    Create(String),
    Update(RoadmapId),
    Delete(RoadmapId),
}

/// Saved-roadmap store behaving like the REST API, kept in memory
#[derive(Debug, Default)]
pub struct InMemoryRoadmapStore {
    roadmaps: Mutex<Vec<RoadmapDocument>>,
    calls: Mutex<Vec<StoreCall>>,
    next_id: Mutex<u64>,
    fail_next: Mutex<Option<PersistenceError>>,
}

impl InMemoryRoadmapStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_roadmap(self, document: RoadmapDocument) -> Self {
        self.roadmaps.lock().push(document);
        self
    }

    /// Make the next call fail with `error`
    pub fn fail_next(&self, error: PersistenceError) {
        *self.fail_next.lock() = Some(error);
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().clone()
    }

    pub fn stored(&self, id: &RoadmapId) -> Option<RoadmapDocument> {
        self.roadmaps.lock().iter().find(|r| &r.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.roadmaps.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn begin(&self, call: StoreCall) -> Result<(), PersistenceError> {
        self.calls.lock().push(call);
        match self.fail_next.lock().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

pub fn not_found() -> PersistenceError {
    PersistenceError::Api {
        status: 404,
        body: r#"{"detail":"Roadmap not found"}"#.to_string(),
    }
}

#[async_trait]
impl RoadmapStore for InMemoryRoadmapStore {
    async fn list(&self) -> Result<Vec<RoadmapSummary>, PersistenceError> {
        self.begin(StoreCall::List)?;
        Ok(self.roadmaps.lock().iter().rev().map(RoadmapDocument::summary).collect())
    }

    async fn get(&self, id: &RoadmapId) -> Result<RoadmapDocument, PersistenceError> {
        self.begin(StoreCall::Get(id.clone()))?;
        self.stored(id).ok_or_else(not_found)
    }

    async fn create(&self, roadmap: NewRoadmap) -> Result<RoadmapDocument, PersistenceError> {
        self.begin(StoreCall::Create(roadmap.title.clone()))?;
        let id = {
            let mut next = self.next_id.lock();
            *next += 1;
            RoadmapId::new(format!("saved-{}", *next))
        };
        let document = RoadmapDocument {
            id,
            title: roadmap.title,
            topic_query: roadmap.topic_query,
            nodes: roadmap.nodes,
            edges: roadmap.edges,
            created_at: CREATED_AT.to_string(),
        };
        self.roadmaps.lock().push(document.clone());
        Ok(document)
    }

    async fn update(&self, id: &RoadmapId, update: RoadmapUpdate) -> Result<RoadmapDocument, PersistenceError> {
        self.begin(StoreCall::Update(id.clone()))?;
        let mut roadmaps = self.roadmaps.lock();
        let document = roadmaps.iter_mut().find(|r| &r.id == id).ok_or_else(not_found)?;
        if let Some(title) = update.title {
            document.title = title;
        }
        if let Some(nodes) = update.nodes {
            document.nodes = nodes;
        }
        if let Some(edges) = update.edges {
            document.edges = edges;
        }
        Ok(document.clone())
    }

    async fn delete(&self, id: &RoadmapId) -> Result<(), PersistenceError> {
        self.begin(StoreCall::Delete(id.clone()))?;
        let mut roadmaps = self.roadmaps.lock();
        let before = roadmaps.len();
        roadmaps.retain(|r| &r.id != id);
        if roadmaps.len() == before {
            return Err(not_found());
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Canned HTTP server
// ---------------------------------------------------------------------------

/// One raw HTTP/1.1 response, written chunk by chunk
#[derive(Debug, Clone)]
pub struct CannedReply {
    chunks: Vec<Vec<u8>>,
}

impl CannedReply {
    /// Response with a fixed body and content type
    pub fn status(code: u16, reason: &str, content_type: &str, body: &str) -> Self {
        let head = format!(
            "HTTP/1.1 {code} {reason}\r\ncontent-type: {content_type}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
            body.len()
        );
        Self {
            chunks: vec![[head.as_bytes(), body.as_bytes()].concat()],
        }
    }

    pub fn json(code: u16, reason: &str, body: &str) -> Self {
        Self::status(code, reason, "application/json", body)
    }

    pub fn no_content() -> Self {
        Self {
            chunks: vec![b"HTTP/1.1 204 No Content\r\nconnection: close\r\n\r\n".to_vec()],
        }
    }

    /// `text/event-stream` body without a length, each chunk flushed separately
    pub fn event_stream(chunks: &[&[u8]]) -> Self {
        let head = b"HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ncache-control: no-cache\r\nconnection: close\r\n\r\n";
        let mut all = vec![head.to_vec()];
        all.extend(chunks.iter().map(|c| c.to_vec()));
        Self { chunks: all }
    }
}

/// Loopback server answering each connection with the next canned reply
#[derive(Debug)]
pub struct CannedServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

impl CannedServer {
    /// Bind an ephemeral port and serve `replies` in order, one per connection
    pub async fn start(replies: Vec<CannedReply>) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let requests = Arc::new(Mutex::new(Vec::new()));

        let seen = requests.clone();
        tokio::spawn(async move {
            for reply in replies {
                let Ok((socket, _)) = listener.accept().await else {
                    return;
                };
                let _ = serve(socket, &reply, &seen).await;
            }
        });

        Ok(Self { addr, requests })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Raw request text (head and body) per served connection
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

async fn serve(mut socket: TcpStream, reply: &CannedReply, seen: &Mutex<Vec<String>>) -> std::io::Result<()> {
    let mut raw = Vec::new();
    let mut buf = [0u8; 4096];
    let head_end = loop {
        if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        let n = socket.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        raw.extend_from_slice(&buf[..n]);
    };

    let head = String::from_utf8_lossy(&raw[..head_end]).to_lowercase();
    let body_len = head
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while raw.len() < head_end + body_len {
        let n = socket.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&buf[..n]);
    }
    seen.lock().push(String::from_utf8_lossy(&raw).into_owned());

    for chunk in &reply.chunks {
        socket.write_all(chunk).await?;
        socket.flush().await?;
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    socket.shutdown().await
}
