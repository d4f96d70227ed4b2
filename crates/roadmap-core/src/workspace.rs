//! Roadmap workspace
//!
//! The session controller. Owns the one shared graph and hands it to:
//! - the [`StreamIngestor`] that fills it from a generation stream
//! - the [`LiveLayout`] that positions it
//! - the [`InteractionController`] that selects, saves and loads
//!
//! Starting a generation or loading a saved roadmap replaces the graph
//! wholesale and clears the selection.

use crate::config::ClientConfig;
use crate::error::{PersistenceError, WorkspaceError};
use crate::document::RoadmapSummary;
use crate::interaction::{InteractionController, PersistOutcome};
use crate::persistence::{HttpRoadmapStore, RoadmapStore};
use parking_lot::Mutex;
use roadmap_graph::{Graph, GraphModel, Node, NodeId, RoadmapId, SharedGraph};
use roadmap_layout::{LayoutEngine, LiveLayout, Refresh};
use roadmap_stream::{EventTransport, GenerateRequest, HttpSseTransport, IngestStatus, SessionId, StreamIngestor};
use std::sync::Arc;
use tokio::sync::watch;

/// Result of loading a saved roadmap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOutcome {
    /// Loaded roadmap
    pub id: RoadmapId,
    /// Saved title
    pub title: String,
    /// Entries skipped as malformed
    pub rejected: usize,
}

/// Session controller for one displayed roadmap
#[derive(Debug)]
pub struct RoadmapWorkspace {
    config: ClientConfig,
    graph: SharedGraph,
    ingestor: StreamIngestor,
    layout: Mutex<LiveLayout>,
    controller: InteractionController,
}

impl RoadmapWorkspace {
    /// Create workspace over explicit collaborators
    #[must_use]
    pub fn new(config: ClientConfig, transport: Arc<dyn EventTransport>, store: Arc<dyn RoadmapStore>) -> Self {
        let graph = GraphModel::shared();
        let ingestor = StreamIngestor::new(Arc::clone(&graph), transport);
        let controller = InteractionController::new(Arc::clone(&graph), store, ingestor.subscribe());
        let layout = Mutex::new(LiveLayout::new(LayoutEngine::new(config.layout)));
        Self {
            config,
            graph,
            ingestor,
            layout,
            controller,
        }
    }

    /// Create workspace talking HTTP to the configured services
    ///
    /// # Errors
    /// Invalid configuration, or an HTTP client that cannot be built.
    pub fn connect(config: ClientConfig) -> Result<Self, WorkspaceError> {
        config.validate()?;
        let transport = HttpSseTransport::new(&config.stream_base_url, config.request_timeout())?;
        let store = HttpRoadmapStore::new(&config.persistence_base_url, config.request_timeout())?
            .with_access_token(config.access_token.clone());
        tracing::info!(
            stream = %config.stream_base_url,
            api = %config.persistence_base_url,
            "workspace connected"
        );
        Ok(Self::new(config, Arc::new(transport), Arc::new(store)))
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Replace the user API key used for later generations
    pub fn set_user_api_key(&mut self, key: Option<String>) {
        self.config.user_api_key = key;
    }

    /// Shared graph handle
    #[inline]
    #[must_use]
    pub fn graph(&self) -> &SharedGraph {
        &self.graph
    }

    /// Snapshot of the current graph
    #[must_use]
    pub fn snapshot(&self) -> Graph {
        self.graph.read().snapshot()
    }

    /// Start generating a roadmap for `query`, superseding any running session
    ///
    /// # Errors
    /// `StreamError::EmptyQuery` for a blank query.
    pub fn generate(&self, query: &str) -> Result<SessionId, WorkspaceError> {
        let request = GenerateRequest::new(query)
            .with_user_api_key(self.config.user_api_key.clone())
            .with_access_token(self.config.access_token.clone());
        let session = self.ingestor.start(request)?;
        self.controller.select(None);
        Ok(session)
    }

    /// Cancel the running session, keeping what has arrived
    pub fn cancel(&self) {
        self.ingestor.cancel();
    }

    /// Current ingest status
    #[must_use]
    pub fn status(&self) -> IngestStatus {
        self.ingestor.status()
    }

    /// Subscribe to ingest status changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<IngestStatus> {
        self.ingestor.subscribe()
    }

    /// Wait for the running session to end
    pub async fn wait_until_finished(&self) -> IngestStatus {
        self.ingestor.wait_until_finished().await
    }

    /// Layout of the current graph, recomputed only on membership change
    #[must_use]
    pub fn layout(&self) -> Refresh {
        let graph = self.snapshot();
        self.layout.lock().refresh(&graph)
    }

    /// Select a node, or clear the selection
    pub fn select(&self, node: Option<NodeId>) {
        self.controller.select(node);
    }

    /// Selected node record
    #[must_use]
    pub fn selected_node(&self) -> Option<Node> {
        self.controller.selected_node()
    }

    /// Save the current graph with its current layout positions
    ///
    /// # Errors
    /// See [`InteractionController::persist`].
    pub async fn persist(&self) -> Result<PersistOutcome, PersistenceError> {
        let refresh = self.layout();
        self.controller.persist(Some(&refresh.layout)).await
    }

    /// Replace the graph with a saved roadmap
    ///
    /// Any running session is cancelled once the document has arrived; if
    /// the fetch fails nothing changes.
    ///
    /// # Errors
    /// Any error from the store.
    pub async fn load(&self, id: &RoadmapId) -> Result<LoadOutcome, PersistenceError> {
        let document = self.controller.fetch(id).await?;
        self.ingestor.cancel();
        let title = document.title.clone();
        let id = document.id.clone();
        let rejected = self.controller.install(document);
        Ok(LoadOutcome { id, title, rejected })
    }

    /// Saved roadmaps
    ///
    /// # Errors
    /// Any error from the store.
    pub async fn list(&self) -> Result<Vec<RoadmapSummary>, PersistenceError> {
        self.controller.list().await
    }

    /// Delete a saved roadmap
    ///
    /// # Errors
    /// Any error from the store.
    pub async fn delete(&self, id: &RoadmapId) -> Result<(), PersistenceError> {
        self.controller.delete(id).await
    }
}
