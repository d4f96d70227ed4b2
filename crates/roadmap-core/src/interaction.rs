//! Interaction controller
//!
//! Selection state and the save/load actions of a displayed roadmap. Reads
//! the shared graph, never streams into it.

use crate::document::{new_roadmap, persisted_parts, RoadmapDocument, RoadmapSummary, RoadmapUpdate};
use crate::error::PersistenceError;
use crate::persistence::RoadmapStore;
use parking_lot::Mutex;
use roadmap_graph::{Node, NodeId, RoadmapId, SharedGraph};
use roadmap_layout::Layout;
use roadmap_stream::IngestStatus;
use std::sync::Arc;
use tokio::sync::watch;

/// What a successful persist did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    /// New roadmap saved under this id
    Created(RoadmapId),
    /// Existing roadmap updated
    Updated(RoadmapId),
}

impl PersistOutcome {
    /// Remote id of the saved roadmap
    #[inline]
    #[must_use]
    pub fn id(&self) -> &RoadmapId {
        match self {
            Self::Created(id) | Self::Updated(id) => id,
        }
    }
}

/// Selection and persistence for the current graph
pub struct InteractionController {
    graph: SharedGraph,
    store: Arc<dyn RoadmapStore>,
    ingest: watch::Receiver<IngestStatus>,
    selected: Mutex<Option<NodeId>>,
}

impl std::fmt::Debug for InteractionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionController")
            .field("selected", &*self.selected.lock())
            .finish_non_exhaustive()
    }
}

impl InteractionController {
    /// Create controller
    ///
    /// `ingest` tells the controller whether a stream is still writing.
    #[must_use]
    pub fn new(graph: SharedGraph, store: Arc<dyn RoadmapStore>, ingest: watch::Receiver<IngestStatus>) -> Self {
        Self {
            graph,
            store,
            ingest,
            selected: Mutex::new(None),
        }
    }

    /// Set or clear the selected node
    pub fn select(&self, node: Option<NodeId>) {
        tracing::debug!(node = ?node, "selection changed");
        *self.selected.lock() = node;
    }

    /// Currently selected id
    #[must_use]
    pub fn selected(&self) -> Option<NodeId> {
        self.selected.lock().clone()
    }

    /// Selected node record, if it still exists
    #[must_use]
    pub fn selected_node(&self) -> Option<Node> {
        let id = self.selected()?;
        self.graph.read().node(&id).cloned()
    }

    /// Save the current graph
    ///
    /// Creates when the graph has no remote id and records the returned id;
    /// otherwise updates nodes and edges. No retry. On failure the remote id
    /// is left as it was.
    ///
    /// # Errors
    /// - `PersistenceError::StillGenerating` while a session is streaming
    /// - any error from the store
    pub async fn persist(&self, layout: Option<&Layout>) -> Result<PersistOutcome, PersistenceError> {
        if self.ingest.borrow().is_generating {
            return Err(PersistenceError::StillGenerating);
        }
        let graph = self.graph.read().snapshot();

        if let Some(id) = graph.meta.remote_id.clone() {
            let (nodes, edges) = persisted_parts(&graph, layout);
            let update = RoadmapUpdate {
                title: None,
                nodes: Some(nodes),
                edges: Some(edges),
            };
            self.store.update(&id, update).await.map_err(|err| {
                tracing::error!(roadmap = %id, error = %err, "update failed");
                err
            })?;
            return Ok(PersistOutcome::Updated(id));
        }

        let body = new_roadmap(&graph, layout);
        let created = self.store.create(body).await.map_err(|err| {
            tracing::error!(error = %err, "create failed");
            err
        })?;

        let mut model = self.graph.write();
        if model.revision() == graph.revision && model.remote_id().is_none() {
            model.set_remote_id(Some(created.id.clone()));
        } else {
            tracing::warn!(roadmap = %created.id, "graph replaced during save; id not recorded");
        }
        tracing::info!(roadmap = %created.id, "roadmap created");
        Ok(PersistOutcome::Created(created.id))
    }

    /// Fetch a saved roadmap
    ///
    /// # Errors
    /// Any error from the store.
    pub async fn fetch(&self, id: &RoadmapId) -> Result<RoadmapDocument, PersistenceError> {
        self.store.get(id).await
    }

    /// Replace the graph with a fetched document; returns rejected entries
    ///
    /// Selection is cleared.
    pub fn install(&self, document: RoadmapDocument) -> usize {
        let id = document.id.clone();
        let (nodes, edges, meta) = document.into_parts();
        let rejected = self.graph.write().replace(nodes, edges, meta);
        self.select(None);
        if rejected > 0 {
            tracing::warn!(roadmap = %id, rejected, "saved roadmap had invalid entries");
        }
        tracing::info!(roadmap = %id, "roadmap loaded");
        rejected
    }

    /// Saved roadmaps
    ///
    /// # Errors
    /// Any error from the store.
    pub async fn list(&self) -> Result<Vec<RoadmapSummary>, PersistenceError> {
        self.store.list().await
    }

    /// Delete a saved roadmap
    ///
    /// If it is the one currently shown, the graph forgets its remote id so
    /// the next persist creates a new roadmap.
    ///
    /// # Errors
    /// Any error from the store; the remote id is then kept.
    pub async fn delete(&self, id: &RoadmapId) -> Result<(), PersistenceError> {
        self.store.delete(id).await?;
        let mut model = self.graph.write();
        if model.remote_id() == Some(id) {
            model.set_remote_id(None);
        }
        Ok(())
    }
}
