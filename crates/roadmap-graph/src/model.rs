//! The canonical graph store
//!
//! [`GraphModel`] owns the nodes and edges of the one active roadmap. It is
//! the only place where the graph is mutated; everything else reads
//! [`Graph`] snapshots.
//!
//! # Merge rules
//!
//! - Nodes upsert by id. A non-empty incoming field overwrites, an absent or
//!   empty one keeps what was there.
//! - Edges upsert by id. A second edge with a known id is ignored, even if its
//!   endpoints differ.
//! - Self-loops and edges to unknown nodes are stored like any other edge.

use crate::error::ValidationError;
use crate::types::{Edge, EdgeId, EdgePatch, Graph, GraphMeta, Node, NodeData, NodeId, NodePatch, RoadmapId};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// Graph model shared between the session controller, the ingestor and readers
pub type SharedGraph = Arc<RwLock<GraphModel>>;

/// What a single apply call did to the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// A new node or edge was stored
    Inserted,
    /// An existing node had fields replaced
    Updated,
    /// Nothing changed (duplicate edge, or a node event with nothing new)
    Unchanged,
}

impl Mutation {
    /// Whether node/edge membership changed, which is what triggers relayout
    #[inline]
    #[must_use]
    pub fn changes_membership(self) -> bool {
        matches!(self, Self::Inserted)
    }

    /// Whether anything changed at all
    #[inline]
    #[must_use]
    pub fn is_change(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// The canonical node/edge store
#[derive(Debug, Default)]
pub struct GraphModel {
    nodes: IndexMap<NodeId, Node>,
    edges: IndexMap<EdgeId, Edge>,
    meta: GraphMeta,
    structure_revision: u64,
    revision: u64,
}

impl GraphModel {
    /// Create an empty model
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty model behind a shared lock
    #[must_use]
    pub fn shared() -> SharedGraph {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Upsert a node
    ///
    /// # Errors
    /// `ValidationError::MissingNodeId` when the patch has no non-blank id.
    pub fn apply_node(&mut self, patch: NodePatch) -> Result<Mutation, ValidationError> {
        let id = non_blank(patch.id).ok_or(ValidationError::MissingNodeId)?;
        let id = NodeId(id);

        let outcome = match self.nodes.get_mut(&id) {
            Some(existing) => {
                if merge_into(existing, patch.label, patch.description, patch.resources, patch.position) {
                    Mutation::Updated
                } else {
                    Mutation::Unchanged
                }
            }
            None => {
                let node = Node {
                    id: id.clone(),
                    label: non_blank(patch.label).unwrap_or_default(),
                    position: patch.position,
                    data: NodeData {
                        description: non_blank(patch.description),
                        resources: patch.resources.unwrap_or_default(),
                    },
                };
                self.nodes.insert(id, node);
                Mutation::Inserted
            }
        };

        self.bump(outcome);
        Ok(outcome)
    }

    /// Upsert an edge
    ///
    /// # Errors
    /// `ValidationError` when the id, source or target is missing.
    pub fn apply_edge(&mut self, patch: EdgePatch) -> Result<Mutation, ValidationError> {
        let id = non_blank(patch.id).ok_or(ValidationError::MissingEdgeId)?;
        let source = non_blank(patch.source)
            .ok_or_else(|| ValidationError::missing_endpoint(id.clone(), "source"))?;
        let target = non_blank(patch.target)
            .ok_or_else(|| ValidationError::missing_endpoint(id.clone(), "target"))?;

        let id = EdgeId(id);
        if self.edges.contains_key(&id) {
            return Ok(Mutation::Unchanged);
        }

        let edge = Edge {
            id: id.clone(),
            source: NodeId(source),
            target: NodeId(target),
        };
        if edge.is_self_loop() {
            tracing::debug!(edge = %edge.id, node = %edge.source, "storing self-loop edge");
        }
        self.edges.insert(id, edge);

        self.bump(Mutation::Inserted);
        Ok(Mutation::Inserted)
    }

    /// Drop every node, edge and the metadata
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.meta = GraphMeta::default();
        self.bump(Mutation::Inserted);
    }

    /// Replace the whole graph in one step
    ///
    /// Invalid patches are skipped and counted in the returned value.
    pub fn replace(
        &mut self,
        nodes: impl IntoIterator<Item = NodePatch>,
        edges: impl IntoIterator<Item = EdgePatch>,
        meta: GraphMeta,
    ) -> usize {
        self.reset();
        self.meta = meta;

        let mut rejected = 0;
        for patch in nodes {
            if self.apply_node(patch).is_err() {
                rejected += 1;
            }
        }
        for patch in edges {
            if self.apply_edge(patch).is_err() {
                rejected += 1;
            }
        }
        rejected
    }

    /// Take an immutable copy of the current state
    #[must_use]
    pub fn snapshot(&self) -> Graph {
        Graph {
            nodes: self.nodes.clone(),
            edges: self.edges.values().cloned().collect(),
            meta: self.meta.clone(),
            structure_revision: self.structure_revision,
            revision: self.revision,
        }
    }

    /// Record the server-assigned id
    pub fn set_remote_id(&mut self, id: Option<RoadmapId>) {
        self.meta.remote_id = id;
    }

    /// Server-assigned id, if any
    #[inline]
    #[must_use]
    pub fn remote_id(&self) -> Option<&RoadmapId> {
        self.meta.remote_id.as_ref()
    }

    /// Record the query that produced this graph
    pub fn set_topic_query(&mut self, query: Option<String>) {
        self.meta.topic_query = query;
    }

    /// Graph metadata
    #[inline]
    #[must_use]
    pub fn meta(&self) -> &GraphMeta {
        &self.meta
    }

    /// Look up a node
    #[inline]
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Number of nodes
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of stored edges
    #[inline]
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Revision bumped on membership changes only
    #[inline]
    #[must_use]
    pub fn structure_revision(&self) -> u64 {
        self.structure_revision
    }

    /// Revision bumped on every change
    #[inline]
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn bump(&mut self, mutation: Mutation) {
        if mutation.changes_membership() {
            self.structure_revision += 1;
        }
        if mutation.is_change() {
            self.revision += 1;
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn merge_into(
    node: &mut Node,
    label: Option<String>,
    description: Option<String>,
    resources: Option<Vec<String>>,
    position: Option<crate::types::Position>,
) -> bool {
    let mut changed = false;

    if let Some(label) = non_blank(label) {
        if node.label != label {
            node.label = label;
            changed = true;
        }
    }
    if let Some(description) = non_blank(description) {
        if node.data.description.as_deref() != Some(description.as_str()) {
            node.data.description = Some(description);
            changed = true;
        }
    }
    if let Some(resources) = resources.filter(|r| !r.is_empty()) {
        if node.data.resources != resources {
            node.data.resources = resources;
            changed = true;
        }
    }
    if let Some(position) = position {
        if node.position != Some(position) {
            node.position = Some(position);
            changed = true;
        }
    }

    changed
}
