//! Core graph types
//!
//! Defines the identifiers and records held by the graph model:
//! - Node and edge identifiers (server-assigned strings)
//! - Concept nodes with their optional detail data
//! - Directed edges
//! - Partial node/edge input as it arrives from a stream
//! - Immutable graph snapshots

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Wrap a raw id
            #[inline]
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw id
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Concept node identifier
    NodeId
);
string_id!(
    /// Edge identifier
    EdgeId
);
string_id!(
    /// Server-assigned identifier of a saved roadmap
    RoadmapId
);

/// Point in layout space (top-left corner of a node box)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Position {
    /// Create a position
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Optional detail attached to a concept
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    /// Short description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Resource URLs or hints
    #[serde(default)]
    pub resources: Vec<String>,
}

/// A concept in the roadmap
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Immutable identity
    pub id: NodeId,
    /// Display label (may be empty until a later event fills it)
    pub label: String,
    /// Position, absent until laid out or supplied by the source
    pub position: Option<Position>,
    /// Detail data
    pub data: NodeData,
}

impl Node {
    /// Create a node with an empty detail record
    #[must_use]
    pub fn new(id: impl Into<NodeId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            position: None,
            data: NodeData::default(),
        }
    }

    /// With description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.data.description = Some(description.into());
        self
    }

    /// With resources
    #[must_use]
    pub fn with_resources(mut self, resources: Vec<String>) -> Self {
        self.data.resources = resources;
        self
    }
}

/// A directed dependency between two concepts
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Unique edge id
    pub id: EdgeId,
    /// Prerequisite concept
    pub source: NodeId,
    /// Dependent concept
    pub target: NodeId,
}

impl Edge {
    /// Create an edge
    #[must_use]
    pub fn new(id: impl Into<EdgeId>, source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
        }
    }

    /// Whether the edge points back at its own source
    #[inline]
    #[must_use]
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Partial node as received from a stream or a saved document
///
/// Every field is optional; [`crate::GraphModel::apply_node`] decides what
/// a missing or empty field means.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    /// Node id (required for the patch to be applied)
    pub id: Option<String>,
    /// Label, already resolved from nested/top-level fields
    pub label: Option<String>,
    /// Description
    pub description: Option<String>,
    /// Resources
    pub resources: Option<Vec<String>>,
    /// Position hint
    pub position: Option<Position>,
}

impl NodePatch {
    /// Patch carrying only an id and a label
    #[must_use]
    pub fn labelled(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            label: Some(label.into()),
            ..Self::default()
        }
    }

    /// With description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// With resources
    #[must_use]
    pub fn with_resources(mut self, resources: Vec<String>) -> Self {
        self.resources = Some(resources);
        self
    }
}

/// Partial edge as received from a stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgePatch {
    /// Edge id
    pub id: Option<String>,
    /// Source node id
    pub source: Option<String>,
    /// Target node id
    pub target: Option<String>,
}

impl EdgePatch {
    /// Fully specified patch
    #[must_use]
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            source: Some(source.into()),
            target: Some(target.into()),
        }
    }
}

/// Metadata that travels with the graph but is not part of its structure
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphMeta {
    /// Server-assigned id; `None` until the first save or a `meta` event
    pub remote_id: Option<RoadmapId>,
    /// Title from the saved document, if loaded
    pub title: Option<String>,
    /// Query that produced the graph
    pub topic_query: Option<String>,
}

/// Immutable read of the graph at one point in time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    /// Nodes in insertion order
    pub nodes: IndexMap<NodeId, Node>,
    /// Edges in arrival order
    pub edges: Vec<Edge>,
    /// Associated metadata
    pub meta: GraphMeta,
    /// Bumped whenever node or edge membership changes
    pub structure_revision: u64,
    /// Bumped on every mutation
    pub revision: u64,
}

impl Graph {
    /// Number of nodes
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of stored edges, including dangling and self-loop edges
    #[inline]
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// True when there are no nodes and no edges
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Look up a node
    #[inline]
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Whether both endpoints of `edge` are present
    #[must_use]
    pub fn is_resolved(&self, edge: &Edge) -> bool {
        self.nodes.contains_key(&edge.source) && self.nodes.contains_key(&edge.target)
    }

    /// Edges usable for layout: both endpoints present, not a self-loop
    pub fn layout_edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges
            .iter()
            .filter(|e| !e.is_self_loop() && self.is_resolved(e))
    }

    /// Edges still waiting for an endpoint
    pub fn dangling_edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.iter().filter(|e| !self.is_resolved(e))
    }

    /// Label of the first inserted node, if it is non-empty
    #[must_use]
    pub fn first_label(&self) -> Option<&str> {
        self.nodes
            .values()
            .next()
            .map(|n| n.label.as_str())
            .filter(|l| !l.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(nodes: &[&str], edges: &[(&str, &str, &str)]) -> Graph {
        let mut g = Graph::default();
        for id in nodes {
            g.nodes.insert(NodeId::from(*id), Node::new(*id, id.to_uppercase()));
        }
        g.edges = edges.iter().map(|(i, s, t)| Edge::new(*i, *s, *t)).collect();
        g
    }

    #[test]
    fn layout_edges_skip_dangling_and_self_loops() {
        let g = graph(
            &["a", "b"],
            &[("e1", "a", "b"), ("e2", "a", "x"), ("e3", "b", "b")],
        );
        let ids: Vec<_> = g.layout_edges().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e1"]);

        let dangling: Vec<_> = g.dangling_edges().map(|e| e.id.as_str()).collect();
        assert_eq!(dangling, vec!["e2"]);
    }

    #[test]
    fn first_label_ignores_blank() {
        let mut g = graph(&["a"], &[]);
        assert_eq!(g.first_label(), Some("A"));

        g.nodes.get_mut(&NodeId::from("a")).unwrap().label = "  ".to_string();
        assert_eq!(g.first_label(), None);
    }

    #[test]
    fn ids_are_transparent_in_json() {
        let edge = Edge::new("e1", "a", "b");
        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json, serde_json::json!({"id": "e1", "source": "a", "target": "b"}));
    }
}
