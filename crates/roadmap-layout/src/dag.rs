//! Layout input graph
//!
//! Restricts a [`Graph`] snapshot to what ranking may see: every node, and
//! only the edges whose endpoints both exist and differ. Node indices follow
//! snapshot insertion order, so index comparison is insertion-order
//! comparison.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use roadmap_graph::{EdgeId, Graph, NodeId};
use std::collections::HashMap;

/// Directed graph over node insertion indices
#[derive(Debug)]
pub(crate) struct LayoutDag {
    pub(crate) inner: DiGraph<NodeId, ()>,
    /// Layout edges with their endpoint indices, in arrival order
    pub(crate) edges: Vec<(EdgeId, NodeIndex, NodeIndex)>,
}

impl LayoutDag {
    pub(crate) fn from_graph(graph: &Graph) -> Self {
        let mut inner = DiGraph::with_capacity(graph.node_count(), graph.edge_count());
        let mut index = HashMap::with_capacity(graph.node_count());
        for id in graph.nodes.keys() {
            index.insert(id, inner.add_node(id.clone()));
        }

        let mut edges = Vec::new();
        for edge in graph.layout_edges() {
            let (Some(&from), Some(&to)) = (index.get(&edge.source), index.get(&edge.target)) else {
                continue;
            };
            // Parallel edges collapse into one for ranking and ordering.
            inner.update_edge(from, to, ());
            edges.push((edge.id.clone(), from, to));
        }

        Self { inner, edges }
    }

    pub(crate) fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Successors sorted by insertion index
    pub(crate) fn successors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        self.sorted_neighbors(node, Direction::Outgoing)
    }

    /// Predecessors sorted by insertion index
    pub(crate) fn predecessors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        self.sorted_neighbors(node, Direction::Incoming)
    }

    /// Nodes with no incoming edge, in insertion order
    pub(crate) fn entry_nodes(&self) -> Vec<NodeIndex> {
        self.inner
            .node_indices()
            .filter(|n| {
                self.inner
                    .neighbors_directed(*n, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .collect()
    }

    fn sorted_neighbors(&self, node: NodeIndex, dir: Direction) -> Vec<NodeIndex> {
        let mut out: Vec<NodeIndex> = self.inner.neighbors_directed(node, dir).collect();
        out.sort_unstable();
        out.dedup();
        out
    }
}
