//! Layout engine
//!
//! Runs the three phases over a [`Graph`] snapshot and packages the result
//! for a renderer. Holds no state between calls.

use crate::config::{Direction, LayoutConfig};
use crate::coords::assign_coordinates;
use crate::dag::LayoutDag;
use crate::order::minimize_crossings;
use crate::rank::assign_ranks;
use indexmap::IndexMap;
use roadmap_graph::{EdgeId, Graph, NodeId, Position};
use serde::Serialize;

/// An edge ready to draw, anchored on its endpoint boxes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutedEdge {
    /// Edge id
    pub id: EdgeId,
    /// Source node
    pub source: NodeId,
    /// Target node
    pub target: NodeId,
    /// Anchor on the source box (outgoing side)
    pub from: Position,
    /// Anchor on the target box (incoming side)
    pub to: Position,
    /// Edge was ignored for ranking to break a cycle
    pub reversed: bool,
}

/// Result of one layout run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layout {
    /// Top-left corner per node, in graph insertion order
    pub positions: IndexMap<NodeId, Position>,
    /// Rank per node
    pub ranks: IndexMap<NodeId, usize>,
    /// Node order within each rank
    pub order: Vec<Vec<NodeId>>,
    /// Drawable edges, in arrival order
    pub edges: Vec<RoutedEdge>,
    /// Edges waiting for a missing endpoint
    pub deferred_edges: Vec<EdgeId>,
    /// Self-loop edges, kept out of layout
    pub self_loops: Vec<EdgeId>,
    /// Edge crossings left after ordering
    pub crossings: usize,
    /// Bounding box width
    pub width: f64,
    /// Bounding box height
    pub height: f64,
    /// Structure revision of the snapshot this was computed from
    pub structure_revision: u64,
}

impl Layout {
    /// Position of a node
    #[inline]
    #[must_use]
    pub fn position(&self, id: &NodeId) -> Option<Position> {
        self.positions.get(id).copied()
    }

    /// Rank of a node
    #[inline]
    #[must_use]
    pub fn rank(&self, id: &NodeId) -> Option<usize> {
        self.ranks.get(id).copied()
    }

    /// Number of ranks
    #[inline]
    #[must_use]
    pub fn rank_count(&self) -> usize {
        self.order.len()
    }
}

/// Layered layout engine
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    /// Create engine with configuration
    #[inline]
    #[must_use]
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// Engine configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Compute positions for every node of `graph`
    #[must_use]
    pub fn compute(&self, graph: &Graph) -> Layout {
        let dag = LayoutDag::from_graph(graph);
        let ranking = assign_ranks(&dag);
        let (order, crossings) = minimize_crossings(&dag, &ranking, self.config.ordering_passes);
        let placement = assign_coordinates(&order, dag.node_count(), &self.config);

        let ids: Vec<&NodeId> = graph.nodes.keys().collect();
        let positions: IndexMap<NodeId, Position> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| ((*id).clone(), placement.positions[i]))
            .collect();
        let ranks = ids
            .iter()
            .enumerate()
            .map(|(i, id)| ((*id).clone(), ranking.ranks[i]))
            .collect();
        let named_order = order
            .iter()
            .map(|rank| rank.iter().map(|n| ids[n.index()].clone()).collect())
            .collect();

        let edges = dag
            .edges
            .iter()
            .map(|(id, from, to)| {
                let source = ids[from.index()].clone();
                let target = ids[to.index()].clone();
                RoutedEdge {
                    id: id.clone(),
                    from: self.outgoing_anchor(positions[&source]),
                    to: self.incoming_anchor(positions[&target]),
                    source,
                    target,
                    reversed: ranking.is_back_edge(*from, *to),
                }
            })
            .collect();

        let deferred_edges = graph.dangling_edges().map(|e| e.id.clone()).collect::<Vec<_>>();
        let self_loops = graph
            .edges
            .iter()
            .filter(|e| e.is_self_loop() && graph.is_resolved(e))
            .map(|e| e.id.clone())
            .collect();

        tracing::debug!(
            nodes = graph.node_count(),
            ranks = order.len(),
            crossings,
            deferred = deferred_edges.len(),
            "layout computed"
        );

        Layout {
            positions,
            ranks,
            order: named_order,
            edges,
            deferred_edges,
            self_loops,
            crossings,
            width: placement.width,
            height: placement.height,
            structure_revision: graph.structure_revision,
        }
    }

    fn outgoing_anchor(&self, at: Position) -> Position {
        match self.config.direction {
            Direction::TopToBottom => {
                Position::new(at.x + self.config.node_width / 2.0, at.y + self.config.node_height)
            }
            Direction::LeftToRight => {
                Position::new(at.x + self.config.node_width, at.y + self.config.node_height / 2.0)
            }
        }
    }

    fn incoming_anchor(&self, at: Position) -> Position {
        match self.config.direction {
            Direction::TopToBottom => Position::new(at.x + self.config.node_width / 2.0, at.y),
            Direction::LeftToRight => Position::new(at.x, at.y + self.config.node_height / 2.0),
        }
    }
}
