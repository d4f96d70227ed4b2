//! Rank assignment
//!
//! Longest-path layering: entry nodes sit on rank 0, every other node one
//! rank below its deepest predecessor. Cycles are broken first by dropping
//! the back edges a depth-first traversal finds, so every node gets a rank
//! and the pass always terminates.

use crate::dag::LayoutDag;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

/// Ranks plus the edges that were ignored to make the graph acyclic
#[derive(Debug, Clone, Default)]
pub(crate) struct Ranking {
    /// Rank per node, indexed by insertion index
    pub(crate) ranks: Vec<usize>,
    /// Edges (from, to) treated as non-ranking
    pub(crate) back_edges: HashSet<(NodeIndex, NodeIndex)>,
}

impl Ranking {
    pub(crate) fn rank_count(&self) -> usize {
        self.ranks.iter().max().map_or(0, |max| max + 1)
    }

    pub(crate) fn is_back_edge(&self, from: NodeIndex, to: NodeIndex) -> bool {
        self.back_edges.contains(&(from, to))
    }
}

/// Find back edges with an iterative DFS
///
/// Roots are tried entry nodes first, then any node still unvisited (members
/// of source-less cycles), each group in insertion order.
pub(crate) fn find_back_edges(dag: &LayoutDag) -> HashSet<(NodeIndex, NodeIndex)> {
    let n = dag.node_count();
    let mut marks = vec![Mark::Unvisited; n];
    let mut back = HashSet::new();

    let roots = dag
        .entry_nodes()
        .into_iter()
        .chain(dag.inner.node_indices());

    for root in roots {
        if marks[root.index()] != Mark::Unvisited {
            continue;
        }

        let mut stack: Vec<(NodeIndex, Vec<NodeIndex>, usize)> = Vec::new();
        marks[root.index()] = Mark::Visiting;
        stack.push((root, dag.successors(root), 0));

        while let Some((node, successors, cursor)) = stack.last_mut() {
            let Some(&next) = successors.get(*cursor) else {
                marks[node.index()] = Mark::Done;
                stack.pop();
                continue;
            };
            *cursor += 1;
            let node = *node;

            match marks[next.index()] {
                Mark::Visiting => {
                    back.insert((node, next));
                }
                Mark::Unvisited => {
                    marks[next.index()] = Mark::Visiting;
                    stack.push((next, dag.successors(next), 0));
                }
                Mark::Done => {}
            }
        }
    }

    back
}

/// Assign longest-path ranks
pub(crate) fn assign_ranks(dag: &LayoutDag) -> Ranking {
    let n = dag.node_count();
    if n == 0 {
        return Ranking::default();
    }

    let back_edges = find_back_edges(dag);
    if !back_edges.is_empty() {
        tracing::debug!(count = back_edges.len(), "ignoring back edges for ranking");
    }

    let mut acyclic: DiGraph<(), ()> = DiGraph::with_capacity(n, dag.inner.edge_count());
    for _ in 0..n {
        acyclic.add_node(());
    }
    for edge in dag.inner.edge_indices() {
        if let Some((from, to)) = dag.inner.edge_endpoints(edge) {
            if !back_edges.contains(&(from, to)) {
                acyclic.add_edge(from, to, ());
            }
        }
    }

    let mut ranks = vec![0usize; n];
    match toposort(&acyclic, None) {
        Ok(order) => {
            for node in order {
                let rank = ranks[node.index()];
                for next in acyclic.neighbors(node) {
                    ranks[next.index()] = ranks[next.index()].max(rank + 1);
                }
            }
        }
        Err(cycle) => {
            // Unreachable once back edges are removed; keep everything on rank 0.
            tracing::warn!(node = ?cycle.node_id(), "cycle survived back-edge removal");
        }
    }

    Ranking { ranks, back_edges }
}
