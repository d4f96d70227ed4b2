//! Ordering within ranks
//!
//! Barycenter crossing minimization. Each pass sweeps down (ordering a rank
//! by the mean position of its predecessors in the rank above) and then up
//! (by the mean position of successors in the rank below). The ordering
//! with the fewest crossings seen across all passes is kept. Ties break by
//! insertion index, so the result is a pure function of the input.

use crate::dag::LayoutDag;
use crate::rank::Ranking;
use petgraph::graph::NodeIndex;

/// Node order per rank
pub(crate) type RankOrder = Vec<Vec<NodeIndex>>;

/// Forward adjacency restricted to ranking edges
#[derive(Debug)]
struct Adjacency {
    down: Vec<Vec<NodeIndex>>,
    up: Vec<Vec<NodeIndex>>,
}

impl Adjacency {
    fn new(dag: &LayoutDag, ranking: &Ranking) -> Self {
        let n = dag.node_count();
        let mut down = vec![Vec::new(); n];
        let mut up = vec![Vec::new(); n];
        for node in dag.inner.node_indices() {
            for next in dag.successors(node) {
                if ranking.is_back_edge(node, next) {
                    continue;
                }
                down[node.index()].push(next);
                up[next.index()].push(node);
            }
        }
        Self { down, up }
    }
}

/// Initial buckets: nodes of each rank in insertion order
pub(crate) fn build_rank_buckets(ranking: &Ranking) -> RankOrder {
    let mut buckets = vec![Vec::new(); ranking.rank_count()];
    for (idx, &rank) in ranking.ranks.iter().enumerate() {
        buckets[rank].push(NodeIndex::new(idx));
    }
    buckets
}

/// Run `passes` down/up sweeps and return the best ordering with its crossings
pub(crate) fn minimize_crossings(
    dag: &LayoutDag,
    ranking: &Ranking,
    passes: usize,
) -> (RankOrder, usize) {
    let adjacency = Adjacency::new(dag, ranking);
    let mut order = build_rank_buckets(ranking);
    let mut best_crossings = total_crossings(&order, &adjacency, dag.node_count());
    let mut best = order.clone();

    if order.len() <= 1 {
        return (best, best_crossings);
    }

    for _ in 0..passes {
        if best_crossings == 0 {
            break;
        }

        for r in 1..order.len() {
            let (above, rest) = order.split_at_mut(r);
            sweep(&mut rest[0], &above[r - 1], &adjacency.up, dag.node_count());
        }
        for r in (0..order.len() - 1).rev() {
            let (head, below) = order.split_at_mut(r + 1);
            sweep(&mut head[r], &below[0], &adjacency.down, dag.node_count());
        }

        let crossings = total_crossings(&order, &adjacency, dag.node_count());
        if crossings < best_crossings {
            best_crossings = crossings;
            best = order.clone();
        }
    }

    (best, best_crossings)
}

/// Reorder `rank` by the barycenter of each node's neighbours in `fixed`
///
/// Nodes without neighbours in `fixed` keep their current slot as their key.
fn sweep(rank: &mut [NodeIndex], fixed: &[NodeIndex], neighbours: &[Vec<NodeIndex>], n: usize) {
    let positions = position_map(fixed, n);

    let mut keyed: Vec<(f64, NodeIndex)> = rank
        .iter()
        .enumerate()
        .map(|(slot, &node)| {
            let placed: Vec<usize> = neighbours[node.index()]
                .iter()
                .filter_map(|nb| positions[nb.index()])
                .collect();
            let key = if placed.is_empty() {
                slot as f64
            } else {
                placed.iter().sum::<usize>() as f64 / placed.len() as f64
            };
            (key, node)
        })
        .collect();

    keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    for (slot, (_, node)) in keyed.into_iter().enumerate() {
        rank[slot] = node;
    }
}

fn position_map(rank: &[NodeIndex], n: usize) -> Vec<Option<usize>> {
    let mut positions = vec![None; n];
    for (i, node) in rank.iter().enumerate() {
        positions[node.index()] = Some(i);
    }
    positions
}

/// Crossings between two adjacent ranks
fn count_crossings(upper: &[NodeIndex], lower: &[NodeIndex], adjacency: &Adjacency, n: usize) -> usize {
    let lower_pos = position_map(lower, n);

    let mut segments: Vec<(usize, usize)> = Vec::new();
    for (i, node) in upper.iter().enumerate() {
        for next in &adjacency.down[node.index()] {
            if let Some(j) = lower_pos[next.index()] {
                segments.push((i, j));
            }
        }
    }

    let mut crossings = 0;
    for (k, &(a1, b1)) in segments.iter().enumerate() {
        for &(a2, b2) in &segments[k + 1..] {
            if (a1 < a2 && b1 > b2) || (a1 > a2 && b1 < b2) {
                crossings += 1;
            }
        }
    }
    crossings
}

fn total_crossings(order: &RankOrder, adjacency: &Adjacency, n: usize) -> usize {
    order
        .windows(2)
        .map(|pair| count_crossings(&pair[0], &pair[1], adjacency, n))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rank::assign_ranks;
    use roadmap_graph::{EdgePatch, GraphModel, NodePatch};

    fn dag(nodes: &[&str], edges: &[(&str, &str)]) -> LayoutDag {
        let mut model = GraphModel::new();
        for id in nodes {
            model.apply_node(NodePatch::labelled(*id, *id)).unwrap();
        }
        for (i, (s, t)) in edges.iter().enumerate() {
            model.apply_edge(EdgePatch::new(format!("e{i}"), *s, *t)).unwrap();
        }
        LayoutDag::from_graph(&model.snapshot())
    }

    fn names(d: &LayoutDag, order: &RankOrder) -> Vec<Vec<String>> {
        order
            .iter()
            .map(|rank| rank.iter().map(|n| d.inner[*n].to_string()).collect())
            .collect()
    }

    #[test]
    fn buckets_follow_insertion_order() {
        let d = dag(&["a", "b", "c"], &[("a", "c")]);
        let ranking = assign_ranks(&d);
        let buckets = build_rank_buckets(&ranking);
        assert_eq!(names(&d, &buckets), vec![vec!["a", "b"], vec!["c"]]);
    }

    #[test]
    fn removes_simple_crossing() {
        // a -> d, b -> c: inserted order gives [a, b] over [c, d], one crossing
        let d = dag(&["a", "b", "c", "d"], &[("a", "d"), ("b", "c")]);
        let ranking = assign_ranks(&d);

        let initial = build_rank_buckets(&ranking);
        let adjacency = Adjacency::new(&d, &ranking);
        assert_eq!(total_crossings(&initial, &adjacency, d.node_count()), 1);

        let (order, crossings) = minimize_crossings(&d, &ranking, 4);
        assert_eq!(crossings, 0);
        assert_eq!(names(&d, &order), vec![vec!["a", "b"], vec!["d", "c"]]);
    }

    #[test]
    fn zero_passes_keeps_insertion_order() {
        let d = dag(&["a", "b", "c", "d"], &[("a", "d"), ("b", "c")]);
        let ranking = assign_ranks(&d);
        let (order, crossings) = minimize_crossings(&d, &ranking, 0);
        assert_eq!(crossings, 1);
        assert_eq!(names(&d, &order), vec![vec!["a", "b"], vec!["c", "d"]]);
    }
}
