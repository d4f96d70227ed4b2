//! Coordinate assignment
//!
//! Pure placement from (rank, slot, rank width). Every rank is centred on
//! the widest one. Coordinates are the top-left corner of each node box.

use crate::config::{Direction, LayoutConfig};
use crate::order::RankOrder;
use roadmap_graph::Position;

/// Placement of every node, indexed by insertion index
#[derive(Debug, Clone, Default)]
pub(crate) struct Placement {
    pub(crate) positions: Vec<Position>,
    pub(crate) width: f64,
    pub(crate) height: f64,
}

pub(crate) fn assign_coordinates(order: &RankOrder, node_count: usize, config: &LayoutConfig) -> Placement {
    let mut positions = vec![Position::default(); node_count];
    if order.is_empty() {
        return Placement::default();
    }

    // Along-rank extent of a node box and step between rank lines.
    let (span, rank_step) = match config.direction {
        Direction::TopToBottom => (config.node_width, config.node_height + config.rank_spacing),
        Direction::LeftToRight => (config.node_height, config.node_width + config.rank_spacing),
    };
    let slot_step = span + config.node_spacing;

    let extent = |count: usize| -> f64 {
        if count == 0 {
            0.0
        } else {
            count as f64 * span + (count - 1) as f64 * config.node_spacing
        }
    };
    let widest = order.iter().map(|rank| extent(rank.len())).fold(0.0_f64, f64::max);

    for (r, rank) in order.iter().enumerate() {
        let shift = (widest - extent(rank.len())) / 2.0;
        let across = r as f64 * rank_step;
        for (slot, node) in rank.iter().enumerate() {
            let along = shift + slot as f64 * slot_step;
            positions[node.index()] = match config.direction {
                Direction::TopToBottom => Position::new(along, across),
                Direction::LeftToRight => Position::new(across, along),
            };
        }
    }

    let depth = order.len() as f64 * rank_step - config.rank_spacing;
    let (width, height) = match config.direction {
        Direction::TopToBottom => (widest, depth),
        Direction::LeftToRight => (depth, widest),
    };

    Placement {
        positions,
        width,
        height,
    }
}
