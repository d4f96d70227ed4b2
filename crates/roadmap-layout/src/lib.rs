//! Roadmap Layout
//!
//! Deterministic layered placement for concept roadmaps:
//! 1. **Rank**: longest path from entry nodes, back edges ignored
//! 2. **Order**: barycenter crossing minimization, ties by insertion order
//! 3. **Coordinates**: fixed box size, configurable node and rank spacing
//!
//! Identical snapshots always produce identical layouts. Dangling and
//! self-loop edges never reach ranking; they are reported on the [`Layout`]
//! so a renderer can decide what to do with them.
//!
//! # Example
//!
//! ```rust
//! use roadmap_graph::{EdgePatch, GraphModel, NodePatch};
//! use roadmap_layout::{LayoutConfig, LayoutEngine};
//!
//! let mut model = GraphModel::new();
//! model.apply_node(NodePatch::labelled("n1", "Basics")).unwrap();
//! model.apply_node(NodePatch::labelled("n2", "Advanced")).unwrap();
//! model.apply_edge(EdgePatch::new("e1", "n1", "n2")).unwrap();
//!
//! let layout = LayoutEngine::new(LayoutConfig::default()).compute(&model.snapshot());
//! assert_eq!(layout.rank(&"n2".into()), Some(1));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod config;
mod coords;
mod dag;
mod engine;
mod live;
mod order;
mod rank;

pub use config::{Direction, LayoutConfig, LayoutConfigError, DEFAULT_NODE_HEIGHT, DEFAULT_NODE_WIDTH};
pub use engine::{Layout, LayoutEngine, RoutedEdge};
pub use live::{LiveLayout, Refresh};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
