//! Roadmap Graph
//!
//! The canonical in-memory model of one concept roadmap:
//! - [`GraphModel`]: upsert/merge store with structural invariants
//! - [`Graph`]: immutable snapshot used by layout and persistence
//! - [`NodePatch`] / [`EdgePatch`]: partial input as it arrives
//!
//! # Example
//!
//! ```rust
//! use roadmap_graph::{EdgePatch, GraphModel, NodePatch};
//!
//! let mut model = GraphModel::new();
//! model.apply_node(NodePatch::labelled("n1", "Basics")).unwrap();
//! model.apply_edge(EdgePatch::new("e1", "n1", "n2")).unwrap();
//!
//! let graph = model.snapshot();
//! assert_eq!(graph.node_count(), 1);
//! assert_eq!(graph.dangling_edges().count(), 1);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod model;
mod types;

pub use error::ValidationError;
pub use model::{GraphModel, Mutation, SharedGraph};
pub use types::{
    Edge, EdgeId, EdgePatch, Graph, GraphMeta, Node, NodeData, NodeId, NodePatch, Position,
    RoadmapId,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
