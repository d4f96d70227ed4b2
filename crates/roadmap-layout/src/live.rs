//! Recompute policy for a graph that grows while it is displayed
//!
//! The full layout is recomputed whenever node/edge membership changes and
//! reused otherwise, so label or description edits never move anything.

use crate::engine::{Layout, LayoutEngine};
use roadmap_graph::Graph;
use std::sync::Arc;

/// Outcome of [`LiveLayout::refresh`]
#[derive(Debug, Clone)]
pub struct Refresh {
    /// Current layout
    pub layout: Arc<Layout>,
    /// Whether this call ran the engine
    pub recomputed: bool,
}

/// Caches the last layout against the snapshot's structure revision
#[derive(Debug, Default)]
pub struct LiveLayout {
    engine: LayoutEngine,
    current: Option<Arc<Layout>>,
    runs: u64,
}

impl LiveLayout {
    /// Create with an engine
    #[inline]
    #[must_use]
    pub fn new(engine: LayoutEngine) -> Self {
        Self {
            engine,
            current: None,
            runs: 0,
        }
    }

    /// Return a layout for `graph`, recomputing only on membership change
    pub fn refresh(&mut self, graph: &Graph) -> Refresh {
        if let Some(current) = &self.current {
            if current.structure_revision == graph.structure_revision {
                return Refresh {
                    layout: Arc::clone(current),
                    recomputed: false,
                };
            }
        }

        let layout = Arc::new(self.engine.compute(graph));
        self.runs += 1;
        self.current = Some(Arc::clone(&layout));
        Refresh {
            layout,
            recomputed: true,
        }
    }

    /// Last computed layout
    #[inline]
    #[must_use]
    pub fn current(&self) -> Option<Arc<Layout>> {
        self.current.clone()
    }

    /// Forget the cached layout
    pub fn invalidate(&mut self) {
        self.current = None;
    }

    /// How many times the engine has run
    #[inline]
    #[must_use]
    pub fn runs(&self) -> u64 {
        self.runs
    }

    /// Underlying engine
    #[inline]
    #[must_use]
    pub fn engine(&self) -> &LayoutEngine {
        &self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadmap_graph::{EdgePatch, GraphModel, NodePatch};

    #[test]
    fn label_edit_reuses_layout() {
        let mut model = GraphModel::new();
        model.apply_node(NodePatch::labelled("a", "A")).unwrap();

        let mut live = LiveLayout::default();
        assert!(live.refresh(&model.snapshot()).recomputed);

        model.apply_node(NodePatch::labelled("a", "Renamed")).unwrap();
        let refresh = live.refresh(&model.snapshot());
        assert!(!refresh.recomputed);
        assert_eq!(live.runs(), 1);

        model.apply_edge(EdgePatch::new("e1", "a", "b")).unwrap();
        assert!(live.refresh(&model.snapshot()).recomputed);
        assert_eq!(live.runs(), 2);
    }

    #[test]
    fn invalidate_forces_recompute() {
        let model = GraphModel::new();
        let mut live = LiveLayout::default();
        live.refresh(&model.snapshot());
        live.invalidate();
        assert!(live.current().is_none());
        assert!(live.refresh(&model.snapshot()).recomputed);
    }
}
