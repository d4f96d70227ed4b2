//! Saved-roadmap documents
//!
//! JSON shapes exchanged with the saved-roadmap API, and their conversion
//! to and from the graph model. Nodes are stored in the same concept shape
//! the stream uses, plus `type: "concept"`.

use roadmap_graph::{Graph, GraphMeta, NodePatch, EdgePatch, RoadmapId};
use roadmap_layout::Layout;
use roadmap_stream::{ConceptRecord, EdgeRecord};
use serde::{Deserialize, Serialize};

/// Title used when the graph has no labelled first node
pub const UNTITLED: &str = "Untitled Roadmap";
/// Topic query used when the graph was not produced by a query
pub const MANUAL_SAVE_TOPIC: &str = "Manual Save";
/// Longest title the API accepts
pub const MAX_TITLE_CHARS: usize = 512;

fn concept_kind() -> String {
    "concept".to_string()
}

/// A stored node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedNode {
    /// Node type, always `concept` for nodes written by this client
    #[serde(rename = "type", default = "concept_kind")]
    pub kind: String,
    /// Concept fields
    #[serde(flatten)]
    pub record: ConceptRecord,
}

impl From<ConceptRecord> for PersistedNode {
    fn from(record: ConceptRecord) -> Self {
        Self {
            kind: concept_kind(),
            record,
        }
    }
}

/// Entry of `GET /roadmaps`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapSummary {
    /// Roadmap id
    pub id: RoadmapId,
    /// Title
    pub title: String,
    /// Creation time as sent by the server
    #[serde(default)]
    pub created_at: String,
}

/// Full saved roadmap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapDocument {
    /// Roadmap id
    pub id: RoadmapId,
    /// Title
    pub title: String,
    /// Query that produced it
    #[serde(default)]
    pub topic_query: String,
    /// Nodes
    #[serde(default)]
    pub nodes: Vec<PersistedNode>,
    /// Edges
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
    /// Creation time as sent by the server
    #[serde(default)]
    pub created_at: String,
}

impl RoadmapDocument {
    /// Summary view
    #[must_use]
    pub fn summary(&self) -> RoadmapSummary {
        RoadmapSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            created_at: self.created_at.clone(),
        }
    }

    /// Split into model patches and metadata
    #[must_use]
    pub fn into_parts(self) -> (Vec<NodePatch>, Vec<EdgePatch>, GraphMeta) {
        let nodes = self.nodes.into_iter().map(|n| n.record.into_patch()).collect();
        let edges = self.edges.into_iter().map(EdgeRecord::into_patch).collect();
        let topic_query = Some(self.topic_query).filter(|q| !q.trim().is_empty());
        let meta = GraphMeta {
            remote_id: Some(self.id),
            title: Some(self.title),
            topic_query,
        };
        (nodes, edges, meta)
    }
}

/// Body of `POST /roadmaps`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRoadmap {
    /// Title
    pub title: String,
    /// Query that produced the graph
    pub topic_query: String,
    /// Nodes
    pub nodes: Vec<PersistedNode>,
    /// Edges
    pub edges: Vec<EdgeRecord>,
}

/// Body of `PATCH /roadmaps/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadmapUpdate {
    /// New title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Replacement nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<PersistedNode>>,
    /// Replacement edges
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edges: Option<Vec<EdgeRecord>>,
}

/// Nodes and edges of `graph` in stored form, positions from `layout` when given
#[must_use]
pub fn persisted_parts(graph: &Graph, layout: Option<&Layout>) -> (Vec<PersistedNode>, Vec<EdgeRecord>) {
    let nodes = graph
        .nodes
        .values()
        .map(|node| {
            let position = layout.and_then(|l| l.position(&node.id));
            PersistedNode::from(ConceptRecord::from_node(node, position))
        })
        .collect();
    let edges = graph
        .edges
        .iter()
        .map(|edge| EdgeRecord {
            id: Some(edge.id.to_string()),
            source: Some(edge.source.to_string()),
            target: Some(edge.target.to_string()),
        })
        .collect();
    (nodes, edges)
}

/// Title for a new save: first node's label, else [`UNTITLED`]
#[must_use]
pub fn title_for(graph: &Graph) -> String {
    let title = graph.first_label().map_or(UNTITLED, str::trim);
    title.chars().take(MAX_TITLE_CHARS).collect()
}

/// Create body for `graph`
#[must_use]
pub fn new_roadmap(graph: &Graph, layout: Option<&Layout>) -> NewRoadmap {
    let (nodes, edges) = persisted_parts(graph, layout);
    NewRoadmap {
        title: title_for(graph),
        topic_query: graph
            .meta
            .topic_query
            .clone()
            .unwrap_or_else(|| MANUAL_SAVE_TOPIC.to_string()),
        nodes,
        edges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use roadmap_graph::GraphModel;
    use roadmap_layout::LayoutEngine;

    fn sample() -> Graph {
        let mut model = GraphModel::new();
        model
            .apply_node(NodePatch::labelled("n1", "Basics").with_resources(vec!["https://doc.rust-lang.org".into()]))
            .unwrap();
        model.apply_node(NodePatch::labelled("n2", "Advanced")).unwrap();
        model.apply_edge(EdgePatch::new("e1", "n1", "n2")).unwrap();
        model.snapshot()
    }

    #[test]
    fn new_roadmap_uses_first_label_and_manual_topic() {
        let body = new_roadmap(&sample(), None);
        assert_eq!(body.title, "Basics");
        assert_eq!(body.topic_query, MANUAL_SAVE_TOPIC);
        assert_eq!(body.nodes.len(), 2);
        assert_eq!(body.edges.len(), 1);
    }

    #[test]
    fn empty_graph_is_untitled() {
        assert_eq!(title_for(&Graph::default()), UNTITLED);
    }

    #[test]
    fn persisted_node_shape() {
        let graph = sample();
        let layout = LayoutEngine::default().compute(&graph);
        let (nodes, _) = persisted_parts(&graph, Some(&layout));

        let json = serde_json::to_value(&nodes[0]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "concept",
                "id": "n1",
                "label": "Basics",
                "position": {"x": 0.0, "y": 0.0},
                "data": {"label": "Basics", "resources": ["https://doc.rust-lang.org"]}
            })
        );
    }

    #[test]
    fn document_from_server_json() {
        let doc: RoadmapDocument = serde_json::from_value(serde_json::json!({
            "id": "r1",
            "title": "Rust",
            "topic_query": "learn rust",
            "nodes": [
                {"id": "n1", "type": "concept", "position": {"x": 0, "y": 0},
                 "data": {"label": "Basics", "description": null, "resources": []}}
            ],
            "edges": [{"id": "e1", "source": "n1", "target": "n2", "source_handle": null}],
            "created_at": "2025-01-01T00:00:00"
        }))
        .unwrap();

        let (nodes, edges, meta) = doc.into_parts();
        assert_eq!(nodes[0].label.as_deref(), Some("Basics"));
        assert_eq!(edges[0], EdgePatch::new("e1", "n1", "n2"));
        assert_eq!(meta.remote_id, Some(RoadmapId::new("r1")));
        assert_eq!(meta.topic_query.as_deref(), Some("learn rust"));
    }

    #[test]
    fn update_skips_absent_fields() {
        let update = RoadmapUpdate {
            nodes: Some(Vec::new()),
            ..RoadmapUpdate::default()
        };
        assert_eq!(serde_json::to_value(&update).unwrap(), serde_json::json!({"nodes": []}));
    }
}
