//! Wire protocol
//!
//! Every message body is a JSON object with a `type` field:
//!
//! ```text
//! {"type":"meta","id":"<graph-id>"}
//! {"type":"concept","id":"n1","label":"…","data":{"label":"…","description":"…","resources":["…"]}}
//! {"type":"edge","id":"e1","source":"n1","target":"n2"}
//! ```
//!
//! Unknown or missing `type` values decode to [`StreamEvent::Ignored`].

use crate::error::MessageError;
use roadmap_graph::{EdgePatch, Node, NodePatch, Position, RoadmapId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One decoded stream message
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Server-side id of the roadmap being generated
    Meta {
        /// Remote roadmap id
        id: RoadmapId,
    },
    /// Concept node
    Concept(NodePatch),
    /// Dependency edge
    Edge(EdgePatch),
    /// Message with a type this client does not handle
    Ignored {
        /// Value of the `type` field (empty when absent)
        kind: String,
    },
}

impl StreamEvent {
    /// Short name for logs
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Meta { .. } => "meta",
            Self::Concept(_) => "concept",
            Self::Edge(_) => "edge",
            Self::Ignored { kind } => kind,
        }
    }
}

/// Nested `data` object of a concept
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConceptData {
    /// Preferred label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Resources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<String>>,
}

/// Concept as it appears on the wire and in saved documents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConceptRecord {
    /// Node id
    #[serde(default)]
    pub id: Option<String>,
    /// Top-level label, used when `data.label` is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Saved position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// Detail data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ConceptData>,
}

impl ConceptRecord {
    /// Label resolution: `data.label`, else top-level `label`, else empty.
    /// A `null` `data.label` counts as absent.
    #[must_use]
    pub fn resolved_label(&self) -> String {
        self.data
            .as_ref()
            .and_then(|d| d.label.clone())
            .or_else(|| self.label.clone())
            .unwrap_or_default()
    }

    /// Convert into a model patch
    #[must_use]
    pub fn into_patch(self) -> NodePatch {
        let label = self.resolved_label();
        let data = self.data.unwrap_or_default();
        NodePatch {
            id: self.id,
            label: Some(label),
            description: data.description,
            resources: data.resources,
            position: self.position,
        }
    }

    /// Record for a stored node, with the label written in both places
    #[must_use]
    pub fn from_node(node: &Node, position: Option<Position>) -> Self {
        Self {
            id: Some(node.id.to_string()),
            label: Some(node.label.clone()),
            position: position.or(node.position),
            data: Some(ConceptData {
                label: Some(node.label.clone()),
                description: node.data.description.clone(),
                resources: Some(node.data.resources.clone()),
            }),
        }
    }
}

/// Edge as it appears on the wire
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    /// Edge id
    #[serde(default)]
    pub id: Option<String>,
    /// Source node id
    #[serde(default)]
    pub source: Option<String>,
    /// Target node id
    #[serde(default)]
    pub target: Option<String>,
}

impl EdgeRecord {
    /// Convert into a model patch
    #[must_use]
    pub fn into_patch(self) -> EdgePatch {
        EdgePatch {
            id: self.id,
            source: self.source,
            target: self.target,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MetaRecord {
    #[serde(default)]
    id: Option<String>,
}

/// Decode one message body
///
/// # Errors
/// - `MessageError::Json` when the body is not JSON or a known event has
///   fields of the wrong type
/// - `MessageError::MissingField` for a `meta` event without an id
pub fn parse_message(text: &str) -> Result<StreamEvent, MessageError> {
    let value: Value = serde_json::from_str(text)?;
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    match kind.as_str() {
        "meta" => {
            let meta: MetaRecord = serde_json::from_value(value)?;
            let id = meta
                .id
                .filter(|id| !id.trim().is_empty())
                .ok_or(MessageError::MissingField {
                    kind: "meta",
                    field: "id",
                })?;
            Ok(StreamEvent::Meta { id: RoadmapId::new(id) })
        }
        "concept" => {
            let record: ConceptRecord = serde_json::from_value(value)?;
            Ok(StreamEvent::Concept(record.into_patch()))
        }
        "edge" => {
            let record: EdgeRecord = serde_json::from_value(value)?;
            Ok(StreamEvent::Edge(record.into_patch()))
        }
        _ => Ok(StreamEvent::Ignored { kind }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_meta() {
        let event = parse_message(r#"{"type":"meta","id":"g1"}"#).unwrap();
        assert_eq!(event, StreamEvent::Meta { id: RoadmapId::new("g1") });
    }

    #[test]
    fn meta_without_id_is_rejected() {
        let err = parse_message(r#"{"type":"meta"}"#).unwrap_err();
        assert!(matches!(err, MessageError::MissingField { kind: "meta", .. }));
    }

    #[test]
    fn concept_prefers_nested_label() {
        let event = parse_message(
            r#"{"type":"concept","id":"n1","label":"outer","data":{"label":"inner","description":"d","resources":["r"]}}"#,
        )
        .unwrap();
        let StreamEvent::Concept(patch) = event else {
            panic!("expected concept");
        };
        assert_eq!(patch.id.as_deref(), Some("n1"));
        assert_eq!(patch.label.as_deref(), Some("inner"));
        assert_eq!(patch.description.as_deref(), Some("d"));
        assert_eq!(patch.resources, Some(vec!["r".to_string()]));
    }

    #[test]
    fn concept_label_falls_back_to_top_level_then_empty() {
        let StreamEvent::Concept(patch) =
            parse_message(r#"{"type":"concept","id":"n1","label":"Basics","data":{}}"#).unwrap()
        else {
            panic!("expected concept");
        };
        assert_eq!(patch.label.as_deref(), Some("Basics"));

        let StreamEvent::Concept(patch) = parse_message(r#"{"type":"concept","id":"n2"}"#).unwrap() else {
            panic!("expected concept");
        };
        assert_eq!(patch.label.as_deref(), Some(""));
    }

    #[test]
    fn null_nested_label_falls_back_to_top_level() {
        let StreamEvent::Concept(patch) =
            parse_message(r#"{"type":"concept","id":"n1","label":"Basics","data":{"label":null}}"#).unwrap()
        else {
            panic!("expected concept");
        };
        assert_eq!(patch.label.as_deref(), Some("Basics"));
    }

    #[test]
    fn edge_ignores_extra_fields() {
        let event = parse_message(
            r#"{"type":"edge","id":"e1","source":"n1","target":"n2","source_handle":null}"#,
        )
        .unwrap();
        assert_eq!(event, StreamEvent::Edge(EdgePatch::new("e1", "n1", "n2")));
    }

    #[test]
    fn unknown_and_missing_type_are_ignored() {
        assert_eq!(
            parse_message(r#"{"type":"progress","pct":50}"#).unwrap(),
            StreamEvent::Ignored { kind: "progress".into() }
        );
        assert_eq!(parse_message(r#"{"id":"n1"}"#).unwrap().kind(), "");
    }

    #[test]
    fn garbage_is_a_json_error() {
        assert!(matches!(parse_message("{not json"), Err(MessageError::Json(_))));
        assert!(matches!(
            parse_message(r#"{"type":"concept","id":"n1","data":{"resources":"oops"}}"#),
            Err(MessageError::Json(_))
        ));
    }

    #[test]
    fn record_from_node_duplicates_label() {
        let node = Node::new("n1", "Basics").with_description("intro");
        let record = ConceptRecord::from_node(&node, Some(Position::new(1.0, 2.0)));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "n1",
                "label": "Basics",
                "position": {"x": 1.0, "y": 2.0},
                "data": {"label": "Basics", "description": "intro", "resources": []}
            })
        );
    }
}
