use proptest::prelude::*;
use roadmap_graph::{EdgePatch, GraphModel, NodeId, NodePatch};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
enum Event {
    Node { id: usize, label: String, description: Option<String> },
    Edge { id: usize, source: usize, target: usize },
}

fn event() -> impl Strategy<Value = Event> {
    prop_oneof![
        (0..8usize, prop_oneof![Just(String::new()), "[a-z]{1,6}"], proptest::option::of("[a-z]{0,6}"))
            .prop_map(|(id, label, description)| Event::Node { id, label, description }),
        (0..8usize, 0..8usize, 0..8usize)
            .prop_map(|(id, source, target)| Event::Edge { id, source, target }),
    ]
}

fn apply(model: &mut GraphModel, event: &Event) {
    match event {
        Event::Node { id, label, description } => {
            let mut patch = NodePatch::labelled(format!("n{id}"), label.clone());
            patch.description = description.clone();
            model.apply_node(patch).unwrap();
        }
        Event::Edge { id, source, target } => {
            model
                .apply_edge(EdgePatch::new(format!("e{id}"), format!("n{source}"), format!("n{target}")))
                .unwrap();
        }
    }
}

proptest! {
    #[test]
    fn prop_snapshot_holds_unique_ids_and_last_non_empty_fields(
        events in proptest::collection::vec(event(), 0..60)
    ) {
        let mut model = GraphModel::new();
        for e in &events {
            apply(&mut model, e);
        }
        let graph = model.snapshot();

        let mut node_ids = HashSet::new();
        let mut edge_ids = HashSet::new();
        let mut labels: HashMap<usize, String> = HashMap::new();
        let mut descriptions: HashMap<usize, String> = HashMap::new();
        for e in &events {
            match e {
                Event::Node { id, label, description } => {
                    node_ids.insert(*id);
                    if !label.is_empty() {
                        labels.insert(*id, label.clone());
                    }
                    if let Some(d) = description.as_ref().filter(|d| !d.is_empty()) {
                        descriptions.insert(*id, d.clone());
                    }
                }
                Event::Edge { id, .. } => {
                    edge_ids.insert(*id);
                }
            }
        }

        prop_assert_eq!(graph.node_count(), node_ids.len());
        prop_assert_eq!(graph.edge_count(), edge_ids.len());

        for id in node_ids {
            let node = graph.node(&NodeId::new(format!("n{id}"))).unwrap();
            prop_assert_eq!(node.label.as_str(), labels.get(&id).map_or("", String::as_str));
            prop_assert_eq!(node.data.description.as_ref(), descriptions.get(&id));
        }
    }

    #[test]
    fn prop_reapplying_events_is_idempotent(
        events in proptest::collection::vec(event(), 0..40)
    ) {
        let mut once = GraphModel::new();
        let mut twice = GraphModel::new();
        for e in &events {
            apply(&mut once, e);
            apply(&mut twice, e);
            apply(&mut twice, e);
        }

        let a = once.snapshot();
        let b = twice.snapshot();
        prop_assert_eq!(a.nodes.keys().collect::<Vec<_>>(), b.nodes.keys().collect::<Vec<_>>());
        prop_assert_eq!(&a.nodes, &b.nodes);
        prop_assert_eq!(&a.edges, &b.edges);
        prop_assert_eq!(a.structure_revision, b.structure_revision);
    }
}

#[test]
fn edges_keep_arrival_order() {
    let mut model = GraphModel::new();
    model.apply_edge(EdgePatch::new("e2", "b", "c")).unwrap();
    model.apply_edge(EdgePatch::new("e1", "a", "b")).unwrap();

    let ids: Vec<_> = model.snapshot().edges.iter().map(|e| e.id.to_string()).collect();
    assert_eq!(ids, vec!["e2", "e1"]);
}
