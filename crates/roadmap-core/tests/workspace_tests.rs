use pretty_assertions::assert_eq;
use roadmap_core::{ClientConfig, PersistOutcome, PersistenceError, RoadmapDocument, RoadmapWorkspace, WorkspaceError};
use roadmap_graph::{NodeId, RoadmapId};
use roadmap_stream::{SessionState, StreamError, TransportEvent};
use roadmap_test_utils::{
    concept, edge, meta, msg, scenario_steps, InMemoryRoadmapStore, ScriptedTransport, Step, StoreCall,
};
use std::sync::Arc;

/// Scenario without the server-assigned id
fn unsaved_steps() -> Vec<Step> {
    vec![
        Step::Emit(TransportEvent::Opened),
        msg(concept("n1", "Basics")),
        msg(concept("n2", "Advanced")),
        msg(edge("e1", "n1", "n2")),
        Step::Emit(TransportEvent::Closed),
    ]
}

fn saved(id: &str, title: &str) -> RoadmapDocument {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "title": title,
        "topic_query": "databases",
        "nodes": [
            {"id": "a", "type": "concept", "position": {"x": 0, "y": 0}, "data": {"label": "SQL"}},
            {"id": "b", "type": "concept", "position": {"x": 0, "y": 120}, "data": {"label": "Indexes"}}
        ],
        "edges": [{"id": "ab", "source": "a", "target": "b"}],
        "created_at": "2025-01-01T00:00:00"
    }))
    .unwrap()
}

struct Fixture {
    workspace: RoadmapWorkspace,
    transport: Arc<ScriptedTransport>,
    store: Arc<InMemoryRoadmapStore>,
}

fn fixture(transport: ScriptedTransport, store: InMemoryRoadmapStore) -> Fixture {
    fixture_with(ClientConfig::default(), transport, store)
}

fn fixture_with(config: ClientConfig, transport: ScriptedTransport, store: InMemoryRoadmapStore) -> Fixture {
    let transport = Arc::new(transport);
    let store = Arc::new(store);
    let workspace = RoadmapWorkspace::new(config, transport.clone(), store.clone());
    Fixture {
        workspace,
        transport,
        store,
    }
}

#[tokio::test]
async fn test_generate_then_persist_creates_then_updates() {
    let f = fixture(ScriptedTransport::new().with_default(unsaved_steps()), InMemoryRoadmapStore::new());

    f.workspace.generate("learn rust").unwrap();
    assert_eq!(f.workspace.wait_until_finished().await.state, SessionState::Closed);

    let created = f.workspace.persist().await.unwrap();
    assert_eq!(created, PersistOutcome::Created(RoadmapId::new("saved-1")));
    assert_eq!(f.workspace.snapshot().meta.remote_id, Some(RoadmapId::new("saved-1")));

    let stored = f.store.stored(created.id()).unwrap();
    assert_eq!(stored.title, "Basics");
    assert_eq!(stored.topic_query, "learn rust");
    assert_eq!(stored.nodes.len(), 2);
    assert!(stored.nodes.iter().all(|n| n.record.position.is_some()));
    assert!(stored.nodes.iter().all(|n| n.kind == "concept"));

    let updated = f.workspace.persist().await.unwrap();
    assert_eq!(updated, PersistOutcome::Updated(RoadmapId::new("saved-1")));
    assert_eq!(
        f.store.calls(),
        [
            StoreCall::Create("Basics".into()),
            StoreCall::Update(RoadmapId::new("saved-1"))
        ]
    );
}

#[tokio::test]
async fn test_server_assigned_id_means_update() {
    let f = fixture(
        ScriptedTransport::new().with_default(scenario_steps()),
        InMemoryRoadmapStore::new().with_roadmap(saved("g1", "Basics")),
    );

    f.workspace.generate("learn rust").unwrap();
    f.workspace.wait_until_finished().await;

    let outcome = f.workspace.persist().await.unwrap();
    assert_eq!(outcome, PersistOutcome::Updated(RoadmapId::new("g1")));
    let stored = f.store.stored(&RoadmapId::new("g1")).unwrap();
    let labels: Vec<String> = stored.nodes.iter().map(|n| n.record.resolved_label()).collect();
    assert_eq!(labels, ["Basics", "Advanced"]);
}

#[tokio::test]
async fn test_persist_refused_while_generating() {
    let steps = vec![Step::Emit(TransportEvent::Opened), msg(concept("n1", "Basics")), Step::Hang];
    let f = fixture(ScriptedTransport::new().with_default(steps), InMemoryRoadmapStore::new());

    f.workspace.generate("q").unwrap();
    assert_eq!(f.workspace.persist().await, Err(PersistenceError::StillGenerating));
    assert!(f.store.calls().is_empty());

    f.workspace.cancel();
    assert!(f.workspace.persist().await.is_ok());
}

#[tokio::test]
async fn test_failed_create_keeps_graph_unsaved() {
    let f = fixture(ScriptedTransport::new().with_default(unsaved_steps()), InMemoryRoadmapStore::new());
    f.workspace.generate("q").unwrap();
    f.workspace.wait_until_finished().await;

    f.store.fail_next(PersistenceError::Api {
        status: 500,
        body: "Internal Server Error".into(),
    });
    let err = f.workspace.persist().await.unwrap_err();

    assert_eq!(err.to_string(), "API Error 500: Internal Server Error");
    assert_eq!(f.workspace.snapshot().meta.remote_id, None);
    assert!(f.store.is_empty());
}

#[tokio::test]
async fn test_load_replaces_graph_and_cancels_generation() {
    let steps = vec![Step::Emit(TransportEvent::Opened), msg(meta("g9")), msg(concept("n1", "Basics")), Step::Hang];
    let f = fixture(
        ScriptedTransport::new().with_default(steps),
        InMemoryRoadmapStore::new().with_roadmap(saved("r1", "Databases")),
    );

    f.workspace.generate("q").unwrap();
    f.workspace.select(Some(NodeId::from("n1")));

    let loaded = f.workspace.load(&RoadmapId::new("r1")).await.unwrap();
    assert_eq!(loaded.title, "Databases");
    assert_eq!(loaded.rejected, 0);

    let status = f.workspace.status();
    assert!(!status.is_generating);
    assert_eq!(status.state, SessionState::Closed);
    assert_eq!(f.workspace.selected_node(), None);

    let graph = f.workspace.snapshot();
    assert_eq!(graph.node_count(), 2);
    assert!(graph.node(&NodeId::from("n1")).is_none());
    assert_eq!(graph.meta.remote_id, Some(RoadmapId::new("r1")));
    assert_eq!(graph.meta.topic_query.as_deref(), Some("databases"));
}

#[tokio::test]
async fn test_failed_load_changes_nothing() {
    let f = fixture(ScriptedTransport::new().with_default(unsaved_steps()), InMemoryRoadmapStore::new());
    f.workspace.generate("q").unwrap();
    f.workspace.wait_until_finished().await;
    let before = f.workspace.snapshot();

    let err = f.workspace.load(&RoadmapId::new("missing")).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(f.workspace.snapshot(), before);
}

#[tokio::test]
async fn test_deleting_shown_roadmap_makes_next_persist_create() {
    let f = fixture(
        ScriptedTransport::new(),
        InMemoryRoadmapStore::new().with_roadmap(saved("r1", "Databases")),
    );
    f.workspace.load(&RoadmapId::new("r1")).await.unwrap();

    f.workspace.delete(&RoadmapId::new("r1")).await.unwrap();
    assert_eq!(f.workspace.snapshot().meta.remote_id, None);
    assert!(f.workspace.list().await.unwrap().is_empty());

    let outcome = f.workspace.persist().await.unwrap();
    assert!(matches!(outcome, PersistOutcome::Created(_)));
    let stored = f.store.stored(outcome.id()).unwrap();
    assert_eq!(stored.title, "SQL");
    assert_eq!(stored.topic_query, "databases");
}

#[tokio::test]
async fn test_layout_follows_structure_changes() {
    let f = fixture(ScriptedTransport::new().with_default(unsaved_steps()), InMemoryRoadmapStore::new());

    let empty = f.workspace.layout();
    assert!(empty.layout.positions.is_empty());

    f.workspace.generate("q").unwrap();
    f.workspace.wait_until_finished().await;

    let first = f.workspace.layout();
    assert!(first.recomputed);
    assert_eq!(first.layout.positions.len(), 2);
    assert_eq!(first.layout.rank(&NodeId::from("n1")), Some(0));
    assert_eq!(first.layout.rank(&NodeId::from("n2")), Some(1));

    let again = f.workspace.layout();
    assert!(!again.recomputed);
    assert_eq!(again.layout, first.layout);
}

#[tokio::test]
async fn test_generate_forwards_configured_credentials() {
    let config = ClientConfig::default()
        .with_user_api_key(Some("sk-user".into()))
        .with_access_token(Some("token".into()));
    let f = fixture_with(
        config,
        ScriptedTransport::new().with_default(scenario_steps()),
        InMemoryRoadmapStore::new(),
    );

    f.workspace.generate("rust").unwrap();
    f.workspace.wait_until_finished().await;

    let requests = f.transport.requests();
    assert_eq!(requests[0].user_api_key.as_deref(), Some("sk-user"));
    assert_eq!(requests[0].access_token.as_deref(), Some("token"));
}

#[tokio::test]
async fn test_blank_query_is_refused() {
    let f = fixture(ScriptedTransport::new(), InMemoryRoadmapStore::new());
    let err = f.workspace.generate("   ").unwrap_err();
    assert!(matches!(err, WorkspaceError::Stream(StreamError::EmptyQuery)));
    assert!(f.transport.requests().is_empty());
}

#[tokio::test]
async fn test_generate_clears_selection() {
    let f = fixture(ScriptedTransport::new().with_default(unsaved_steps()), InMemoryRoadmapStore::new());
    f.workspace.generate("q").unwrap();
    f.workspace.wait_until_finished().await;

    f.workspace.select(Some(NodeId::from("n2")));
    assert_eq!(f.workspace.selected_node().map(|n| n.label), Some("Advanced".to_string()));

    f.workspace.generate("again").unwrap();
    assert_eq!(f.workspace.selected_node(), None);
}
