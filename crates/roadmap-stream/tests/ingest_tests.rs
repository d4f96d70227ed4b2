use pretty_assertions::assert_eq;
use roadmap_graph::{GraphModel, NodeId, RoadmapId};
use roadmap_stream::{GenerateRequest, IngestStatus, SessionState, StreamError, StreamIngestor, TransportEvent};
use roadmap_test_utils::{concept, edge, meta, msg, rate_limited_steps, scenario_steps, ScriptedTransport, Step};
use std::sync::Arc;
use std::time::Duration;

fn ingestor(transport: ScriptedTransport) -> (StreamIngestor, Arc<ScriptedTransport>) {
    let transport = Arc::new(transport);
    let ingestor = StreamIngestor::new(GraphModel::shared(), transport.clone());
    (ingestor, transport)
}

async fn wait_for(ingestor: &StreamIngestor, done: impl Fn(&IngestStatus) -> bool) -> IngestStatus {
    let mut rx = ingestor.subscribe();
    let status = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| done(s)))
        .await
        .expect("timed out waiting for status")
        .expect("ingestor dropped");
    status.clone()
}

#[tokio::test]
async fn test_scenario_builds_graph_and_closes() {
    let (ingestor, _) = ingestor(ScriptedTransport::new().with_default(scenario_steps()));

    tokio_test::assert_ok!(ingestor.start(GenerateRequest::new("learn rust")));
    let status = ingestor.wait_until_finished().await;

    assert_eq!(status.state, SessionState::Closed);
    assert!(!status.is_generating);
    assert_eq!(status.last_error, None);
    assert_eq!(status.counters.applied, 4);

    let graph = ingestor.graph().read().snapshot();
    let labels: Vec<&str> = graph.nodes.values().map(|n| n.label.as_str()).collect();
    assert_eq!(labels, ["Basics", "Advanced"]);
    assert_eq!(graph.edge_count(), 1);
    assert_eq!(graph.dangling_edges().count(), 0);
    assert_eq!(graph.meta.remote_id, Some(RoadmapId::new("g1")));
}

#[tokio::test]
async fn test_malformed_message_is_skipped_and_stream_continues() {
    let mut steps = vec![Step::Emit(TransportEvent::Opened)];
    for i in 0..10 {
        if i == 4 {
            steps.push(msg("{\"type\":\"concept\",\"id\":"));
        } else {
            steps.push(msg(concept(&format!("n{i}"), &format!("Concept {i}"))));
        }
    }
    steps.push(Step::Hang);
    let (ingestor, _) = ingestor(ScriptedTransport::new().with_default(steps));

    ingestor.start(GenerateRequest::new("q")).unwrap();
    let status = wait_for(&ingestor, |s| s.counters.total() == 10).await;

    assert_eq!(status.counters.applied, 9);
    assert_eq!(status.counters.rejected, 1);
    assert_eq!(status.state, SessionState::Streaming);
    assert!(status.is_generating);
    assert_eq!(ingestor.graph().read().node_count(), 9);
}

#[tokio::test]
async fn test_superseded_session_contributes_nothing() {
    let first = vec![
        Step::Emit(TransportEvent::Opened),
        msg(concept("old", "Old")),
        Step::Sleep(Duration::from_millis(200)),
        msg(concept("late", "Late")),
        msg(edge("late-e", "old", "late")),
        Step::Emit(TransportEvent::Closed),
    ];
    let (ingestor, transport) = ingestor(
        ScriptedTransport::new()
            .with_script("first", first)
            .with_script("second", scenario_steps()),
    );

    ingestor.start(GenerateRequest::new("first")).unwrap();
    wait_for(&ingestor, |s| s.counters.applied == 1).await;

    ingestor.start(GenerateRequest::new("second")).unwrap();
    let status = ingestor.wait_until_finished().await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(status.state, SessionState::Closed);
    assert_eq!(status.query.as_deref(), Some("second"));
    assert_eq!(status.counters.applied, 4);

    let graph = ingestor.graph().read().snapshot();
    assert!(graph.node(&NodeId::from("old")).is_none());
    assert!(graph.node(&NodeId::from("late")).is_none());
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.meta.topic_query.as_deref(), Some("second"));
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test]
async fn test_cancel_keeps_partial_graph() {
    let steps = vec![
        Step::Emit(TransportEvent::Opened),
        msg(meta("g7")),
        msg(concept("n1", "Basics")),
        Step::Hang,
    ];
    let (ingestor, _) = ingestor(ScriptedTransport::new().with_default(steps));

    ingestor.start(GenerateRequest::new("q")).unwrap();
    wait_for(&ingestor, |s| s.counters.applied == 2).await;
    ingestor.cancel();

    let status = ingestor.status();
    assert_eq!(status.state, SessionState::Closed);
    assert!(!status.is_generating);
    assert_eq!(ingestor.active_session(), None);
    assert_eq!(ingestor.graph().read().node_count(), 1);
    assert_eq!(ingestor.graph().read().remote_id(), Some(&RoadmapId::new("g7")));
}

#[tokio::test]
async fn test_rate_limit_errors_session() {
    let (ingestor, _) = ingestor(ScriptedTransport::new().with_default(rate_limited_steps()));

    ingestor.start(GenerateRequest::new("q")).unwrap();
    let status = ingestor.wait_until_finished().await;

    assert_eq!(status.state, SessionState::Errored);
    assert!(!status.is_generating);
    let err = status.last_error.expect("error recorded");
    assert!(matches!(err, StreamError::RateLimited(_)));
    assert!(err.is_rate_limited());
    assert!(ingestor.graph().read().snapshot().is_empty());
}

#[tokio::test]
async fn test_network_failure_is_not_rate_limited() {
    let steps = vec![
        Step::Emit(TransportEvent::Opened),
        msg(concept("n1", "Basics")),
        Step::Emit(TransportEvent::Failed(roadmap_stream::TransportFailure::network("connection reset"))),
    ];
    let (ingestor, _) = ingestor(ScriptedTransport::new().with_default(steps));

    ingestor.start(GenerateRequest::new("q")).unwrap();
    let status = ingestor.wait_until_finished().await;

    assert_eq!(status.state, SessionState::Errored);
    assert!(matches!(status.last_error, Some(StreamError::Transport(_))));
    assert_eq!(ingestor.graph().read().node_count(), 1);
}

#[tokio::test]
async fn test_restart_after_error_clears_previous_failure() {
    let (ingestor, _) = ingestor(
        ScriptedTransport::new()
            .with_script("limited", rate_limited_steps())
            .with_script("ok", scenario_steps()),
    );

    ingestor.start(GenerateRequest::new("limited")).unwrap();
    assert_eq!(ingestor.wait_until_finished().await.state, SessionState::Errored);

    ingestor.start(GenerateRequest::new("ok")).unwrap();
    let status = ingestor.wait_until_finished().await;
    assert_eq!(status.state, SessionState::Closed);
    assert_eq!(status.last_error, None);
}

#[tokio::test]
async fn test_credentials_reach_transport() {
    let (ingestor, transport) = ingestor(ScriptedTransport::new().with_default(scenario_steps()));

    let request = GenerateRequest::new("  padded query  ")
        .with_user_api_key(Some("sk-user".into()))
        .with_access_token(Some("token".into()));
    ingestor.start(request).unwrap();
    ingestor.wait_until_finished().await;

    let seen = transport.requests();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].query, "padded query");
    assert_eq!(seen[0].user_api_key.as_deref(), Some("sk-user"));
    assert_eq!(seen[0].access_token.as_deref(), Some("token"));
}
