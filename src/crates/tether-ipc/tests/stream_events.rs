//! Graph event streaming over a real socket

mod common;

use axum::body::Body;
use axum::http::header;
use axum::routing::post;
use axum::Router;
use futures::StreamExt;
use serde_json::json;
use std::time::Duration;
use tempfile::TempDir;
use tether_checkpoint::CheckpointConfig;
use tether_ipc::{BridgeError, GraphServiceClient, StreamEvent, StreamProtocolVersion};

fn graph_client(dir: &TempDir) -> GraphServiceClient {
    GraphServiceClient::new(dir.path().join("graph.sock"), "agent")
}

async fn open_stream(client: &GraphServiceClient) -> tether_ipc::EventStream {
    let config = CheckpointConfig::new().with_thread_id("thread-1".to_string());
    client
        .stream_events(json!({"messages": []}), &config, StreamProtocolVersion::V2)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_events_arrive_in_order_and_typed() {
    let dir = tempfile::tempdir().unwrap();
    let frames = common::frames(&[
        common::standard_frame("on_chain_start", json!({"input": {}})),
        json!({
            "event": "on_custom_event",
            "name": "progress",
            "data": {"step": "retrieval"},
            "run_id": "run-1"
        }),
        common::standard_frame("on_chain_end", json!({"output": null})),
    ]);
    common::serve_on(
        &dir.path().join("graph.sock"),
        common::stub_graph_router(frames),
    );

    let client = graph_client(&dir);
    let stream = open_stream(&client).await;
    let events: Vec<_> = stream.collect().await;

    assert_eq!(events.len(), 3);
    assert!(matches!(
        events[0].as_ref().unwrap(),
        StreamEvent::Standard(_)
    ));
    assert!(matches!(
        events[1].as_ref().unwrap(),
        StreamEvent::Custom(_)
    ));
    assert_eq!(events[2].as_ref().unwrap().event(), "on_chain_end");
}

#[tokio::test]
async fn test_unknown_event_names_flow_through_as_standard() {
    let dir = tempfile::tempdir().unwrap();
    let frames = common::frames(&[common::standard_frame("on_experimental_phase", json!({}))]);
    common::serve_on(
        &dir.path().join("graph.sock"),
        common::stub_graph_router(frames),
    );

    let client = graph_client(&dir);
    let mut stream = open_stream(&client).await;

    let event = stream.next().await.unwrap().unwrap();
    assert!(matches!(event, StreamEvent::Standard(_)));
    assert_eq!(event.event(), "on_experimental_phase");
}

#[tokio::test]
async fn test_clean_close_just_ends_the_stream() {
    let dir = tempfile::tempdir().unwrap();
    let frames = common::frames(&[
        common::standard_frame("on_chain_start", json!({})),
        common::standard_frame("on_chain_stream", json!({"chunk": 1})),
    ]);
    common::serve_on(
        &dir.path().join("graph.sock"),
        common::stub_graph_router(frames),
    );

    let client = graph_client(&dir);
    let mut stream = open_stream(&client).await;

    assert!(stream.next().await.unwrap().is_ok());
    assert!(stream.next().await.unwrap().is_ok());
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_malformed_frame_is_a_terminal_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let frames = vec![
        common::standard_frame("on_chain_start", json!({})).to_string(),
        "this is not json".to_string(),
        common::standard_frame("on_chain_end", json!({})).to_string(),
    ];
    common::serve_on(
        &dir.path().join("graph.sock"),
        common::stub_graph_router(frames),
    );

    let client = graph_client(&dir);
    let mut stream = open_stream(&client).await;

    assert!(stream.next().await.unwrap().is_ok());
    assert!(matches!(
        stream.next().await.unwrap(),
        Err(BridgeError::StreamDecode(_))
    ));
    // The error fuses the stream; the valid frame behind it is never seen.
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_abrupt_close_surfaces_a_terminal_error() {
    let dir = tempfile::tempdir().unwrap();
    let router = Router::new().route(
        "/:graph_id/streamEvents",
        post(|| async {
            let frames = async_stream::stream! {
                let first = common::standard_frame("on_chain_start", json!({}));
                yield Ok::<_, std::io::Error>(format!("data: {first}\n\n"));
                let second = common::standard_frame("on_chain_stream", json!({"chunk": 1}));
                yield Ok(format!("data: {second}\n\n"));
                tokio::time::sleep(Duration::from_millis(20)).await;
                yield Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "engine crashed",
                ));
            };
            (
                [(header::CONTENT_TYPE, "text/event-stream")],
                Body::from_stream(frames),
            )
        }),
    );
    common::serve_on(&dir.path().join("graph.sock"), router);

    let client = graph_client(&dir);
    let stream = open_stream(&client).await;
    let events: Vec<_> = stream.collect().await;

    // Both complete frames arrive, then exactly one terminal error.
    assert_eq!(events.len(), 3);
    assert!(events[0].is_ok());
    assert!(events[1].is_ok());
    assert!(events[2].is_err());
}

#[tokio::test]
async fn test_wrong_version_never_reaches_a_live_socket() {
    let dir = tempfile::tempdir().unwrap();
    common::serve_on(
        &dir.path().join("graph.sock"),
        common::stub_graph_router(Vec::new()),
    );

    let client = graph_client(&dir);
    let config = CheckpointConfig::new().with_thread_id("thread-1".to_string());
    let result = client
        .stream_events(json!({}), &config, StreamProtocolVersion::V1)
        .await;

    assert!(matches!(
        result,
        Err(BridgeError::ProtocolVersion {
            requested: StreamProtocolVersion::V1
        })
    ));
}
