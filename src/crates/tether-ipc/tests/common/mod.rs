//! Shared helpers for integration tests

#![allow(dead_code)]

use axum::extract::Path as RoutePath;
use axum::response::sse::{Event, Sse};
use axum::routing::{get, post};
use axum::Router;
use futures::stream;
use serde_json::Value;
use std::convert::Infallible;
use std::path::Path;
use tether_ipc::transport;

/// Bind `path` and serve `router` on it in a background task
pub fn serve_on(path: &Path, router: Router) {
    let listener = transport::bind(path).unwrap();
    tokio::spawn(transport::serve(listener, router));
}

/// Stub graph engine: answers `/ok` and streams `frames` for any graph
pub fn stub_graph_router(frames: Vec<String>) -> Router {
    Router::new()
        .route("/ok", get(|| async { "ok" }))
        .route(
            "/:graph_id/streamEvents",
            post(move |RoutePath(_graph_id): RoutePath<String>| {
                let frames = frames.clone();
                async move {
                    let events = frames
                        .into_iter()
                        .map(|frame| Ok::<_, Infallible>(Event::default().data(frame)));
                    Sse::new(stream::iter(events))
                }
            }),
        )
}

/// Encode JSON values as SSE data frames
pub fn frames(values: &[Value]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

/// A standard engine event frame
pub fn standard_frame(event: &str, data: Value) -> Value {
    serde_json::json!({"event": event, "data": data, "run_id": "run-1"})
}
