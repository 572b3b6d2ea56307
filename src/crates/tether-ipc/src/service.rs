//! Checkpointer HTTP service
//!
//! The persistence half of the bridge: a small JSON API over the
//! checkpointer socket backed by a [`CheckpointSaver`], plus a run endpoint
//! that drives a full graph execution through the graph socket and returns
//! the collected events.

use crate::client::GraphServiceClient;
use crate::error::BridgeError;
use crate::events::{StreamEvent, StreamProtocolVersion};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tether_checkpoint::{
    Checkpoint, CheckpointConfig, CheckpointError, CheckpointMetadata, CheckpointSaver,
    CheckpointTuple,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// Shared state for the checkpointer service
#[derive(Clone)]
pub struct AppState {
    /// Checkpoint storage backend
    pub saver: Arc<dyn CheckpointSaver>,
    /// Socket the graph engine serves on, used by the run endpoint
    pub graph_socket: PathBuf,
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: String,
    pub message: String,
    pub code: u16,
}

impl ApiErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            code,
        }
    }
}

/// Errors surfaced by the checkpointer HTTP surface
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Bridge-level failure
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

impl ApiError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Bridge(BridgeError::Store(CheckpointError::Invalid(_))) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Bridge(BridgeError::Store(CheckpointError::NotFound(_))) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Bridge(BridgeError::Connection { .. }) => StatusCode::BAD_GATEWAY,
            ApiError::Bridge(BridgeError::ProtocolVersion { .. }) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Numeric code carried in the response body
    pub fn code(&self) -> u16 {
        self.status_code().as_u16()
    }

    /// Stable machine-readable error type
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Bridge(BridgeError::Store(_)) => "store_error",
            ApiError::Bridge(BridgeError::Connection { .. }) => "connection_error",
            ApiError::Bridge(BridgeError::ProtocolVersion { .. }) => "protocol_version_error",
            ApiError::Bridge(BridgeError::StreamDecode(_)) => "stream_decode_error",
            ApiError::Bridge(_) => "bridge_error",
        }
    }
}

impl From<CheckpointError> for ApiError {
    fn from(err: CheckpointError) -> Self {
        ApiError::Bridge(BridgeError::Store(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ApiErrorResponse::new(self.error_type(), self.to_string(), self.code());
        if status.is_server_error() {
            tracing::error!("API Error: {:?}", body);
        } else {
            tracing::debug!("API Error: {:?}", body);
        }
        (status, Json(body)).into_response()
    }
}

/// Body of `POST /get_tuple`
#[derive(Debug, Serialize, Deserialize)]
pub struct GetTupleRequest {
    pub config: CheckpointConfig,
}

/// Body of `POST /list`
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ListRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<CheckpointConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<CheckpointConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

/// Body of `POST /put`
#[derive(Debug, Serialize, Deserialize)]
pub struct PutRequest {
    pub config: CheckpointConfig,
    pub checkpoint: Checkpoint,
    pub metadata: CheckpointMetadata,
}

/// Body of `POST /run`
#[derive(Debug, Serialize, Deserialize)]
pub struct RunRequest {
    pub graph_id: String,
    pub input: serde_json::Value,
}

/// Body of `GET /ok`
#[derive(Debug, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// Build the checkpointer router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/ok", get(ok))
        // Checkpoint store
        .route("/get_tuple", post(get_tuple))
        .route("/list", post(list))
        .route("/put", post(put))
        // Graph runs
        .route("/run", post(run))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn ok() -> impl IntoResponse {
    Json(OkResponse { ok: true })
}

/// Load a checkpoint tuple, `null` when nothing matches
async fn get_tuple(
    State(state): State<AppState>,
    Json(request): Json<GetTupleRequest>,
) -> Result<Json<Option<CheckpointTuple>>, ApiError> {
    let tuple = state.saver.get_tuple(&request.config).await?;
    Ok(Json(tuple))
}

/// List checkpoint tuples, newest first
async fn list(
    State(state): State<AppState>,
    Json(request): Json<ListRequest>,
) -> Result<Json<Vec<CheckpointTuple>>, ApiError> {
    let mut stream = state
        .saver
        .list(request.config.as_ref(), request.before.as_ref(), request.limit)
        .await?;

    let mut tuples = Vec::new();
    while let Some(tuple) = stream.next().await {
        tuples.push(tuple?);
    }
    Ok(Json(tuples))
}

/// Store a checkpoint, answering with the config that addresses it
async fn put(
    State(state): State<AppState>,
    Json(request): Json<PutRequest>,
) -> Result<Json<CheckpointConfig>, ApiError> {
    let config = state
        .saver
        .put(&request.config, request.checkpoint, request.metadata)
        .await?;
    Ok(Json(config))
}

/// Run a graph to completion and return every event of the stream
async fn run(
    State(state): State<AppState>,
    Json(request): Json<RunRequest>,
) -> Result<Json<Vec<StreamEvent>>, ApiError> {
    if request.graph_id.is_empty() {
        return Err(ApiError::BadRequest("graph_id is required".to_string()));
    }

    let client = GraphServiceClient::new(&state.graph_socket, &request.graph_id);
    let config = CheckpointConfig::new().with_thread_id(Uuid::new_v4().to_string());

    let mut stream = client
        .stream_events(request.input, &config, StreamProtocolVersion::V2)
        .await?;

    let mut events = Vec::new();
    while let Some(event) = stream.next().await {
        events.push(event.map_err(ApiError::Bridge)?);
    }

    tracing::debug!(
        "Run of graph {} produced {} events",
        request.graph_id,
        events.len()
    );
    Ok(Json(events))
}
