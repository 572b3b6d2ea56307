//! Clients for the two bridge sockets
//!
//! [`GraphServiceClient`] consumes the graph engine's streaming API over the
//! graph socket. [`CheckpointerClient`] is the consuming side of the
//! checkpointer wire contract, mirroring the service route for route.

use crate::error::{BridgeError, Result};
use crate::events::{EventStream, StreamEvent, StreamProtocolVersion};
use crate::service::{GetTupleRequest, ListRequest, PutRequest, RunRequest};
use crate::transport::{self, UdsClient};
use eventsource_stream::{EventStreamError, Eventsource};
use futures::StreamExt;
use http_body_util::BodyDataStream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use tether_checkpoint::{Checkpoint, CheckpointConfig, CheckpointMetadata, CheckpointTuple};

/// Body of `POST /{graph_id}/streamEvents`
#[derive(Debug, Serialize, Deserialize)]
pub struct StreamEventsRequest {
    pub input: Value,
    pub config: CheckpointConfig,
}

/// Snapshot of graph state at a checkpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Channel values at the snapshot
    pub values: Value,
    /// Nodes scheduled to run next
    #[serde(default)]
    pub next: Vec<String>,
    /// Config addressing the snapshot's checkpoint
    pub config: CheckpointConfig,
    /// Config of the parent checkpoint, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_config: Option<CheckpointConfig>,
}

/// Graph topology in drawable form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DrawableGraph {
    #[serde(default)]
    pub nodes: Vec<Value>,
    #[serde(default)]
    pub edges: Vec<Value>,
}

/// Client for one graph on the engine's streaming service
///
/// Only event streaming crosses the bridge today. The remaining graph
/// operations are declared so the capability boundary is explicit; each
/// answers with the not-implemented error naming itself.
#[derive(Debug, Clone)]
pub struct GraphServiceClient {
    transport: UdsClient,
    graph_id: String,
}

impl GraphServiceClient {
    /// Create a client for `graph_id` on the engine behind `socket_path`
    pub fn new(socket_path: impl Into<PathBuf>, graph_id: impl Into<String>) -> Self {
        Self {
            transport: UdsClient::new(socket_path, transport::GRAPH_HOST),
            graph_id: graph_id.into(),
        }
    }

    /// The graph this client addresses
    pub fn graph_id(&self) -> &str {
        &self.graph_id
    }

    /// Stream the events of one graph execution
    ///
    /// The version is checked before any socket I/O; only
    /// [`StreamProtocolVersion::SUPPORTED`] passes. Events arrive lazily and
    /// in order. Connection refusal and mid-stream disconnection surface as
    /// terminal errors on the sequence; a malformed frame terminates this
    /// stream only. Dropping the stream closes the connection.
    pub async fn stream_events(
        &self,
        input: Value,
        config: &CheckpointConfig,
        version: StreamProtocolVersion,
    ) -> Result<EventStream> {
        if version != StreamProtocolVersion::SUPPORTED {
            return Err(BridgeError::ProtocolVersion { requested: version });
        }

        let body = StreamEventsRequest {
            input,
            config: config.clone(),
        };
        let path = format!("/{}/streamEvents", self.graph_id);
        let response = self.transport.post_json(&path, &body).await?;
        let response = transport::error_for_status(response).await?;

        let frames = BodyDataStream::new(response.into_body())
            .eventsource()
            .map(|frame| match frame {
                Ok(frame) => serde_json::from_str::<StreamEvent>(&frame.data)
                    .map_err(|err| BridgeError::StreamDecode(err.to_string())),
                Err(EventStreamError::Transport(err)) => Err(BridgeError::Http(err)),
                Err(err) => Err(BridgeError::StreamDecode(err.to_string())),
            });

        Ok(EventStream::from_stream(frames))
    }

    /// Not available over the bridge
    pub async fn invoke(&self, _input: Value, _config: &CheckpointConfig) -> Result<Value> {
        Err(BridgeError::NotImplemented("invoke".to_string()))
    }

    /// Not available over the bridge
    pub async fn get_graph(&self, _config: &CheckpointConfig) -> Result<DrawableGraph> {
        Err(BridgeError::NotImplemented("get_graph".to_string()))
    }

    /// Not available over the bridge
    pub async fn get_state(&self, _config: &CheckpointConfig) -> Result<StateSnapshot> {
        Err(BridgeError::NotImplemented("get_state".to_string()))
    }

    /// Not available over the bridge
    pub async fn update_state(
        &self,
        _config: &CheckpointConfig,
        _values: Value,
    ) -> Result<CheckpointConfig> {
        Err(BridgeError::NotImplemented("update_state".to_string()))
    }

    /// Not available over the bridge
    pub async fn state_history(&self, _config: &CheckpointConfig) -> Result<Vec<StateSnapshot>> {
        Err(BridgeError::NotImplemented("state_history".to_string()))
    }
}

/// Client for the checkpointer service socket
#[derive(Debug, Clone)]
pub struct CheckpointerClient {
    transport: UdsClient,
}

impl CheckpointerClient {
    /// Create a client for the checkpointer behind `socket_path`
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            transport: UdsClient::new(socket_path, transport::CHECKPOINTER_HOST),
        }
    }

    /// True when the service answers its health endpoint
    pub async fn ok(&self) -> Result<bool> {
        let response = self.transport.get("/ok").await?;
        Ok(response.status().is_success())
    }

    /// Fetch the tuple the config addresses, `None` when nothing matches
    pub async fn get_tuple(&self, config: &CheckpointConfig) -> Result<Option<CheckpointTuple>> {
        let request = GetTupleRequest {
            config: config.clone(),
        };
        let response = self.transport.post_json("/get_tuple", &request).await?;
        let response = transport::error_for_status(response).await?;
        transport::read_json(response).await
    }

    /// List checkpoint tuples, newest first
    pub async fn list(
        &self,
        config: Option<&CheckpointConfig>,
        before: Option<&CheckpointConfig>,
        limit: Option<usize>,
    ) -> Result<Vec<CheckpointTuple>> {
        let request = ListRequest {
            config: config.cloned(),
            before: before.cloned(),
            limit,
        };
        let response = self.transport.post_json("/list", &request).await?;
        let response = transport::error_for_status(response).await?;
        transport::read_json(response).await
    }

    /// Store a checkpoint, returning the config that addresses it
    pub async fn put(
        &self,
        config: &CheckpointConfig,
        checkpoint: Checkpoint,
        metadata: CheckpointMetadata,
    ) -> Result<CheckpointConfig> {
        let request = PutRequest {
            config: config.clone(),
            checkpoint,
            metadata,
        };
        let response = self.transport.post_json("/put", &request).await?;
        let response = transport::error_for_status(response).await?;
        transport::read_json(response).await
    }

    /// Run a graph to completion, collecting every stream event
    pub async fn run(&self, graph_id: &str, input: Value) -> Result<Vec<StreamEvent>> {
        let request = RunRequest {
            graph_id: graph_id.to_string(),
            input,
        };
        let response = self.transport.post_json("/run", &request).await?;
        let response = transport::error_for_status(response).await?;
        transport::read_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn unreachable_client() -> GraphServiceClient {
        GraphServiceClient::new("/nonexistent/graph.sock", "agent")
    }

    #[tokio::test]
    async fn test_wrong_version_fails_before_any_io() {
        // The socket path does not exist, so reaching it would fail with a
        // connection error. The version gate must fire first.
        let client = unreachable_client();
        let result = client
            .stream_events(json!({}), &CheckpointConfig::new(), StreamProtocolVersion::V1)
            .await;

        match result {
            Err(BridgeError::ProtocolVersion { requested }) => {
                assert_eq!(requested, StreamProtocolVersion::V1);
            }
            other => panic!("expected protocol version error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connection_refusal_is_a_connection_error() {
        let client = unreachable_client();
        let result = client
            .stream_events(json!({}), &CheckpointConfig::new(), StreamProtocolVersion::V2)
            .await;
        assert!(matches!(result, Err(BridgeError::Connection { .. })));
    }

    #[tokio::test]
    async fn test_capability_stubs_name_themselves() {
        let client = unreachable_client();
        let config = CheckpointConfig::new();

        let cases: Vec<(&str, BridgeError)> = vec![
            ("invoke", client.invoke(json!({}), &config).await.unwrap_err()),
            ("get_graph", client.get_graph(&config).await.unwrap_err()),
            ("get_state", client.get_state(&config).await.unwrap_err()),
            (
                "update_state",
                client.update_state(&config, json!({})).await.unwrap_err(),
            ),
            (
                "state_history",
                client.state_history(&config).await.unwrap_err(),
            ),
        ];

        for (name, err) in cases {
            match err {
                BridgeError::NotImplemented(capability) => assert_eq!(capability, name),
                other => panic!("expected not-implemented for {name}, got {other:?}"),
            }
        }
    }
}
