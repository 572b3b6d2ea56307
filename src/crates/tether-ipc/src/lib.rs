//! # tether-ipc - Cross-Runtime Bridge over Unix Sockets
//!
//! **The wire half of tether**: one process runs the graph engine, another
//! owns checkpoint persistence, and this crate is the bridge between them.
//! Both directions speak HTTP/1.1 over Unix domain sockets; graph execution
//! streams back as Server-Sent Events.
//!
//! ## Overview
//!
//! The bridge provides:
//!
//! - **Checkpointer Service** - JSON API over a Unix socket backed by any
//!   [`CheckpointSaver`](tether_checkpoint::CheckpointSaver)
//! - **Graph Streaming Client** - Lazy, in-order event streams from the
//!   engine, decoded into a typed event union
//! - **Process Supervision** - The counterpart engine is spawned, handed its
//!   graph registry, and watched; its exit always ends the session
//! - **Readiness Gate** - One signal, delivered exactly once, when both
//!   sockets answer their health endpoints
//! - **Two Concurrency Domains** - The worker runs its own event loop on a
//!   dedicated thread; callers need no runtime of their own
//!
//! ## Core Concepts
//!
//! ### 1. Two Sockets, Two Directions
//!
//! The checkpointer socket is served by this process and consumed by the
//! engine. The graph socket is served by the engine and consumed here. The
//! `Host` header names the logical peer; the socket path does the
//! addressing.
//!
//! ### 2. The Event Stream
//!
//! [`GraphServiceClient::stream_events`] yields [`StreamEvent`]s as the
//! engine produces them. The union is discriminated on the `event` field:
//! the reserved `on_custom_event` name marks user events, every other name
//! decodes as a standard engine event, unknown vocabulary included. Frames
//! that do not fit the envelope fail loudly, and the first error ends its
//! stream.
//!
//! ### 3. Supervision
//!
//! [`GraphBridge::start`] spawns a worker thread that binds the checkpointer
//! socket, launches the engine, and polls both `/ok` endpoints. Readiness or
//! the first fatal error crosses back to the caller through a oneshot
//! channel; [`ReadinessState`] only ever moves forward.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use tether_checkpoint::CheckpointConfig;
//! use tether_ipc::{BridgeConfig, GraphBridge, StreamProtocolVersion};
//!
//! #[tokio::main]
//! async fn main() -> tether_ipc::Result<()> {
//!     let config = BridgeConfig::new()
//!         .with_command("node")
//!         .with_args(vec!["graph-server.js".to_string()])
//!         .with_graph("agent", "./graphs/agent.js");
//!
//!     let bridge = GraphBridge::new(config);
//!     bridge.start()?;
//!     bridge.wait_ready().await?;
//!
//!     let client = bridge.graph_client("agent");
//!     let thread = CheckpointConfig::new().with_thread_id("thread-1".to_string());
//!     let mut events = client
//!         .stream_events(
//!             serde_json::json!({"messages": []}),
//!             &thread,
//!             StreamProtocolVersion::V2,
//!         )
//!         .await?;
//!
//!     while let Some(event) = events.next().await {
//!         println!("{}", event?.event());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//!  caller's domain          │ worker thread (own tokio runtime)
//!                           │
//!  GraphBridge::start ──────┼──► bind checkpointer.sock
//!                           │    spawn engine (TETHER_GRAPHS=…)
//!  wait_ready().await ◄─────┼─── oneshot: Ok(()) | Err(BridgeError)
//!                           │         ▲
//!                           │    ┌────┴─────────────────────────┐
//!                           │    │ select! loop                 │
//!                           │    │  • serve checkpointer.sock   │
//!                           │    │  • wait on engine process    │
//!                           │    │  • poll both /ok every 100ms │
//!                           │    └──────────────────────────────┘
//!                           │
//!  graph_client("agent") ───┼──► POST /agent/streamEvents ──► SSE
//! ```
//!
//! ## Module Organization
//!
//! - [`events`] - [`StreamEvent`] union, [`EventStream`], protocol version
//! - [`client`] - [`GraphServiceClient`], [`CheckpointerClient`]
//! - [`service`] - Checkpointer router, handlers, API error shape
//! - [`transport`] - HTTP-over-UDS client and server plumbing
//! - [`process`] - Counterpart engine lifecycle
//! - [`readiness`] - [`ReadinessGate`] and the health poll
//! - [`supervisor`] - [`GraphBridge`], the worker thread, the session loop
//! - [`config`] - [`BridgeConfig`] with TOML loading
//! - [`error`] - [`BridgeError`] taxonomy

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod process;
pub mod readiness;
pub mod service;
pub mod supervisor;
pub mod transport;

// Re-export main types
pub use client::{
    CheckpointerClient, DrawableGraph, GraphServiceClient, StateSnapshot, StreamEventsRequest,
};
pub use config::{BridgeConfig, ConfigError, CONFIG_ENV};
pub use error::{BridgeError, Result};
pub use events::{
    CustomStreamEvent, EventStream, StandardStreamEvent, StreamEvent, StreamProtocolVersion,
    CUSTOM_EVENT,
};
pub use process::{GraphProcess, GRAPHS_ENV};
pub use readiness::{ReadinessGate, ReadinessState};
pub use service::{create_router, ApiError, ApiErrorResponse, AppState};
pub use supervisor::GraphBridge;
pub use transport::{UdsClient, CHECKPOINTER_HOST, GRAPH_HOST};
