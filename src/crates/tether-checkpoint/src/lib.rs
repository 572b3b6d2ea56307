//! # tether-checkpoint - Checkpoint Persistence for the Tether Bridge
//!
//! **Checkpoint data model and storage abstractions** shared by both halves of the
//! tether IPC bridge. A checkpoint is a snapshot of workflow state produced by a
//! graph execution engine; this crate moves and stores those snapshots without
//! interpreting their content.
//!
//! ## Overview
//!
//! The checkpoint system provides:
//!
//! - **Opaque Snapshots** - Engine-owned state carried as JSON, envelope fields typed
//! - **Thread Isolation** - Independent checkpoint histories per `thread_id`
//! - **Append-Only History** - A new `put` never mutates earlier tuples
//! - **Time-Ordered Ids** - Fresh checkpoint ids sort in write order
//! - **Independent Reads** - Every retrieval yields a freshly decoded copy
//! - **Pluggable Storage** - One trait, any backend
//!
//! ## Core Concepts
//!
//! ### 1. CheckpointSaver Trait
//!
//! The [`CheckpointSaver`] trait defines the persistence interface the bridge
//! service exposes over its socket:
//!
//! - **`put()`** - Append a checkpoint, returning the config that now addresses it
//! - **`get_tuple()`** - Load a specific or latest checkpoint for a thread
//! - **`list()`** - Stream history newest-first with `before`/`limit` windows
//!
//! ### 2. The Tuple
//!
//! A [`CheckpointTuple`] is the unit of persistence: the addressing
//! [`CheckpointConfig`], the [`Checkpoint`] snapshot itself, its
//! [`CheckpointMetadata`], and the parent config that links history together.
//! Identity is `(thread_id, checkpoint_ns, checkpoint_id)`.
//!
//! ### 3. Opacity
//!
//! The engine on the far side of the socket owns the snapshot format. Only the
//! envelope (`id`, `ts`, version fields) is typed here; channel content stays
//! `serde_json::Value`, and envelope fields this crate does not model survive a
//! round trip untouched via flattened extras.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tether_checkpoint::{
//!     Checkpoint, CheckpointConfig, CheckpointMetadata, CheckpointSaver,
//!     InMemoryCheckpointSaver,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let saver = InMemoryCheckpointSaver::new();
//!
//!     // Save a checkpoint
//!     let config = CheckpointConfig::new().with_thread_id("thread-123".to_string());
//!     let saved = saver
//!         .put(&config, Checkpoint::empty(), CheckpointMetadata::new())
//!         .await?;
//!     println!("Checkpoint saved with ID: {:?}", saved.checkpoint_id);
//!
//!     // Retrieve it
//!     if let Some(tuple) = saver.get_tuple(&saved).await? {
//!         println!("Retrieved checkpoint: {:?}", tuple.checkpoint.id);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        tether-ipc (Checkpointer HTTP service)           │
//! │  • /put /get_tuple /list over a Unix socket             │
//! └────────────────────┬────────────────────────────────────┘
//!                      │ CheckpointSaver trait
//!                      ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │              Storage Backend (This Crate)               │
//! │  • put() - Append snapshot                              │
//! │  • get_tuple() - Load snapshot                          │
//! │  • list() - Stream history                              │
//! └────────────────────┬────────────────────────────────────┘
//!                      │ Implemented by
//!            ┌─────────┴─────────┐
//!            ▼                   ▼
//!     ┌──────────────┐    ┌──────────────┐
//!     │  In-Memory   │    │   Custom     │
//!     │ (Reference)  │    │  (Yours)     │
//!     └──────────────┘    └──────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`checkpoint`] - [`Checkpoint`], [`CheckpointConfig`], [`CheckpointMetadata`], [`CheckpointTuple`]
//! - [`traits`] - [`CheckpointSaver`] trait and [`CheckpointStream`]
//! - [`memory`] - [`InMemoryCheckpointSaver`] reference implementation
//! - [`serializer`] - [`SerializerProtocol`] with JSON and bincode implementations
//! - [`error`] - [`CheckpointError`] types

pub mod checkpoint;
pub mod error;
pub mod memory;
pub mod serializer;
pub mod traits;

// Re-export main types
pub use checkpoint::{
    ChannelVersion, ChannelVersions, Checkpoint, CheckpointConfig, CheckpointId,
    CheckpointMetadata, CheckpointSource, CheckpointTuple,
};
pub use error::{CheckpointError, Result};
pub use memory::InMemoryCheckpointSaver;
pub use serializer::{BincodeSerializer, JsonSerializer, SerializerProtocol};
pub use traits::{CheckpointSaver, CheckpointStream};
