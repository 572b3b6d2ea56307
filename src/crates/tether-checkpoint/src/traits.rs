//! Storage trait for checkpoint persistence

use crate::checkpoint::{Checkpoint, CheckpointConfig, CheckpointMetadata, CheckpointTuple};
use crate::error::Result;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// Stream of checkpoint tuples returned by [`CheckpointSaver::list`]
pub type CheckpointStream = Pin<Box<dyn Stream<Item = Result<CheckpointTuple>> + Send + 'static>>;

/// Trait for checkpoint storage backends
///
/// History is append-only: `put` adds a tuple and never rewrites an existing
/// one. `list` yields tuples newest-first.
#[async_trait]
pub trait CheckpointSaver: Send + Sync {
    /// Get the checkpoint tuple the config addresses
    ///
    /// With a `checkpoint_id` the matching tuple is returned; without one the
    /// latest tuple for the thread. Returns `None` when nothing matches.
    async fn get_tuple(&self, config: &CheckpointConfig) -> Result<Option<CheckpointTuple>>;

    /// List checkpoint tuples, newest first
    ///
    /// `before` excludes the named checkpoint and everything at or after it.
    /// `limit` caps the number of tuples yielded.
    async fn list(
        &self,
        config: Option<&CheckpointConfig>,
        before: Option<&CheckpointConfig>,
        limit: Option<usize>,
    ) -> Result<CheckpointStream>;

    /// Store a checkpoint, returning the config that now addresses it
    async fn put(
        &self,
        config: &CheckpointConfig,
        checkpoint: Checkpoint,
        metadata: CheckpointMetadata,
    ) -> Result<CheckpointConfig>;

    /// Get just the checkpoint the config addresses
    async fn get(&self, config: &CheckpointConfig) -> Result<Option<Checkpoint>> {
        Ok(self.get_tuple(config).await?.map(|tuple| tuple.checkpoint))
    }
}
