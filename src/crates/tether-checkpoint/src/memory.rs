//! In-memory checkpoint storage

use crate::checkpoint::{
    Checkpoint, CheckpointConfig, CheckpointId, CheckpointMetadata, CheckpointTuple,
};
use crate::error::{CheckpointError, Result};
use crate::serializer::{JsonSerializer, SerializerProtocol};
use crate::traits::{CheckpointSaver, CheckpointStream};
use async_trait::async_trait;
use futures::stream;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A stored checkpoint entry
///
/// Checkpoint and metadata are kept serialized so every read deserializes a
/// fresh copy. Mutating a returned tuple can never change stored history.
#[derive(Debug, Clone)]
struct CheckpointEntry {
    id: CheckpointId,
    config: CheckpointConfig,
    checkpoint: Vec<u8>,
    metadata: Vec<u8>,
    parent_config: Option<CheckpointConfig>,
}

type CheckpointStorage = Arc<RwLock<HashMap<String, Vec<CheckpointEntry>>>>;

/// In-memory checkpoint storage
///
/// Reference [`CheckpointSaver`] implementation backing the checkpointer
/// service. Entries are grouped by thread and appended in write order.
#[derive(Debug, Clone)]
pub struct InMemoryCheckpointSaver {
    storage: CheckpointStorage,
    serializer: JsonSerializer,
}

impl InMemoryCheckpointSaver {
    /// Create a new empty in-memory saver
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
            serializer: JsonSerializer::new(),
        }
    }

    /// Number of threads with at least one checkpoint
    pub async fn thread_count(&self) -> usize {
        self.storage.read().await.len()
    }

    /// Number of checkpoints stored for a thread
    pub async fn checkpoint_count(&self, thread_id: &str) -> usize {
        self.storage
            .read()
            .await
            .get(thread_id)
            .map(|entries| entries.len())
            .unwrap_or(0)
    }

    /// Remove all stored checkpoints
    pub async fn clear(&self) {
        self.storage.write().await.clear();
    }

    fn decode_entry(&self, entry: &CheckpointEntry) -> Result<CheckpointTuple> {
        let checkpoint: Checkpoint = self.serializer.loads(&entry.checkpoint)?;
        let metadata: CheckpointMetadata = self.serializer.loads(&entry.metadata)?;
        let mut tuple = CheckpointTuple::new(entry.config.clone(), checkpoint, metadata);
        if let Some(parent) = &entry.parent_config {
            tuple = tuple.with_parent_config(parent.clone());
        }
        Ok(tuple)
    }
}

impl Default for InMemoryCheckpointSaver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CheckpointSaver for InMemoryCheckpointSaver {
    async fn get_tuple(&self, config: &CheckpointConfig) -> Result<Option<CheckpointTuple>> {
        let thread_id = config
            .thread_id
            .as_ref()
            .ok_or_else(|| CheckpointError::Invalid("thread_id is required".to_string()))?;

        let storage = self.storage.read().await;
        let Some(entries) = storage.get(thread_id) else {
            return Ok(None);
        };

        let entry = match &config.checkpoint_id {
            Some(checkpoint_id) => entries.iter().find(|entry| &entry.id == checkpoint_id),
            None => entries.last(),
        };

        entry.map(|entry| self.decode_entry(entry)).transpose()
    }

    async fn list(
        &self,
        config: Option<&CheckpointConfig>,
        before: Option<&CheckpointConfig>,
        limit: Option<usize>,
    ) -> Result<CheckpointStream> {
        let storage = self.storage.read().await;

        let thread_ids: Vec<String> = match config.and_then(|c| c.thread_id.clone()) {
            Some(thread_id) => vec![thread_id],
            None => storage.keys().cloned().collect(),
        };
        let before_id = before.and_then(|c| c.checkpoint_id.as_ref());

        let mut results = Vec::new();
        'outer: for thread_id in &thread_ids {
            let Some(entries) = storage.get(thread_id) else {
                continue;
            };
            // Entries are appended in write order, so reverse is newest first.
            for entry in entries.iter().rev() {
                if let Some(before_id) = before_id {
                    if entry.id >= *before_id {
                        continue;
                    }
                }
                results.push(self.decode_entry(entry));
                if let Some(limit) = limit {
                    if results.len() >= limit {
                        break 'outer;
                    }
                }
            }
        }

        Ok(Box::pin(stream::iter(results)))
    }

    async fn put(
        &self,
        config: &CheckpointConfig,
        checkpoint: Checkpoint,
        metadata: CheckpointMetadata,
    ) -> Result<CheckpointConfig> {
        let thread_id = config
            .thread_id
            .clone()
            .ok_or_else(|| CheckpointError::Invalid("thread_id is required".to_string()))?;

        let checkpoint_config = CheckpointConfig {
            thread_id: Some(thread_id.clone()),
            checkpoint_id: Some(checkpoint.id.clone()),
            checkpoint_ns: config.checkpoint_ns.clone(),
            extra: config.extra.clone(),
        };

        let entry = CheckpointEntry {
            id: checkpoint.id.clone(),
            config: checkpoint_config.clone(),
            checkpoint: self.serializer.dumps(&checkpoint)?,
            metadata: self.serializer.dumps(&metadata)?,
            parent_config: config.checkpoint_id.as_ref().map(|_| config.clone()),
        };

        let mut storage = self.storage.write().await;
        storage.entry(thread_id).or_default().push(entry);

        Ok(checkpoint_config)
    }
}
