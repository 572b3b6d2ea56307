//! Core checkpoint types for workflow state snapshots

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Unique identifier for a checkpoint
pub type CheckpointId = String;

/// Version number for a channel
///
/// Versions are opaque to the bridge: the engine that produced a snapshot may
/// use integers, floats, or strings, and all three must survive a round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelVersion {
    /// Integer version
    Int(i64),
    /// Float version
    Float(f64),
    /// String version
    String(String),
}

impl Default for ChannelVersion {
    fn default() -> Self {
        ChannelVersion::Int(1)
    }
}

/// Map of channel names to their versions
pub type ChannelVersions = HashMap<String, ChannelVersion>;

/// Source of a checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointSource {
    /// Checkpoint from user input
    Input,
    /// Checkpoint from a step in the main execution loop
    Loop,
    /// Checkpoint from a manual state update
    Update,
    /// Checkpoint created when a thread is forked
    Fork,
}

/// Metadata associated with a checkpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    /// The source of the checkpoint
    pub source: CheckpointSource,

    /// Step number, -1 for input, 0 for first loop step
    pub step: i64,

    /// Parent checkpoint IDs keyed by namespace
    #[serde(default)]
    pub parents: HashMap<String, CheckpointId>,

    /// Engine-defined metadata this crate does not model
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl CheckpointMetadata {
    /// Create new metadata with default values
    pub fn new() -> Self {
        Self {
            source: CheckpointSource::Loop,
            step: -1,
            parents: HashMap::new(),
            extra: HashMap::new(),
        }
    }

    /// Set the source
    pub fn with_source(mut self, source: CheckpointSource) -> Self {
        self.source = source;
        self
    }

    /// Set the step number
    pub fn with_step(mut self, step: i64) -> Self {
        self.step = step;
        self
    }

    /// Add a parent checkpoint
    pub fn with_parent(mut self, namespace: String, checkpoint_id: CheckpointId) -> Self {
        self.parents.insert(namespace, checkpoint_id);
        self
    }
}

impl Default for CheckpointMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// A snapshot of workflow state at a point in time
///
/// Channel content is carried opaquely as JSON. Only the envelope is typed,
/// and envelope fields the bridge does not model are preserved in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Format version
    pub v: i64,

    /// Unique checkpoint identifier
    pub id: CheckpointId,

    /// Timestamp in ISO 8601 format
    pub ts: String,

    /// Values of channels at checkpoint time
    pub channel_values: HashMap<String, serde_json::Value>,

    /// Versions of channels at checkpoint time
    pub channel_versions: ChannelVersions,

    /// Versions seen by each node
    pub versions_seen: HashMap<String, ChannelVersions>,

    /// Channels updated in the step that produced this checkpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_channels: Option<Vec<String>>,

    /// Engine-defined envelope fields this crate does not model
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Checkpoint {
    /// Current checkpoint format version
    pub const CURRENT_VERSION: i64 = 1;

    /// Create a new checkpoint with the given ID
    pub fn new(id: CheckpointId) -> Self {
        Self {
            v: Self::CURRENT_VERSION,
            id,
            ts: chrono::Utc::now().to_rfc3339(),
            channel_values: HashMap::new(),
            channel_versions: HashMap::new(),
            versions_seen: HashMap::new(),
            updated_channels: None,
            extra: HashMap::new(),
        }
    }

    /// Create an empty checkpoint with a generated ID
    ///
    /// IDs are UUIDv7, so ids generated by successive calls sort in
    /// creation order.
    pub fn empty() -> Self {
        Self::new(Uuid::now_v7().to_string())
    }

    /// Create a deep copy of this checkpoint
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Set the updated channels
    pub fn with_updated_channels(mut self, channels: Vec<String>) -> Self {
        self.updated_channels = Some(channels);
        self
    }
}

/// Configuration identifying a checkpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckpointConfig {
    /// Thread identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,

    /// Checkpoint identifier, None selects the latest
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint_id: Option<CheckpointId>,

    /// Checkpoint namespace, empty string is the root namespace
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint_ns: Option<String>,

    /// Additional configuration fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl CheckpointConfig {
    /// Create a new empty config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the thread ID
    pub fn with_thread_id(mut self, thread_id: String) -> Self {
        self.thread_id = Some(thread_id);
        self
    }

    /// Set the checkpoint ID
    pub fn with_checkpoint_id(mut self, checkpoint_id: CheckpointId) -> Self {
        self.checkpoint_id = Some(checkpoint_id);
        self
    }

    /// Set the checkpoint namespace
    pub fn with_checkpoint_ns(mut self, checkpoint_ns: String) -> Self {
        self.checkpoint_ns = Some(checkpoint_ns);
        self
    }
}

/// A checkpoint together with its config, metadata, and parent link
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointTuple {
    /// Configuration that addresses this checkpoint
    pub config: CheckpointConfig,

    /// The checkpoint itself
    pub checkpoint: Checkpoint,

    /// Checkpoint metadata
    pub metadata: CheckpointMetadata,

    /// Config of the parent checkpoint, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_config: Option<CheckpointConfig>,
}

impl CheckpointTuple {
    /// Create a new checkpoint tuple
    pub fn new(
        config: CheckpointConfig,
        checkpoint: Checkpoint,
        metadata: CheckpointMetadata,
    ) -> Self {
        Self {
            config,
            checkpoint,
            metadata,
            parent_config: None,
        }
    }

    /// Set the parent config
    pub fn with_parent_config(mut self, parent_config: CheckpointConfig) -> Self {
        self.parent_config = Some(parent_config);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoint_creation() {
        let checkpoint = Checkpoint::empty();
        assert_eq!(checkpoint.v, Checkpoint::CURRENT_VERSION);
        assert!(!checkpoint.id.is_empty());
        assert!(checkpoint.channel_values.is_empty());
    }

    #[test]
    fn test_checkpoint_ids_sort_in_creation_order() {
        let first = Checkpoint::empty();
        let second = Checkpoint::empty();
        assert!(first.id < second.id);
    }

    #[test]
    fn test_checkpoint_metadata_builder() {
        let metadata = CheckpointMetadata::new()
            .with_source(CheckpointSource::Input)
            .with_step(0)
            .with_parent("".to_string(), "parent-id".to_string());

        assert_eq!(metadata.source, CheckpointSource::Input);
        assert_eq!(metadata.step, 0);
        assert_eq!(metadata.parents.get(""), Some(&"parent-id".to_string()));
    }

    #[test]
    fn test_checkpoint_config_builder() {
        let config = CheckpointConfig::new()
            .with_thread_id("thread-1".to_string())
            .with_checkpoint_id("ckpt-1".to_string())
            .with_checkpoint_ns("ns".to_string());

        assert_eq!(config.thread_id, Some("thread-1".to_string()));
        assert_eq!(config.checkpoint_id, Some("ckpt-1".to_string()));
        assert_eq!(config.checkpoint_ns, Some("ns".to_string()));
    }

    #[test]
    fn test_checkpoint_tuple() {
        let config = CheckpointConfig::new().with_thread_id("thread-1".to_string());
        let checkpoint = Checkpoint::empty();
        let metadata = CheckpointMetadata::new();

        let tuple = CheckpointTuple::new(config.clone(), checkpoint, metadata)
            .with_parent_config(config);

        assert!(tuple.parent_config.is_some());
    }

    #[test]
    fn test_unknown_envelope_fields_survive_round_trip() {
        let raw = serde_json::json!({
            "v": 1,
            "id": "ckpt-1",
            "ts": "2024-01-01T00:00:00Z",
            "channel_values": {"messages": ["hi"]},
            "channel_versions": {"messages": 2},
            "versions_seen": {},
            "pending_sends": [{"node": "tools"}]
        });

        let checkpoint: Checkpoint = serde_json::from_value(raw.clone()).unwrap();
        assert!(checkpoint.extra.contains_key("pending_sends"));

        let encoded = serde_json::to_value(&checkpoint).unwrap();
        assert_eq!(encoded["pending_sends"], raw["pending_sends"]);
    }

    #[test]
    fn test_channel_version_variants_round_trip() {
        let versions: ChannelVersions = serde_json::from_value(serde_json::json!({
            "a": 3,
            "b": 1.5,
            "c": "00000000000000000000000000000032.0.1"
        }))
        .unwrap();

        assert_eq!(versions.get("a"), Some(&ChannelVersion::Int(3)));
        assert_eq!(versions.get("b"), Some(&ChannelVersion::Float(1.5)));
        assert!(matches!(versions.get("c"), Some(ChannelVersion::String(_))));
    }
}
