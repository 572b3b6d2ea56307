//! Serialization protocols for checkpoint storage

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Protocol for serializing and deserializing stored values
///
/// Storage backends keep snapshots serialized at rest so every read hands the
/// caller an independent copy.
pub trait SerializerProtocol: Send + Sync {
    /// Serialize a value to bytes
    fn dumps<T: Serialize>(&self, value: &T) -> Result<Vec<u8>>;

    /// Deserialize a value from bytes
    fn loads<T: for<'de> Deserialize<'de>>(&self, data: &[u8]) -> Result<T>;

    /// Serialize a value to a JSON value
    fn dumps_json<T: Serialize>(&self, value: &T) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(value)?)
    }

    /// Deserialize a value from a JSON value
    fn loads_json<T: for<'de> Deserialize<'de>>(&self, value: serde_json::Value) -> Result<T> {
        Ok(serde_json::from_value(value)?)
    }
}

/// JSON serializer
///
/// The default serializer. Handles every envelope type in this crate,
/// including those with flattened extra fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl JsonSerializer {
    /// Create a new JSON serializer
    pub fn new() -> Self {
        Self
    }
}

impl SerializerProtocol for JsonSerializer {
    fn dumps<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    fn loads<T: for<'de> Deserialize<'de>>(&self, data: &[u8]) -> Result<T> {
        Ok(serde_json::from_slice(data)?)
    }
}

/// Bincode serializer for compact binary encoding
///
/// Not suitable for types with flattened fields; use [`JsonSerializer`]
/// for checkpoint envelopes.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeSerializer;

impl BincodeSerializer {
    /// Create a new bincode serializer
    pub fn new() -> Self {
        Self
    }
}

impl SerializerProtocol for BincodeSerializer {
    fn dumps<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        Ok(bincode::serialize(value)?)
    }

    fn loads<T: for<'de> Deserialize<'de>>(&self, data: &[u8]) -> Result<T> {
        Ok(bincode::deserialize(data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::Checkpoint;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct TestData {
        name: String,
        value: i64,
    }

    #[test]
    fn test_json_serializer_round_trip() {
        let serializer = JsonSerializer::new();
        let data = TestData {
            name: "test".to_string(),
            value: 42,
        };

        let bytes = serializer.dumps(&data).unwrap();
        let decoded: TestData = serializer.loads(&bytes).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_bincode_serializer_round_trip() {
        let serializer = BincodeSerializer::new();
        let data = TestData {
            name: "test".to_string(),
            value: 42,
        };

        let bytes = serializer.dumps(&data).unwrap();
        let decoded: TestData = serializer.loads(&bytes).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_json_serializer_handles_checkpoints() {
        let serializer = JsonSerializer::new();
        let mut checkpoint = Checkpoint::empty();
        checkpoint
            .extra
            .insert("pending_sends".to_string(), serde_json::json!([]));

        let bytes = serializer.dumps(&checkpoint).unwrap();
        let decoded: Checkpoint = serializer.loads(&bytes).unwrap();
        assert_eq!(decoded.id, checkpoint.id);
        assert!(decoded.extra.contains_key("pending_sends"));
    }

    #[test]
    fn test_json_value_round_trip() {
        let serializer = JsonSerializer::new();
        let data = TestData {
            name: "test".to_string(),
            value: 7,
        };

        let value = serializer.dumps_json(&data).unwrap();
        let decoded: TestData = serializer.loads_json(value).unwrap();
        assert_eq!(decoded, data);
    }
}
