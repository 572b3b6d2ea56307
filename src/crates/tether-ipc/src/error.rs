//! Error types for the bridge

use crate::config::ConfigError;
use crate::events::StreamProtocolVersion;
use std::process::ExitStatus;
use tether_checkpoint::CheckpointError;
use thiserror::Error;

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors that can occur across the bridge
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Requested stream protocol version is not supported
    #[error("Stream protocol version {requested} is not supported; only v2 is available")]
    ProtocolVersion { requested: StreamProtocolVersion },

    /// A bridge socket could not be reached
    #[error("Failed to connect to {path}: {source}")]
    Connection {
        path: String,
        source: std::io::Error,
    },

    /// A stream frame could not be decoded
    #[error("Failed to decode stream frame: {0}")]
    StreamDecode(String),

    /// Checkpoint store failure
    #[error(transparent)]
    Store(#[from] CheckpointError),

    /// Counterpart process exited
    ///
    /// Any exit ends the session, exit code 0 included. The counterpart is
    /// expected to outlive the bridge.
    #[error("Counterpart process exited with {status}")]
    ProcessExit { status: ExitStatus },

    /// Counterpart process could not be launched
    #[error("Failed to spawn {command}: {source}")]
    ProcessSpawn {
        command: String,
        source: std::io::Error,
    },

    /// Operation is not available over the bridge
    #[error("{0} is not implemented over the bridge")]
    NotImplemented(String),

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    /// Request construction failure
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] http::Error),

    /// Peer answered with an unexpected HTTP status
    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Bridge has not been started
    #[error("Bridge has not been started")]
    NotStarted,

    /// Bridge is already started
    #[error("Bridge is already started")]
    AlreadyStarted,

    /// The single-use readiness channel went to an earlier waiter
    #[error("Bridge readiness was already claimed by another waiter")]
    ReadinessClaimed,

    /// Worker thread ended before readiness was resolved
    #[error("Bridge supervisor exited before readiness was resolved")]
    SupervisorExited,
}
