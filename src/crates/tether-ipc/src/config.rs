//! Bridge configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "TETHER_CONFIG";

/// Conventional config file locations, tried in order
const CONFIG_CANDIDATES: &[&str] = &["tether.toml", "config/tether.toml"];

/// Errors from loading bridge configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Configuration for a bridge instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Socket the counterpart graph engine serves on
    #[serde(default = "default_graph_socket")]
    pub graph_socket: PathBuf,

    /// Socket the checkpointer service binds
    #[serde(default = "default_checkpointer_socket")]
    pub checkpointer_socket: PathBuf,

    /// Interval between health polls, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Command used to launch the counterpart engine
    #[serde(default)]
    pub command: Option<String>,

    /// Arguments passed to the counterpart command
    #[serde(default)]
    pub args: Vec<String>,

    /// Graph registry, mapping graph name to source location
    #[serde(default)]
    pub graphs: HashMap<String, String>,
}

fn default_graph_socket() -> PathBuf {
    PathBuf::from("./graph.sock")
}

fn default_checkpointer_socket() -> PathBuf {
    PathBuf::from("./checkpointer.sock")
}

fn default_poll_interval_ms() -> u64 {
    100
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            graph_socket: default_graph_socket(),
            checkpointer_socket: default_checkpointer_socket(),
            poll_interval_ms: default_poll_interval_ms(),
            command: None,
            args: Vec::new(),
            graphs: HashMap::new(),
        }
    }
}

impl BridgeConfig {
    /// Create a config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the graph engine socket path
    pub fn with_graph_socket(mut self, path: impl Into<PathBuf>) -> Self {
        self.graph_socket = path.into();
        self
    }

    /// Set the checkpointer socket path
    pub fn with_checkpointer_socket(mut self, path: impl Into<PathBuf>) -> Self {
        self.checkpointer_socket = path.into();
        self
    }

    /// Set the health poll interval in milliseconds
    pub fn with_poll_interval_ms(mut self, interval: u64) -> Self {
        self.poll_interval_ms = interval;
        self
    }

    /// Set the counterpart command
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Set the counterpart command arguments
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Register a graph by name
    pub fn with_graph(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.graphs.insert(name.into(), path.into());
        self
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::ParseError)
    }

    /// Load configuration from the conventional locations
    ///
    /// Checks the `TETHER_CONFIG` environment variable first, then the
    /// candidate paths in order.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::from_file(path);
        }

        for candidate in CONFIG_CANDIDATES {
            if Path::new(candidate).exists() {
                return Self::from_file(candidate);
            }
        }

        Err(ConfigError::InvalidConfig(
            "No configuration file found".to_string(),
        ))
    }
}
