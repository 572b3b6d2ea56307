//! Counterpart process lifecycle

use crate::config::{BridgeConfig, ConfigError};
use crate::error::{BridgeError, Result};
use tokio::process::{Child, Command};

/// Environment variable carrying the graph registry to the counterpart
///
/// The value is a JSON object mapping graph name to source location.
pub const GRAPHS_ENV: &str = "TETHER_GRAPHS";

/// Handle to the spawned counterpart engine process
///
/// The child is killed when this handle is dropped.
#[derive(Debug)]
pub struct GraphProcess {
    child: Child,
    command: String,
}

impl GraphProcess {
    /// Spawn the counterpart engine described by the config
    pub fn spawn(config: &BridgeConfig) -> Result<Self> {
        let program = config.command.as_deref().ok_or_else(|| {
            ConfigError::InvalidConfig("counterpart command is required".to_string())
        })?;
        let registry = serde_json::to_string(&config.graphs)?;

        let mut command = Command::new(program);
        command
            .args(&config.args)
            .env(GRAPHS_ENV, registry)
            .kill_on_drop(true);

        let child = command.spawn().map_err(|source| BridgeError::ProcessSpawn {
            command: program.to_string(),
            source,
        })?;

        tracing::info!(
            "Spawned counterpart process {} (pid {:?})",
            program,
            child.id()
        );
        Ok(Self {
            child,
            command: program.to_string(),
        })
    }

    /// Wait for the process to exit
    ///
    /// Resolution is always a failure for the session: the counterpart is
    /// expected to outlive the bridge, so any exit, code 0 included, carries
    /// its real status out as [`BridgeError::ProcessExit`].
    pub async fn wait(&mut self) -> BridgeError {
        match self.child.wait().await {
            Ok(status) => {
                tracing::error!("Counterpart process {} exited with {}", self.command, status);
                BridgeError::ProcessExit { status }
            }
            Err(err) => BridgeError::Io(err),
        }
    }

    /// OS process id, while the child is running
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }
}
