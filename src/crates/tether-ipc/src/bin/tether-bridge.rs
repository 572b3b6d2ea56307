//! Bridge daemon: serve the checkpointer, supervise the engine, stay up

use clap::Parser;
use std::path::PathBuf;
use tether_ipc::{BridgeConfig, GraphBridge};

#[derive(Parser, Debug)]
#[command(
    name = "tether-bridge",
    version,
    about = "Bridge a graph engine and its checkpointer over Unix sockets"
)]
struct Args {
    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Socket the counterpart graph engine serves on
    #[arg(long)]
    graph_socket: Option<PathBuf>,

    /// Socket the checkpointer service binds
    #[arg(long)]
    checkpointer_socket: Option<PathBuf>,

    /// Health poll interval in milliseconds
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Graph registry entry as name=path; repeatable
    #[arg(long = "graph", value_name = "NAME=PATH")]
    graphs: Vec<String>,

    /// Counterpart command followed by its arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(rust_log).init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => BridgeConfig::from_file(path)?,
        None => match BridgeConfig::load() {
            Ok(config) => {
                tracing::info!("Loaded configuration file");
                config
            }
            Err(err) => {
                tracing::warn!("Using default configuration: {}", err);
                BridgeConfig::default()
            }
        },
    };

    if let Some(path) = args.graph_socket {
        config.graph_socket = path;
    }
    if let Some(path) = args.checkpointer_socket {
        config.checkpointer_socket = path;
    }
    if let Some(interval) = args.poll_interval_ms {
        config.poll_interval_ms = interval;
    }
    for entry in &args.graphs {
        let Some((name, path)) = entry.split_once('=') else {
            anyhow::bail!("invalid --graph entry {entry:?}, expected name=path");
        };
        config.graphs.insert(name.to_string(), path.to_string());
    }
    if let Some((command, rest)) = args.command.split_first() {
        config.command = Some(command.clone());
        config.args = rest.to_vec();
    }

    let bridge = GraphBridge::new(config);
    bridge.start()?;
    bridge.wait_ready_blocking()?;
    tracing::info!("Bridge is ready");

    // The session runs until the engine exits or the listener fails.
    bridge.join()?;
    Ok(())
}
