//! Bridge supervision
//!
//! [`GraphBridge`] ties the pieces together: it launches the counterpart
//! engine, serves the checkpointer socket, and reports readiness, all from a
//! dedicated worker thread running its own single-threaded tokio runtime.
//! The caller's concurrency domain (which may have no runtime at all) and
//! the worker's domain touch only through a oneshot channel and an atomic
//! readiness gate.
//!
//! Inside the worker, one select loop joins three activities:
//!
//! 1. serving the checkpointer listener, which runs for the whole session,
//! 2. waiting on the counterpart process, whose exit always ends the session,
//! 3. polling both sockets' `/ok` until each has answered once.
//!
//! Readiness is signaled exactly once. A failure before readiness, a bind
//! failure, a spawn failure, or an early process exit travels down the same
//! oneshot channel, so a waiter always learns the real outcome;
//! [`GraphBridge::join`] drains anything left unclaimed.

use crate::client::{CheckpointerClient, GraphServiceClient};
use crate::config::{BridgeConfig, ConfigError};
use crate::error::{BridgeError, Result};
use crate::process::GraphProcess;
use crate::readiness::{self, ReadinessGate, ReadinessState};
use crate::service::{self, AppState};
use crate::transport::{self, UdsClient, CHECKPOINTER_HOST, GRAPH_HOST};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tether_checkpoint::{CheckpointSaver, InMemoryCheckpointSaver};
use tokio::sync::oneshot;

/// A supervised bridge between the graph engine and its checkpointer
pub struct GraphBridge {
    config: BridgeConfig,
    saver: Arc<dyn CheckpointSaver>,
    gate: ReadinessGate,
    started: AtomicBool,
    ready: Mutex<Option<oneshot::Receiver<Result<()>>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
    error: Arc<Mutex<Option<BridgeError>>>,
}

impl GraphBridge {
    /// Create a bridge over `config` with a fresh in-memory store
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            saver: Arc::new(InMemoryCheckpointSaver::new()),
            gate: ReadinessGate::new(),
            started: AtomicBool::new(false),
            ready: Mutex::new(None),
            handle: Mutex::new(None),
            error: Arc::new(Mutex::new(None)),
        }
    }

    /// Replace the checkpoint store backend; call before [`start`](Self::start)
    pub fn with_saver(mut self, saver: Arc<dyn CheckpointSaver>) -> Self {
        self.saver = saver;
        self
    }

    /// Current readiness state
    pub fn state(&self) -> ReadinessState {
        self.gate.state()
    }

    /// The configuration this bridge runs with
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Client for one graph on the engine socket
    pub fn graph_client(&self, graph_id: impl Into<String>) -> GraphServiceClient {
        GraphServiceClient::new(&self.config.graph_socket, graph_id)
    }

    /// Client for the checkpointer socket
    pub fn checkpointer_client(&self) -> CheckpointerClient {
        CheckpointerClient::new(&self.config.checkpointer_socket)
    }

    /// Launch the worker thread and the counterpart process
    ///
    /// Returns as soon as the worker is spawned; readiness arrives later
    /// through [`wait_ready`](Self::wait_ready).
    pub fn start(&self) -> Result<()> {
        if self.config.command.is_none() {
            return Err(ConfigError::InvalidConfig(
                "counterpart command is required".to_string(),
            )
            .into());
        }
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(BridgeError::AlreadyStarted);
        }

        let (ready_tx, ready_rx) = oneshot::channel();
        *self.ready.lock() = Some(ready_rx);

        let config = self.config.clone();
        let saver = self.saver.clone();
        let gate = self.gate.clone();
        let error = self.error.clone();
        self.gate.advance(ReadinessState::Polling);

        let handle = std::thread::Builder::new()
            .name("bridge-supervisor".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(err) => {
                        let _ = ready_tx.send(Err(BridgeError::Io(err)));
                        return;
                    }
                };
                runtime.block_on(supervise(config, saver, gate, ready_tx, error));
            })
            .map_err(BridgeError::Io)?;
        *self.handle.lock() = Some(handle);

        tracing::info!("Bridge supervisor started");
        Ok(())
    }

    /// Wait until both sockets have answered their health endpoints
    ///
    /// Resolves `Ok` exactly when readiness is signaled, or with the error
    /// that ended the session before readiness. The readiness channel can be
    /// consumed once per bridge: a second pre-ready waiter gets
    /// [`BridgeError::ReadinessClaimed`]. After the bridge turns ready this
    /// returns `Ok` immediately for everyone.
    pub async fn wait_ready(&self) -> Result<()> {
        if self.gate.state() == ReadinessState::Ready {
            return Ok(());
        }
        let receiver = match self.ready.lock().take() {
            Some(receiver) => receiver,
            None if self.started.load(Ordering::SeqCst) => {
                return Err(BridgeError::ReadinessClaimed);
            }
            None => return Err(BridgeError::NotStarted),
        };
        match receiver.await {
            Ok(result) => result,
            Err(_) => Err(BridgeError::SupervisorExited),
        }
    }

    /// Blocking variant of [`wait_ready`](Self::wait_ready) for callers
    /// without an async runtime
    pub fn wait_ready_blocking(&self) -> Result<()> {
        if self.gate.state() == ReadinessState::Ready {
            return Ok(());
        }
        let receiver = match self.ready.lock().take() {
            Some(receiver) => receiver,
            None if self.started.load(Ordering::SeqCst) => {
                return Err(BridgeError::ReadinessClaimed);
            }
            None => return Err(BridgeError::NotStarted),
        };
        match receiver.blocking_recv() {
            Ok(result) => result,
            Err(_) => Err(BridgeError::SupervisorExited),
        }
    }

    /// Block until the supervisor thread ends, surfacing the session error
    pub fn join(&self) -> Result<()> {
        let Some(handle) = self.handle.lock().take() else {
            return Err(BridgeError::NotStarted);
        };
        handle.join().map_err(|_| BridgeError::SupervisorExited)?;
        if let Some(err) = self.error.lock().take() {
            return Err(err);
        }
        // A pre-ready failure nobody claimed is still parked in the
        // readiness channel, not the error slot.
        if let Some(mut receiver) = self.ready.lock().take() {
            if let Ok(Err(err)) = receiver.try_recv() {
                return Err(err);
            }
        }
        Ok(())
    }
}

/// Drive one bridge session on the worker runtime
async fn supervise(
    config: BridgeConfig,
    saver: Arc<dyn CheckpointSaver>,
    gate: ReadinessGate,
    ready: oneshot::Sender<Result<()>>,
    error: Arc<Mutex<Option<BridgeError>>>,
) {
    let mut ready = Some(ready);
    if let Err(err) = run_session(config, saver, gate, &mut ready).await {
        tracing::error!("Bridge session ended: {}", err);
        match ready.take() {
            Some(channel) => {
                // An unconsumed channel means nobody is waiting; keep the
                // error for join().
                if let Err(Err(unsent)) = channel.send(Err(err)) {
                    *error.lock() = Some(unsent);
                }
            }
            None => *error.lock() = Some(err),
        }
    }
}

/// One session: serve the checkpointer, watch the process, poll for health
async fn run_session(
    config: BridgeConfig,
    saver: Arc<dyn CheckpointSaver>,
    gate: ReadinessGate,
    ready: &mut Option<oneshot::Sender<Result<()>>>,
) -> Result<()> {
    let listener = transport::bind(&config.checkpointer_socket)?;
    tracing::info!(
        "Checkpointer service listening on {}",
        config.checkpointer_socket.display()
    );

    let state = AppState {
        saver,
        graph_socket: config.graph_socket.clone(),
    };
    let router = service::create_router(state);

    let mut process = GraphProcess::spawn(&config)?;

    let graph = UdsClient::new(&config.graph_socket, GRAPH_HOST);
    let checkpointer = UdsClient::new(&config.checkpointer_socket, CHECKPOINTER_HOST);
    let interval = Duration::from_millis(config.poll_interval_ms);

    let serve = transport::serve(listener, router);
    let exited = process.wait();
    let healthy = readiness::poll_until_healthy(&graph, &checkpointer, interval);
    tokio::pin!(serve, exited, healthy);

    let mut signalled = false;
    loop {
        tokio::select! {
            result = &mut serve => {
                // The accept loop only returns on failure.
                return result;
            }
            err = &mut exited => {
                return Err(err);
            }
            _ = &mut healthy, if !signalled => {
                signalled = true;
                gate.advance(ReadinessState::Ready);
                tracing::info!("Bridge ready, both sockets answered /ok");
                if let Some(channel) = ready.take() {
                    let _ = channel.send(Ok(()));
                }
            }
        }
    }
}
