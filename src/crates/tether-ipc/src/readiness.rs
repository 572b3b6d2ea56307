//! Readiness tracking and health polling

use crate::transport::UdsClient;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Lifecycle states of a bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadinessState {
    /// Bridge has not been started
    NotReady = 0,
    /// Worker is running, sockets not yet both healthy
    Polling = 1,
    /// Both sockets have answered their health endpoints
    Ready = 2,
}

impl ReadinessState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ReadinessState::NotReady,
            1 => ReadinessState::Polling,
            _ => ReadinessState::Ready,
        }
    }
}

/// Shared, monotonic readiness state
///
/// Transitions only move forward: NotReady, then Polling, then Ready.
/// An attempted regression is ignored.
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    state: Arc<AtomicU8>,
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(ReadinessState::NotReady as u8)),
        }
    }

    /// Current state
    pub fn state(&self) -> ReadinessState {
        ReadinessState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Advance to `state`; regressions are ignored
    pub(crate) fn advance(&self, state: ReadinessState) {
        self.state.fetch_max(state as u8, Ordering::SeqCst);
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Poll both health endpoints until each has succeeded at least once
///
/// A success is remembered; a peer is not re-polled after its first healthy
/// answer. There is no internal timeout, callers impose deadlines around the
/// readiness wait.
pub(crate) async fn poll_until_healthy(
    graph: &UdsClient,
    checkpointer: &UdsClient,
    interval: Duration,
) {
    let mut graph_ok = false;
    let mut checkpointer_ok = false;

    loop {
        if !graph_ok && graph.healthy().await {
            graph_ok = true;
            tracing::debug!("Graph socket answered /ok");
        }
        if !checkpointer_ok && checkpointer.healthy().await {
            checkpointer_ok = true;
            tracing::debug!("Checkpointer socket answered /ok");
        }
        if graph_ok && checkpointer_ok {
            return;
        }
        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{self, CHECKPOINTER_HOST, GRAPH_HOST};
    use axum::routing::get;
    use axum::Router;

    fn ok_router() -> Router {
        Router::new().route("/ok", get(|| async { "ok" }))
    }

    #[test]
    fn test_gate_never_regresses() {
        let gate = ReadinessGate::new();
        assert_eq!(gate.state(), ReadinessState::NotReady);

        gate.advance(ReadinessState::Polling);
        assert_eq!(gate.state(), ReadinessState::Polling);

        gate.advance(ReadinessState::Ready);
        assert_eq!(gate.state(), ReadinessState::Ready);

        gate.advance(ReadinessState::Polling);
        assert_eq!(gate.state(), ReadinessState::Ready);
    }

    #[test]
    fn test_gate_is_shared_between_clones() {
        let gate = ReadinessGate::new();
        let observer = gate.clone();
        gate.advance(ReadinessState::Ready);
        assert_eq!(observer.state(), ReadinessState::Ready);
    }

    #[tokio::test]
    async fn test_poll_waits_for_both_sockets() {
        let dir = tempfile::tempdir().unwrap();
        let graph_path = dir.path().join("graph.sock");
        let checkpointer_path = dir.path().join("checkpointer.sock");

        let listener = transport::bind(&checkpointer_path).unwrap();
        tokio::spawn(transport::serve(listener, ok_router()));

        let graph = UdsClient::new(&graph_path, GRAPH_HOST);
        let checkpointer = UdsClient::new(&checkpointer_path, CHECKPOINTER_HOST);

        let poll = poll_until_healthy(&graph, &checkpointer, Duration::from_millis(10));
        tokio::pin!(poll);

        // Only the checkpointer is up, so the poll must keep waiting.
        let early = tokio::time::timeout(Duration::from_millis(100), poll.as_mut()).await;
        assert!(early.is_err());

        let listener = transport::bind(&graph_path).unwrap();
        tokio::spawn(transport::serve(listener, ok_router()));

        tokio::time::timeout(Duration::from_secs(5), poll)
            .await
            .expect("poll should finish once both sockets answer");
    }
}
