//! HTTP-over-UDS plumbing shared by the bridge's clients and services
//!
//! Unix sockets do the addressing; HTTP/1.1 does the framing. Requests carry
//! a `Host` header naming the logical peer since socket paths never appear
//! in URIs.

use crate::error::{BridgeError, Result};
use http::{header, Method, Request, Response};
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper_util::rt::{TokioExecutor, TokioIo};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::convert::Infallible;
use std::path::{Path, PathBuf};
use tokio::net::{UnixListener, UnixStream};
use tower::Service;

/// Host header value for the graph engine peer
pub const GRAPH_HOST: &str = "graph";

/// Host header value for the checkpointer peer
pub const CHECKPOINTER_HOST: &str = "checkpointer";

/// HTTP client for a single Unix socket peer
///
/// Each request opens a fresh connection with its own driver task, so no
/// connection state outlives a request.
#[derive(Debug, Clone)]
pub struct UdsClient {
    socket_path: PathBuf,
    host: String,
}

impl UdsClient {
    /// Create a client for the peer behind `socket_path`
    pub fn new(socket_path: impl Into<PathBuf>, host: impl Into<String>) -> Self {
        Self {
            socket_path: socket_path.into(),
            host: host.into(),
        }
    }

    /// The socket path this client connects to
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Send a GET request
    pub async fn get(&self, path: &str) -> Result<Response<Incoming>> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(path)
            .header(header::HOST, &self.host)
            .body(Full::new(Bytes::new()))?;
        self.send(request).await
    }

    /// Send a POST request with a JSON body
    pub async fn post_json<T: Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<Response<Incoming>> {
        let payload = serde_json::to_vec(body)?;
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::HOST, &self.host)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(payload)))?;
        self.send(request).await
    }

    /// True when the peer answers `GET /ok` with a success status
    pub async fn healthy(&self) -> bool {
        match self.get("/ok").await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    async fn send(&self, request: Request<Full<Bytes>>) -> Result<Response<Incoming>> {
        let stream = UnixStream::connect(&self.socket_path)
            .await
            .map_err(|source| BridgeError::Connection {
                path: self.socket_path.display().to_string(),
                source,
            })?;

        let (mut sender, connection) =
            hyper::client::conn::http1::handshake(TokioIo::new(stream)).await?;
        tokio::spawn(async move {
            if let Err(err) = connection.await {
                tracing::debug!("Connection ended: {}", err);
            }
        });

        Ok(sender.send_request(request).await?)
    }
}

/// Collect a response body and decode it as JSON
pub async fn read_json<T: DeserializeOwned>(response: Response<Incoming>) -> Result<T> {
    let bytes = response.into_body().collect().await?.to_bytes();
    Ok(serde_json::from_slice(&bytes)?)
}

/// Collect a response body as raw bytes
pub async fn read_bytes(response: Response<Incoming>) -> Result<Bytes> {
    Ok(response.into_body().collect().await?.to_bytes())
}

/// Turn a non-success response into an error carrying status and body
pub async fn error_for_status(response: Response<Incoming>) -> Result<Response<Incoming>> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = read_bytes(response).await?;
    Err(BridgeError::UnexpectedStatus {
        status,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

/// Bind a Unix listener, unlinking a stale socket file first
pub fn bind(path: &Path) -> Result<UnixListener> {
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    Ok(UnixListener::bind(path)?)
}

/// Serve an axum router over a Unix listener
///
/// Each accepted connection gets its own task driving hyper's auto builder.
/// Returns only if the accept loop itself fails.
pub async fn serve(listener: UnixListener, app: axum::Router) -> Result<()> {
    let mut make_service = app.into_make_service();

    loop {
        let (socket, _remote_addr) = listener.accept().await?;
        let tower_service = unwrap_infallible(make_service.call(&socket).await);

        tokio::spawn(async move {
            let socket = TokioIo::new(socket);
            let hyper_service = hyper::service::service_fn(move |request: Request<Incoming>| {
                tower_service.clone().call(request)
            });

            if let Err(err) = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                .serve_connection(socket, hyper_service)
                .await
            {
                tracing::debug!("Failed to serve connection: {:?}", err);
            }
        });
    }
}

fn unwrap_infallible<T>(result: std::result::Result<T, Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => match err {},
    }
}
