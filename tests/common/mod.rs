//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Method, Request, Response, StatusCode, Uri},
    Router,
};
use shadow_proxy::{HttpServer, ShadowConfig, Shutdown};
use tokio::net::TcpListener;

/// One request as seen by a mock backend.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Clone)]
struct BackendState {
    name: &'static str,
    status: StatusCode,
    body: &'static str,
    delay: Option<Duration>,
    captured: Arc<Mutex<Vec<Captured>>>,
}

/// A mock backend that records every request it receives.
pub struct RecordingBackend {
    pub addr: SocketAddr,
    captured: Arc<Mutex<Vec<Captured>>>,
}

impl RecordingBackend {
    pub fn requests(&self) -> Vec<Captured> {
        self.captured.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.captured.lock().unwrap().len()
    }

    /// Poll until at least `n` requests arrived or `timeout` elapses.
    pub async fn wait_for(&self, n: usize, timeout: Duration) -> Vec<Captured> {
        let deadline = Instant::now() + timeout;
        while self.count() < n && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.requests()
    }
}

/// Builder-style options for [`start_recording_backend`].
pub struct BackendSpec {
    pub name: &'static str,
    pub status: StatusCode,
    pub body: &'static str,
    pub delay: Option<Duration>,
}

impl BackendSpec {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            status: StatusCode::OK,
            body: name,
            delay: None,
        }
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

pub async fn start_recording_backend(spec: BackendSpec) -> RecordingBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let captured = Arc::new(Mutex::new(Vec::new()));

    let state = BackendState {
        name: spec.name,
        status: spec.status,
        body: spec.body,
        delay: spec.delay,
        captured: captured.clone(),
    };
    let app = Router::new().fallback(record).with_state(state);

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    RecordingBackend { addr, captured }
}

async fn record(State(state): State<BackendState>, request: Request<Body>) -> Response<Body> {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
    state.captured.lock().unwrap().push(Captured {
        method: parts.method,
        uri: parts.uri,
        headers: parts.headers,
        body,
    });

    if let Some(delay) = state.delay {
        tokio::time::sleep(delay).await;
    }

    Response::builder()
        .status(state.status)
        .header("x-backend", state.name)
        .body(Body::from(state.body))
        .unwrap()
}

/// A backend that accepts connections and drops them at once.
pub async fn start_resetting_backend() -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = accepted.clone();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            drop(socket);
        }
    });

    (addr, accepted)
}

/// Config pointing both roles at the given backends.
pub fn config_for(primary: SocketAddr, shadow: SocketAddr) -> ShadowConfig {
    let mut config = ShadowConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.primary.target = primary.to_string();
    config.shadow.target = shadow.to_string();
    config.primary.timeout_ms = 2000;
    config.shadow.timeout_ms = 2000;
    config
}

/// Start the proxy on an ephemeral port.
pub async fn start_proxy(config: ShadowConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .pool_max_idle_per_host(0)
        .build()
        .unwrap()
}
