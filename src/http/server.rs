//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all shadowing handler
//! - Wire up middleware (tracing, connection policy)
//! - Serve on a plain TCP listener or a rustls listener
//! - Stop accepting on shutdown and drain in-flight requests

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderValue, Request},
    routing::any,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::config::ShadowConfig;
use crate::lifecycle::ShutdownListener;
use crate::shadow::{Coordinator, Relay};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Coordinator>,
}

/// HTTP server for the shadowing proxy.
pub struct HttpServer {
    router: Router,
    config: Arc<ShadowConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ShadowConfig) -> Result<Self, reqwest::Error> {
        let config = Arc::new(config);
        let coordinator = Arc::new(Coordinator::new(Arc::clone(&config))?);
        Ok(Self::with_coordinator(coordinator))
    }

    /// Create a server around an already built coordinator.
    pub fn with_coordinator(coordinator: Arc<Coordinator>) -> Self {
        let config = Arc::clone(coordinator.config());
        let router = Self::build_router(&config, AppState { coordinator });
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ShadowConfig, state: AppState) -> Router {
        let router = Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http());

        if config.close_connections {
            // Ends caller keep-alive after every response.
            router.layer(SetResponseHeaderLayer::overriding(
                header::CONNECTION,
                HeaderValue::from_static("close"),
            ))
        } else {
            router
        }
    }

    /// Serve plain HTTP on `listener` until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: ShutdownListener) -> io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            primary = %self.config.primary.target,
            shadow = %self.config.shadow.target,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS on `addr` until `shutdown` fires.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        shutdown: ShutdownListener,
    ) -> io::Result<()> {
        tracing::info!(
            address = %addr,
            primary = %self.config.primary.target,
            shadow = %self.config.shadow.target,
            "HTTPS server starting"
        );

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            shutdown.wait().await;
            drain.graceful_shutdown(None);
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(app)
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ShadowConfig {
        &self.config
    }
}

/// Main proxy handler. Every method and path goes through the coordinator.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Relay {
    state.coordinator.handle(addr, request).await
}
