//! Startup orchestration.
//!
//! # Order
//! 1. Metrics exporter (when enabled)
//! 2. TLS material (when configured)
//! 3. Listener bind
//! 4. Serve until a shutdown signal arrives
//!
//! Any failure before serving is fatal and aborts startup.

use std::error::Error;
use std::net::SocketAddr;
use std::path::Path;

use tokio::net::TcpListener;

use crate::config::ShadowConfig;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::net::tls::load_tls_config;
use crate::observability::metrics;

/// Start the proxy and block until it has shut down.
pub async fn run(config: ShadowConfig) -> Result<(), Box<dyn Error>> {
    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
        tracing::info!(address = %addr, "Metrics exporter listening");
    }

    let tls = match &config.listener.tls {
        Some(tls) => Some(load_tls_config(Path::new(&tls.cert_path), Path::new(&tls.key_path)).await?),
        None => None,
    };

    let bind_address = config.listener.socket_address();
    let addr = tokio::net::lookup_host(bind_address.as_str())
        .await?
        .next()
        .ok_or_else(|| format!("bind address `{bind_address}` did not resolve"))?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    let server = HttpServer::new(config)?;
    match tls {
        Some(tls) => server.run_tls(addr, tls, server_shutdown).await?,
        None => {
            let listener = TcpListener::bind(addr).await?;
            server.run(listener, server_shutdown).await?
        }
    }

    Ok(())
}
