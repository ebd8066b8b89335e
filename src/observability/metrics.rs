//! Metrics collection and exposition.
//!
//! # Metrics
//! - `shadow_proxy_requests_total` (counter): inbound requests by sampling decision
//! - `shadow_proxy_dispatch_total` (counter): dispatches by role and outcome
//! - `shadow_proxy_dispatch_duration_seconds` (histogram): dispatch latency by role
//!
//! Recording is a no-op until [`init_metrics`] installs a recorder.

use std::net::SocketAddr;
use std::time::Instant;

use axum::http::StatusCode;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::shadow::Role;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()
}

/// Count one inbound request by sampling decision.
pub fn record_decision(decision: &'static str) {
    metrics::counter!("shadow_proxy_requests_total", "decision" => decision).increment(1);
}

/// Record one completed dispatch.
pub fn record_dispatch(role: Role, status: Option<StatusCode>, start: Instant) {
    let outcome = match status {
        Some(status) => status.as_u16().to_string(),
        None => "failed".to_string(),
    };

    metrics::counter!(
        "shadow_proxy_dispatch_total",
        "role" => role.as_str(),
        "outcome" => outcome
    )
    .increment(1);

    metrics::histogram!("shadow_proxy_dispatch_duration_seconds", "role" => role.as_str())
        .record(start.elapsed().as_secs_f64());
}
