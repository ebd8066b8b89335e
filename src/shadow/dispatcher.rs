//! Per-role outbound round-trips.
//!
//! # Responsibilities
//! - Own one HTTP client per role, configured with that role's timeout
//! - Bound connect, TLS handshake and response-header wait by the timeout
//! - Retry exactly once, immediately, on transient transport failures
//!
//! # Design Decisions
//! - Redirects are never followed; 3xx responses are returned verbatim
//! - With `close_connections`, no idle connection is kept in the pool
//! - The outcome is an explicit two-variant enum, never an optional response

use std::time::Duration;

use axum::http::StatusCode;

use crate::config::RoleConfig;
use crate::error::DispatchError;
use crate::shadow::request::Role;
use crate::shadow::target::ResolvedRequest;

/// Result of dispatching one request copy.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// The backend answered. Dropping the response closes its body.
    Responded(reqwest::Response),
    /// Every attempt failed; the last error is kept.
    Failed(DispatchError),
}

impl DispatchOutcome {
    /// Status code of the backend response, if one arrived.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            DispatchOutcome::Responded(response) => Some(response.status()),
            DispatchOutcome::Failed(_) => None,
        }
    }

    /// Close the response body without reading it, returning its status.
    pub fn discard(self) -> Option<StatusCode> {
        let status = self.status();
        drop(self);
        status
    }
}

/// Sends resolved requests to one role's backend.
#[derive(Debug, Clone)]
pub struct RoleDispatcher {
    role: Role,
    client: reqwest::Client,
    timeout: Duration,
}

impl RoleDispatcher {
    /// Build the client for `role`.
    pub fn new(
        role: Role,
        config: &RoleConfig,
        close_connections: bool,
    ) -> Result<Self, reqwest::Error> {
        let timeout = config.timeout();

        let mut builder = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(timeout)
            .tcp_keepalive(timeout * 10)
            .no_proxy();
        if close_connections {
            builder = builder.pool_max_idle_per_host(0);
        }

        Ok(Self {
            role,
            client: builder.build()?,
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Perform the round-trip, retrying once on a transient failure.
    pub async fn dispatch(&self, request: &ResolvedRequest) -> DispatchOutcome {
        let first = match self.round_trip(request).await {
            Ok(response) => return DispatchOutcome::Responded(response),
            Err(e) => e,
        };

        if !first.is_transient() {
            tracing::warn!(role = %self.role, url = %request.url, error = %first, "Request failed");
            return DispatchOutcome::Failed(first);
        }

        tracing::debug!(role = %self.role, url = %request.url, error = %first, "Retrying after transport error");

        match self.round_trip(request).await {
            Ok(response) => DispatchOutcome::Responded(response),
            Err(e) => {
                tracing::warn!(role = %self.role, url = %request.url, error = %e, "Request failed twice");
                DispatchOutcome::Failed(e)
            }
        }
    }

    async fn round_trip(&self, request: &ResolvedRequest) -> Result<reqwest::Response, DispatchError> {
        let send = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone())
            .body(request.body.clone())
            .send();

        match tokio::time::timeout(self.timeout, send).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(DispatchError::Timeout(self.timeout)),
        }
    }
}
