//! Per-request dispatch coordination.
//!
//! # Request Flow
//! ```text
//! inbound request
//!     → HEAD? → Skipped (no backend contact)
//!     → forwarded headers (optional)
//!     → sampling gate
//!         pass → duplicate body → spawn shadow task (detached)
//!         fail → buffer body once
//!     → primary: resolve → dispatch → relay response
//! ```
//!
//! The shadow task and the primary path never wait on each other. Faults
//! inside either path are caught at its boundary and logged.

use std::any::Any;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::response::IntoResponse;
use futures_util::FutureExt;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::ShadowConfig;
use crate::http::response::relay_response;
use crate::observability::metrics;
use crate::shadow::dispatcher::{DispatchOutcome, RoleDispatcher};
use crate::shadow::duplicate::{declared_length, duplicate_body, read_body};
use crate::shadow::forwarded::append_forwarded_headers;
use crate::shadow::request::{OutboundRequest, Role};
use crate::shadow::sampling::Sampler;
use crate::shadow::target::{resolve, ResolvedRequest};

/// What the caller gets back.
#[derive(Debug)]
pub enum Relay {
    /// The request was ignored by method; nothing was forwarded.
    Skipped,
    /// The primary backend answered; its response is streamed back.
    Relayed(Response<Body>),
    /// No primary response could be obtained.
    NoResponse,
}

impl IntoResponse for Relay {
    fn into_response(self) -> axum::response::Response {
        match self {
            Relay::Relayed(response) => response,
            // Nothing is written; the HTTP stack sends its default empty response.
            Relay::Skipped | Relay::NoResponse => Response::new(Body::empty()),
        }
    }
}

/// Caller-side details carried into access lines.
#[derive(Debug, Clone)]
struct AccessInfo {
    caller: String,
    method: Method,
    uri: String,
}

/// Entry point for inbound requests.
#[derive(Debug)]
pub struct Coordinator {
    config: Arc<ShadowConfig>,
    primary: RoleDispatcher,
    shadow: RoleDispatcher,
    sampler: Sampler,
}

impl Coordinator {
    /// Build role clients and an entropy-seeded sampler from `config`.
    pub fn new(config: Arc<ShadowConfig>) -> Result<Self, reqwest::Error> {
        let sampler = Sampler::new(config.sampling.percent);
        Self::with_sampler(config, sampler)
    }

    pub fn with_sampler(config: Arc<ShadowConfig>, sampler: Sampler) -> Result<Self, reqwest::Error> {
        let primary = RoleDispatcher::new(Role::Primary, &config.primary, config.close_connections)?;
        let shadow = RoleDispatcher::new(Role::Shadow, &config.shadow, config.close_connections)?;
        Ok(Self {
            config,
            primary,
            shadow,
            sampler,
        })
    }

    pub fn config(&self) -> &Arc<ShadowConfig> {
        &self.config
    }

    /// Handle one inbound request from `remote_addr`.
    pub async fn handle(&self, remote_addr: SocketAddr, request: Request<Body>) -> Relay {
        if request.method() == Method::HEAD {
            tracing::debug!(caller = %remote_addr, uri = %request.uri(), "Received HEAD request. Ignoring.");
            metrics::record_decision("skipped");
            return Relay::Skipped;
        }

        let span = tracing::info_span!(
            "request",
            id = %Uuid::new_v4(),
            method = %request.method(),
            uri = %request.uri(),
        );

        let debug = self.config.observability.debug;
        let handled = AssertUnwindSafe(self.forward(remote_addr, request).instrument(span))
            .catch_unwind()
            .await;

        handled.unwrap_or_else(|panic| {
            if debug {
                tracing::warn!(fault = %panic_message(&*panic), "Recovered in primary request");
            }
            Relay::NoResponse
        })
    }

    async fn forward(&self, remote_addr: SocketAddr, request: Request<Body>) -> Relay {
        let (mut parts, body) = request.into_parts();
        let access = AccessInfo {
            caller: remote_addr.to_string(),
            method: parts.method.clone(),
            uri: parts.uri.to_string(),
        };

        if self.config.forward_client_ip {
            append_forwarded_headers(&mut parts.headers, &access.caller);
        }

        let declared = declared_length(&parts.headers);
        let limit = self.config.limits.max_body_bytes;

        let primary = if self.sampler.should_shadow() {
            metrics::record_decision("shadowed");
            let bodies = match duplicate_body(body, declared, limit).await {
                Ok(bodies) => bodies,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to duplicate request body");
                    return Relay::NoResponse;
                }
            };
            self.spawn_shadow(OutboundRequest::clone_of(&parts, bodies.shadow), access.clone());
            OutboundRequest::clone_of(&parts, bodies.primary)
        } else {
            metrics::record_decision("primary_only");
            match read_body(body, declared, limit).await {
                Ok(body) => OutboundRequest::passthrough(&parts, body),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read request body");
                    return Relay::NoResponse;
                }
            }
        };

        tracing::debug!(version = ?primary.version, close = primary.close, "Forwarding to primary");
        self.dispatch_primary(primary, &access).await
    }

    async fn dispatch_primary(&self, request: OutboundRequest, access: &AccessInfo) -> Relay {
        let resolved = match resolve(request, &self.config.primary) {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::warn!(role = %Role::Primary, error = %e, "Failed to resolve target");
                return Relay::NoResponse;
            }
        };

        let start = Instant::now();
        let outcome = self.primary.dispatch(&resolved).await;
        metrics::record_dispatch(Role::Primary, outcome.status(), start);

        match outcome {
            DispatchOutcome::Responded(response) => {
                if self.config.observability.verbose {
                    log_access(Role::Primary, access, &resolved, Some(response.status().as_u16()), start);
                }
                Relay::Relayed(relay_response(response, self.primary.timeout()))
            }
            DispatchOutcome::Failed(_) => Relay::NoResponse,
        }
    }

    /// Fire and forget: the task is never awaited and its faults stay inside it.
    fn spawn_shadow(&self, request: OutboundRequest, access: AccessInfo) {
        let config = Arc::clone(&self.config);
        let dispatcher = self.shadow.clone();
        let span = tracing::Span::current();

        tokio::spawn(
            async move {
                let debug = config.observability.debug;
                let task = shadow_round_trip(config, dispatcher, request, access);
                if let Err(panic) = AssertUnwindSafe(task).catch_unwind().await {
                    if debug {
                        tracing::warn!(fault = %panic_message(&*panic), "Recovered in shadow request");
                    }
                }
            }
            .instrument(span),
        );
    }
}

async fn shadow_round_trip(
    config: Arc<ShadowConfig>,
    dispatcher: RoleDispatcher,
    request: OutboundRequest,
    access: AccessInfo,
) {
    let resolved = match resolve(request, &config.shadow) {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::warn!(role = %Role::Shadow, error = %e, "Failed to resolve target");
            return;
        }
    };

    let start = Instant::now();
    let outcome = dispatcher.dispatch(&resolved).await;
    let status = outcome.discard();
    metrics::record_dispatch(Role::Shadow, status, start);

    if config.observability.verbose {
        log_access(Role::Shadow, &access, &resolved, status.map(|s| s.as_u16()), start);
    }
}

fn log_access(role: Role, access: &AccessInfo, resolved: &ResolvedRequest, status: Option<u16>, start: Instant) {
    tracing::info!(
        role = role.tag(),
        caller = %access.caller,
        method = %access.method,
        status,
        elapsed = ?start.elapsed(),
        host = %resolved.host(),
        uri = %access.uri,
        "Dispatch completed"
    );
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown fault".to_string()
    }
}
