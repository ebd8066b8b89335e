//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatch engine produces:
//!     → logging.rs (structured log events, per-dispatch access lines)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - A request id lives on the tracing span only; it is never forwarded
//! - Metrics are cheap (atomic increments) and off by default

pub mod logging;
pub mod metrics;
