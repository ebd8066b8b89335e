//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Derive the default filter from config (`log_level`, `debug`)
//!
//! # Design Decisions
//! - `RUST_LOG` wins over config when set
//! - Access lines are `info` events, so `verbose` works at the default level

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Default filter directive for the given config.
pub fn default_filter(config: &ObservabilityConfig) -> String {
    if config.debug {
        "shadow_proxy=debug,tower_http=debug".to_string()
    } else {
        format!("shadow_proxy={},tower_http=warn", config.log_level)
    }
}

/// Install the global subscriber. Call once, before serving.
pub fn init_logging(config: &ObservabilityConfig) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter(config))),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
