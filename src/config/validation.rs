//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, percentage within 0..=100)
//! - Check that role targets form a usable URL authority
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ShadowConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{RoleConfig, ShadowConfig};

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a host:port or :port address")]
    BindAddress(String),

    #[error("{role}.target must not be empty")]
    EmptyTarget { role: &'static str },

    #[error("{role}.target `{target}` is not a valid host[:port]")]
    InvalidTarget { role: &'static str, target: String },

    #[error("{role}.timeout_ms must be greater than zero")]
    ZeroTimeout { role: &'static str },

    #[error("sampling.percent must be within 0..=100, got {0}")]
    Percent(f64),

    #[error("listener.tls requires both cert_path and key_path")]
    IncompleteTls,

    #[error("observability.metrics_address `{0}` is not a socket address")]
    MetricsAddress(String),

    #[error("limits.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,
}

/// Validate a loaded configuration, collecting every problem.
pub fn validate_config(config: &ShadowConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !is_bind_address(&config.listener.socket_address()) {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.is_empty() || tls.key_path.is_empty() {
            errors.push(ValidationError::IncompleteTls);
        }
    }

    validate_role("primary", &config.primary, &mut errors);
    validate_role("shadow", &config.shadow, &mut errors);

    let percent = config.sampling.percent;
    if !(0.0..=100.0).contains(&percent) {
        errors.push(ValidationError::Percent(percent));
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_role(role: &'static str, config: &RoleConfig, errors: &mut Vec<ValidationError>) {
    if config.target.is_empty() {
        errors.push(ValidationError::EmptyTarget { role });
    } else if !is_authority(&config.target) {
        errors.push(ValidationError::InvalidTarget {
            role,
            target: config.target.clone(),
        });
    }

    if config.timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout { role });
    }
}

/// A bind address is an IP socket address or a hostname with an explicit port.
fn is_bind_address(address: &str) -> bool {
    if address.parse::<SocketAddr>().is_ok() {
        return true;
    }
    match address.rsplit_once(':') {
        Some((host, port)) => {
            !host.is_empty() && port.parse::<u16>().is_ok() && is_authority(address)
        }
        None => false,
    }
}

/// A target is usable when `http://<target>/` parses to a URL whose only
/// non-default parts are host and port.
fn is_authority(target: &str) -> bool {
    match url::Url::parse(&format!("http://{target}/")) {
        Ok(url) => {
            url.host().is_some()
                && url.path() == "/"
                && url.username().is_empty()
                && url.query().is_none()
                && url.fragment().is_none()
        }
        Err(_) => false,
    }
}
