//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the shadowing proxy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShadowConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Backend whose responses are relayed to callers.
    pub primary: RoleConfig,

    /// Backend receiving duplicated traffic; responses are discarded.
    pub shadow: RoleConfig,

    /// Shadow sampling settings.
    pub sampling: SamplingConfig,

    /// Append the caller address to `X-Forwarded-For` and `Forwarded`.
    pub forward_client_ip: bool,

    /// Disable keep-alive towards callers and connection pooling towards backends.
    pub close_connections: bool,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            primary: RoleConfig::default(),
            shadow: RoleConfig::default_shadow(),
            sampling: SamplingConfig::default(),
            forward_client_ip: false,
            close_connections: false,
            limits: LimitsConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8888", "localhost:8888" or ":8888").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8888".to_string(),
            tls: None,
        }
    }
}

impl ListenerConfig {
    /// Bind address with the host-less `:port` form expanded to all interfaces.
    pub fn socket_address(&self) -> String {
        match self.bind_address.strip_prefix(':') {
            Some(port) => format!("0.0.0.0:{port}"),
            None => self.bind_address.clone(),
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Per-role backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoleConfig {
    /// Dial target (e.g., "localhost:8080").
    pub target: String,

    /// Timeout in milliseconds for connect, TLS handshake and response headers.
    pub timeout_ms: u64,

    /// Overwrite the Host header when forwarding.
    pub rewrite_host: bool,

    /// Host value written when `rewrite_host` is set. Defaults to `target`.
    pub host: Option<String>,

    /// Upgrade the outbound scheme to HTTPS.
    pub https: bool,
}

impl RoleConfig {
    fn default_shadow() -> Self {
        Self {
            target: "localhost:8081".to_string(),
            timeout_ms: 1000,
            ..Self::default()
        }
    }

    /// Role timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Logical hostname used for Host rewriting.
    pub fn host_name(&self) -> &str {
        self.host.as_deref().unwrap_or(&self.target)
    }
}

impl Default for RoleConfig {
    fn default() -> Self {
        Self {
            target: "localhost:8080".to_string(),
            timeout_ms: 2500,
            rewrite_host: false,
            host: None,
            https: false,
        }
    }
}

/// Shadow sampling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Percentage of requests duplicated to the shadow backend (0-100).
    pub percent: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self { percent: 100.0 }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size buffered for forwarding, in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Extra logging, including contained faults and ignored requests.
    pub debug: bool,

    /// Emit one access line per completed dispatch.
    pub verbose: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            debug: false,
            verbose: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
