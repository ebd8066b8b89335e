//! Command line interface.
//!
//! Flags override values read from the optional `--config` TOML file, which
//! in turn override built-in defaults.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{read_config, validate_config, ConfigError, ShadowConfig, TlsConfig};

#[derive(Debug, Parser)]
#[command(name = "shadow-proxy")]
#[command(
    about = "HTTP proxy that mirrors live traffic to a shadow backend",
    long_about = None
)]
pub struct Cli {
    /// TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Address to accept requests on: `host:port`, or `:port` for all interfaces.
    #[arg(short = 'l', long, value_name = "ADDR")]
    pub listen: Option<String>,

    /// Where production traffic goes; responses are returned to callers.
    #[arg(short = 'a', long, value_name = "HOST:PORT")]
    pub primary: Option<String>,

    /// Where shadow traffic goes; responses are discarded.
    #[arg(short = 'b', long, value_name = "HOST:PORT")]
    pub shadow: Option<String>,

    /// Timeout in milliseconds for primary traffic.
    #[arg(long, value_name = "MS")]
    pub primary_timeout: Option<u64>,

    /// Timeout in milliseconds for shadow traffic.
    #[arg(long, value_name = "MS")]
    pub shadow_timeout: Option<u64>,

    /// Rewrite the Host header when proxying primary traffic.
    #[arg(long)]
    pub primary_rewrite_host: bool,

    /// Rewrite the Host header when proxying shadow traffic.
    #[arg(long)]
    pub shadow_rewrite_host: bool,

    /// Use HTTPS towards the primary backend.
    #[arg(long)]
    pub primary_https: bool,

    /// Use HTTPS towards the shadow backend.
    #[arg(long)]
    pub shadow_https: bool,

    /// Percentage of traffic to copy to the shadow backend.
    #[arg(short = 'p', long, value_name = "PERCENT")]
    pub percent: Option<f64>,

    /// Path to the TLS certificate file.
    #[arg(long, value_name = "FILE")]
    pub cert_file: Option<String>,

    /// Path to the TLS private key file.
    #[arg(long, value_name = "FILE")]
    pub key_file: Option<String>,

    /// Forward the client IP in `X-Forwarded-For` and `Forwarded`.
    #[arg(long)]
    pub forward_client_ip: bool,

    /// Close connections to clients and backends after each request.
    #[arg(long)]
    pub close_connections: bool,

    /// More logging, including recovered faults and ignored requests.
    #[arg(long)]
    pub debug: bool,

    /// Log every dispatch like an access log.
    #[arg(long)]
    pub verbose: bool,
}

impl Cli {
    /// Read the config file (if any), apply flags and validate the result.
    pub fn load_config(&self) -> Result<ShadowConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => ShadowConfig::default(),
        };
        self.apply(&mut config);
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }

    /// Overlay the flags that were given onto `config`.
    pub fn apply(&self, config: &mut ShadowConfig) {
        if let Some(listen) = &self.listen {
            config.listener.bind_address = listen.clone();
        }
        if let Some(target) = &self.primary {
            config.primary.target = target.clone();
        }
        if let Some(target) = &self.shadow {
            config.shadow.target = target.clone();
        }
        if let Some(ms) = self.primary_timeout {
            config.primary.timeout_ms = ms;
        }
        if let Some(ms) = self.shadow_timeout {
            config.shadow.timeout_ms = ms;
        }
        if let Some(percent) = self.percent {
            config.sampling.percent = percent;
        }

        config.primary.rewrite_host |= self.primary_rewrite_host;
        config.shadow.rewrite_host |= self.shadow_rewrite_host;
        config.primary.https |= self.primary_https;
        config.shadow.https |= self.shadow_https;
        config.forward_client_ip |= self.forward_client_ip;
        config.close_connections |= self.close_connections;
        config.observability.debug |= self.debug;
        config.observability.verbose |= self.verbose;

        if self.cert_file.is_some() || self.key_file.is_some() {
            let existing = config.listener.tls.take();
            let (cert, key) = match existing {
                Some(tls) => (tls.cert_path, tls.key_path),
                None => (String::new(), String::new()),
            };
            config.listener.tls = Some(TlsConfig {
                cert_path: self.cert_file.clone().unwrap_or(cert),
                key_path: self.key_file.clone().unwrap_or(key),
            });
        }
    }
}
