//! Traffic-shadowing HTTP proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                 SHADOW PROXY                 │
//!     Client Request      │  ┌─────────┐    ┌─────────────┐              │
//!     ────────────────────┼─▶│  http   │───▶│ coordinator │              │
//!                         │  │ server  │    │  + sampler  │              │
//!                         │  └─────────┘    └──────┬──────┘              │
//!                         │                        │ duplicate body      │
//!                         │              ┌─────────┴─────────┐           │
//!                         │              ▼                   ▼           │
//!                         │      ┌──────────────┐   ┌──────────────┐     │
//!                         │      │ primary (A)  │   │  shadow (B)  │     │
//!                         │      │ resolve+send │   │ resolve+send │     │
//!                         │      └──────┬───────┘   └──────┬───────┘     │
//!     Client Response     │             │                  │ discard     │
//!     ◀───────────────────┼─────────────┘                  ▼             │
//!                         └──────────────────────────────────────────────┘
//! ```

use clap::Parser;

use shadow_proxy::cli::Cli;
use shadow_proxy::lifecycle::startup;
use shadow_proxy::observability::logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.load_config()?;

    logging::init_logging(&config.observability);

    tracing::info!(
        listen = %config.listener.bind_address,
        primary = %config.primary.target,
        shadow = %config.shadow.target,
        percent = config.sampling.percent,
        tls = config.listener.tls.is_some(),
        "shadow-proxy v0.1.0 starting"
    );

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
