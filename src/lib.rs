//! Traffic-shadowing HTTP proxy library.
//!
//! Every inbound request is forwarded to a primary backend whose response
//! goes back to the caller. A sampled share of requests is also copied to a
//! shadow backend whose response is thrown away.

pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod shadow;

pub use config::schema::ShadowConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
