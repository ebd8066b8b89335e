//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, connect info, graceful shutdown)
//!     → shadow::Coordinator (duplicate, dispatch)
//!     → response.rs (relay primary response, strip hop-by-hop headers)
//!     → Send to client
//! ```

pub mod headers;
pub mod response;
pub mod server;

pub use server::HttpServer;
