//! Error types for the dispatch engine.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while duplicating, resolving or forwarding one request.
///
/// Each error is scoped to a single role's path: a failure on the shadow
/// path never reaches the caller, and a failure on the primary path
/// surfaces only as an absent response.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The inbound body stream yielded an error before it was fully read.
    #[error("failed to read request body: {0}")]
    BodyRead(#[source] axum::Error),

    /// The inbound body exceeded the configured buffering limit.
    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    /// The role target did not produce a valid destination URL.
    #[error("invalid destination `{url}`: {source}")]
    InvalidTarget {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The role's Host override is not a legal header value.
    #[error("invalid Host override `{0}`")]
    InvalidHost(String),

    /// Connect, handshake or protocol failure reported by the HTTP client.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// No response headers arrived within the role timeout.
    #[error("no response within {0:?}")]
    Timeout(Duration),
}

impl DispatchError {
    /// Whether a single immediate retry may succeed.
    ///
    /// Errors raised before any bytes leave the proxy (malformed
    /// destinations, unbuildable requests, unreadable bodies) fail fast.
    pub fn is_transient(&self) -> bool {
        match self {
            DispatchError::Transport(e) => !e.is_builder(),
            DispatchError::Timeout(_) => true,
            DispatchError::BodyRead(_)
            | DispatchError::BodyTooLarge { .. }
            | DispatchError::InvalidTarget { .. }
            | DispatchError::InvalidHost(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_are_transient() {
        assert!(DispatchError::Timeout(Duration::from_millis(10)).is_transient());
    }

    #[test]
    fn clone_failures_are_not_transient() {
        let source = url::Url::parse("http://bad host/").unwrap_err();
        let err = DispatchError::InvalidTarget {
            url: "http://bad host/".into(),
            source,
        };
        assert!(!err.is_transient());
        assert!(!DispatchError::BodyTooLarge { limit: 1 }.is_transient());
        assert!(!DispatchError::InvalidHost("a\nb".into()).is_transient());
    }
}
