//! Request and role types shared by the dispatch pipeline.

use std::fmt;

use axum::body::Bytes;
use axum::http::{header, request::Parts, HeaderMap, HeaderValue, Method, Uri, Version};

use crate::http::headers::strip_hop_by_hop;

/// Which backend a request copy is destined for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Backend whose response is relayed to the caller.
    Primary,
    /// Backend whose response is discarded.
    Shadow,
}

impl Role {
    /// Short tag used in access lines (`A` for primary, `B` for shadow).
    pub fn tag(&self) -> &'static str {
        match self {
            Role::Primary => "A",
            Role::Shadow => "B",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Primary => "primary",
            Role::Shadow => "shadow",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One independently owned copy of an inbound request.
///
/// Holds its own header map and body handle, so the primary and shadow
/// copies can be rewritten and sent without coordinating with each other.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    /// Inbound request target; only path and query survive resolution.
    pub uri: Uri,
    pub version: Version,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Ask the backend to close the connection after this exchange.
    pub close: bool,
}

impl OutboundRequest {
    /// Build a duplicated copy. Duplicates never assume connection reuse.
    pub fn clone_of(parts: &Parts, body: Bytes) -> Self {
        Self::build(parts, body, true)
    }

    /// Forward the original request as-is when no duplication happened.
    pub fn passthrough(parts: &Parts, body: Bytes) -> Self {
        Self::build(parts, body, false)
    }

    fn build(parts: &Parts, body: Bytes, close: bool) -> Self {
        let mut headers = parts.headers.clone();
        strip_hop_by_hop(&mut headers);
        // Framing is recomputed from the buffered body.
        headers.remove(header::CONTENT_LENGTH);
        if close {
            headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
        }

        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            version: parts.version,
            headers,
            body,
            close,
        }
    }

    /// Path and query of the inbound request target, `/` when absent.
    pub fn path_and_query(&self) -> &str {
        self.uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/")
    }
}
