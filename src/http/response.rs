//! Response relay from the primary backend to the caller.
//!
//! # Responsibilities
//! - Copy status and end-to-end headers from the backend response
//! - Stream the body chunk by chunk without buffering it whole
//! - Bound each body read by the role timeout
//!
//! # Design Decisions
//! - Hop-by-hop headers stripped automatically
//! - A stalled body ends the stream with an error instead of hanging
//! - The backend response is dropped, and its body closed, when the stream ends

use std::io;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::Response;
use futures_util::stream;

use crate::http::headers::strip_hop_by_hop;

/// Turn a backend response into the caller's response.
pub fn relay_response(response: reqwest::Response, idle_timeout: Duration) -> Response<Body> {
    let status = response.status();
    let mut headers = response.headers().clone();
    strip_hop_by_hop(&mut headers);

    let mut relayed = Response::new(Body::from_stream(body_stream(response, idle_timeout)));
    *relayed.status_mut() = status;
    *relayed.headers_mut() = headers;
    relayed
}

fn body_stream(
    response: reqwest::Response,
    idle_timeout: Duration,
) -> impl futures_util::Stream<Item = Result<Bytes, io::Error>> + Send + 'static {
    stream::unfold(Some(response), move |state| async move {
        let mut response = state?;
        match tokio::time::timeout(idle_timeout, response.chunk()).await {
            Ok(Ok(Some(chunk))) => Some((Ok(chunk), Some(response))),
            Ok(Ok(None)) => None,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Backend body failed mid-stream");
                Some((Err(io::Error::other(e)), None))
            }
            Err(_) => {
                tracing::warn!(timeout = ?idle_timeout, "Backend body stalled");
                Some((
                    Err(io::Error::new(io::ErrorKind::TimedOut, "backend body stalled")),
                    None,
                ))
            }
        }
    })
}
