//! Proxy-chain headers (`X-Forwarded-For` and RFC 7239 `Forwarded`).
//!
//! Entries are only ever appended; existing hops are never removed or
//! reordered.

use axum::http::header::{HeaderName, FORWARDED};
use axum::http::{HeaderMap, HeaderValue};

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Address portion of an `address:port` string.
///
/// Falls back to the whole string (with a warning) when there is no port.
pub fn client_address(remote_addr: &str) -> &str {
    match remote_addr.rfind(':') {
        Some(idx) => &remote_addr[..idx],
        None => {
            tracing::warn!(
                remote_addr = %remote_addr,
                "Caller address is not in address:port form"
            );
            remote_addr
        }
    }
}

/// Record the caller as the newest hop in both forwarded-chain headers.
pub fn append_forwarded_headers(headers: &mut HeaderMap, remote_addr: &str) {
    let address = client_address(remote_addr);
    extend_header(headers, FORWARDED, &format!("for={address}"));
    extend_header(headers, X_FORWARDED_FOR, address);
}

fn extend_header(headers: &mut HeaderMap, name: HeaderName, entry: &str) {
    // Several header lines form one chain; fold them before appending.
    let mut value = Vec::new();
    for existing in headers.get_all(&name).iter().filter(|v| !v.is_empty()) {
        if !value.is_empty() {
            value.extend_from_slice(b", ");
        }
        value.extend_from_slice(existing.as_bytes());
    }
    if !value.is_empty() {
        value.extend_from_slice(b", ");
    }
    value.extend_from_slice(entry.as_bytes());

    match HeaderValue::from_bytes(&value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => {
            tracing::warn!(header = %name, entry = %entry, "Skipping unrepresentable forwarded entry");
        }
    }
}
