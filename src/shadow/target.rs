//! Destination rewriting for one request copy.

use axum::body::Bytes;
use axum::http::uri::Authority;
use axum::http::{header, HeaderMap, HeaderValue, Method};
use url::Url;

use crate::config::RoleConfig;
use crate::error::DispatchError;
use crate::shadow::request::OutboundRequest;

/// A request copy with an absolute destination, ready to send.
#[derive(Debug, Clone)]
pub struct ResolvedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Inbound request target, kept for access logging.
    pub request_uri: String,
}

impl ResolvedRequest {
    /// Host the backend will see: the Host header if present, else the URL host.
    pub fn host(&self) -> &str {
        self.headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .or_else(|| self.url.host_str())
            .unwrap_or_default()
    }
}

/// Point `request` at the role's backend.
///
/// The URL is always built as `http://<target><path-and-query>`; the Host
/// override and HTTPS upgrade are applied afterwards according to the role.
pub fn resolve(request: OutboundRequest, role: &RoleConfig) -> Result<ResolvedRequest, DispatchError> {
    let request_uri = request.path_and_query().to_string();
    let raw = format!("http://{}{}", role.target, request_uri);
    let mut url = Url::parse(&raw).map_err(|source| DispatchError::InvalidTarget {
        url: raw.clone(),
        source,
    })?;

    let mut headers = request.headers;
    if role.rewrite_host {
        let host = HeaderValue::from_str(role.host_name())
            .map_err(|_| DispatchError::InvalidHost(role.host_name().to_string()))?;
        headers.insert(header::HOST, host);
    }

    if role.https {
        upgrade_scheme(&mut url, explicit_port(&role.target));
    }

    Ok(ResolvedRequest {
        method: request.method,
        url,
        headers,
        body: request.body,
        request_uri,
    })
}

/// Port written in the target itself, including a default one like `:80`.
fn explicit_port(target: &str) -> Option<u16> {
    target.parse::<Authority>().ok()?.port_u16()
}

/// Switch to `https`. An explicit target port is kept; otherwise the
/// https default applies.
fn upgrade_scheme(url: &mut Url, port: Option<u16>) {
    if url.set_scheme("https").is_ok() {
        // Only fails for URLs without a host, which `resolve` never builds.
        let _ = url.set_port(port);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn request(uri: &str) -> OutboundRequest {
        let (parts, _) = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(header::HOST, "proxy.example.com")
            .body(())
            .unwrap()
            .into_parts();
        OutboundRequest::clone_of(&parts, Bytes::new())
    }

    fn role(target: &str) -> RoleConfig {
        RoleConfig {
            target: target.into(),
            ..RoleConfig::default()
        }
    }

    #[test]
    fn builds_http_url_from_target_and_path() {
        let primary = resolve(request("/x?y=1"), &role("primary.local:80")).unwrap();
        let shadow = resolve(request("/x?y=1"), &role("shadow.local:80")).unwrap();

        assert_eq!(primary.url.as_str(), "http://primary.local/x?y=1");
        assert_eq!(shadow.url.as_str(), "http://shadow.local/x?y=1");
        assert_eq!(primary.request_uri, "/x?y=1");
    }

    #[test]
    fn keeps_inbound_host_without_rewrite() {
        let resolved = resolve(request("/"), &role("10.1.1.1:8080")).unwrap();
        assert_eq!(resolved.url.as_str(), "http://10.1.1.1:8080/");
        assert_eq!(resolved.host(), "proxy.example.com");
    }

    #[test]
    fn rewrites_host_to_target() {
        let mut config = role("backend.internal:8080");
        config.rewrite_host = true;

        let resolved = resolve(request("/"), &config).unwrap();
        assert_eq!(resolved.headers[header::HOST], "backend.internal:8080");
    }

    #[test]
    fn rewrites_host_to_logical_name() {
        let mut config = role("10.1.1.1:8080");
        config.rewrite_host = true;
        config.host = Some("api.example.com".into());

        let resolved = resolve(request("/"), &config).unwrap();
        assert_eq!(resolved.host(), "api.example.com");
        assert_eq!(resolved.url.host_str(), Some("10.1.1.1"));
    }

    #[test]
    fn upgrades_scheme_and_keeps_port() {
        let mut config = role("secure.local:8443");
        config.https = true;
        let resolved = resolve(request("/a"), &config).unwrap();
        assert_eq!(resolved.url.as_str(), "https://secure.local:8443/a");

        let mut config = role("secure.local:80");
        config.https = true;
        let resolved = resolve(request("/a"), &config).unwrap();
        assert_eq!(resolved.url.as_str(), "https://secure.local:80/a");

        let mut config = role("secure.local");
        config.https = true;
        let resolved = resolve(request("/a"), &config).unwrap();
        assert_eq!(resolved.url.as_str(), "https://secure.local/a");
    }

    #[test]
    fn malformed_target_fails() {
        let err = resolve(request("/"), &role("bad host:80")).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidTarget { .. }));
    }

    #[test]
    fn invalid_host_override_fails() {
        let mut config = role("ok.local:80");
        config.rewrite_host = true;
        config.host = Some("bad\nhost".into());

        let err = resolve(request("/"), &config).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidHost(_)));
    }
}
