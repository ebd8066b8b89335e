//! TLS configuration and certificate loading.

use std::io;
use std::path::{Path, PathBuf};

use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;

/// Unusable TLS material. Always fatal at startup.
#[derive(Debug, Error)]
pub enum TlsError {
    #[error("{kind} file not found: {path:?}")]
    Missing { kind: &'static str, path: PathBuf },

    #[error("failed to load certificate {cert:?} and private key {key:?}: {source}")]
    Load {
        cert: PathBuf,
        key: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Load TLS configuration from PEM certificate and key files.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, TlsError> {
    for (kind, path) in [("Certificate", cert_path), ("Private key", key_path)] {
        if !path.exists() {
            return Err(TlsError::Missing {
                kind,
                path: path.to_path_buf(),
            });
        }
    }

    RustlsConfig::from_pem_file(cert_path, key_path)
        .await
        .map_err(|source| TlsError::Load {
            cert: cert_path.to_path_buf(),
            key: key_path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_certificate_is_reported() {
        let err = load_tls_config(Path::new("/no/such/cert.pem"), Path::new("/no/such/key.pem"))
            .await
            .unwrap_err();
        assert!(matches!(err, TlsError::Missing { kind: "Certificate", .. }));
    }

    #[tokio::test]
    async fn garbage_material_fails_to_load() {
        let dir = std::env::temp_dir();
        let cert = dir.join(format!("shadow-proxy-cert-{}.pem", std::process::id()));
        let key = dir.join(format!("shadow-proxy-key-{}.pem", std::process::id()));
        std::fs::write(&cert, "not a certificate").unwrap();
        std::fs::write(&key, "not a key").unwrap();

        let result = load_tls_config(&cert, &key).await;
        std::fs::remove_file(&cert).ok();
        std::fs::remove_file(&key).ok();

        assert!(matches!(result, Err(TlsError::Load { .. })));
    }
}
