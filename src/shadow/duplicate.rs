//! Request body duplication.
//!
//! The inbound body is drained exactly once into a single buffer, which is
//! then handed out as two independent, read-only handles. `Bytes` clones
//! share storage, so the second copy costs a reference count rather than a
//! second allocation. The original stream is consumed by value and dropped
//! on every exit path, which releases the underlying connection.

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap};
use futures_util::StreamExt;

use crate::error::DispatchError;

/// Two byte-identical copies of one request body.
#[derive(Debug, Clone)]
pub struct BodyPair {
    pub primary: Bytes,
    pub shadow: Bytes,
}

/// Parse the declared `Content-Length`, if any.
pub fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Drain `body` into memory, failing if it grows past `limit` bytes.
pub async fn read_body(
    body: Body,
    declared: Option<u64>,
    limit: usize,
) -> Result<Bytes, DispatchError> {
    if let Some(len) = declared {
        if len > limit as u64 {
            return Err(DispatchError::BodyTooLarge { limit });
        }
    }

    let capacity = declared.map_or(0, |len| len as usize);
    let mut buffer = Vec::with_capacity(capacity);
    let mut stream = body.into_data_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(DispatchError::BodyRead)?;
        if buffer.len() + chunk.len() > limit {
            return Err(DispatchError::BodyTooLarge { limit });
        }
        buffer.extend_from_slice(&chunk);
    }

    Ok(Bytes::from(buffer))
}

/// Split one body into two independently readable copies.
pub async fn duplicate_body(
    body: Body,
    declared: Option<u64>,
    limit: usize,
) -> Result<BodyPair, DispatchError> {
    let buffered = read_body(body, declared, limit).await?;
    Ok(BodyPair {
        primary: buffered.clone(),
        shadow: buffered,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use futures_util::stream;

    fn chunked(chunks: Vec<&'static [u8]>) -> Body {
        Body::from_stream(stream::iter(
            chunks
                .into_iter()
                .map(|c| Ok::<_, std::io::Error>(Bytes::from_static(c))),
        ))
    }

    #[tokio::test]
    async fn both_copies_match_original() {
        let body = chunked(vec![b"hello ", b"shadow ", b"world"]);
        let pair = duplicate_body(body, None, 1024).await.unwrap();

        assert_eq!(pair.primary, Bytes::from_static(b"hello shadow world"));
        assert_eq!(pair.shadow, Bytes::from_static(b"hello shadow world"));
    }

    #[tokio::test]
    async fn binary_body_survives_intact() {
        let original: Vec<u8> = (0..=255u8).cycle().take(64 * 1024 + 7).collect();
        let body = Body::from(original.clone());

        let pair = duplicate_body(body, Some(original.len() as u64), 1 << 20)
            .await
            .unwrap();

        assert_eq!(&pair.primary[..], &original[..]);
        assert_eq!(&pair.shadow[..], &original[..]);
    }

    #[tokio::test]
    async fn empty_body_yields_empty_copies() {
        let pair = duplicate_body(Body::empty(), Some(0), 16).await.unwrap();
        assert!(pair.primary.is_empty());
        assert!(pair.shadow.is_empty());
    }

    #[tokio::test]
    async fn read_error_produces_no_copies() {
        let body = Body::from_stream(stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        ]));

        let err = duplicate_body(body, None, 1024).await.unwrap_err();
        assert!(matches!(err, DispatchError::BodyRead(_)));
    }

    #[tokio::test]
    async fn enforces_limit_while_streaming() {
        let body = chunked(vec![b"0123456789", b"0123456789"]);
        let err = duplicate_body(body, None, 15).await.unwrap_err();
        assert!(matches!(err, DispatchError::BodyTooLarge { limit: 15 }));
    }

    #[tokio::test]
    async fn rejects_oversized_declared_length_upfront() {
        let err = read_body(Body::empty(), Some(1_000), 10).await.unwrap_err();
        assert!(matches!(err, DispatchError::BodyTooLarge { limit: 10 }));
    }

    #[test]
    fn parses_declared_length() {
        let mut headers = HeaderMap::new();
        assert_eq!(declared_length(&headers), None);

        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("42"));
        assert_eq!(declared_length(&headers), Some(42));

        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("nope"));
        assert_eq!(declared_length(&headers), None);
    }
}
