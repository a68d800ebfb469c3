//! Correlation ID resolution.
//!
//! # Responsibilities
//! - Reuse the inbound `X-Request-Id` when present
//! - Otherwise generate a UUID v4 from the OS random source
//!
//! # Design Decisions
//! - Generation failure degrades to an empty ID; it never fails the request
//! - The random source is a trait object so it can be swapped in tests

use axum::http::HeaderMap;
use rand::rngs::OsRng;
use rand::RngCore;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Field name the correlation ID is bound under.
pub const CORRELATION_ID_FIELD: &str = "CorrelationId";

#[derive(Debug, thiserror::Error)]
pub enum CorrelationError {
    #[error("random source unavailable: {0}")]
    Entropy(#[from] rand::Error),
}

/// Produces fresh correlation IDs. Shared by all requests.
pub trait CorrelationIdSource: Send + Sync {
    fn generate(&self) -> Result<String, CorrelationError>;
}

/// Random UUID v4 drawn from the operating system RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomUuid;

impl CorrelationIdSource for RandomUuid {
    fn generate(&self) -> Result<String, CorrelationError> {
        let mut bytes = [0u8; 16];
        OsRng.try_fill_bytes(&mut bytes)?;
        Ok(uuid::Builder::from_random_bytes(bytes).into_uuid().to_string())
    }
}

/// Correlation ID for a request: the inbound header if non-empty, else a fresh one.
pub fn resolve_correlation_id(headers: &HeaderMap, source: &dyn CorrelationIdSource) -> String {
    let inbound = headers
        .get(X_REQUEST_ID)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .unwrap_or_default();
    if !inbound.is_empty() {
        return inbound;
    }

    match source.generate() {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(error = %e, "Correlation ID generation failed");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    struct Exhausted;

    impl CorrelationIdSource for Exhausted {
        fn generate(&self) -> Result<String, CorrelationError> {
            Err(rand::Error::new(std::io::Error::other("no entropy")).into())
        }
    }

    #[test]
    fn inbound_header_is_reused() {
        let mut headers = HeaderMap::new();
        headers.insert(X_REQUEST_ID, HeaderValue::from_static("abc-123"));
        assert_eq!(resolve_correlation_id(&headers, &RandomUuid), "abc-123");
    }

    #[test]
    fn non_ascii_header_is_kept() {
        let mut headers = HeaderMap::new();
        headers.insert(X_REQUEST_ID, HeaderValue::from_bytes("req-é".as_bytes()).unwrap());
        assert_eq!(resolve_correlation_id(&headers, &Exhausted), "req-é");
    }

    #[test]
    fn empty_header_generates_uuid() {
        let mut headers = HeaderMap::new();
        headers.insert(X_REQUEST_ID, HeaderValue::from_static(""));

        let id = resolve_correlation_id(&headers, &RandomUuid);
        let parsed = uuid::Uuid::parse_str(&id).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn generated_ids_differ() {
        let headers = HeaderMap::new();
        let a = resolve_correlation_id(&headers, &RandomUuid);
        let b = resolve_correlation_id(&headers, &RandomUuid);
        assert_ne!(a, b);
    }

    #[test]
    fn generation_failure_degrades_to_empty() {
        assert_eq!(resolve_correlation_id(&HeaderMap::new(), &Exhausted), "");
    }
}
