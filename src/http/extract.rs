//! Handler access to the request-scoped logger.

use std::convert::Infallible;
use std::ops::Deref;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::logging::{current_logger, Logger};

/// Extracts the logger bound to the current request.
///
/// Never rejects: without the logging layer in front, the process default
/// logger is returned instead.
///
/// ```rust,ignore
/// async fn handler(RequestLogger(log): RequestLogger) -> &'static str {
///     log.info("handling");
///     "ok"
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequestLogger(pub Logger);

impl<S> FromRequestParts<S> for RequestLogger
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RequestLogger(current_logger(&parts.extensions)))
    }
}

impl Deref for RequestLogger {
    type Target = Logger;

    fn deref(&self) -> &Logger {
        &self.0
    }
}
