//! Request logging middleware.
//!
//! Brackets every request with two records on the scoped logger:
//!
//! ```text
//! request ──▶ resolve CorrelationId ──▶ bind scoped logger ──▶ "Incoming Request"
//!                                                                    │
//!                                                                    ▼
//! response ◀── observe(response) ◀── "Completed Request" ◀── inner service
//! ```
//!
//! The scoped logger is attached to the request extensions before the inner
//! service runs, so handlers can pick it up with [`RequestLogger`](super::RequestLogger).
//! No recovery is attempted: if the inner service fails or the future is
//! dropped, "Completed Request" is not emitted.

use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::http::{Request, Response};
use futures_util::future::BoxFuture;
use tower::{Layer, Service};

use crate::http::correlation::{
    resolve_correlation_id, CorrelationIdSource, RandomUuid, CORRELATION_ID_FIELD,
};
use crate::http::info::{HostInfo, HttpInfo, RequestInfo, ResponseInfo};
use crate::http::observer::{observe, ObservedBody};
use crate::logging::{attach_logger, FieldValue, Logger};

pub const INCOMING_MESSAGE: &str = "Incoming Request";
pub const COMPLETED_MESSAGE: &str = "Completed Request";

/// Tower layer adding request logging.
#[derive(Clone)]
pub struct RequestLoggingLayer {
    logger: Logger,
    ids: Arc<dyn CorrelationIdSource>,
}

impl RequestLoggingLayer {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            ids: Arc::new(RandomUuid),
        }
    }

    /// Replace the source used when a request carries no `X-Request-Id`.
    pub fn with_id_source<I>(mut self, ids: I) -> Self
    where
        I: CorrelationIdSource + 'static,
    {
        self.ids = Arc::new(ids);
        self
    }
}

impl<S> Layer<S> for RequestLoggingLayer {
    type Service = RequestLogging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLogging {
            inner,
            logger: self.logger.clone(),
            ids: Arc::clone(&self.ids),
        }
    }
}

/// Service produced by [`RequestLoggingLayer`].
#[derive(Clone)]
pub struct RequestLogging<S> {
    inner: S,
    logger: Logger,
    ids: Arc<dyn CorrelationIdSource>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for RequestLogging<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = Response<ObservedBody<ResBody>>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<ReqBody>) -> Self::Future {
        let start = Instant::now();

        let correlation_id = resolve_correlation_id(request.headers(), self.ids.as_ref());
        let scoped = self.logger.with_field(CORRELATION_ID_FIELD, correlation_id);
        attach_logger(request.extensions_mut(), scoped.clone());

        let request_info = RequestInfo::from_request(&request);
        let host_info = HostInfo::from_request(&request);

        scoped
            .with_fields(event_fields(&request_info, None, &host_info))
            .info(INCOMING_MESSAGE);

        let future = self.inner.call(request);

        Box::pin(async move {
            let response = observe(future.await?);

            let response_info = ResponseInfo::from(response.body().status());
            let elapsed_micros = start.elapsed().as_micros() as f64;
            scoped
                .with_fields(event_fields(&request_info, Some(response_info), &host_info))
                .with_field("responseTime", elapsed_micros)
                .info(COMPLETED_MESSAGE);

            Ok::<_, S::Error>(response)
        })
    }
}

fn event_fields(
    request: &RequestInfo,
    response: Option<ResponseInfo>,
    host: &HostInfo,
) -> [(String, FieldValue); 2] {
    let http = HttpInfo {
        request: Some(request.clone()),
        response,
    };
    [
        ("http".to_string(), FieldValue::structured(http)),
        ("host".to_string(), FieldValue::structured(host.clone())),
    ]
}
