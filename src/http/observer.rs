//! Response observation.
//!
//! # Responsibilities
//! - Record the status code the handler produced
//! - Count body bytes as they are handed downstream
//!
//! # Design Decisions
//! - Pure pass-through: headers, frames and trailers are forwarded as-is,
//!   with no buffering or reordering
//! - Only successfully yielded data frames are counted; errors pass through
//!   without touching the counter

use std::pin::Pin;
use std::task::{ready, Context, Poll};

use axum::http::{Response, StatusCode};
use bytes::Buf;
use http_body::{Body, Frame, SizeHint};
use pin_project_lite::pin_project;

/// Status and byte count observed for one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseOutcome {
    pub status: StatusCode,
    pub bytes_written: u64,
}

pin_project! {
    /// Response body wrapper that counts the bytes it yields.
    #[derive(Debug)]
    pub struct ObservedBody<B> {
        #[pin]
        inner: B,
        status: StatusCode,
        written: u64,
    }
}

impl<B> ObservedBody<B> {
    pub fn new(inner: B, status: StatusCode) -> Self {
        Self {
            inner,
            status,
            written: 0,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Bytes successfully yielded so far.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    pub fn outcome(&self) -> ResponseOutcome {
        ResponseOutcome {
            status: self.status,
            bytes_written: self.written,
        }
    }
}

impl<B> Body for ObservedBody<B>
where
    B: Body,
{
    type Data = B::Data;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.project();
        let frame = ready!(this.inner.poll_frame(cx));
        if let Some(Ok(frame)) = &frame {
            if let Some(data) = frame.data_ref() {
                *this.written += data.remaining() as u64;
            }
        }
        Poll::Ready(frame)
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

/// Wrap a response so its outcome can be observed. The status is taken from
/// the response head; a handler that never set one yields `200 OK`.
pub fn observe<B>(response: Response<B>) -> Response<ObservedBody<B>> {
    let status = response.status();
    response.map(|body| ObservedBody::new(body, status))
}

#[cfg(test)]
mod tests {
    use axum::body::Body as AxumBody;
    use bytes::Bytes;
    use http_body_util::{BodyExt, StreamBody};

    use super::*;

    #[tokio::test]
    async fn counts_bytes_and_keeps_them_intact() {
        let response = Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header("x-custom", "kept")
            .body(AxumBody::from("x".repeat(37)))
            .unwrap();

        let observed = observe(response);
        assert_eq!(observed.headers()["x-custom"], "kept");
        assert_eq!(observed.body().status(), StatusCode::NOT_FOUND);
        assert_eq!(observed.body().bytes_written(), 0);

        let mut body = observed.into_body();
        let mut collected = Vec::new();
        while let Some(frame) = body.frame().await {
            if let Ok(data) = frame.unwrap().into_data() {
                collected.extend_from_slice(&data);
            }
        }
        assert_eq!(collected, "x".repeat(37).into_bytes());
        assert_eq!(
            body.outcome(),
            ResponseOutcome {
                status: StatusCode::NOT_FOUND,
                bytes_written: 37
            }
        );
    }

    #[tokio::test]
    async fn default_status_is_ok() {
        let observed = observe(Response::new(AxumBody::from("0123456789")));
        let mut body = observed.into_body();
        while body.frame().await.is_some() {}
        assert_eq!(body.status(), StatusCode::OK);
        assert_eq!(body.bytes_written(), 10);
    }

    #[tokio::test]
    async fn failed_frames_are_not_counted() {
        let frames: Vec<Result<Frame<Bytes>, std::io::Error>> = vec![
            Ok(Frame::data(Bytes::from_static(b"abcd"))),
            Err(std::io::Error::other("client went away")),
        ];
        let stream = futures_util::stream::iter(frames);
        let mut body = ObservedBody::new(StreamBody::new(stream), StatusCode::OK);

        assert!(body.frame().await.unwrap().is_ok());
        assert!(body.frame().await.unwrap().is_err());
        assert_eq!(body.bytes_written(), 4);
    }
}
