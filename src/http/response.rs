//! HTTP response building module
//!
//! `ResponseSink` is the per-request output: status, headers and a body that can be written
//! exactly once. It is shared by reference between the dispatcher, concurrently running
//! middleware and custom responders, so all access goes through a mutex.

use std::mem;
use std::sync::{Mutex, MutexGuard, PoisonError};

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use hyper::{Response, StatusCode};

use crate::error::ServeError;

/// Content-Type sent with 404 and 500 pages.
pub const PAGE_CONTENT_TYPE: &str = "text/html; charset=UTF-8";

#[derive(Debug)]
struct SinkState {
    status: StatusCode,
    headers: HeaderMap,
    /// `Some` once the response has been ended.
    body: Option<Bytes>,
}

/// Write-once response under construction.
#[derive(Debug)]
pub struct ResponseSink {
    state: Mutex<SinkState>,
}

impl ResponseSink {
    pub fn new() -> Self {
        Self::with_headers_preset(HeaderMap::new())
    }

    /// Open a 200 response that starts out with `headers`.
    pub fn with_headers_preset(headers: HeaderMap) -> Self {
        Self {
            state: Mutex::new(SinkState {
                status: StatusCode::OK,
                headers,
                body: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SinkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_open(&self) -> Result<MutexGuard<'_, SinkState>, ServeError> {
        let state = self.lock();
        if state.body.is_some() {
            return Err(ServeError::ResponseEnded);
        }
        Ok(state)
    }

    pub fn status(&self) -> StatusCode {
        self.lock().status
    }

    pub fn set_status(&self, status: StatusCode) -> Result<(), ServeError> {
        self.lock_open()?.status = status;
        Ok(())
    }

    pub fn header(&self, name: &HeaderName) -> Option<HeaderValue> {
        self.lock().headers.get(name).cloned()
    }

    /// Snapshot of the headers set so far.
    pub fn headers(&self) -> HeaderMap {
        self.lock().headers.clone()
    }

    pub fn set_header(&self, name: HeaderName, value: HeaderValue) -> Result<(), ServeError> {
        self.lock_open()?.headers.insert(name, value);
        Ok(())
    }

    pub fn remove_header(&self, name: &HeaderName) -> Result<Option<HeaderValue>, ServeError> {
        Ok(self.lock_open()?.headers.remove(name))
    }

    /// Set the status and merge `headers` in one step.
    pub fn write_head(&self, status: StatusCode, headers: HeaderMap) -> Result<(), ServeError> {
        let mut state = self.lock_open()?;
        state.status = status;
        for (name, value) in headers {
            if let Some(name) = name {
                state.headers.insert(name, value);
            }
        }
        Ok(())
    }

    /// Write the body and close the response. Only the first call succeeds.
    pub fn end(&self, body: impl Into<Bytes>) -> Result<(), ServeError> {
        self.lock_open()?.body = Some(body.into());
        Ok(())
    }

    pub fn is_ended(&self) -> bool {
        self.lock().body.is_some()
    }

    /// Move the accumulated response out of the sink.
    ///
    /// A sink that was never ended yields its status and headers with an empty body.
    pub fn take_response(&self) -> Response<Full<Bytes>> {
        let mut state = self.lock();
        let headers = mem::take(&mut state.headers);
        let body = state.body.take().unwrap_or_default();
        let status = state.status;
        drop(state);

        let mut response = Response::new(Full::new(body));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }
}

impl Default for ResponseSink {
    fn default() -> Self {
        Self::new()
    }
}

/// Send a text page with the given status, as used for 404 and 500 responses.
pub fn send_page(sink: &ResponseSink, status: StatusCode, body: String) -> Result<(), ServeError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(PAGE_CONTENT_TYPE));
    sink.write_head(status, headers)?;
    sink.end(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn test_end_is_write_once() {
        let sink = ResponseSink::new();
        sink.end("first").unwrap();
        assert!(sink.is_ended());
        assert!(matches!(sink.end("second"), Err(ServeError::ResponseEnded)));
        assert!(matches!(
            sink.set_status(StatusCode::NOT_FOUND),
            Err(ServeError::ResponseEnded)
        ));
        assert!(matches!(
            sink.set_header(CONTENT_TYPE, HeaderValue::from_static("text/plain")),
            Err(ServeError::ResponseEnded)
        ));
    }

    #[tokio::test]
    async fn test_take_response() {
        let sink = ResponseSink::new();
        sink.set_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .unwrap();
        sink.end(Bytes::from_static(b"{}")).unwrap();

        let response = sink.take_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "application/json");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"{}");
    }

    #[tokio::test]
    async fn test_send_page() {
        let sink = ResponseSink::new();
        send_page(&sink, StatusCode::NOT_FOUND, "Not Found".to_string()).unwrap();

        let response = sink.take_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), PAGE_CONTENT_TYPE);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"Not Found");
    }

    #[test]
    fn test_unended_sink_yields_empty_body() {
        let sink = ResponseSink::new();
        sink.set_status(StatusCode::ACCEPTED).unwrap();
        let response = sink.take_response();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }
}
