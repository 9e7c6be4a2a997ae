//! Per-request context
//!
//! Built fresh for every request and dropped once the response is finished.

use hyper::header::HeaderMap;
use hyper::{Method, Request, Uri, Version};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Instant;

/// Client address, inserted into request extensions by the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerAddr(pub SocketAddr);

/// Request information shared with middleware, responders and log formatters.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    /// The request target as received
    pub uri: Uri,
    pub version: Version,
    pub headers: HeaderMap,
    /// Query string without the leading `?`
    pub query: Option<String>,
    /// Path component of the request target
    pub path: String,
    /// File the request resolved to; unset when the request was declined before resolution
    pub file_path: Option<PathBuf>,
    /// Last component of `file_path`
    pub filename: Option<String>,
    pub peer_addr: Option<SocketAddr>,
    pub(crate) received_at: Instant,
}

impl RequestContext {
    pub fn from_request<B>(req: &Request<B>) -> Self {
        let uri = req.uri().clone();
        Self {
            method: req.method().clone(),
            query: uri.query().map(ToString::to_string),
            path: uri.path().to_string(),
            uri,
            version: req.version(),
            headers: req.headers().clone(),
            file_path: None,
            filename: None,
            peer_addr: req.extensions().get::<PeerAddr>().map(|peer| peer.0),
            received_at: Instant::now(),
        }
    }

    /// The request target as sent: path plus query, or just the path.
    pub fn raw_url(&self) -> &str {
        self.uri
            .path_and_query()
            .map_or_else(|| self.uri.path(), |pq| pq.as_str())
    }

    pub(crate) fn set_file_path(&mut self, file_path: PathBuf) {
        self.filename = file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        self.file_path = Some(file_path);
    }

    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_request() {
        let mut req = Request::get("/docs/a.json?x=1&y=2").body(()).unwrap();
        req.extensions_mut()
            .insert(PeerAddr("10.0.0.1:5000".parse().unwrap()));

        let mut ctx = RequestContext::from_request(&req);
        assert_eq!(ctx.method, Method::GET);
        assert_eq!(ctx.path, "/docs/a.json");
        assert_eq!(ctx.query.as_deref(), Some("x=1&y=2"));
        assert_eq!(ctx.raw_url(), "/docs/a.json?x=1&y=2");
        assert_eq!(ctx.peer_addr, Some("10.0.0.1:5000".parse().unwrap()));
        assert!(ctx.file_path.is_none());

        ctx.set_file_path(PathBuf::from("/srv/docs/a.json"));
        assert_eq!(ctx.filename.as_deref(), Some("a.json"));
    }
}
