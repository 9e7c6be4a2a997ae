//! Access log format module
//!
//! Supports multiple log formats:
//! - `combined` (Apache/Nginx combined format)
//! - `common` (Common Log Format - CLF)
//! - `json` (JSON structured logging)
//! - Custom patterns with variables

use chrono::Local;
use hyper::header::{REFERER, USER_AGENT};
use hyper::Version;

use crate::handler::RequestContext;

/// Access log entry containing all request/response information
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    /// Client IP address, `-` when unknown
    pub remote_addr: String,
    pub time: chrono::DateTime<Local>,
    pub method: String,
    pub path: String,
    /// Query string (without leading ?)
    pub query: Option<String>,
    /// HTTP version (1.0, 1.1, 2)
    pub http_version: String,
    pub status: u16,
    /// Response body size in bytes
    pub body_bytes: usize,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    /// Time since the request was received, in microseconds
    pub request_time_us: u64,
    /// File the request resolved to
    pub filename: Option<String>,
}

impl AccessLogEntry {
    /// Build an entry for a request that was answered with `status`
    pub fn from_context(ctx: &RequestContext, status: u16, body_bytes: usize) -> Self {
        Self {
            remote_addr: ctx
                .peer_addr
                .map_or_else(|| "-".to_string(), |addr| addr.ip().to_string()),
            time: Local::now(),
            method: ctx.method.to_string(),
            path: ctx.path.clone(),
            query: ctx.query.clone(),
            http_version: version_str(ctx.version).to_string(),
            status,
            body_bytes,
            referer: ctx.header_str(REFERER.as_str()).map(ToString::to_string),
            user_agent: ctx.header_str(USER_AGENT.as_str()).map(ToString::to_string),
            request_time_us: u64::try_from(ctx.received_at.elapsed().as_micros())
                .unwrap_or(u64::MAX),
            filename: ctx.filename.clone(),
        }
    }

    /// Format the log entry according to the specified format
    pub fn format(&self, format: &str) -> String {
        match format {
            "combined" => self.format_combined(),
            "common" => self.format_common(),
            "json" => self.format_json(),
            custom => self.format_custom(custom),
        }
    }

    fn request_uri(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{q}", self.path),
            None => self.path.clone(),
        }
    }

    /// Apache/Nginx Combined Log Format
    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent "$http_referer" "$http_user_agent"`
    fn format_combined(&self) -> String {
        format!(
            "{} \"{}\" \"{}\"",
            self.format_common(),
            self.referer.as_deref().unwrap_or("-"),
            self.user_agent.as_deref().unwrap_or("-"),
        )
    }

    /// Common Log Format (CLF)
    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent`
    fn format_common(&self) -> String {
        format!(
            "{} - - [{}] \"{} {} HTTP/{}\" {} {}",
            self.remote_addr,
            self.time.format("%d/%b/%Y:%H:%M:%S %z"),
            self.method,
            self.request_uri(),
            self.http_version,
            self.status,
            self.body_bytes,
        )
    }

    /// JSON structured log format
    fn format_json(&self) -> String {
        serde_json::json!({
            "remote_addr": self.remote_addr,
            "time": self.time.to_rfc3339(),
            "method": self.method,
            "path": self.path,
            "query": self.query,
            "http_version": self.http_version,
            "status": self.status,
            "body_bytes": self.body_bytes,
            "referer": self.referer,
            "user_agent": self.user_agent,
            "request_time_us": self.request_time_us,
            "filename": self.filename,
        })
        .to_string()
    }

    /// Custom format with variable substitution
    ///
    /// Supported variables:
    /// - `$remote_addr` - Client IP address
    /// - `$time_local` - Local time in Common Log Format
    /// - `$time_iso8601` - ISO 8601 timestamp
    /// - `$request` - Full request line ("METHOD /path HTTP/version")
    /// - `$request_method` - HTTP method
    /// - `$request_uri` - Request URI with query string
    /// - `$request_filename` - Served file name
    /// - `$status` - Response status code
    /// - `$body_bytes_sent` - Response body size
    /// - `$http_referer` - Referer header
    /// - `$http_user_agent` - User-Agent header
    /// - `$request_time` - Request processing time in seconds (3 decimal places)
    fn format_custom(&self, pattern: &str) -> String {
        let request_uri = self.request_uri();
        let request_line = format!("{} {} HTTP/{}", self.method, request_uri, self.http_version);
        #[allow(clippy::cast_precision_loss)]
        let request_time = self.request_time_us as f64 / 1_000_000.0;

        // Longer variables first: `$request_*` before `$request`
        pattern
            .replace("$remote_addr", &self.remote_addr)
            .replace(
                "$time_local",
                &self.time.format("%d/%b/%Y:%H:%M:%S %z").to_string(),
            )
            .replace("$time_iso8601", &self.time.to_rfc3339())
            .replace("$request_time", &format!("{request_time:.3}"))
            .replace("$request_method", &self.method)
            .replace("$request_uri", &request_uri)
            .replace(
                "$request_filename",
                self.filename.as_deref().unwrap_or("-"),
            )
            .replace("$request", &request_line)
            .replace("$status", &self.status.to_string())
            .replace("$body_bytes_sent", &self.body_bytes.to_string())
            .replace("$http_referer", self.referer.as_deref().unwrap_or("-"))
            .replace(
                "$http_user_agent",
                self.user_agent.as_deref().unwrap_or("-"),
            )
    }
}

fn version_str(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::PeerAddr;
    use hyper::Request;
    use std::path::PathBuf;

    fn create_test_entry() -> AccessLogEntry {
        let mut req = Request::get("/docs/users.json?page=1")
            .header(REFERER, "https://example.com")
            .header(USER_AGENT, "Mozilla/5.0")
            .body(())
            .unwrap();
        req.extensions_mut()
            .insert(PeerAddr("192.168.1.1:40000".parse().unwrap()));
        let mut ctx = RequestContext::from_request(&req);
        ctx.set_file_path(PathBuf::from("/srv/docs/users.json"));

        let mut entry = AccessLogEntry::from_context(&ctx, 200, 1234);
        entry.request_time_us = 1500;
        entry
    }

    #[test]
    fn test_from_context() {
        let entry = create_test_entry();
        assert_eq!(entry.remote_addr, "192.168.1.1");
        assert_eq!(entry.method, "GET");
        assert_eq!(entry.path, "/docs/users.json");
        assert_eq!(entry.query.as_deref(), Some("page=1"));
        assert_eq!(entry.http_version, "1.1");
        assert_eq!(entry.filename.as_deref(), Some("users.json"));
    }

    #[test]
    fn test_unknown_peer() {
        let ctx = RequestContext::from_request(&Request::get("/").body(()).unwrap());
        let entry = AccessLogEntry::from_context(&ctx, 404, 9);
        assert!(entry.format("common").starts_with("- - - ["));
    }

    #[test]
    fn test_format_combined() {
        let entry = create_test_entry();
        let log = entry.format("combined");
        assert!(log.contains("192.168.1.1"));
        assert!(log.contains("GET /docs/users.json?page=1 HTTP/1.1"));
        assert!(log.contains("200 1234"));
        assert!(log.contains("https://example.com"));
        assert!(log.contains("Mozilla/5.0"));
    }

    #[test]
    fn test_format_common() {
        let entry = create_test_entry();
        let log = entry.format("common");
        assert!(log.contains("GET /docs/users.json?page=1 HTTP/1.1"));
        assert!(log.contains("200 1234"));
        // Common format does not include referer/user-agent
        assert!(!log.contains("https://example.com"));
    }

    #[test]
    fn test_format_json() {
        let entry = create_test_entry();
        let log: serde_json::Value = serde_json::from_str(&entry.format("json")).unwrap();
        assert_eq!(log["remote_addr"], "192.168.1.1");
        assert_eq!(log["method"], "GET");
        assert_eq!(log["status"], 200);
        assert_eq!(log["body_bytes"], 1234);
        assert_eq!(log["filename"], "users.json");
    }

    #[test]
    fn test_format_custom() {
        let entry = create_test_entry();
        let log = entry.format("$request_method $request_uri -> $request_filename $status $request_time");
        // 1500us = 0.0015s, formatted with 3 decimal places
        assert!(
            log.starts_with("GET /docs/users.json?page=1 -> users.json 200 0.00"),
            "unexpected log line: {log}"
        );
    }
}
