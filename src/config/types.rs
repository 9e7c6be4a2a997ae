// Configuration types module
// Runtime configuration handed to `StaticServer::new`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::ServeError;
use crate::handler::RequestContext;
use crate::http::ResponseSink;

/// A header value given either as one string or as a list joined with `", "`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum HeaderList {
    One(String),
    Many(Vec<String>),
}

impl HeaderList {
    pub fn joined(&self) -> String {
        match self {
            Self::One(value) => value.clone(),
            Self::Many(values) => values.join(", "),
        }
    }
}

impl From<&str> for HeaderList {
    fn from(value: &str) -> Self {
        Self::One(value.to_string())
    }
}

impl From<String> for HeaderList {
    fn from(value: String) -> Self {
        Self::One(value)
    }
}

impl From<Vec<String>> for HeaderList {
    fn from(values: Vec<String>) -> Self {
        Self::Many(values)
    }
}

impl From<Vec<&str>> for HeaderList {
    fn from(values: Vec<&str>) -> Self {
        Self::Many(values.into_iter().map(str::to_string).collect())
    }
}

/// Not-Found callback: returns a body to send with 404, or `None` if it wrote the response.
pub type NotFoundFn = Arc<dyn Fn(&RequestContext, &ResponseSink) -> Option<String> + Send + Sync>;

/// Error callback: same contract as [`NotFoundFn`], with status 500.
pub type ErrorFn =
    Arc<dyn Fn(&ServeError, &RequestContext, &ResponseSink) -> Option<String> + Send + Sync>;

/// How a 404 or 500 is produced.
#[derive(Clone)]
pub enum Responder<F> {
    /// Plain `Not Found` / `Internal Server Error`
    Default,
    /// Send this body verbatim
    Literal(String),
    /// Let the callback decide
    Callback(F),
}

pub type NotFoundHandler = Responder<NotFoundFn>;
pub type ErrorHandler = Responder<ErrorFn>;

impl<F> Default for Responder<F> {
    fn default() -> Self {
        Self::Default
    }
}

impl<F> Responder<F> {
    pub fn literal(body: impl Into<String>) -> Self {
        Self::Literal(body.into())
    }
}

impl Responder<NotFoundFn> {
    pub fn callback<C>(callback: C) -> Self
    where
        C: Fn(&RequestContext, &ResponseSink) -> Option<String> + Send + Sync + 'static,
    {
        Self::Callback(Arc::new(callback))
    }
}

impl Responder<ErrorFn> {
    pub fn callback<C>(callback: C) -> Self
    where
        C: Fn(&ServeError, &RequestContext, &ResponseSink) -> Option<String>
            + Send
            + Sync
            + 'static,
    {
        Self::Callback(Arc::new(callback))
    }
}

impl<F> fmt::Debug for Responder<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("Default"),
            Self::Literal(body) => f.debug_tuple("Literal").field(body).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

pub type LogFormatFn = Arc<dyn Fn(&RequestContext) -> Option<String> + Send + Sync>;

/// Access log line written after a file is served.
#[derive(Clone, Default)]
pub enum LogFormat {
    /// `<METHOD> -> <path>`
    #[default]
    Default,
    /// `combined`, `common`, `json`, or a `$variable` template
    Pattern(String),
    /// Formatter returning the line, or `None` to skip it
    Custom(LogFormatFn),
}

impl LogFormat {
    pub fn custom<C>(formatter: C) -> Self
    where
        C: Fn(&RequestContext) -> Option<String> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(formatter))
    }
}

impl fmt::Debug for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("Default"),
            Self::Pattern(pattern) => f.debug_tuple("Pattern").field(pattern).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

pub type ListeningFn = Arc<dyn Fn(SocketAddr) -> Option<String> + Send + Sync>;

/// Message written once the listener is bound.
#[derive(Clone, Default)]
pub enum ListeningMessage {
    /// `Static Server Listening on port <port>`
    #[default]
    Default,
    Literal(String),
    Custom(ListeningFn),
}

impl ListeningMessage {
    pub fn custom<C>(message: C) -> Self
    where
        C: Fn(SocketAddr) -> Option<String> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(message))
    }

    /// Render the message for the bound address.
    pub fn render(&self, addr: SocketAddr) -> Option<String> {
        match self {
            Self::Default => Some(format!("Static Server Listening on port {}", addr.port())),
            Self::Literal(text) => Some(text.clone()),
            Self::Custom(message) => message(addr),
        }
    }
}

impl fmt::Debug for ListeningMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("Default"),
            Self::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Server configuration
///
/// Fixed once the server is built; `root` is made absolute at that point.
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct ServerConfig {
    /// Write access lines and the listening message
    pub logging: bool,
    /// Directory files are served from
    pub root: PathBuf,
    /// File served for a request to exactly `/`
    pub index: Option<String>,
    /// Mount prefix; requests outside it are declined
    pub prefix: String,
    /// Send `Cache-Control: no-store, no-cache, must-revalidate`
    pub disable_cache: bool,
    /// `Cache-Control: public, max-age=N` when caching is not disabled
    pub max_age: Option<u32>,
    pub cors: Option<HeaderList>,
    pub cors_methods: Option<HeaderList>,
    pub cors_headers: Option<HeaderList>,
    pub not_found_handler: NotFoundHandler,
    pub error_handler: ErrorHandler,
    pub log_format: LogFormat,
    pub listening_message: ListeningMessage,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            logging: true,
            root: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            index: None,
            prefix: String::new(),
            disable_cache: false,
            max_age: None,
            cors: None,
            cors_methods: None,
            cors_headers: None,
            not_found_handler: NotFoundHandler::default(),
            error_handler: ErrorHandler::default(),
            log_format: LogFormat::default(),
            listening_message: ListeningMessage::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_list_joined() {
        assert_eq!(HeaderList::from("*").joined(), "*");
        assert_eq!(
            HeaderList::from(vec!["https://a.example", "https://b.example"]).joined(),
            "https://a.example, https://b.example"
        );
    }

    #[test]
    fn test_header_list_deserializes_both_shapes() {
        let one: HeaderList = serde_json::from_str(r#""GET""#).unwrap();
        assert_eq!(one, HeaderList::One("GET".to_string()));
        let many: HeaderList = serde_json::from_str(r#"["GET","POST"]"#).unwrap();
        assert_eq!(many.joined(), "GET, POST");
    }

    #[test]
    fn test_listening_message_render() {
        let addr: SocketAddr = "127.0.0.1:3000".parse().unwrap();
        assert_eq!(
            ListeningMessage::Default.render(addr).as_deref(),
            Some("Static Server Listening on port 3000")
        );
        assert_eq!(
            ListeningMessage::Literal("up".to_string()).render(addr).as_deref(),
            Some("up")
        );
        let custom = ListeningMessage::custom(|addr| Some(format!("at {addr}")));
        assert_eq!(custom.render(addr).as_deref(), Some("at 127.0.0.1:3000"));
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert!(config.logging);
        assert!(config.prefix.is_empty());
        assert!(!config.disable_cache);
        assert!(matches!(config.not_found_handler, Responder::Default));
        assert!(matches!(config.log_format, LogFormat::Default));
    }
}
