//! Error types
//!
//! `ServeError` covers everything that can go wrong while answering a single request;
//! `ServerError` covers construction, configuration and listening.

use std::fmt;
use std::io;

/// Boxed error returned by middleware steps.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure while serving one request.
#[derive(Debug)]
pub enum ServeError {
    /// The resolved path does not exist, or names a directory.
    NotFound,
    /// Any other failure while reading the file.
    Io(io::Error),
    /// A middleware step failed.
    Middleware(BoxError),
    /// A write was attempted after the response was ended.
    ResponseEnded,
}

impl ServeError {
    /// Whether this error is routed to Not-Found handling rather than the error handler.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

impl fmt::Display for ServeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "File not found"),
            Self::Io(err) => write!(f, "IO error: {err}"),
            Self::Middleware(err) => write!(f, "Middleware failed: {err}"),
            Self::ResponseEnded => write!(f, "Response already ended"),
        }
    }
}

impl std::error::Error for ServeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Middleware(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<io::Error> for ServeError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

/// Failure while constructing, configuring or running the server.
#[derive(Debug)]
pub enum ServerError {
    /// Settings could not be loaded or deserialized.
    Config(config::ConfigError),
    /// Binding, accepting or logger setup failed.
    Io(io::Error),
    /// The configured host/port is not a socket address.
    InvalidAddress(String),
    /// A configured header value contains characters HTTP does not allow.
    InvalidHeader { name: &'static str, value: String },
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "Configuration error: {err}"),
            Self::Io(err) => write!(f, "IO error: {err}"),
            Self::InvalidAddress(addr) => write!(f, "Invalid address: {addr}"),
            Self::InvalidHeader { name, value } => {
                write!(f, "Invalid value for header {name}: {value:?}")
            }
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ServerError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<config::ConfigError> for ServerError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err)
    }
}
