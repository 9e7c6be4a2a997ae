//! Minimal static-file server
//!
//! A [`StaticServer`] maps request paths under a mount prefix onto files below a root
//! directory. Each served file gets a content type from its extension, optional CORS and
//! cache-control headers, and a pass through any registered middleware. Requests it cannot
//! serve get a configurable 404 page, or are handed to a continuation when the server is
//! one stage of a larger pipeline. Read failures get a configurable 500 page.
//!
//! ```no_run
//! use statically_served::{ServerConfig, StaticServer};
//!
//! # async fn run() -> Result<(), statically_served::ServerError> {
//! let server = StaticServer::new(ServerConfig {
//!     root: "public".into(),
//!     index: Some("index.html".to_string()),
//!     ..ServerConfig::default()
//! })?;
//! server.listen("127.0.0.1:3000".parse().expect("valid address")).await
//! # }
//! ```

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;

pub use config::{
    ErrorHandler, HeaderList, ListeningMessage, LogFormat, NotFoundHandler, ServerConfig, Settings,
};
pub use error::{BoxError, ServeError, ServerError};
pub use handler::{Middleware, RequestContext, StaticServer};
pub use http::{ContentTypeResolver, ResponseSink};
pub use server::{ListenOptions, Listening};
