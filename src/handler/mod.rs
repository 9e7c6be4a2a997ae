//! Request handler module
//!
//! The dispatch pipeline: prefix check, path resolution, file read, headers, middleware,
//! and Not-Found/error fallbacks.

mod context;
mod dispatcher;
pub mod fallback;
pub mod middleware;
pub mod path;

pub use context::{PeerAddr, RequestContext};
pub use dispatcher::StaticServer;
pub use middleware::{Middleware, MiddlewareFuture, MiddlewareList};
pub use path::resolve_file_path;
