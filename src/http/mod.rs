//! HTTP protocol layer module
//!
//! Header policies, content-type detection and the write-once response sink. Nothing in
//! here touches the file system.

pub mod cache;
pub mod cors;
pub mod mime;
pub mod response;

// Re-export commonly used types
pub use cache::CachePolicy;
pub use cors::CorsHeaders;
pub use mime::{BasicTable, ContentTypeResolver, MimeLookup};
pub use response::{send_page, ResponseSink};

#[cfg(feature = "mime-guess")]
pub use mime::GuessTable;
