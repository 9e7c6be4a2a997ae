//! MIME type detection module
//!
//! Maps a file extension to a Content-Type. The lookup strategy is chosen once, when the
//! server is built: the `mime_guess` database when the `mime-guess` feature is compiled in,
//! otherwise a small table of common types.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Extension to MIME type lookup strategy.
///
/// Extensions are passed without the leading dot. `None` means "do not send a Content-Type".
pub trait MimeLookup: Send + Sync {
    fn lookup(&self, extension: &str) -> Option<&'static str>;

    /// Short name used in startup logs.
    fn name(&self) -> &'static str;
}

/// Built-in table: enough for images, json, favicon.ico, robots.txt and html.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicTable;

impl MimeLookup for BasicTable {
    fn lookup(&self, extension: &str) -> Option<&'static str> {
        match extension {
            "json" => Some("application/json"),
            "png" => Some("image/png"),
            "txt" => Some("text/plain"),
            "html" | "htm" => Some("text/html"),
            "gif" => Some("image/gif"),
            "jpg" | "jpeg" => Some("image/jpeg"),
            "ico" => Some("image/x-icon"),
            "js" => Some("application/javascript"),
            "css" => Some("text/css"),
            "xml" => Some("application/xml"),
            "md" => Some("text/markdown"),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        "basic"
    }
}

/// Lookup backed by the `mime_guess` extension database.
#[cfg(feature = "mime-guess")]
#[derive(Debug, Clone, Copy, Default)]
pub struct GuessTable;

#[cfg(feature = "mime-guess")]
impl MimeLookup for GuessTable {
    fn lookup(&self, extension: &str) -> Option<&'static str> {
        mime_guess::from_ext(extension).first_raw()
    }

    fn name(&self) -> &'static str {
        "mime_guess"
    }
}

/// Content-Type resolver holding the selected lookup strategy.
#[derive(Clone)]
pub struct ContentTypeResolver {
    lookup: Arc<dyn MimeLookup>,
}

impl ContentTypeResolver {
    /// Create a resolver using the given strategy.
    pub fn new(lookup: impl MimeLookup + 'static) -> Self {
        Self {
            lookup: Arc::new(lookup),
        }
    }

    /// Resolver using only the built-in table.
    pub fn basic() -> Self {
        Self::new(BasicTable)
    }

    /// Pick the richest strategy compiled into this build.
    pub fn detect() -> Self {
        #[cfg(feature = "mime-guess")]
        {
            Self::new(GuessTable)
        }
        #[cfg(not(feature = "mime-guess"))]
        {
            Self::basic()
        }
    }

    /// Resolve an extension, with or without its leading dot.
    pub fn resolve(&self, extension: &str) -> Option<&'static str> {
        let extension = extension.strip_prefix('.').unwrap_or(extension);
        self.lookup.lookup(extension)
    }

    /// Resolve the Content-Type for a file path from its extension.
    pub fn resolve_path(&self, path: &Path) -> Option<&'static str> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.resolve(ext))
    }

    pub fn strategy(&self) -> &'static str {
        self.lookup.name()
    }
}

impl Default for ContentTypeResolver {
    fn default() -> Self {
        Self::detect()
    }
}

impl fmt::Debug for ContentTypeResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentTypeResolver")
            .field("strategy", &self.lookup.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_common_types() {
        let resolver = ContentTypeResolver::basic();
        assert_eq!(resolver.resolve("json"), Some("application/json"));
        assert_eq!(resolver.resolve("png"), Some("image/png"));
        assert_eq!(resolver.resolve("htm"), Some("text/html"));
        assert_eq!(resolver.resolve("jpeg"), Some("image/jpeg"));
        assert_eq!(resolver.resolve("ico"), Some("image/x-icon"));
        assert_eq!(resolver.resolve("md"), Some("text/markdown"));
    }

    #[test]
    fn test_leading_dot_is_stripped() {
        let resolver = ContentTypeResolver::basic();
        assert_eq!(resolver.resolve(".css"), Some("text/css"));
        assert_eq!(resolver.resolve(".xml"), Some("application/xml"));
    }

    #[test]
    fn test_unknown_extension() {
        let resolver = ContentTypeResolver::basic();
        assert_eq!(resolver.resolve("xyz"), None);
        assert_eq!(resolver.resolve(""), None);
        assert_eq!(resolver.resolve_path(Path::new("/srv/Makefile")), None);
    }

    #[test]
    fn test_resolve_path_uses_extension() {
        let resolver = ContentTypeResolver::basic();
        assert_eq!(
            resolver.resolve_path(Path::new("/srv/www/data.json")),
            Some("application/json")
        );
        assert_eq!(resolver.resolve_path(Path::new("/srv/www/.txt")), None);
    }

    #[test]
    fn test_custom_strategy_is_used() {
        struct Only;
        impl MimeLookup for Only {
            fn lookup(&self, extension: &str) -> Option<&'static str> {
                (extension == "wasm").then_some("application/wasm")
            }
            fn name(&self) -> &'static str {
                "only"
            }
        }

        let resolver = ContentTypeResolver::new(Only);
        assert_eq!(resolver.resolve(".wasm"), Some("application/wasm"));
        assert_eq!(resolver.resolve("json"), None);
        assert_eq!(resolver.strategy(), "only");
    }

    #[cfg(feature = "mime-guess")]
    #[test]
    fn test_guess_table() {
        let resolver = ContentTypeResolver::detect();
        assert_eq!(resolver.strategy(), "mime_guess");
        assert_eq!(resolver.resolve("json"), Some("application/json"));
        assert_eq!(resolver.resolve("png"), Some("image/png"));
        assert_eq!(resolver.resolve("no-such-extension"), None);
    }
}
