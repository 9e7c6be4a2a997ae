//! HTTP cache control module
//!
//! Decides the `Cache-Control` header sent with every response.

use hyper::header::{HeaderMap, HeaderValue, CACHE_CONTROL};

/// Value sent when caching is disabled.
pub const NO_STORE: &str = "no-store, no-cache, must-revalidate";

/// Cache control policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Leave `Cache-Control` unset
    #[default]
    Unspecified,
    /// Public cache with specified max-age (seconds)
    Public(u32),
    /// Clients and intermediaries must not store or reuse the response
    Disabled,
}

impl CachePolicy {
    /// Build the policy from the `disable_cache` flag and optional max-age.
    ///
    /// Disabling the cache wins over a configured max-age.
    pub const fn from_config(disable_cache: bool, max_age: Option<u32>) -> Self {
        match (disable_cache, max_age) {
            (true, _) => Self::Disabled,
            (false, Some(seconds)) => Self::Public(seconds),
            (false, None) => Self::Unspecified,
        }
    }

    /// Convert to Cache-Control header value
    pub fn to_header_value(self) -> Option<HeaderValue> {
        match self {
            Self::Unspecified => None,
            Self::Public(max_age) => {
                HeaderValue::from_str(&format!("public, max-age={max_age}")).ok()
            }
            Self::Disabled => Some(HeaderValue::from_static(NO_STORE)),
        }
    }

    /// Set `Cache-Control` on the given headers, if the policy asks for one.
    pub fn apply(self, headers: &mut HeaderMap) {
        if let Some(value) = self.to_header_value() {
            headers.insert(CACHE_CONTROL, value);
        }
    }
}
