//! CORS header module
//!
//! Header values are validated once when the server is built and copied onto every
//! response, whatever its outcome.

use hyper::header::{
    HeaderMap, HeaderName, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS,
    ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};

use crate::config::{HeaderList, ServerConfig};
use crate::error::ServerError;

/// Pre-built `Access-Control-Allow-*` headers.
#[derive(Debug, Clone, Default)]
pub struct CorsHeaders {
    origin: Option<HeaderValue>,
    methods: Option<HeaderValue>,
    headers: Option<HeaderValue>,
}

impl CorsHeaders {
    pub fn from_config(config: &ServerConfig) -> Result<Self, ServerError> {
        Ok(Self {
            origin: header_value("Access-Control-Allow-Origin", config.cors.as_ref())?,
            methods: header_value("Access-Control-Allow-Methods", config.cors_methods.as_ref())?,
            headers: header_value("Access-Control-Allow-Headers", config.cors_headers.as_ref())?,
        })
    }

    pub const fn is_empty(&self) -> bool {
        self.origin.is_none() && self.methods.is_none() && self.headers.is_none()
    }

    /// Set every configured CORS header on `target`.
    pub fn apply(&self, target: &mut HeaderMap) {
        let pairs: [(HeaderName, &Option<HeaderValue>); 3] = [
            (ACCESS_CONTROL_ALLOW_ORIGIN, &self.origin),
            (ACCESS_CONTROL_ALLOW_METHODS, &self.methods),
            (ACCESS_CONTROL_ALLOW_HEADERS, &self.headers),
        ];
        for (name, value) in pairs {
            if let Some(value) = value {
                target.insert(name, value.clone());
            }
        }
    }
}

fn header_value(
    name: &'static str,
    list: Option<&HeaderList>,
) -> Result<Option<HeaderValue>, ServerError> {
    let Some(list) = list else {
        return Ok(None);
    };
    let joined = list.joined();
    if joined.is_empty() {
        return Ok(None);
    }
    HeaderValue::from_str(&joined)
        .map(Some)
        .map_err(|_| ServerError::InvalidHeader {
            name,
            value: joined,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_cors_configured() {
        let cors = CorsHeaders::from_config(&ServerConfig::default()).unwrap();
        assert!(cors.is_empty());

        let mut headers = HeaderMap::new();
        cors.apply(&mut headers);
        assert!(headers.is_empty());
    }

    #[test]
    fn test_lists_are_joined() {
        let config = ServerConfig {
            cors: Some(HeaderList::from("*")),
            cors_methods: Some(HeaderList::from(vec!["GET", "HEAD"])),
            cors_headers: Some(HeaderList::from(vec!["X-Token"])),
            ..ServerConfig::default()
        };
        let cors = CorsHeaders::from_config(&config).unwrap();

        let mut headers = HeaderMap::new();
        cors.apply(&mut headers);
        assert_eq!(headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
        assert_eq!(headers.get(ACCESS_CONTROL_ALLOW_METHODS).unwrap(), "GET, HEAD");
        assert_eq!(headers.get(ACCESS_CONTROL_ALLOW_HEADERS).unwrap(), "X-Token");
    }

    #[test]
    fn test_invalid_value_is_rejected() {
        let config = ServerConfig {
            cors: Some(HeaderList::from("https://a.example\n")),
            ..ServerConfig::default()
        };
        assert!(matches!(
            CorsHeaders::from_config(&config),
            Err(ServerError::InvalidHeader {
                name: "Access-Control-Allow-Origin",
                ..
            })
        ));
    }
}
