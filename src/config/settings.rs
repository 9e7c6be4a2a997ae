// File/environment settings module
// Deserialized through the `config` crate and converted into `ServerConfig`

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::types::{HeaderList, ListeningMessage, LogFormat, Responder, ServerConfig};
use crate::server::ListenOptions;

/// Settings loaded from the config file and environment
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ListenSettings,
    pub logging: LoggingSettings,
    pub files: FileSettings,
    #[serde(default)]
    pub cors: CorsSettings,
    #[serde(default)]
    pub pages: PageSettings,
}

/// Listener settings
#[derive(Debug, Deserialize, Clone)]
pub struct ListenSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    pub keep_alive: bool,
    /// Per-connection timeout in seconds, 0 disables it
    pub connection_timeout: u64,
    pub max_connections: Option<usize>,
    pub backlog: u32,
}

/// Logging settings
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub enabled: bool,
    /// `combined`, `common`, `json` or a `$variable` template
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub listening_message: Option<String>,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

/// What to serve
#[derive(Debug, Deserialize, Clone)]
pub struct FileSettings {
    /// Defaults to the working directory
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default)]
    pub index: Option<String>,
    pub prefix: String,
    pub disable_cache: bool,
    #[serde(default)]
    pub max_age: Option<u32>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CorsSettings {
    #[serde(default)]
    pub origin: Option<HeaderList>,
    #[serde(default)]
    pub methods: Option<HeaderList>,
    #[serde(default)]
    pub headers: Option<HeaderList>,
}

/// Literal bodies for 404 and 500 responses
#[derive(Debug, Deserialize, Clone, Default)]
pub struct PageSettings {
    #[serde(default)]
    pub not_found: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl Settings {
    /// Build the runtime configuration.
    pub fn server_config(&self) -> ServerConfig {
        let defaults = ServerConfig::default();
        ServerConfig {
            logging: self.logging.enabled,
            root: self.files.root.clone().unwrap_or(defaults.root),
            index: self.files.index.clone().filter(|index| !index.is_empty()),
            prefix: self.files.prefix.clone(),
            disable_cache: self.files.disable_cache,
            max_age: self.files.max_age,
            cors: self.cors.origin.clone(),
            cors_methods: self.cors.methods.clone(),
            cors_headers: self.cors.headers.clone(),
            not_found_handler: self
                .pages
                .not_found
                .clone()
                .map_or_else(Responder::default, Responder::Literal),
            error_handler: self
                .pages
                .error
                .clone()
                .map_or_else(Responder::default, Responder::Literal),
            log_format: self
                .logging
                .format
                .clone()
                .map_or_else(LogFormat::default, LogFormat::Pattern),
            listening_message: self
                .logging
                .listening_message
                .clone()
                .map_or_else(ListeningMessage::default, ListeningMessage::Literal),
        }
    }

    pub fn listen_options(&self) -> ListenOptions {
        ListenOptions {
            keep_alive: self.server.keep_alive,
            connection_timeout: (self.server.connection_timeout > 0)
                .then(|| Duration::from_secs(self.server.connection_timeout)),
            max_connections: self.server.max_connections,
            backlog: self.server.backlog,
        }
    }
}
