// Configuration module entry point
// Runtime server configuration plus file/environment settings loading

mod settings;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use settings::{
    CorsSettings, FileSettings, ListenSettings, LoggingSettings, PageSettings, Settings,
};
pub use types::{
    ErrorFn, ErrorHandler, HeaderList, ListeningFn, ListeningMessage, LogFormat, LogFormatFn,
    NotFoundFn, NotFoundHandler, Responder, ServerConfig,
};

/// Environment variable naming the settings file (without extension)
pub const CONFIG_PATH_ENV: &str = "STATIC_SERVER_CONFIG";

/// Settings file used when `STATIC_SERVER_CONFIG` is unset
pub const DEFAULT_CONFIG_PATH: &str = "static-server";

impl Settings {
    /// Load settings from the file named by `STATIC_SERVER_CONFIG`, or `static-server`
    pub fn load() -> Result<Self, config::ConfigError> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path)
    }

    /// Load settings from the given file path (extension optional), layered under
    /// `STATIC_*` environment variables. A missing file is not an error.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("STATIC")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.keep_alive", true)?
            .set_default("server.connection_timeout", 0)?
            .set_default("server.backlog", 128)?
            .set_default("logging.enabled", true)?
            .set_default("files.prefix", "")?
            .set_default("files.disable_cache", false)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, crate::error::ServerError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| crate::error::ServerError::InvalidAddress(format!("{e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    fn write_settings(contents: &str) -> (tempfile::TempDir, String) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("static-server.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        let path = path.to_string_lossy().into_owned();
        (dir, path)
    }

    #[test]
    fn test_defaults_without_file() {
        let settings = Settings::load_from("/nonexistent/static-server-settings").unwrap();
        assert_eq!(settings.server.port, 3000);
        assert!(settings.logging.enabled);
        assert!(settings.files.prefix.is_empty());
        assert_eq!(
            settings.socket_addr().unwrap(),
            "127.0.0.1:3000".parse().unwrap()
        );

        let options = settings.listen_options();
        assert!(options.keep_alive);
        assert!(options.connection_timeout.is_none());
    }

    #[test]
    fn test_file_values() {
        let (_dir, path) = write_settings(
            r#"
[server]
port = 8081
connection_timeout = 30

[logging]
enabled = false
format = "common"

[files]
root = "/srv/www"
index = "index.html"
prefix = "/static"
disable_cache = true

[cors]
origin = "*"
methods = ["GET", "HEAD"]

[pages]
not_found = "<h1>missing</h1>"
"#,
        );
        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.server.port, 8081);
        assert_eq!(
            settings.listen_options().connection_timeout,
            Some(Duration::from_secs(30))
        );

        let config = settings.server_config();
        assert!(!config.logging);
        assert_eq!(config.root, std::path::PathBuf::from("/srv/www"));
        assert_eq!(config.index.as_deref(), Some("index.html"));
        assert_eq!(config.prefix, "/static");
        assert!(config.disable_cache);
        assert_eq!(config.cors_methods.unwrap().joined(), "GET, HEAD");
        assert!(matches!(config.not_found_handler, Responder::Literal(ref body) if body == "<h1>missing</h1>"));
        assert!(matches!(config.error_handler, Responder::Default));
        assert!(matches!(config.log_format, LogFormat::Pattern(ref p) if p == "common"));
    }

    #[test]
    fn test_invalid_address() {
        let (_dir, path) = write_settings("[server]\nhost = \"not an ip\"\n");
        let settings = Settings::load_from(&path).unwrap();
        assert!(settings.socket_addr().is_err());
    }
}
