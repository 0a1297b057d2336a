// Configuration module entry point
// Loads the immutable server configuration and builds the shared request state

mod state;
mod types;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::StartupError;

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, HttpConfig, LoggingConfig, NotFoundPolicy, PerformanceConfig, ServerConfig,
    DEFAULT_PORT,
};

/// Config file used when `MAGICIAN_CONFIG` is not set (extension optional)
pub const DEFAULT_CONFIG_FILE: &str = "magician";

impl Config {
    /// Load configuration from `MAGICIAN_CONFIG` (or `magician.toml`), the
    /// `MAGICIAN_*` environment and the `PORT` override
    pub fn load() -> Result<Self, StartupError> {
        let config_path =
            std::env::var("MAGICIAN_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let port_override = std::env::var("PORT").ok();
        Ok(Self::load_from(&config_path, port_override)?)
    }

    /// Load configuration from specified file path
    ///
    /// A missing file is not an error; every key has a default. `port_override`
    /// takes precedence over both the file and the `MAGICIAN_` environment.
    pub fn load_from(
        config_path: &str,
        port_override: Option<String>,
    ) -> Result<Self, config::ConfigError> {
        let quiet_extensions: Vec<&str> = types::DEFAULT_QUIET_EXTENSIONS.to_vec();

        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("MAGICIAN")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", types::DEFAULT_HOST)?
            .set_default("server.port", i64::from(types::DEFAULT_PORT))?
            .set_default("server.root", types::DEFAULT_ROOT)?
            .set_default("server.root_document", types::DEFAULT_ROOT_DOCUMENT)?
            .set_default("server.not_found", "not_found")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", types::DEFAULT_ACCESS_LOG_FORMAT)?
            .set_default("logging.quiet_extensions", quiet_extensions)?
            .set_default(
                "performance.connection_timeout",
                i64::try_from(types::DEFAULT_CONNECTION_TIMEOUT).unwrap_or(i64::MAX),
            )?
            .set_default("http.allow_headers", types::DEFAULT_ALLOW_HEADERS)?
            .set_override_option("server.port", port_override)?
            .build()?;

        settings.try_deserialize()
    }

    /// Default configuration serving `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let mut config = Self::default();
        config.server.root = root.into();
        config
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, StartupError> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse()
            .map_err(|_| StartupError::InvalidAddress { addr })
    }

    pub const fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.performance.connection_timeout)
    }
}
