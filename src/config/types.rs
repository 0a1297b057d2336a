// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_ROOT: &str = ".";
pub const DEFAULT_ROOT_DOCUMENT: &str = "index.html";
pub const DEFAULT_ACCESS_LOG_FORMAT: &str = "dev";
pub const DEFAULT_QUIET_EXTENSIONS: &[&str] =
    &[".css", ".js", ".png", ".ico", ".woff", ".woff2", ".ttf"];
pub const DEFAULT_CONNECTION_TIMEOUT: u64 = 30;
pub const DEFAULT_ALLOW_HEADERS: &str = "*";

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
}

/// What to answer when a request path resolves to nothing
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotFoundPolicy {
    /// 404 page with a link back to `/`
    #[default]
    NotFound,
    /// Serve the root document and let client-side routing take over
    SpaFallback,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Project root, nothing outside it is ever served
    pub root: PathBuf,
    /// Served for `/` and for directory paths
    pub root_document: String,
    pub not_found: NotFoundPolicy,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub access_log: bool,
    /// Access log format (dev, common, combined, json, or custom pattern)
    pub access_log_format: String,
    /// Successful requests for these extensions are not logged
    pub quiet_extensions: Vec<String>,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    /// Seconds a connection may wait for the next request head
    pub connection_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Value of `Access-Control-Allow-Headers`
    pub allow_headers: String,
    /// Extra or overriding extension -> content type entries
    #[serde(default)]
    pub mime_types: HashMap<String, String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            root: PathBuf::from(DEFAULT_ROOT),
            root_document: DEFAULT_ROOT_DOCUMENT.to_string(),
            not_found: NotFoundPolicy::default(),
            workers: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            access_log: true,
            access_log_format: DEFAULT_ACCESS_LOG_FORMAT.to_string(),
            quiet_extensions: DEFAULT_QUIET_EXTENSIONS
                .iter()
                .map(ToString::to_string)
                .collect(),
            access_log_file: None,
            error_log_file: None,
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
            max_connections: None,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            allow_headers: DEFAULT_ALLOW_HEADERS.to_string(),
            mime_types: HashMap::new(),
        }
    }
}
