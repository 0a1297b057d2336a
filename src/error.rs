//! Error types
//!
//! `ServeError` covers everything that can go wrong while answering a single
//! request; each variant maps to exactly one HTTP status. `StartupError` covers
//! the fatal conditions that stop the process before (or while) the listener
//! comes up.

use hyper::StatusCode;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Per-request failure, always converted into a response
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("file not found: {path}")]
    NotFound { path: String },

    #[error("access denied: {path}")]
    Forbidden { path: String },

    #[error("method not allowed: {method}")]
    MethodNotAllowed { method: String },

    #[error("malformed request path: {path}")]
    BadRequest { path: String },

    #[error("failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl ServeError {
    /// HTTP status this error is reported with
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Read { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Fatal error raised while loading configuration or bringing the listener up
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid listen address '{addr}'")]
    InvalidAddress { addr: String },

    #[error("project root '{}' is not accessible: {source}", path.display())]
    RootDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("root document '{}' not found, run the server from the project root", path.display())]
    MissingRootDocument { path: PathBuf },

    #[error("invalid {setting} value {value:?}, not usable as a header value")]
    InvalidHeaderValue { setting: String, value: String },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("runtime error: {0}")]
    Runtime(#[from] io::Error),
}
