//! Development static file server for the Chatlog Magician front-end
//!
//! Serves a project directory over HTTP/1.1 with permissive CORS and no-cache
//! headers. Paths are resolved strictly inside the project root; unresolved
//! paths either get a 404 page or, with `spa_fallback`, the root document.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;

pub use config::{AppState, Config, NotFoundPolicy};
pub use error::{ServeError, StartupError};
pub use server::{start, RunningServer};
