// Server module entry point
// Listener setup, connection serving, lifecycle and signal handling

pub mod connection;
pub mod lifecycle;
pub mod listener;
pub mod signal;

// `loop` is a keyword, so the file is mounted as `server_loop`
#[path = "loop.rs"]
pub mod server_loop;

// Re-export commonly used types
pub use lifecycle::{start, RunningServer};
pub use listener::create_listener;
pub use signal::wait_for_shutdown;
