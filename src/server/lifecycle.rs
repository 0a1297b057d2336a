//! Server lifecycle
//!
//! `start` validates the project, binds the listener and spawns the accept
//! loop; the returned `RunningServer` is the only way to stop it.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::listener::create_listener;
use super::server_loop::run_accept_loop;
use crate::config::{AppState, Config};
use crate::error::StartupError;
use crate::logger;

/// Handle to a server whose accept loop is running
#[derive(Debug)]
pub struct RunningServer {
    local_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Start serving `config`
///
/// The root document is checked before the port is bound. Must be called
/// from within a Tokio runtime.
pub fn start(config: Config) -> Result<RunningServer, StartupError> {
    let addr = config.socket_addr()?;
    let state = Arc::new(AppState::new(config)?);

    let listener = create_listener(addr).map_err(|source| StartupError::Bind { addr, source })?;
    let local_addr = listener.local_addr()?;

    logger::log_server_start(&local_addr, &state);

    let (shutdown, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(run_accept_loop(listener, state, shutdown_rx));

    Ok(RunningServer {
        local_addr,
        shutdown,
        task,
    })
}

impl RunningServer {
    /// Address the listener is bound to (useful with port 0)
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting, let in-flight responses finish, release the socket
    ///
    /// Returns once every connection task has ended.
    pub async fn stop(self) {
        // Fails only if the loop already exited and dropped its receiver
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            logger::log_error(&format!("Accept loop failed: {e}"));
        }
        logger::log_server_stopped();
    }
}
