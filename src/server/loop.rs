// Server loop module
// Accepts connections until shutdown, then drains the in-flight ones

use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

/// Accept loop backing a `RunningServer`
///
/// Runs until the shutdown flag flips (or its sender is dropped). The
/// listener is closed before waiting on the remaining connections, so no
/// new connection is accepted while draining.
pub async fn run_accept_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(
                            stream,
                            peer_addr,
                            &state,
                            &mut connections,
                            shutdown.clone(),
                        );
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            Some(joined) = connections.join_next(), if !connections.is_empty() => {
                log_join_result(joined);
            }

            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    drop(listener);
    logger::log_draining(connections.len());

    while let Some(joined) = connections.join_next().await {
        log_join_result(joined);
    }
}

fn log_join_result(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        logger::log_error(&format!("Connection task failed: {e}"));
    }
}
