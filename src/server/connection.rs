// Connection handling module
// Accepts a single TCP connection and serves it until it closes or shutdown

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Accept a connection, enforce the connection limit, and spawn its task.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `state` - Shared application state
/// * `connections` - Set of running connection tasks
/// * `shutdown` - Receiver flipped to `true` when the server stops
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    connections: &mut JoinSet<()>,
    shutdown: watch::Receiver<bool>,
) {
    if let Some(max_conn) = state.config.performance.max_connections {
        let active = connections.len();
        if active >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            logger::log_warning(&format!(
                "Max connections reached: {active}/{max_conn}. Connection from {peer_addr} rejected."
            ));
            drop(stream);
            return;
        }
    }

    connections.spawn(serve_connection(
        stream,
        peer_addr,
        Arc::clone(state),
        shutdown,
    ));
}

/// Serve one connection.
///
/// This function:
/// 1. Wraps the TCP stream in `TokioIo`
/// 2. Serves HTTP/1.1 with keep-alive through the request handler
/// 3. Closes the connection when no request head arrives within the
///    configured connection timeout, whether it is fresh or idle between
///    keep-alive requests
/// 4. Switches to graceful shutdown once the shutdown flag flips, letting the
///    in-flight response finish and closing idle keep-alive connections
async fn serve_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    mut shutdown: watch::Receiver<bool>,
) {
    let io = TokioIo::new(stream);
    let idle_timeout = state.config.connection_timeout();

    let service_state = Arc::clone(&state);
    let service = service_fn(move |req| {
        handler::handle_request(req, Arc::clone(&service_state), peer_addr)
    });

    let mut builder = http1::Builder::new();
    builder
        .keep_alive(true)
        .timer(TokioTimer::new())
        .header_read_timeout(idle_timeout);
    let conn = builder.serve_connection(io, service);
    let mut conn = std::pin::pin!(conn);

    let mut draining = false;
    let served = loop {
        tokio::select! {
            result = conn.as_mut() => break result,
            _ = shutdown.changed(), if !draining => {
                draining = true;
                conn.as_mut().graceful_shutdown();
            }
        }
    };

    match served {
        Ok(()) => {}
        Err(err) if err.is_timeout() => {
            logger::log_warning(&format!(
                "Connection from {peer_addr} idle for {} seconds, closing",
                idle_timeout.as_secs()
            ));
        }
        Err(err) => logger::log_connection_error(&err),
    }
}
