// Server loop module
// Accepts connections until shutdown is signalled

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use crate::config;
use crate::logger;

/// Accept connections until `state.shutdown` is notified.
///
/// Must run inside a `tokio::task::LocalSet`: connections are served with
/// `spawn_local`, so request handling stays on this thread. Connections in
/// flight at shutdown are left to finish on their own.
#[allow(clippy::ignored_unit_patterns)]
pub async fn run_server_loop(listener: TcpListener, state: Arc<config::AppState>) {
    let active_connections = Arc::new(AtomicUsize::new(0));
    let shutdown = Arc::clone(&state.shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            _ = shutdown.notified() => {
                logger::log_shutdown();
                break;
            }
        }
    }
}
