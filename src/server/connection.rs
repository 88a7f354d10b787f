// Connection module
// Accepts a TCP connection and serves HTTP/1 requests on it

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};

use crate::config::{self, PerformanceConfig};
use crate::handler;
use crate::logger;

/// Accept a connection, enforcing `performance.max_connections`.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `state` - Shared application state
/// * `conn_counter` - Active connection counter
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    state: &Arc<config::AppState>,
    conn_counter: &Arc<AtomicUsize>,
) {
    // Increment counter first, then check limit (prevents race condition)
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection rejected."
            ));
            drop(stream);
            return;
        }
    }

    logger::log_connection_accepted(&peer_addr);

    handle_connection(
        stream,
        peer_addr,
        Arc::clone(state),
        Arc::clone(conn_counter),
    );
}

/// Timeouts applied to one connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionTimeouts {
    /// Keep the connection open between requests
    pub keep_alive: bool,
    /// How long to wait for the next request's headers, idle time included
    pub header_read: Duration,
    /// Upper bound for handling a single request
    pub request: Duration,
}

impl ConnectionTimeouts {
    pub fn from_config(performance: &PerformanceConfig) -> Self {
        let keep_alive = performance.keep_alive_timeout > 0;
        let header_read = if keep_alive {
            performance.keep_alive_timeout
        } else {
            performance.read_timeout
        };
        Self {
            keep_alive,
            header_read: Duration::from_secs(header_read),
            request: Duration::from_secs(std::cmp::max(
                performance.read_timeout,
                performance.write_timeout,
            )),
        }
    }
}

/// Serve one connection on the local task set.
///
/// Requests on the connection are handled one after another. A keep-alive
/// connection is closed once it sits idle for `keep_alive_timeout`; each
/// request is bounded by the larger of the read and write timeouts.
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    state: Arc<config::AppState>,
    conn_counter: Arc<AtomicUsize>,
) {
    tokio::task::spawn_local(async move {
        let io = TokioIo::new(stream);
        let timeouts = ConnectionTimeouts::from_config(&state.config.performance);

        let mut builder = http1::Builder::new();
        builder
            .timer(TokioTimer::new())
            .keep_alive(timeouts.keep_alive)
            .header_read_timeout(timeouts.header_read);

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let state = Arc::clone(&service_state);
                async move {
                    let handled = handler::handle_request(req, peer_addr, state);
                    match tokio::time::timeout(timeouts.request, handled).await {
                        Ok(Ok(response)) => Ok(response),
                        Ok(Err(never)) => match never {},
                        Err(_) => {
                            logger::log_warning(&format!(
                                "Request from {peer_addr} timed out after {} seconds",
                                timeouts.request.as_secs()
                            ));
                            Err(io::Error::new(
                                io::ErrorKind::TimedOut,
                                "request handling timed out",
                            ))
                        }
                    }
                }
            }),
        );

        if let Err(err) = conn.await {
            logger::log_connection_error(&err);
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}
