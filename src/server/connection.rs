// Connection handling module
// Serves one accepted TCP connection and tracks how many are open

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;
use tokio::sync::{watch, Notify};

use super::ListenOptions;
use crate::handler::{PeerAddr, StaticServer};
use crate::logger;

/// Count of open connections, with a wake-up when it drops to zero.
#[derive(Clone, Default)]
pub struct ConnectionCounter {
    active: Arc<AtomicUsize>,
    drained: Arc<Notify>,
}

impl ConnectionCounter {
    /// Reserve a slot, or refuse when `limit` connections are already open.
    pub fn try_acquire(&self, limit: Option<usize>) -> bool {
        // Increment first, then check, so two racing accepts cannot both pass
        let prev = self.active.fetch_add(1, Ordering::SeqCst);
        if let Some(limit) = limit {
            if prev >= limit {
                self.active.fetch_sub(1, Ordering::SeqCst);
                return false;
            }
        }
        true
    }

    pub fn release(&self) {
        if self.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.drained.notify_waiters();
        }
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Wait until every acquired slot has been released.
    pub async fn wait_drained(&self) {
        loop {
            let drained = self.drained.notified();
            if self.active() == 0 {
                return;
            }
            drained.await;
        }
    }
}

/// Accept a connection, checking the connection limit.
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    server: &StaticServer,
    options: &ListenOptions,
    counter: &ConnectionCounter,
    shutdown: watch::Receiver<bool>,
) {
    if !counter.try_acquire(options.max_connections) {
        logger::log_connection_limit(&peer_addr, options.max_connections.unwrap_or_default());
        drop(stream);
        return;
    }

    handle_connection(
        stream,
        peer_addr,
        server.clone(),
        options.clone(),
        counter.clone(),
        shutdown,
    );
}

/// Serve a connection in a spawned task until it closes, times out, or shutdown
/// completes its in-flight request.
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    server: StaticServer,
    options: ListenOptions,
    counter: ConnectionCounter,
    mut shutdown: watch::Receiver<bool>,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let service = service_fn(move |req: Request<Incoming>| {
            let server = server.clone();
            // Request bodies are never read
            let (parts, _body) = req.into_parts();
            let mut req = Request::from_parts(parts, ());
            req.extensions_mut().insert(PeerAddr(peer_addr));
            async move { Ok::<_, Infallible>(server.handle(req).await) }
        });

        let mut builder = http1::Builder::new();
        builder.keep_alive(options.keep_alive);
        let conn = builder.serve_connection(io, service);
        let mut conn = std::pin::pin!(conn);

        let served = async {
            tokio::select! {
                result = conn.as_mut() => result,
                _ = shutdown.changed() => {
                    conn.as_mut().graceful_shutdown();
                    conn.as_mut().await
                }
            }
        };

        let result = match options.connection_timeout {
            Some(limit) => tokio::time::timeout(limit, served).await,
            None => Ok(served.await),
        };
        match result {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => {
                logger::log_warning(&format!(
                    "Connection from {peer_addr} timed out after {:?}",
                    options.connection_timeout.unwrap_or_default()
                ));
            }
        }

        counter.release();
    });
}
