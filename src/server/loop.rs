// Server loop module
// Accepts connections until the shutdown signal fires, then drains open connections

use std::future::Future;
use tokio::net::TcpListener;
use tokio::sync::watch;

use super::connection::{accept_connection, ConnectionCounter};
use super::ListenOptions;
use crate::handler::StaticServer;
use crate::logger;

/// Run the accept loop until `signal` completes.
///
/// After the signal, the listener is closed, every connection is told to finish its
/// current request, and the loop returns once all of them have closed.
#[allow(clippy::ignored_unit_patterns)]
pub async fn start_server_loop<S>(
    listener: TcpListener,
    server: StaticServer,
    options: ListenOptions,
    signal: S,
) where
    S: Future<Output = ()>,
{
    let counter = ConnectionCounter::default();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut signal = std::pin::pin!(signal);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(
                            stream,
                            peer_addr,
                            &server,
                            &options,
                            &counter,
                            shutdown_rx.clone(),
                        );
                    }
                    Err(e) => logger::log_accept_error(&e),
                }
            }

            _ = &mut signal => break,
        }
    }

    drop(listener);
    if server.config().logging {
        logger::log_shutdown(counter.active());
    }
    // Receivers only fail to see this once their connection has already closed
    let _ = shutdown_tx.send(true);
    counter.wait_drained().await;
}
