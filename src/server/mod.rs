// Server module entry point
// Binds the listening socket and runs the accept loop for a `StaticServer`

pub mod connection;
pub mod listener;
pub mod signal;

// `loop` is a keyword, so the module is named server_loop
#[path = "loop.rs"]
pub mod server_loop;

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

pub use listener::create_listener;
pub use server_loop::start_server_loop;
pub use signal::shutdown_signal;

use crate::error::ServerError;
use crate::handler::StaticServer;
use crate::logger;

/// Connection-level settings
#[derive(Debug, Clone)]
pub struct ListenOptions {
    /// HTTP/1.1 keep-alive
    pub keep_alive: bool,
    /// Upper bound on a connection's lifetime
    pub connection_timeout: Option<Duration>,
    /// Connections beyond this many are closed on accept
    pub max_connections: Option<usize>,
    pub backlog: u32,
}

impl Default for ListenOptions {
    fn default() -> Self {
        Self {
            keep_alive: true,
            connection_timeout: None,
            max_connections: None,
            backlog: 128,
        }
    }
}

/// A bound server that has not started accepting yet.
#[derive(Debug)]
pub struct Listening {
    listener: std::net::TcpListener,
    server: StaticServer,
    options: ListenOptions,
}

impl Listening {
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until the process exits.
    pub async fn serve(self) -> io::Result<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Serve until `signal` completes, then let open connections finish.
    pub async fn serve_with_shutdown<S>(self, signal: S) -> io::Result<()>
    where
        S: Future<Output = ()>,
    {
        let listener = tokio::net::TcpListener::from_std(self.listener)?;
        start_server_loop(listener, self.server, self.options, signal).await;
        Ok(())
    }
}

impl StaticServer {
    /// Bind `addr` with default connection settings.
    pub fn bind(&self, addr: SocketAddr) -> Result<Listening, ServerError> {
        self.bind_with(addr, ListenOptions::default())
    }

    /// Bind `addr` and announce the listening message when logging is enabled.
    pub fn bind_with(&self, addr: SocketAddr, options: ListenOptions) -> Result<Listening, ServerError> {
        let listener = create_listener(addr, options.backlog)?;
        let local_addr = listener.local_addr()?;

        let config = self.config();
        if config.logging {
            if let Some(message) = config.listening_message.render(local_addr) {
                logger::log_listening(&message);
            }
        }

        Ok(Listening {
            listener,
            server: self.clone(),
            options,
        })
    }

    /// Bind and serve until the process exits.
    pub async fn listen(&self, addr: SocketAddr) -> Result<(), ServerError> {
        self.bind(addr)?.serve().await?;
        Ok(())
    }
}
