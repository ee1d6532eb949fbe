//! TCP server for the chat room
//!
//! Accepts connections, registers each as an unnamed session and runs its
//! read loop on its own task. All messages are broadcast to every
//! registered session.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tracing::{debug, error, info};

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::registry::{Registry, SessionId};
use crate::session::ClientSession;
use crate::{DEFAULT_ADDRESS, DEFAULT_PORT, DEFAULT_SEND_TIMEOUT};

/// Listening parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub address: String,
    /// 0 picks an ephemeral port
    pub port: u16,
    /// Upper bound on one send to a slow recipient; `None` waits forever
    pub send_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            send_timeout: Some(DEFAULT_SEND_TIMEOUT),
        }
    }
}

/// Running server handle
pub struct Server {
    addr: SocketAddr,
    registry: Registry,
    shutdown_tx: broadcast::Sender<()>,
}

impl Server {
    /// Bind and start accepting connections
    pub async fn start(config: &ServerConfig) -> Result<Self> {
        let addr = format!("{}:{}", config.address, config.port);
        let listener = TcpListener::bind((config.address.as_str(), config.port))
            .await
            .map_err(|source| Error::Bind {
                addr: addr.clone(),
                source,
            })?;
        let bound_addr = listener
            .local_addr()
            .map_err(|source| Error::Bind { addr, source })?;

        info!(addr = %bound_addr, "Listening for connections");

        let registry = Registry::new();
        let (shutdown_tx, _) = broadcast::channel(1);

        tokio::spawn(accept_loop(
            listener,
            registry.clone(),
            config.send_timeout,
            shutdown_tx.subscribe(),
        ));

        Ok(Server {
            addr: bound_addr,
            registry,
            shutdown_tx,
        })
    }

    /// Get the server's bound address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Stop accepting and release the listening socket.
    ///
    /// Sessions already running are not notified.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
        info!("Server shutdown initiated");
    }
}

/// Accept incoming connections
async fn accept_loop(
    listener: TcpListener,
    registry: Registry,
    send_timeout: Option<Duration>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, addr)) => {
                        debug!(addr = %addr, "New connection");
                        admit(stream, &registry, send_timeout).await;
                    }
                    Err(e) => {
                        error!(error = %e, "Accept failed");
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                info!("Accept loop shutting down");
                break;
            }
        }
    }
}

/// Register the connection before its read loop starts
async fn admit(stream: TcpStream, registry: &Registry, send_timeout: Option<Duration>) {
    let id = SessionId::new();
    let connection = Arc::new(Connection::from_tcp(stream).with_send_timeout(send_timeout));

    registry.add(id, connection.clone()).await;

    let session = ClientSession::new(id, connection, registry.clone());
    tokio::spawn(async move {
        session.run().await;
        debug!(session = %id, "Session ended");
    });
}
