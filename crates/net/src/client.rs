//! TCP client for joining a chat server
//!
//! Presentation layers drive a [`Client`] with `send_chat` and render
//! whatever arrives through `next_event`.

use std::sync::Arc;

use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::connection::Connection;
use crate::error::Result;
use crate::protocol::{chat_line, Message};

/// Event received from the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// A broadcast line, to be shown as-is
    Line(String),
    /// Connection lost
    Disconnected,
}

/// Client handle for network operations
pub struct Client {
    name: String,
    connection: Arc<Connection>,
    event_rx: mpsc::Receiver<ClientEvent>,
}

impl Client {
    /// Connect to a server and announce `name`
    pub async fn connect(host: &str, port: u16, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        info!(host = %host, port = port, "Connecting to server");

        let stream = TcpStream::connect((host, port)).await?;
        let connection = Arc::new(Connection::from_tcp(stream));

        connection.send(&Message::Name(name.clone()).encode()).await?;

        let (event_tx, event_rx) = mpsc::channel(64);
        tokio::spawn(reader_task(connection.clone(), event_tx));

        Ok(Client {
            name,
            connection,
            event_rx,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the next server event; `None` after the reader has stopped
    pub async fn next_event(&mut self) -> Option<ClientEvent> {
        self.event_rx.recv().await
    }

    /// Send a chat line with this client's name prefixed
    pub async fn send_chat(&self, text: &str) -> Result<()> {
        self.connection.send(&chat_line(&self.name, text)).await
    }

    /// Send a line exactly as given
    pub async fn send_raw(&self, line: &str) -> Result<()> {
        self.connection.send(line).await
    }

    /// Announce departure and close the connection
    pub async fn leave(&self) -> Result<()> {
        let result = self
            .connection
            .send(&Message::Exit(self.name.clone()).encode())
            .await;
        self.connection.close().await;
        result
    }

    pub fn is_connected(&self) -> bool {
        !self.connection.is_closed()
    }
}

/// Forward inbound lines until the stream ends
async fn reader_task(connection: Arc<Connection>, event_tx: mpsc::Sender<ClientEvent>) {
    loop {
        match connection.receive().await {
            Ok(line) => {
                if event_tx.send(ClientEvent::Line(line)).await.is_err() {
                    debug!("Client handle dropped, stopping reader");
                    return;
                }
            }
            Err(e) if e.is_disconnect() => {
                debug!(error = %e, "Server connection ended");
                break;
            }
            Err(e) => {
                warn!(error = %e, "Read error");
                break;
            }
        }
    }

    connection.close().await;
    let _ = event_tx.send(ClientEvent::Disconnected).await;
    info!("Disconnected from server");
}
