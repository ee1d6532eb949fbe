//! Server-side state of one connected participant
//!
//! A session reads one message at a time from its connection and hands
//! each event to the registry. It ends on a leave notice or when the
//! link drops; only the former is announced to the room.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::connection::Connection;
use crate::error::Error;
use crate::protocol::Message;
use crate::registry::{Registry, SessionId};

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unnamed,
    Named,
    /// Terminal
    Closed,
}

/// One participant's connection and name
pub struct ClientSession {
    id: SessionId,
    connection: Arc<Connection>,
    registry: Registry,
    name: Option<String>,
    state: SessionState,
}

impl ClientSession {
    pub fn new(id: SessionId, connection: Arc<Connection>, registry: Registry) -> Self {
        Self {
            id,
            connection,
            registry,
            name: None,
            state: SessionState::Unnamed,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Read loop. Returns once the session is closed and unregistered.
    pub async fn run(mut self) -> SessionState {
        while self.state != SessionState::Closed {
            match self.connection.receive().await {
                Ok(raw) => self.handle(Message::parse(&raw)).await,
                Err(Error::EndOfStream) | Err(Error::ConnectionClosed) => {
                    debug!(session = %self.id, "Connection ended");
                    self.close().await;
                }
                Err(e) => {
                    warn!(session = %self.id, error = %e, "Read error");
                    self.close().await;
                }
            }
        }
        self.state
    }

    async fn handle(&mut self, msg: Message) {
        match msg {
            Message::Name(name) => {
                if self.name.is_none() {
                    self.name = Some(name.clone());
                    self.state = SessionState::Named;
                }
                self.registry.set_name(self.id, &name).await;
            }
            Message::Exit(name) => {
                if self.registry.remove_by_name(&name).await.is_none() {
                    debug!(session = %self.id, name = %name, "Leave notice for unknown name");
                }
                self.close().await;
            }
            Message::Chat(line) => {
                info!("{}", line);
                self.registry.broadcast(&line).await;
            }
        }
    }

    /// Unregisters, then closes the link
    async fn close(&mut self) {
        self.state = SessionState::Closed;
        self.registry.remove(self.id).await;
        self.connection.close().await;
    }
}
