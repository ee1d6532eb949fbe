//! Natter Network Library
//!
//! Single-room TCP chat: every line a client sends is broadcast to every
//! connected client.
//!
//! # Architecture
//!
//! - **Connection**: one framed stream, safe for one reader and many writers
//! - **ClientSession**: per-connection read loop (unnamed → named → closed)
//! - **Registry**: the locked set of sessions; joins, leaves and broadcasts
//! - **Server**: accepts connections and spawns their sessions
//! - **Client**: dials a server on behalf of a presentation layer
//! - **Protocol**: length-prefixed UTF-8 strings, `name`/`exit` tagged notices
//!
//! # Usage
//!
//! ```ignore
//! let server = Server::start(&ServerConfig::default()).await?;
//!
//! let mut client = Client::connect("localhost", DEFAULT_PORT, "alice").await?;
//! client.send_chat("hello").await?;
//! while let Some(ClientEvent::Line(line)) = client.next_event().await {
//!     println!("{}", line);
//! }
//! ```

pub mod client;
pub mod connection;
pub mod error;
mod frame;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod session;

pub use client::{Client, ClientEvent};
pub use connection::Connection;
pub use error::{Error, Result};
pub use frame::MAX_FRAME_SIZE;
pub use protocol::Message;
pub use registry::{Registry, SessionId};
pub use server::{Server, ServerConfig};
pub use session::{ClientSession, SessionState};

/// Default port for Natter servers
pub const DEFAULT_PORT: u16 = 14001;

/// Default host clients dial and servers bind
pub const DEFAULT_ADDRESS: &str = "localhost";

/// Default bound on one send to a recipient that has stopped reading
pub const DEFAULT_SEND_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);
