//! Network error types

use std::io;

/// Network result type
pub type Result<T> = std::result::Result<T, Error>;

/// Network errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Read or write failure on an open stream
    #[error("Transport error: {0}")]
    Transport(#[from] io::Error),

    /// Peer closed the stream
    #[error("End of stream")]
    EndOfStream,

    /// Connection was closed locally
    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Listening socket could not be opened
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// True when the error means the link is gone rather than a bad frame
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            Error::EndOfStream | Error::ConnectionClosed | Error::Transport(_)
        )
    }
}
