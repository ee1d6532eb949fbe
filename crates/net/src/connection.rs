//! A framed, bidirectional link to one remote peer
//!
//! Reads and writes are guarded separately so one reader task and any
//! number of broadcasting writers can share a connection. Frames from
//! concurrent writers never interleave.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{watch, Mutex};
use tracing::debug;

use crate::error::{Error, Result};
use crate::frame::{read_frame, write_frame};

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// One framed stream
pub struct Connection {
    peer: String,
    reader: Mutex<BoxedReader>,
    writer: Mutex<BoxedWriter>,
    closed: watch::Sender<bool>,
    send_timeout: Option<Duration>,
}

impl Connection {
    /// Wrap any byte stream
    pub fn new<S>(stream: S, peer: impl Into<String>) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        let (closed, _) = watch::channel(false);

        Self {
            peer: peer.into(),
            reader: Mutex::new(Box::new(reader)),
            writer: Mutex::new(Box::new(writer)),
            closed,
            send_timeout: None,
        }
    }

    /// Wrap an accepted or dialed TCP stream, labelled with its remote address
    pub fn from_tcp(stream: TcpStream) -> Self {
        let peer = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        if let Err(e) = stream.set_nodelay(true) {
            debug!(peer = %peer, error = %e, "Failed to set TCP_NODELAY");
        }
        Self::new(stream, peer)
    }

    /// Bound how long a single send may wait on backpressure
    pub fn with_send_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Remote peer label
    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Send one line as a single frame
    pub async fn send(&self, line: &str) -> Result<()> {
        if self.is_closed() {
            return Err(Error::ConnectionClosed);
        }

        let mut writer = self.writer.lock().await;

        // May have been closed while waiting for the writer
        if self.is_closed() {
            return Err(Error::ConnectionClosed);
        }

        let Some(limit) = self.send_timeout else {
            return write_frame(&mut *writer, line).await;
        };

        match tokio::time::timeout(limit, write_frame(&mut *writer, line)).await {
            Ok(result) => result,
            Err(_) => {
                // A partial frame may be on the wire, nothing after it is decodable
                self.closed.send_replace(true);
                debug!(peer = %self.peer, "Send timed out, connection closed");
                Err(Error::Transport(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "send timed out",
                )))
            }
        }
    }

    /// Wait for the next complete line
    pub async fn receive(&self) -> Result<String> {
        let mut closed = self.closed.subscribe();
        if *closed.borrow_and_update() {
            return Err(Error::ConnectionClosed);
        }

        let mut reader = self.reader.lock().await;

        tokio::select! {
            result = read_frame(&mut *reader) => result,
            _ = closed.wait_for(|closed| *closed) => Err(Error::ConnectionClosed),
        }
    }

    /// Close both directions. Safe to call more than once.
    pub async fn close(&self) {
        if self.closed.send_replace(true) {
            return;
        }

        // A writer stuck on backpressure keeps the lock; the stream is
        // released when the last handle drops in that case
        if let Ok(mut writer) = self.writer.try_lock() {
            if let Err(e) = writer.shutdown().await {
                debug!(peer = %self.peer, error = %e, "Shutdown failed");
            }
        }

        debug!(peer = %self.peer, "Connection closed");
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("peer", &self.peer)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Two connections joined by an in-memory pipe
    fn pair() -> (Connection, Connection) {
        let (a, b) = tokio::io::duplex(1024);
        (Connection::new(a, "a"), Connection::new(b, "b"))
    }

    #[tokio::test]
    async fn test_send_receive() {
        let (a, b) = pair();
        a.send("hello").await.unwrap();
        a.send("world").await.unwrap();
        assert_eq!(b.receive().await.unwrap(), "hello");
        assert_eq!(b.receive().await.unwrap(), "world");
    }

    #[tokio::test]
    async fn test_closed_connection_rejects_io() {
        let (a, _b) = pair();
        a.close().await;
        assert!(a.is_closed());
        assert!(matches!(a.send("x").await, Err(Error::ConnectionClosed)));
        assert!(matches!(a.receive().await, Err(Error::ConnectionClosed)));

        // Idempotent
        a.close().await;
        assert!(a.is_closed());
    }

    #[tokio::test]
    async fn test_peer_close_is_end_of_stream() {
        let (a, b) = pair();
        a.close().await;
        assert!(matches!(b.receive().await, Err(Error::EndOfStream)));
    }

    #[tokio::test]
    async fn test_close_wakes_blocked_reader() {
        let (a, _b) = pair();
        let a = Arc::new(a);

        let reader = {
            let a = a.clone();
            tokio::spawn(async move { a.receive().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        a.close().await;

        let result = tokio::time::timeout(Duration::from_secs(1), reader)
            .await
            .expect("reader should wake")
            .unwrap();
        assert!(matches!(result, Err(Error::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_concurrent_senders_do_not_interleave() {
        let (a, b) = pair();
        let a = Arc::new(a);

        let mut handles = Vec::new();
        for i in 0..8 {
            let a = a.clone();
            handles.push(tokio::spawn(async move {
                let line = format!("{}", i).repeat(300);
                a.send(&line).await.unwrap();
            }));
        }

        let mut seen = Vec::new();
        for _ in 0..8 {
            let line = b.receive().await.unwrap();
            assert_eq!(line.len(), 300);
            let first = line.chars().next().unwrap();
            assert!(line.chars().all(|c| c == first));
            seen.push(first);
        }
        for h in handles {
            h.await.unwrap();
        }

        seen.sort();
        assert_eq!(seen, vec!['0', '1', '2', '3', '4', '5', '6', '7']);
    }

    #[tokio::test]
    async fn test_send_timeout_closes_connection() {
        // Tiny pipe that nobody drains
        let (a, _b) = tokio::io::duplex(8);
        let a = Connection::new(a, "a").with_send_timeout(Some(Duration::from_millis(50)));

        let result = a.send(&"x".repeat(64)).await;
        match result {
            Err(Error::Transport(e)) => assert_eq!(e.kind(), io::ErrorKind::TimedOut),
            other => panic!("expected timeout, got {:?}", other),
        }
        assert!(a.is_closed());
    }
}
