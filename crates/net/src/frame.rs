//! Length-prefixed string encoding/decoding
//!
//! Wire format: [2-byte big-endian length][UTF-8 payload]
//! Maximum frame size: 65535 bytes (the prefix width)
//!
//! Payloads are standard UTF-8. Java's modified UTF-8 (NUL as `C0 80`,
//! supplementary characters as encoded surrogate pairs) is rejected with
//! [`Error::Protocol`], so peers sending `writeUTF` output must avoid those
//! characters.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};

/// Maximum allowed payload size
pub const MAX_FRAME_SIZE: usize = u16::MAX as usize;

fn map_read_err(e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        Error::EndOfStream
    } else {
        Error::Transport(e)
    }
}

/// Read one length-prefixed string from a stream.
///
/// The payload must be standard UTF-8.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<String> {
    let mut len_buf = [0u8; 2];
    reader.read_exact(&mut len_buf).await.map_err(map_read_err)?;

    let len = u16::from_be_bytes(len_buf) as usize;

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await.map_err(map_read_err)?;

    String::from_utf8(payload).map_err(|e| Error::Protocol(format!("Invalid UTF-8: {}", e)))
}

/// Write one length-prefixed string to a stream
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, line: &str) -> Result<()> {
    let payload = line.as_bytes();
    if payload.len() > MAX_FRAME_SIZE {
        return Err(Error::Protocol(format!(
            "Message too large: {} bytes (max {})",
            payload.len(),
            MAX_FRAME_SIZE
        )));
    }

    // Prefix and payload go out in one write so a cancelled send never
    // leaves a bare length on the wire
    let mut buf = Vec::with_capacity(2 + payload.len());
    buf.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    buf.extend_from_slice(payload);

    writer.write_all(&buf).await?;
    writer.flush().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn test_frame_layout() {
        let mut buf = Vec::new();
        write_frame(&mut buf, "hi").await.unwrap();
        assert_eq!(buf, vec![0, 2, b'h', b'i']);
    }

    #[tokio::test]
    async fn test_multiple_frames_in_order() {
        let mut buf = Vec::new();
        write_frame(&mut buf, "nameAlice").await.unwrap();
        write_frame(&mut buf, "").await.unwrap();
        write_frame(&mut buf, "<Alice> h\u{e9}llo").await.unwrap();

        let mut cursor = Cursor::new(buf);
        assert_eq!(read_frame(&mut cursor).await.unwrap(), "nameAlice");
        assert_eq!(read_frame(&mut cursor).await.unwrap(), "");
        assert_eq!(read_frame(&mut cursor).await.unwrap(), "<Alice> h\u{e9}llo");
        assert!(matches!(
            read_frame(&mut cursor).await,
            Err(Error::EndOfStream)
        ));
    }

    #[tokio::test]
    async fn test_truncated_frame_is_end_of_stream() {
        // Length says 5, only 2 bytes follow
        let mut cursor = Cursor::new(vec![0, 5, b'a', b'b']);
        let result = read_frame(&mut cursor).await;
        assert!(matches!(result, Err(Error::EndOfStream)));
    }

    #[tokio::test]
    async fn test_invalid_utf8_rejected() {
        let mut cursor = Cursor::new(vec![0, 2, 0xff, 0xfe]);
        let result = read_frame(&mut cursor).await;
        assert!(matches!(result, Err(Error::Protocol(_))));
    }

    #[tokio::test]
    async fn test_modified_utf8_nul_rejected() {
        let mut cursor = Cursor::new(vec![0, 2, 0xc0, 0x80]);
        let result = read_frame(&mut cursor).await;
        assert!(matches!(result, Err(Error::Protocol(_))));
    }

    #[tokio::test]
    async fn test_supplementary_character_as_four_bytes() {
        let mut buf = Vec::new();
        write_frame(&mut buf, "\u{1f600}").await.unwrap();
        assert_eq!(buf, vec![0, 4, 0xf0, 0x9f, 0x98, 0x80]);
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let line = "x".repeat(MAX_FRAME_SIZE + 1);
        let mut buf = Vec::new();
        let result = write_frame(&mut buf, &line).await;
        assert!(matches!(result, Err(Error::Protocol(_))));
        assert!(buf.is_empty());
    }
}
