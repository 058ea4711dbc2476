//! Wire framing.
//!
//! One frame is `type: u64 LE || length: u64 LE || payload`, with exactly
//! `length` payload bytes. Interoperating peers must reproduce this
//! framing bit-exactly. Every read and write is bounded by the idle
//! timeout so a stalled peer fails the operation instead of blocking
//! forever.

use crate::error::NetworkError;
use crate::msg::Msg;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FrameHeader {
    pub msg_type: u64,
    pub length: u64,
}

/// Write one complete frame and flush.
///
/// The caller must hold the destination connection's send lock for the
/// whole call so the frame is atomic with respect to other writers. A
/// payload shorter or longer than the declared length is reported as
/// `ShortWrite`; the stream framing is broken at that point and the
/// connection should be discarded.
pub(crate) async fn write_frame<W>(
    writer: &mut W,
    msg: &dyn Msg,
    idle_timeout: Duration,
) -> Result<(), NetworkError>
where
    W: AsyncWrite + Unpin + Send,
{
    let declared = msg.msg_length();

    timeout(idle_timeout, async {
        writer.write_u64_le(msg.msg_type()).await?;
        writer.write_u64_le(declared).await
    })
    .await
    .map_err(|_| NetworkError::Timeout)??;

    let written = timeout(idle_timeout, msg.write_content(&mut *writer))
        .await
        .map_err(|_| NetworkError::Timeout)??;

    timeout(idle_timeout, writer.flush())
        .await
        .map_err(|_| NetworkError::Timeout)??;

    if written != declared {
        return Err(NetworkError::ShortWrite {
            expected: declared,
            written,
        });
    }
    Ok(())
}

/// Read one frame header.
///
/// Returns `Ok(None)` when the peer closed the connection cleanly at a
/// frame boundary. EOF after the type field has arrived is a truncated
/// header and therefore an error.
pub(crate) async fn read_header<R>(
    reader: &mut R,
    idle_timeout: Duration,
) -> Result<Option<FrameHeader>, NetworkError>
where
    R: AsyncRead + Unpin,
{
    let msg_type = match timeout(idle_timeout, reader.read_u64_le()).await {
        Err(_) => return Err(NetworkError::Timeout),
        Ok(Err(e)) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Ok(Err(e)) => return Err(e.into()),
        Ok(Ok(msg_type)) => msg_type,
    };

    let length = timeout(idle_timeout, reader.read_u64_le())
        .await
        .map_err(|_| NetworkError::Timeout)??;

    Ok(Some(FrameHeader { msg_type, length }))
}
