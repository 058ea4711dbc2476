//! Message and handler capability traits.
//!
//! Messages are supplied by callers; the hub only needs a type tag, a
//! declared length, a way to stream the payload onto a connection, and a
//! completion callback. Handlers are the inverse: given a reader bounded
//! to a frame's declared length, they consume the payload and report how
//! many bytes they read.

use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncRead, AsyncWrite};

/// A message that can be delivered through the hub.
///
/// `done` is invoked exactly once when a delivery attempt (single-target
/// or broadcast) finishes, successful or not; callers use it to release
/// resources or unblock waiters.
#[async_trait]
pub trait Msg: Send + Sync + 'static {
    /// Numeric type tag; selects the handler on the receiving side.
    fn msg_type(&self) -> u64;

    /// Declared payload length in bytes. `write_content` must write
    /// exactly this many bytes.
    fn msg_length(&self) -> u64;

    /// Stream the payload to a connection. Returns the number of bytes
    /// written.
    async fn write_content(
        &self,
        writer: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> io::Result<u64>;

    /// Delivery attempt finished.
    fn done(&self);
}

/// Per-message-type decode routine invoked by the hub's decode loop.
///
/// The reader is bounded to exactly `length` bytes; on success the
/// handler must consume all of them and return the count. A mismatch is
/// a protocol error and closes the connection.
#[async_trait]
pub trait MsgHandler: Send + Sync + 'static {
    async fn handle(
        &self,
        reader: &mut (dyn AsyncRead + Unpin + Send),
        length: u64,
    ) -> io::Result<u64>;
}
