//! Outbound connection pool.
//!
//! One persistent connection per destination address, created lazily on
//! first send. The pool map has its own structural lock; each connection
//! carries an independent send lock that serializes writers, so frames
//! from concurrent senders are never interleaved on the wire.

use crate::config::DEFAULT_CHUNK_SIZE;
use crate::error::NetworkError;
use crate::msg::Msg;
use crate::network::frame;
use parking_lot::Mutex;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufWriter;
use tokio::net::TcpStream;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::timeout;
use tracing::debug;

/// A pooled outbound connection with its send lock.
#[derive(Debug)]
pub(crate) struct PooledConn {
    addr: String,
    writer: AsyncMutex<BufWriter<TcpStream>>,
}

impl PooledConn {
    fn new(addr: String, stream: TcpStream) -> Self {
        Self {
            addr,
            writer: AsyncMutex::new(BufWriter::with_capacity(DEFAULT_CHUNK_SIZE, stream)),
        }
    }

    pub(crate) fn addr(&self) -> &str {
        &self.addr
    }

    /// Write one frame, holding the send lock for the full
    /// encode-and-flush.
    pub(crate) async fn send(
        &self,
        msg: &dyn Msg,
        idle_timeout: Duration,
    ) -> Result<(), NetworkError> {
        let mut writer = self.writer.lock().await;
        frame::write_frame(&mut *writer, msg, idle_timeout).await
    }
}

/// Address to connection mapping with dial-or-reuse semantics.
pub(crate) struct ConnectionPool {
    conns: Mutex<HashMap<String, Arc<PooledConn>>>,
    connect_timeout: Duration,
}

impl ConnectionPool {
    pub(crate) fn new(connect_timeout: Duration) -> Self {
        Self {
            conns: Mutex::new(HashMap::new()),
            connect_timeout,
        }
    }

    /// Return the pooled connection for `addr`, dialing if absent.
    ///
    /// A failed dial caches nothing. When two tasks race to dial the
    /// same address the first insert wins and the loser's stream is
    /// dropped.
    pub(crate) async fn get_or_dial(&self, addr: &str) -> Result<Arc<PooledConn>, NetworkError> {
        if let Some(conn) = self.conns.lock().get(addr) {
            return Ok(conn.clone());
        }

        let stream = timeout(self.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| NetworkError::ConnectionFailed {
                addr: addr.to_string(),
                reason: "connect timeout".to_string(),
            })?
            .map_err(|e| NetworkError::ConnectionFailed {
                addr: addr.to_string(),
                reason: e.to_string(),
            })?;

        debug!(%addr, "Connection established");
        let conn = Arc::new(PooledConn::new(addr.to_string(), stream));

        match self.conns.lock().entry(addr.to_string()) {
            Entry::Occupied(existing) => Ok(existing.get().clone()),
            Entry::Vacant(slot) => {
                slot.insert(conn.clone());
                Ok(conn)
            }
        }
    }

    /// Drop a broken connection so the next send redials.
    ///
    /// Pointer-identity guarded: a newer connection already pooled for
    /// the same address is left alone.
    pub(crate) fn evict(&self, conn: &Arc<PooledConn>) {
        let mut conns = self.conns.lock();
        if let Some(existing) = conns.get(conn.addr()) {
            if Arc::ptr_eq(existing, conn) {
                conns.remove(conn.addr());
                debug!(addr = %conn.addr(), "Connection evicted");
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.conns.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_dial_then_reuse() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let pool = ConnectionPool::new(Duration::from_secs(1));
        let first = pool.get_or_dial(&addr).await.unwrap();
        let second = pool.get_or_dial(&addr).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(pool.len(), 1);
        assert_eq!(first.addr(), addr);
    }

    #[tokio::test]
    async fn test_failed_dial_caches_nothing() {
        // Bind and drop to get an address nothing is listening on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let pool = ConnectionPool::new(Duration::from_secs(1));
        let err = pool.get_or_dial(&addr).await.unwrap_err();
        assert!(matches!(err, NetworkError::ConnectionFailed { .. }));
        assert_eq!(pool.len(), 0);
    }

    #[tokio::test]
    async fn test_evict_forces_redial() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let pool = ConnectionPool::new(Duration::from_secs(1));
        let first = pool.get_or_dial(&addr).await.unwrap();

        pool.evict(&first);
        assert_eq!(pool.len(), 0);

        let second = pool.get_or_dial(&addr).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));

        // Evicting the stale handle must not remove the new connection.
        pool.evict(&first);
        assert_eq!(pool.len(), 1);
    }
}
