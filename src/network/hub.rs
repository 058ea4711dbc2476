//! Messaging hub: inbound dispatch and outbound fan-out.
//!
//! The hub ties the ring to the wire. Inbound, it accepts connections
//! forever and runs one decode loop per connection, dispatching each
//! frame to the handler registered for its type; any protocol violation
//! closes the connection, since a desynced stream cannot be resumed.
//! Outbound, it delivers messages to single nodes or fans out to every
//! replica-holder of a partition, pooling one connection per address.

use crate::config::{HubConfig, DEFAULT_CHUNK_SIZE};
use crate::error::{Error, NetworkError, Result, RingError};
use crate::msg::{Msg, MsgHandler};
use crate::network::frame;
use crate::network::pool::ConnectionPool;
use crate::ring::{NodeRegistry, RingTable};
use crate::types::{NodeId, Partition, RingVersion};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, error, info, trace, warn};

type HandlerMap = HashMap<u64, Arc<dyn MsgHandler>>;

/// Messaging hub for a ring of nodes.
pub struct MsgHub {
    /// Current ring snapshot.
    ring: Arc<RingTable>,

    /// Node ID to address resolution.
    registry: Arc<NodeRegistry>,

    /// Per-message-type decode handlers.
    handlers: Arc<RwLock<HandlerMap>>,

    /// Outbound connections, one per destination address.
    pool: Arc<ConnectionPool>,

    config: HubConfig,
}

impl MsgHub {
    /// Create a hub over a ring snapshot and a node registry.
    pub fn new(ring: Arc<RingTable>, registry: Arc<NodeRegistry>, config: HubConfig) -> Self {
        let pool = Arc::new(ConnectionPool::new(config.connect_timeout));
        Self {
            ring,
            registry,
            handlers: Arc::new(RwLock::new(HashMap::new())),
            pool,
            config,
        }
    }

    /// The ring snapshot this hub routes against.
    pub fn ring(&self) -> &RingTable {
        &self.ring
    }

    /// The node registry this hub resolves addresses through.
    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// Largest inbound frame payload this hub accepts.
    pub fn max_msg_length(&self) -> u64 {
        self.config.max_msg_length
    }

    /// Register the handler for a message type, replacing any previous
    /// one. Safe to call while the hub is serving.
    pub fn set_handler(&self, msg_type: u64, handler: Arc<dyn MsgHandler>) {
        self.handlers.write().insert(msg_type, handler);
    }

    /// Bind `bind_addr` and accept inbound connections forever.
    ///
    /// Returns only if binding or listening itself fails; per-connection
    /// errors are logged and do not stop the accept loop.
    pub async fn listen(&self, bind_addr: &str) -> Result<()> {
        let listener = TcpListener::bind(bind_addr)
            .await
            .map_err(NetworkError::Io)?;
        self.serve(listener).await
    }

    /// Accept loop over an already bound listener.
    pub(crate) async fn serve(&self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr().map_err(NetworkError::Io)?;
        info!(addr = %local_addr, "Hub listening");

        loop {
            match listener.accept().await {
                Ok((stream, peer_addr)) => {
                    debug!(peer = %peer_addr, "Accepted connection");
                    let handlers = self.handlers.clone();
                    let config = self.config.clone();
                    tokio::spawn(async move {
                        match Self::decode_loop(stream, handlers, config).await {
                            Ok(()) => debug!(peer = %peer_addr, "Connection closed by peer"),
                            Err(e) => {
                                warn!(peer = %peer_addr, error = %e, "Closing connection")
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    /// Per-connection decode loop.
    ///
    /// Runs until the peer closes cleanly at a frame boundary or a
    /// protocol error occurs. Dropping the stream on exit closes the
    /// connection; there is no frame resynchronization.
    async fn decode_loop(
        stream: TcpStream,
        handlers: Arc<RwLock<HandlerMap>>,
        config: HubConfig,
    ) -> std::result::Result<(), NetworkError> {
        let mut reader = BufReader::with_capacity(DEFAULT_CHUNK_SIZE, stream);

        loop {
            let header = match frame::read_header(&mut reader, config.idle_timeout).await? {
                Some(header) => header,
                None => return Ok(()),
            };
            trace!(
                msg_type = header.msg_type,
                length = header.length,
                "Frame received"
            );

            let handler = handlers
                .read()
                .get(&header.msg_type)
                .cloned()
                .ok_or(NetworkError::UnknownMsgType(header.msg_type))?;

            if header.length > config.max_msg_length {
                return Err(NetworkError::MessageTooLarge {
                    length: header.length,
                    max: config.max_msg_length,
                });
            }

            let mut bounded = (&mut reader).take(header.length);
            let consumed = timeout(config.idle_timeout, handler.handle(&mut bounded, header.length))
                .await
                .map_err(|_| NetworkError::Timeout)??;

            if consumed != header.length {
                return Err(NetworkError::ShortConsume {
                    expected: header.length,
                    consumed,
                });
            }
        }
    }

    /// Send a message to one node; errors are logged, not returned.
    ///
    /// `msg.done()` fires exactly once when the attempt finishes,
    /// successful or not.
    pub async fn send_to_node(&self, node_id: NodeId, msg: Arc<dyn Msg>) {
        if let Err(e) = deliver(&self.pool, &self.registry, &self.config, node_id, msg.as_ref()).await
        {
            warn!(node_id, error = %e, "Send failed");
        }
        msg.done();
    }

    /// Send a message to one node, surfacing the outcome.
    ///
    /// `msg.done()` still fires exactly once.
    pub async fn send_to_node_result(&self, node_id: NodeId, msg: Arc<dyn Msg>) -> Result<()> {
        let result =
            deliver(&self.pool, &self.registry, &self.config, node_id, msg.as_ref()).await;
        msg.done();
        result.map_err(Error::from)
    }

    /// Send a message to every replica-holder of a partition; errors are
    /// logged, not returned.
    ///
    /// Each target gets its own send task; no target's failure
    /// short-circuits the others. `msg.done()` fires exactly once, only
    /// after every target's attempt has finished. A `ring_version` that
    /// does not match the current snapshot is rejected: nothing is sent
    /// and the message completes immediately.
    pub async fn send_to_replicas(
        &self,
        ring_version: RingVersion,
        partition: Partition,
        msg: Arc<dyn Msg>,
    ) {
        if ring_version != self.ring.version() {
            warn!(
                requested = ring_version,
                current = self.ring.version(),
                partition,
                "Stale ring version, dropping broadcast"
            );
            msg.done();
            return;
        }

        let targets = self.ring.responsible_ids(partition);
        let mut rx = self.fan_out(&targets, &msg);
        while rx.recv().await.is_some() {}
        msg.done();
    }

    /// Send a message to every replica-holder of a partition, returning
    /// one outcome per target (in completion order) after all attempts
    /// have finished.
    ///
    /// A stale `ring_version` is an error; no sends are attempted, but
    /// `msg.done()` still fires exactly once.
    pub async fn send_to_replicas_result(
        &self,
        ring_version: RingVersion,
        partition: Partition,
        msg: Arc<dyn Msg>,
    ) -> Result<Vec<(NodeId, Result<()>)>> {
        if ring_version != self.ring.version() {
            msg.done();
            return Err(RingError::StaleVersion {
                requested: ring_version,
                current: self.ring.version(),
            }
            .into());
        }

        let targets = self.ring.responsible_ids(partition);
        let mut rx = self.fan_out(&targets, &msg);
        let mut outcomes = Vec::with_capacity(targets.len());
        while let Some((node_id, result)) = rx.recv().await {
            outcomes.push((node_id, result.map_err(Error::from)));
        }
        msg.done();
        Ok(outcomes)
    }

    /// Spawn one send task per target; each reports completion through
    /// the returned channel, which closes once every attempt finishes.
    fn fan_out(
        &self,
        targets: &[NodeId],
        msg: &Arc<dyn Msg>,
    ) -> mpsc::Receiver<(NodeId, std::result::Result<(), NetworkError>)> {
        let (tx, rx) = mpsc::channel(targets.len().max(1));

        for &node_id in targets {
            let pool = self.pool.clone();
            let registry = self.registry.clone();
            let config = self.config.clone();
            let msg = msg.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = deliver(&pool, &registry, &config, node_id, msg.as_ref()).await;
                if let Err(e) = &result {
                    warn!(node_id, error = %e, "Replica send failed");
                }
                let _ = tx.send((node_id, result)).await;
            });
        }

        rx
    }
}

/// Resolve, dial-or-reuse, and write one frame under the connection's
/// send lock. Any failure after a connection exists evicts it from the
/// pool so the next send redials.
async fn deliver(
    pool: &ConnectionPool,
    registry: &NodeRegistry,
    config: &HubConfig,
    node_id: NodeId,
    msg: &dyn Msg,
) -> std::result::Result<(), NetworkError> {
    let addr = registry
        .address(node_id, config.address_index)
        .ok_or(NetworkError::NoAddress {
            node_id,
            index: config.address_index,
        })?;

    let conn = pool.get_or_dial(&addr).await?;

    if let Err(e) = conn.send(msg, config.idle_timeout).await {
        // A failed or mis-framed write leaves the stream unusable.
        pool.evict(&conn);
        return Err(e);
    }
    trace!(node_id, %addr, msg_type = msg.msg_type(), "Frame sent");
    Ok(())
}

impl std::fmt::Debug for MsgHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MsgHub")
            .field("ring_version", &self.ring.version())
            .field("config", &self.config)
            .finish()
    }
}
