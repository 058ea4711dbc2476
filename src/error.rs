//! Error types for the ring and messaging layers.

use crate::types::{NodeId, RingVersion};
use std::io;
use thiserror::Error;

/// Result type alias for ring hub operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the ring hub.
#[derive(Error, Debug)]
pub enum Error {
    /// Ring snapshot errors.
    #[error("ring error: {0}")]
    Ring(#[from] RingError),

    /// Network communication errors.
    #[error("network error: {0}")]
    Network(#[from] NetworkError),
}

/// Ring snapshot related errors.
#[derive(Error, Debug)]
pub enum RingError {
    /// Partition bit count cannot address a u32 partition space.
    #[error("invalid partition bit count: {0}")]
    InvalidPartitionBitCount(u16),

    /// A replica row does not cover every partition.
    #[error("assignment row {replica} has {got} partitions, expected {expected}")]
    AssignmentShape {
        replica: usize,
        got: usize,
        expected: usize,
    },

    /// An assignment entry points outside the node list.
    #[error("assignment[{replica}][{partition}] = {index} is not a valid node index (node count {node_count})")]
    InvalidNodeIndex {
        replica: usize,
        partition: usize,
        index: u32,
        node_count: usize,
    },

    /// The configured local node ID is not in the node list.
    #[error("local node {0} not found in ring")]
    UnknownLocalNode(NodeId),

    /// A request was built against a different ring version.
    #[error("stale ring version: requested {requested}, current {current}")]
    StaleVersion {
        requested: RingVersion,
        current: RingVersion,
    },
}

/// Network communication errors.
#[derive(Error, Debug)]
pub enum NetworkError {
    /// Outbound connect failed.
    #[error("connection failed to {addr}: {reason}")]
    ConnectionFailed { addr: String, reason: String },

    /// No address known for a node at the configured address index.
    #[error("no address for node {node_id} at index {index}")]
    NoAddress { node_id: NodeId, index: usize },

    /// Inbound frame declared a type with no registered handler.
    #[error("unknown message type: {0}")]
    UnknownMsgType(u64),

    /// A message wrote fewer or more bytes than it declared.
    #[error("message declared {expected} bytes but wrote {written}")]
    ShortWrite { expected: u64, written: u64 },

    /// A handler consumed fewer or more bytes than the frame declared.
    #[error("frame declared {expected} bytes but handler consumed {consumed}")]
    ShortConsume { expected: u64, consumed: u64 },

    /// Inbound frame payload exceeds the configured maximum.
    #[error("message too large: {length} bytes (max {max})")]
    MessageTooLarge { length: u64, max: u64 },

    /// An I/O operation exceeded its idle deadline.
    #[error("operation timed out")]
    Timeout,

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
