//! Consistent hashing ring with a TCP messaging hub.
//!
//! This crate provides two tightly coupled pieces:
//! - An immutable, versioned [`RingTable`] that maps partitions and
//!   their replicas to cluster nodes and answers "who owns partition P"
//!   and "am I one of them".
//! - A [`MsgHub`] that lets nodes in such a ring exchange typed binary
//!   messages over persistent TCP connections, including fan-out
//!   delivery to every replica-holder of a partition.
//!
//! # Example
//!
//! ```rust,no_run
//! use ringhub::{HubConfig, MsgHub, NodeRegistry, RingTable};
//! use std::sync::Arc;
//!
//! # async fn run(my_handler: Arc<dyn ringhub::MsgHandler>, msg: Arc<dyn ringhub::Msg>) -> ringhub::Result<()> {
//! // The assignment table comes from an external ring builder.
//! let ring = Arc::new(RingTable::new(
//!     1,                        // version
//!     2,                        // partition bit count (4 partitions)
//!     vec![10, 20, 30],         // node IDs
//!     vec![vec![0; 4], vec![1; 4], vec![2; 4]],
//!     Some(10),                 // local node
//! )?);
//!
//! let registry = Arc::new(NodeRegistry::new());
//! registry.add_node(20, vec!["10.0.0.2:9000".to_string()]);
//! registry.add_node(30, vec!["10.0.0.3:9000".to_string()]);
//!
//! let hub = Arc::new(MsgHub::new(ring.clone(), registry, HubConfig::new()));
//! hub.set_handler(42, my_handler);
//!
//! // Serve inbound frames.
//! let server = hub.clone();
//! tokio::spawn(async move { server.listen("10.0.0.1:9000").await });
//!
//! // Derive a partition from a key hash and fan out to its replicas.
//! let partition = ring.partition_for_hash(0xdead_beef_dead_beef);
//! hub.send_to_replicas(ring.version(), partition, msg).await;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! ```text
//! caller ──▶ RingTable::responsible_ids ──▶ MsgHub::send_to_replicas
//!                                               │ one task per target
//!                                               ▼
//!                                        ConnectionPool ──▶ frame ──▶ TCP
//!
//! TCP ──▶ accept loop ──▶ decode loop ──▶ MsgHandler (per msg type)
//! ```
//!
//! # Consistency and concurrency
//!
//! - The ring table is immutable after construction; readers never lock.
//! - Writes to one destination connection are serialized by that
//!   connection's send lock, so frames are never byte-interleaved.
//! - A broadcast attempts every target and completes the message exactly
//!   once after all attempts finish, regardless of failures.

pub mod config;
pub mod error;
pub mod msg;
pub mod network;
pub mod ring;
pub mod types;

pub use config::HubConfig;
pub use error::{Error, NetworkError, Result, RingError};
pub use msg::{Msg, MsgHandler};
pub use network::MsgHub;
pub use ring::{NodeRegistry, RingTable};
pub use types::{NodeId, Partition, RingVersion};
