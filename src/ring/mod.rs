//! Consistent hashing ring: immutable snapshot lookups and the node
//! address registry.

pub mod registry;
pub mod table;

pub use registry::NodeRegistry;
pub use table::RingTable;
