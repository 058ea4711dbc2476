//! Core types used throughout the ring and messaging layers.

/// Node identifier in the cluster.
pub type NodeId = u64;

/// Partition number; one of `2^partition_bit_count` buckets that keys
/// hash into.
pub type Partition = u32;

/// Monotonically increasing identifier for a ring snapshot. A server
/// working with one version can detect requests that were built against
/// an older or newer assignment table.
pub type RingVersion = i64;
