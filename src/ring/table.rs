//! Immutable ring snapshot.
//!
//! A `RingTable` answers "which nodes own partition P" and "is the local
//! node one of them". It is built once from an externally computed
//! assignment table and never mutated, so concurrent readers need no
//! synchronization. Keeping replicas of a partition on distinct tiers
//! (devices, servers, cabinets, rooms, data centers) is the builder's
//! job; the table consumes and trusts the result.

use crate::error::RingError;
use crate::types::{NodeId, Partition, RingVersion};

/// Immutable, versioned partition-to-node lookup table.
#[derive(Debug, Clone)]
pub struct RingTable {
    /// Snapshot version; used to detect staleness between a request and
    /// the current topology.
    version: RingVersion,

    /// Number of high bits of a 64-bit hash that select a partition.
    partition_bit_count: u16,

    /// Node IDs, indexed by dense node index.
    node_ids: Vec<NodeId>,

    /// `assignment[replica][partition]` is the node index holding that
    /// replica of that partition.
    assignment: Vec<Vec<u32>>,

    /// Index of the local node within `node_ids`, if one is configured.
    local_node_index: Option<u32>,
}

impl RingTable {
    /// Build a ring table from an externally computed assignment.
    ///
    /// Validates that every replica row covers every partition and that
    /// every entry is a valid node index. Tier diversity of the
    /// assignment is not checked.
    pub fn new(
        version: RingVersion,
        partition_bit_count: u16,
        node_ids: Vec<NodeId>,
        assignment: Vec<Vec<u32>>,
        local_node_id: Option<NodeId>,
    ) -> Result<Self, RingError> {
        if partition_bit_count > 32 {
            return Err(RingError::InvalidPartitionBitCount(partition_bit_count));
        }

        let partition_count = (1u64 << partition_bit_count) as usize;
        for (replica, row) in assignment.iter().enumerate() {
            if row.len() != partition_count {
                return Err(RingError::AssignmentShape {
                    replica,
                    got: row.len(),
                    expected: partition_count,
                });
            }
            for (partition, &index) in row.iter().enumerate() {
                if index as usize >= node_ids.len() {
                    return Err(RingError::InvalidNodeIndex {
                        replica,
                        partition,
                        index,
                        node_count: node_ids.len(),
                    });
                }
            }
        }

        let local_node_index = match local_node_id {
            Some(id) => Some(
                node_ids
                    .iter()
                    .position(|&n| n == id)
                    .ok_or(RingError::UnknownLocalNode(id))? as u32,
            ),
            None => None,
        };

        Ok(Self {
            version,
            partition_bit_count,
            node_ids,
            assignment,
            local_node_index,
        })
    }

    /// Snapshot version.
    pub fn version(&self) -> RingVersion {
        self.version
    }

    /// Number of hash bits that select a partition.
    pub fn partition_bit_count(&self) -> u16 {
        self.partition_bit_count
    }

    /// Number of partitions (`2^partition_bit_count`).
    pub fn partition_count(&self) -> u64 {
        1u64 << self.partition_bit_count
    }

    /// Number of replicas maintained per partition.
    pub fn replica_count(&self) -> usize {
        self.assignment.len()
    }

    /// All node IDs in the ring, in dense-index order.
    pub fn node_ids(&self) -> &[NodeId] {
        &self.node_ids
    }

    /// ID of the local node, if one is configured.
    pub fn local_node_id(&self) -> Option<NodeId> {
        self.local_node_index
            .map(|index| self.node_ids[index as usize])
    }

    /// Map a 64-bit hash value to its partition by taking the top
    /// `partition_bit_count` bits.
    pub fn partition_for_hash(&self, hash: u64) -> Partition {
        if self.partition_bit_count == 0 {
            return 0;
        }
        (hash >> (64 - self.partition_bit_count)) as Partition
    }

    /// True if the local node holds some replica of the partition.
    /// Always false when no local node is configured.
    ///
    /// `partition` must be less than `partition_count()`.
    pub fn responsible(&self, partition: Partition) -> bool {
        let Some(local) = self.local_node_index else {
            return false;
        };
        self.assignment
            .iter()
            .any(|row| row[partition as usize] == local)
    }

    /// Node IDs holding the partition's replicas, one per replica row in
    /// row order.
    ///
    /// `partition` must be less than `partition_count()`.
    pub fn responsible_ids(&self, partition: Partition) -> Vec<NodeId> {
        let mut ids = Vec::with_capacity(self.assignment.len());
        for row in &self.assignment {
            ids.push(self.node_ids[row[partition as usize] as usize]);
        }
        ids
    }
}
