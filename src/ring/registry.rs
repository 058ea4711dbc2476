//! Node address registry.
//!
//! Maps node IDs to their ordered address lists. A node may be reachable
//! over several paths (interfaces, networks); the hub picks one by the
//! configured address index.

use crate::types::NodeId;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

/// Synchronized node ID to address-list mapping.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: RwLock<HashMap<NodeId, Vec<String>>>,
}

impl NodeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a node's address list.
    pub fn add_node(&self, id: NodeId, addresses: Vec<String>) {
        debug!(node_id = id, count = addresses.len(), "Node addresses set");
        self.nodes.write().insert(id, addresses);
    }

    /// Remove a node.
    pub fn remove_node(&self, id: NodeId) {
        self.nodes.write().remove(&id);
        debug!(node_id = id, "Node removed");
    }

    /// Address at the given index for a node, if both exist.
    pub fn address(&self, id: NodeId, index: usize) -> Option<String> {
        self.nodes.read().get(&id)?.get(index).cloned()
    }

    /// All registered node IDs.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.read().keys().copied().collect()
    }

    /// Number of registered nodes.
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    /// True if no nodes are registered.
    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }
}
