//! Node directory
//!
//! Grow-only, thread-safe map from node id to node metadata. Once a node has
//! been sighted in any store result it stays registered for the process
//! lifetime; there is no eviction and no overwrite.

use super::node::{Node, NodeId};
use dashmap::DashMap;

/// Grow-only registry of every node the caches have seen
#[derive(Debug, Default)]
pub struct NodeDirectory {
    nodes: DashMap<NodeId, Node>,
}

impl NodeDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a node by id
    pub fn get(&self, id: NodeId) -> Option<Node> {
        self.nodes.get(&id).map(|entry| entry.clone())
    }

    /// Register a node unless its id is already present
    ///
    /// First sighting wins; concurrent callers racing on the same id resolve
    /// to exactly one stored node. Returns true if this call inserted.
    pub fn set_if_absent(&self, node: Node) -> bool {
        match self.nodes.entry(node.id()) {
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(node);
                true
            }
        }
    }

    /// Number of registered nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the directory is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
