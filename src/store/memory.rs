//! store::memory
//!
//! In-memory node store.
//!
//! # Example
//!
//! ```
//! use slugsync::core::node::Node;
//! use slugsync::core::types::{NodeId, SlugPath};
//! use slugsync::store::{MemoryStore, NodeStore};
//!
//! let mut store = MemoryStore::new();
//! store.save(Node::site_root(NodeId::new(1))).unwrap();
//! store
//!     .save(Node::new(NodeId::new(2), Some(NodeId::new(1)), SlugPath::new("/a").unwrap()))
//!     .unwrap();
//!
//! let children = store.children(NodeId::new(1), Default::default()).unwrap();
//! assert_eq!(children.len(), 1);
//! assert_eq!(store.next_id().unwrap(), NodeId::new(3));
//! ```

use std::collections::BTreeMap;

use super::traits::{NodeStore, StoreError};
use crate::core::node::Node;
use crate::core::types::NodeId;

/// Node store backed by an ordered map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    nodes: BTreeMap<NodeId, Node>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `nodes`. Later duplicates replace earlier ones.
    pub fn from_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
        Self {
            nodes: nodes.into_iter().map(|n| (n.id, n)).collect(),
        }
    }

    /// Consume the store, returning nodes in id order.
    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes.into_values().collect()
    }

    /// Number of stored nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl NodeStore for MemoryStore {
    fn get(&self, id: NodeId) -> Result<Option<Node>, StoreError> {
        Ok(self.nodes.get(&id).cloned())
    }

    fn save(&mut self, mut node: Node) -> Result<(), StoreError> {
        node.full_path_override = false;
        self.nodes.insert(node.id, node);
        Ok(())
    }

    fn find(&self, predicate: &dyn Fn(&Node) -> bool) -> Result<Vec<Node>, StoreError> {
        Ok(self
            .nodes
            .values()
            .filter(|n| predicate(n))
            .cloned()
            .collect())
    }

    fn next_id(&self) -> Result<NodeId, StoreError> {
        Ok(NodeId::new(
            self.nodes.keys().next_back().map_or(1, |id| id.get() + 1),
        ))
    }
}
