//! In-memory node store
//!
//! Holds records behind a single `RwLock`, so every batch is trivially atomic.
//! Used by tests and by embedders that persist elsewhere.

use crate::error::StorageError;
use crate::store::{sort_for_listing, sort_siblings, NodeStore};
use crate::tree::node::{Node, NodeKind};
use crate::types::{NodeId, TreeFamily};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

pub struct InMemoryNodeStore {
    family: TreeFamily,
    nodes: RwLock<BTreeMap<NodeId, Node>>,
    next_id: AtomicU64,
}

impl InMemoryNodeStore {
    pub fn new(family: TreeFamily) -> Self {
        Self {
            family,
            nodes: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Seed the store with existing records, bypassing validation
    pub fn with_nodes(family: TreeFamily, nodes: impl IntoIterator<Item = Node>) -> Self {
        let store = Self::new(family);
        {
            let mut map = store.nodes.write();
            for node in nodes {
                map.insert(node.id, node);
            }
            let max = map.keys().next_back().map(|id| id.0).unwrap_or(0);
            store.next_id.store(max + 1, Ordering::SeqCst);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }
}

impl NodeStore for InMemoryNodeStore {
    fn family(&self) -> TreeFamily {
        self.family
    }

    fn allocate_id(&self) -> Result<NodeId, StorageError> {
        Ok(NodeId(self.next_id.fetch_add(1, Ordering::SeqCst)))
    }

    fn find_by_id(&self, id: NodeId) -> Result<Option<Node>, StorageError> {
        Ok(self.nodes.read().get(&id).cloned())
    }

    fn find_all(&self, kind: Option<NodeKind>) -> Result<Vec<Node>, StorageError> {
        let mut nodes: Vec<Node> = self
            .nodes
            .read()
            .values()
            .filter(|n| kind.map_or(true, |k| n.kind == k))
            .cloned()
            .collect();
        sort_for_listing(&mut nodes);
        Ok(nodes)
    }

    fn find_children(&self, parent: Option<NodeId>) -> Result<Vec<Node>, StorageError> {
        let mut nodes: Vec<Node> = self
            .nodes
            .read()
            .values()
            .filter(|n| n.parent_id == parent)
            .cloned()
            .collect();
        sort_siblings(&mut nodes);
        Ok(nodes)
    }

    fn save(&self, node: &Node) -> Result<Node, StorageError> {
        self.nodes.write().insert(node.id, node.clone());
        Ok(node.clone())
    }

    fn save_batch(&self, nodes: &[Node]) -> Result<(), StorageError> {
        let mut map = self.nodes.write();
        for node in nodes {
            map.insert(node.id, node.clone());
        }
        Ok(())
    }

    fn compare_and_set_parent(
        &self,
        node: &Node,
        expected_parent: Option<NodeId>,
        dependents: &[Node],
    ) -> Result<Node, StorageError> {
        let mut map = self.nodes.write();
        match map.get(&node.id) {
            Some(current) if current.parent_id == expected_parent => {}
            _ => return Err(StorageError::Conflict(node.id)),
        }
        map.insert(node.id, node.clone());
        for dependent in dependents {
            map.insert(dependent.id, dependent.clone());
        }
        Ok(node.clone())
    }

    fn delete(&self, id: NodeId) -> Result<(), StorageError> {
        let mut map = self.nodes.write();
        if map.values().any(|n| n.parent_id == Some(id)) {
            return Err(StorageError::HasChildren(id));
        }
        map.remove(&id);
        Ok(())
    }

    fn delete_batch(&self, ids: &[NodeId]) -> Result<(), StorageError> {
        let mut map = self.nodes.write();
        let doomed: HashSet<NodeId> = ids.iter().copied().collect();
        let survivor_child = map
            .values()
            .filter(|n| !doomed.contains(&n.id))
            .find_map(|n| n.parent_id.filter(|p| doomed.contains(p)));
        if let Some(parent) = survivor_child {
            return Err(StorageError::HasChildren(parent));
        }
        for id in ids {
            map.remove(id);
        }
        Ok(())
    }
}
