//! Node Store
//!
//! Persistence contract for flat node records. The tree core never walks
//! structure through the store beyond single-hop lookups; assembly happens in
//! memory over `find_all_active`.

pub mod memory;
pub mod persistence;

use crate::error::{StorageError, TreeError};
use crate::tree::node::{Node, NodeKind};
use crate::tree::NodeLookup;
use crate::types::{NodeId, TreeFamily};

pub use memory::InMemoryNodeStore;
pub use persistence::SledNodeStore;

/// Node store interface
///
/// One store instance holds one tree family. Listing methods return nodes
/// ordered by `(parent_id, sort_order, id)`.
pub trait NodeStore: Send + Sync {
    fn family(&self) -> TreeFamily;

    /// Reserve a fresh, never reused id
    fn allocate_id(&self) -> Result<NodeId, StorageError>;

    fn find_by_id(&self, id: NodeId) -> Result<Option<Node>, StorageError>;

    /// Every node, active or not, optionally restricted to one kind
    fn find_all(&self, kind: Option<NodeKind>) -> Result<Vec<Node>, StorageError>;

    /// Active nodes only, optionally restricted to one kind
    fn find_all_active(&self, kind: Option<NodeKind>) -> Result<Vec<Node>, StorageError> {
        Ok(self
            .find_all(kind)?
            .into_iter()
            .filter(|n| n.is_active)
            .collect())
    }

    /// Direct children of `parent` (root nodes for `None`), active or not
    fn find_children(&self, parent: Option<NodeId>) -> Result<Vec<Node>, StorageError>;

    /// Insert or replace a record
    fn save(&self, node: &Node) -> Result<Node, StorageError>;

    /// Insert or replace several records atomically
    fn save_batch(&self, nodes: &[Node]) -> Result<(), StorageError>;

    /// Replace a record only if its stored parent still equals `expected_parent`,
    /// writing `dependents` in the same atomic step
    ///
    /// Fails with `StorageError::Conflict` when another writer re-parented the
    /// node in the meantime; nothing is written in that case.
    fn compare_and_set_parent(
        &self,
        node: &Node,
        expected_parent: Option<NodeId>,
        dependents: &[Node],
    ) -> Result<Node, StorageError>;

    /// Remove a record. Fails with `StorageError::HasChildren` if any node names
    /// it as parent. Removing an unknown id is a no-op.
    fn delete(&self, id: NodeId) -> Result<(), StorageError>;

    /// Remove several records atomically. Fails with `StorageError::HasChildren`
    /// if a node outside the batch names a removed node as parent.
    fn delete_batch(&self, ids: &[NodeId]) -> Result<(), StorageError>;
}

impl<'a> NodeLookup for dyn NodeStore + 'a {
    fn lookup(&self, id: NodeId) -> Result<Option<Node>, TreeError> {
        Ok(self.find_by_id(id)?)
    }
}

/// Order nodes for listing: by parent, then sibling position, then id
pub fn sort_for_listing(nodes: &mut [Node]) {
    nodes.sort_by(|a, b| {
        a.parent_id
            .cmp(&b.parent_id)
            .then(a.sort_order.cmp(&b.sort_order))
            .then(a.id.cmp(&b.id))
    });
}

/// Sort siblings by position, then id
pub(crate) fn sort_siblings(nodes: &mut [Node]) {
    nodes.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.id.cmp(&b.id)));
}
