//! Hierarchical content tree
//!
//! Pure algorithms over flat node records: forest assembly, cycle validation,
//! depth derivation, sibling ordering, and breadcrumb reconstruction. All walks
//! are iterative over parent pointers.

pub mod builder;
pub mod depth;
pub mod guard;
pub mod node;
pub mod order;
pub mod path;

use crate::error::TreeError;
use crate::types::NodeId;
use node::Node;
use std::collections::HashMap;

pub use builder::{Forest, OrphanPolicy, TreeBuilder};
pub use depth::DepthPolicy;
pub use node::{NodeAttributes, NodeKind, NodeUpdate, TreeNode};
pub use order::ReorderEntry;

/// Single-hop node resolution used by ancestor walks
///
/// Implemented by node stores (one store read per hop) and by preloaded maps
/// (one map lookup per hop).
pub trait NodeLookup {
    fn lookup(&self, id: NodeId) -> Result<Option<Node>, TreeError>;

    /// Resolve a node or fail with `NodeNotFound`
    fn require(&self, id: NodeId) -> Result<Node, TreeError> {
        self.lookup(id)?.ok_or(TreeError::NodeNotFound(id))
    }
}

impl NodeLookup for HashMap<NodeId, Node> {
    fn lookup(&self, id: NodeId) -> Result<Option<Node>, TreeError> {
        Ok(self.get(&id).cloned())
    }
}

/// Index nodes by id
pub fn index_by_id(nodes: impl IntoIterator<Item = Node>) -> HashMap<NodeId, Node> {
    nodes.into_iter().map(|n| (n.id, n)).collect()
}
