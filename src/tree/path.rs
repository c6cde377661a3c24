//! Path Reconstructor
//!
//! Walks a node's parent chain to produce a root-first breadcrumb path.

use crate::error::TreeError;
use crate::tree::node::Node;
use crate::tree::NodeLookup;
use crate::types::NodeId;
use std::collections::HashSet;

/// Root-first path ending at `node_id`
///
/// One lookup per ancestor. A parent reference that does not resolve ends the
/// walk at that node. A chain that revisits a node is corrupt and reported as
/// a cycle.
pub fn path_to<L: NodeLookup + ?Sized>(lookup: &L, node_id: NodeId) -> Result<Vec<Node>, TreeError> {
    let target = lookup.require(node_id)?;
    path_from(lookup, target)
}

/// Same as [`path_to`], starting from an already resolved node
pub fn path_from<L: NodeLookup + ?Sized>(lookup: &L, target: Node) -> Result<Vec<Node>, TreeError> {
    let start = target.id;
    let mut seen = HashSet::new();
    seen.insert(start);

    let mut path = vec![target];
    let mut next = path[0].parent_id;
    while let Some(parent_id) = next {
        if !seen.insert(parent_id) {
            return Err(TreeError::Cycle {
                node: start,
                parent: parent_id,
            });
        }
        match lookup.lookup(parent_id)? {
            Some(parent) => {
                next = parent.parent_id;
                path.push(parent);
            }
            None => {
                tracing::warn!(
                    node_id = %start,
                    missing_parent = %parent_id,
                    "Breadcrumb path stops at unresolved parent"
                );
                break;
            }
        }
    }

    path.reverse();
    Ok(path)
}
