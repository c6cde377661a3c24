//! Cycle Guard
//!
//! Validates proposed parent assignments before anything is written. A move is
//! rejected when the node would become its own parent, when the proposed parent
//! is one of the node's descendants, or when the proposed parent cannot hold
//! children.

use crate::error::TreeError;
use crate::tree::node::Node;
use crate::tree::NodeLookup;
use crate::types::NodeId;
use std::collections::HashSet;

/// Validate moving `node_id` under `proposed_parent`
///
/// Returns the resolved parent record (`None` when moving to the root level).
/// Cost is one lookup per ancestor of the proposed parent.
pub fn validate_move<L: NodeLookup + ?Sized>(
    lookup: &L,
    node_id: NodeId,
    proposed_parent: Option<NodeId>,
) -> Result<Option<Node>, TreeError> {
    let parent_id = match proposed_parent {
        Some(id) if id == node_id => return Err(TreeError::SelfParent(node_id)),
        Some(id) => id,
        None => return Ok(None),
    };

    let parent = lookup.require(parent_id)?;

    // Walk upward from the proposed parent; meeting the node means the parent
    // sits inside the node's own subtree.
    let mut seen = HashSet::new();
    seen.insert(parent.id);
    let mut next = parent.parent_id;
    while let Some(ancestor_id) = next {
        if ancestor_id == node_id {
            return Err(TreeError::Cycle {
                node: node_id,
                parent: parent_id,
            });
        }
        if !seen.insert(ancestor_id) {
            // Stored chain already loops; refuse to attach anything beneath it.
            return Err(TreeError::Cycle {
                node: node_id,
                parent: parent_id,
            });
        }
        next = match lookup.lookup(ancestor_id)? {
            Some(ancestor) => ancestor.parent_id,
            None => None,
        };
    }

    check_parent(&parent)?;
    Ok(Some(parent))
}

/// Validate a parent for a node that does not exist yet
pub fn validate_parent<L: NodeLookup + ?Sized>(
    lookup: &L,
    parent_id: Option<NodeId>,
) -> Result<Option<Node>, TreeError> {
    match parent_id {
        None => Ok(None),
        Some(id) => {
            let parent = lookup.require(id)?;
            check_parent(&parent)?;
            Ok(Some(parent))
        }
    }
}

/// A parent must be active and of a container kind
pub fn check_parent(parent: &Node) -> Result<(), TreeError> {
    if !parent.is_active {
        return Err(TreeError::InvalidParentKind {
            parent: parent.id,
            reason: "parent is inactive".to_string(),
        });
    }
    if !parent.is_container() {
        return Err(TreeError::InvalidParentKind {
            parent: parent.id,
            reason: format!("{} nodes cannot contain children", parent.kind),
        });
    }
    Ok(())
}
