//! Order Manager
//!
//! Sibling order is advisory: it drives display order only and carries no
//! uniqueness guarantee.

use crate::error::TreeError;
use crate::tree::depth::{self, DepthPolicy};
use crate::tree::guard;
use crate::tree::node::Node;
use crate::tree::NodeLookup;
use crate::types::{NodeId, SortOrder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One line of a reorder request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderEntry {
    pub id: NodeId,
    pub sort_order: SortOrder,
    /// Parent after the reorder; `None` places the node at the root level
    pub parent_id: Option<NodeId>,
}

impl ReorderEntry {
    pub fn new(id: NodeId, sort_order: SortOrder, parent_id: Option<NodeId>) -> Self {
        Self {
            id,
            sort_order,
            parent_id,
        }
    }
}

/// Position for a node appended after the given siblings
///
/// One past the largest order among active siblings, or 1 when there are none.
pub fn next_sort_order(siblings: &[Node]) -> SortOrder {
    siblings
        .iter()
        .filter(|n| n.is_active)
        .map(|n| n.sort_order)
        .max()
        .map(|max| max.saturating_add(1))
        .unwrap_or(1)
}

/// Apply a reorder batch to a working copy of the tree
///
/// Entries are applied in order, each validated against the state left by the
/// entries before it. On error the working copy may be partially modified and
/// must be discarded. Returns the ids of every record that changed, including
/// descendants whose depth was cascaded.
pub fn apply_reorder(
    working: &mut HashMap<NodeId, Node>,
    entries: &[ReorderEntry],
    depth_policy: DepthPolicy,
) -> Result<Vec<NodeId>, TreeError> {
    let mut touched: Vec<NodeId> = Vec::new();

    for entry in entries {
        let mut node = working.require(entry.id)?;

        if node.parent_id != entry.parent_id {
            let parent = guard::validate_move(&*working, entry.id, entry.parent_id)?;
            node.parent_id = entry.parent_id;
            node.depth = depth::depth_under(parent.as_ref());

            if depth_policy == DepthPolicy::Cascade {
                let view: &HashMap<NodeId, Node> = working;
                let descendants = depth::cascade(&node, |id| Ok(children_in(view, id)))?;
                for child in descendants {
                    touched.push(child.id);
                    working.insert(child.id, child);
                }
            }
        }

        node.sort_order = entry.sort_order;
        node.touch();
        touched.push(node.id);
        working.insert(node.id, node);
    }

    let mut seen = std::collections::HashSet::new();
    touched.retain(|id| seen.insert(*id));
    Ok(touched)
}

fn children_in(working: &HashMap<NodeId, Node>, parent: NodeId) -> Vec<Node> {
    working
        .values()
        .filter(|n| n.parent_id == Some(parent))
        .cloned()
        .collect()
}
