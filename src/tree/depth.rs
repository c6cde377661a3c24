//! Depth Calculator
//!
//! A node's depth is one more than its parent's stored depth, or 0 at the root.
//! The parent's stored value is trusted: it was itself derived on creation or move.

use crate::error::TreeError;
use crate::tree::builder::{OrphanPolicy, TreeBuilder};
use crate::tree::node::Node;
use crate::tree::NodeLookup;
use crate::types::{Depth, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// How a move propagates depth to the moved node's existing descendants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthPolicy {
    /// Rewrite every descendant's stored depth in the same write as the move
    #[default]
    Cascade,
    /// Only the moved node's depth changes; descendants stay stale until a repair
    NodeOnly,
}

/// Depth of a child placed under `parent`
pub fn depth_under(parent: Option<&Node>) -> Depth {
    parent.map(|p| p.depth + 1).unwrap_or(0)
}

/// Depth of a child placed under the node with id `parent_id`
pub fn depth_of<L: NodeLookup + ?Sized>(
    lookup: &L,
    parent_id: Option<NodeId>,
) -> Result<Depth, TreeError> {
    match parent_id {
        None => Ok(0),
        Some(id) => Ok(lookup.require(id)?.depth + 1),
    }
}

/// Recompute stored depth for every descendant of `root`
///
/// `root` must already carry its new depth. `children_of` returns the direct
/// children of a node. Returns only descendants whose depth actually changed.
pub fn cascade<F>(root: &Node, mut children_of: F) -> Result<Vec<Node>, TreeError>
where
    F: FnMut(NodeId) -> Result<Vec<Node>, TreeError>,
{
    let mut changed = Vec::new();
    let mut seen = HashSet::new();
    seen.insert(root.id);
    let mut queue: VecDeque<(NodeId, Depth)> = VecDeque::new();
    queue.push_back((root.id, root.depth));

    while let Some((parent_id, parent_depth)) = queue.pop_front() {
        for mut child in children_of(parent_id)? {
            if !seen.insert(child.id) {
                continue;
            }
            let depth = parent_depth + 1;
            queue.push_back((child.id, depth));
            if child.depth != depth {
                child.depth = depth;
                child.touch();
                changed.push(child);
            }
        }
    }

    Ok(changed)
}

/// Recompute depth top-down for a full node set
///
/// Returns records whose stored depth disagrees with their position. Orphans and
/// their subtrees are left alone.
pub fn recompute_all(nodes: Vec<Node>) -> Vec<Node> {
    let stored: Vec<(NodeId, Depth)> = nodes.iter().map(|n| (n.id, n.depth)).collect();
    let forest = TreeBuilder::new(OrphanPolicy::Exclude).build(nodes);

    stored
        .into_iter()
        .filter_map(|(id, old_depth)| {
            let node = forest.get(id)?;
            if node.depth == old_depth {
                return None;
            }
            let mut fixed = node.clone();
            fixed.touch();
            Some(fixed)
        })
        .collect()
}
