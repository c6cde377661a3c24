//! Tree Builder
//!
//! Assembles a flat list of nodes into a forest. Children are attached by map
//! lookup rather than recursion, so arbitrarily deep trees never grow the stack.
//! Depth in the built forest is recomputed top-down from the structure; stored
//! depth values are ignored here.

use crate::tree::node::{Node, TreeNode};
use crate::types::{Depth, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, warn};

/// What to do with nodes whose parent is not in the input set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanPolicy {
    /// Leave orphans and everything below them out of the forest
    #[default]
    Exclude,
    /// Place orphans at the root level
    Promote,
}

/// Index-based forest view over a set of nodes
///
/// Node records are held by id; structure lives in separate `id -> [child ids]`
/// lists, so there are no back-pointers to keep consistent.
#[derive(Debug, Clone, Default)]
pub struct Forest {
    nodes: HashMap<NodeId, Node>,
    roots: Vec<NodeId>,
    children: HashMap<NodeId, Vec<NodeId>>,
    orphans: Vec<NodeId>,
    omitted: Vec<NodeId>,
    detached: Vec<NodeId>,
}

impl Forest {
    /// Root ids in sibling order
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Child ids of a node in sibling order (empty for leaves and unknown ids)
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Depth as placed in this forest (roots are 0)
    pub fn depth_of(&self, id: NodeId) -> Option<Depth> {
        self.nodes.get(&id).map(|n| n.depth)
    }

    /// Parent within this forest; `None` for roots (including promoted orphans)
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.nodes
            .get(&id)?
            .parent_id
            .filter(|parent| self.nodes.contains_key(parent))
    }

    /// Number of nodes placed in the forest
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes whose parent did not resolve, whether promoted or excluded
    pub fn orphans(&self) -> &[NodeId] {
        &self.orphans
    }

    /// Input nodes left out of the forest by the orphan policy
    pub fn omitted(&self) -> &[NodeId] {
        &self.omitted
    }

    /// Input nodes unreachable from any root because their parent chain loops
    pub fn detached(&self) -> &[NodeId] {
        &self.detached
    }

    /// All placed nodes in pre-order (roots first, each followed by its subtree)
    pub fn flatten(&self) -> Vec<&Node> {
        self.preorder_ids()
            .into_iter()
            .filter_map(|id| self.nodes.get(&id))
            .collect()
    }

    /// True if `ancestor` lies on the parent chain of `id` within this forest
    pub fn is_descendant(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = self.parent_of(id);
        let mut hops = 0;
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            hops += 1;
            if hops > self.nodes.len() {
                return false;
            }
            current = self.parent_of(parent);
        }
        false
    }

    /// Materialize the nested representation handed to display layers
    pub fn to_nested(&self) -> Vec<TreeNode> {
        let order = self.preorder_ids();
        let mut built: HashMap<NodeId, TreeNode> = HashMap::with_capacity(order.len());

        // Reverse pre-order visits every child before its parent.
        for id in order.iter().rev() {
            let node = match self.nodes.get(id) {
                Some(n) => n.clone(),
                None => continue,
            };
            let children = self
                .children_of(*id)
                .iter()
                .filter_map(|child| built.remove(child))
                .collect();
            built.insert(*id, TreeNode { node, children });
        }

        self.roots
            .iter()
            .filter_map(|root| built.remove(root))
            .collect()
    }

    fn preorder_ids(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children_of(id).iter().rev());
        }
        out
    }
}

/// Builds forests under a fixed orphan policy
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeBuilder {
    orphan_policy: OrphanPolicy,
}

impl TreeBuilder {
    pub fn new(orphan_policy: OrphanPolicy) -> Self {
        Self { orphan_policy }
    }

    pub fn orphan_policy(&self) -> OrphanPolicy {
        self.orphan_policy
    }

    /// Build a forest from flat nodes
    ///
    /// Siblings are ordered by `(sort_order, id)`. Every input node ends up in
    /// exactly one of: the forest, `omitted()`, or `detached()`.
    pub fn build(&self, mut nodes: Vec<Node>) -> Forest {
        nodes.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.id.cmp(&b.id)));

        let mut index: HashMap<NodeId, Node> = HashMap::with_capacity(nodes.len());
        let mut ordered: Vec<NodeId> = Vec::with_capacity(nodes.len());
        for node in nodes {
            if index.contains_key(&node.id) {
                warn!(node_id = %node.id, "Duplicate node id in tree input, keeping first");
                continue;
            }
            ordered.push(node.id);
            index.insert(node.id, node);
        }

        let mut roots = Vec::new();
        let mut orphans = Vec::new();
        let mut children: HashMap<NodeId, Vec<NodeId>> = HashMap::new();

        for id in &ordered {
            let parent = index.get(id).and_then(|n| n.parent_id);
            match parent {
                None => roots.push(*id),
                Some(parent) if index.contains_key(&parent) => {
                    children.entry(parent).or_default().push(*id);
                }
                Some(_) => {
                    orphans.push(*id);
                    if self.orphan_policy == OrphanPolicy::Promote {
                        roots.push(*id);
                    }
                }
            }
        }

        // Breadth-first from the roots assigns depth and marks what is placed.
        let mut depths: HashMap<NodeId, Depth> = HashMap::with_capacity(index.len());
        let mut queue: VecDeque<(NodeId, Depth)> = roots.iter().map(|r| (*r, 0)).collect();
        while let Some((id, depth)) = queue.pop_front() {
            if depths.insert(id, depth).is_some() {
                continue;
            }
            if let Some(kids) = children.get(&id) {
                queue.extend(kids.iter().map(|k| (*k, depth + 1)));
            }
        }

        let excluded = if self.orphan_policy == OrphanPolicy::Exclude {
            subtree_ids(&orphans, &children)
        } else {
            HashSet::new()
        };

        let mut omitted = Vec::new();
        let mut detached = Vec::new();
        let mut placed: HashMap<NodeId, Node> = HashMap::with_capacity(depths.len());
        for id in ordered {
            let Some(mut node) = index.remove(&id) else {
                continue;
            };
            match depths.get(&id) {
                Some(depth) => {
                    node.depth = *depth;
                    placed.insert(id, node);
                }
                None if excluded.contains(&id) => omitted.push(id),
                None => detached.push(id),
            }
        }

        children.retain(|parent, _| placed.contains_key(parent));

        if !orphans.is_empty() {
            warn!(
                count = orphans.len(),
                policy = ?self.orphan_policy,
                "Tree input contains nodes whose parent is not present"
            );
        }
        if !detached.is_empty() {
            warn!(
                count = detached.len(),
                "Tree input contains nodes unreachable from any root (parent cycle)"
            );
        }
        debug!(
            placed = placed.len(),
            roots = roots.len(),
            "Assembled forest"
        );

        Forest {
            nodes: placed,
            roots,
            children,
            orphans,
            omitted,
            detached,
        }
    }
}

fn subtree_ids(heads: &[NodeId], children: &HashMap<NodeId, Vec<NodeId>>) -> HashSet<NodeId> {
    let mut seen = HashSet::new();
    let mut stack: Vec<NodeId> = heads.to_vec();
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        if let Some(kids) = children.get(&id) {
            stack.extend(kids.iter().copied());
        }
    }
    seen
}
