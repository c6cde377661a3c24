//! Tree Service
//!
//! The public face of one tree family. Reads go through the cache; every write
//! holds the family's structural lock from validation through persistence and
//! cache eviction.

use crate::audience::Audience;
use crate::cache::{CacheScope, CacheStats, TreeCache};
use crate::concurrency::TreeLockManager;
use crate::config::TreeConfig;
use crate::error::TreeError;
use crate::store::NodeStore;
use crate::tree::builder::{Forest, TreeBuilder};
use crate::tree::depth::{self, DepthPolicy};
use crate::tree::node::{Node, NodeAttributes, NodeKind, NodeUpdate, TreeNode};
use crate::tree::order::{self, ReorderEntry};
use crate::tree::{guard, index_by_id, path, NodeLookup};
use crate::types::{Depth, NodeId, TreeFamily};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info};

/// Summary counts for one family
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TreeStats {
    pub total: usize,
    pub active: usize,
    pub by_kind: BTreeMap<String, usize>,
    /// Deepest node reachable from a root through active nodes
    pub max_depth: Depth,
    /// Direct child count per container, inactive children included
    pub child_counts: BTreeMap<NodeId, usize>,
}

pub struct TreeService {
    store: Arc<dyn NodeStore>,
    cache: TreeCache,
    builder: TreeBuilder,
    depth_policy: DepthPolicy,
    locks: Arc<TreeLockManager>,
}

impl TreeService {
    pub fn new(store: Arc<dyn NodeStore>, config: &TreeConfig) -> Self {
        Self::with_lock_manager(store, config, Arc::new(TreeLockManager::new()))
    }

    /// Share a lock manager with other services writing the same store
    pub fn with_lock_manager(
        store: Arc<dyn NodeStore>,
        config: &TreeConfig,
        locks: Arc<TreeLockManager>,
    ) -> Self {
        Self {
            store,
            cache: TreeCache::with_enabled(config.cache_enabled),
            builder: TreeBuilder::new(config.orphan_policy),
            depth_policy: config.depth_policy,
            locks,
        }
    }

    pub fn family(&self) -> TreeFamily {
        self.store.family()
    }

    pub fn depth_policy(&self) -> DepthPolicy {
        self.depth_policy
    }

    fn lookup(&self) -> &dyn NodeStore {
        self.store.as_ref()
    }

    // ---- reads ----

    /// The forest visible to `audience`, served from cache when possible
    pub fn get_tree(&self, audience: Audience) -> Result<Arc<Forest>, TreeError> {
        self.cache.get_or_build(audience, || {
            let nodes = audience.filter(self.store.find_all_active(None)?);
            debug!(family = %self.family(), %audience, nodes = nodes.len(), "Building tree");
            Ok(self.builder.build(nodes))
        })
    }

    /// The forest visible to `audience`, with children attached
    pub fn get_nested_tree(&self, audience: Audience) -> Result<Vec<TreeNode>, TreeError> {
        Ok(self.get_tree(audience)?.to_nested())
    }

    /// Root-first breadcrumb ending at `id`
    pub fn get_path(&self, id: NodeId) -> Result<Vec<Node>, TreeError> {
        path::path_to(self.lookup(), id)
    }

    /// Breadcrumb for the node carrying `external_ref`
    ///
    /// Active nodes win over inactive ones; among equals the first in listing
    /// order wins. No match yields an empty path.
    pub fn get_path_by_ref(&self, external_ref: &str) -> Result<Vec<Node>, TreeError> {
        let mut matches: Vec<Node> = self
            .store
            .find_all(None)?
            .into_iter()
            .filter(|n| n.external_ref.as_deref() == Some(external_ref))
            .collect();
        matches.sort_by_key(|n| !n.is_active);

        match matches.into_iter().next() {
            Some(target) => path::path_from(self.lookup(), target),
            None => {
                debug!(family = %self.family(), external_ref, "No node for reference");
                Ok(Vec::new())
            }
        }
    }

    pub fn get_node(&self, id: NodeId) -> Result<Node, TreeError> {
        self.lookup().require(id)
    }

    /// Every record, inactive included, ordered by parent then position
    pub fn list_all(&self, kind: Option<NodeKind>) -> Result<Vec<Node>, TreeError> {
        Ok(self.store.find_all(kind)?)
    }

    pub fn stats(&self) -> Result<TreeStats, TreeError> {
        let nodes = self.store.find_all(None)?;
        let mut stats = TreeStats {
            total: nodes.len(),
            ..TreeStats::default()
        };

        for node in &nodes {
            *stats.by_kind.entry(node.kind.to_string()).or_insert(0) += 1;
            if node.is_active {
                stats.active += 1;
            }
            if node.is_container() {
                stats.child_counts.entry(node.id).or_insert(0);
            }
        }
        for node in &nodes {
            if let Some(parent) = node.parent_id {
                if let Some(count) = stats.child_counts.get_mut(&parent) {
                    *count += 1;
                }
            }
        }

        let active: Vec<Node> = nodes.into_iter().filter(|n| n.is_active).collect();
        let forest = TreeBuilder::default().build(active);
        stats.max_depth = forest
            .flatten()
            .iter()
            .map(|n| n.depth)
            .max()
            .unwrap_or(0);
        Ok(stats)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn invalidate_cache(&self, scope: CacheScope) {
        self.cache.invalidate(scope);
    }

    // ---- writes ----

    /// Create a node under `parent_id`, appended after its siblings
    pub fn create(
        &self,
        parent_id: Option<NodeId>,
        attributes: NodeAttributes,
    ) -> Result<Node, TreeError> {
        let lock = self.locks.get_lock(self.family());
        let _guard = lock.lock();

        attributes.validate(self.family())?;
        let parent = guard::validate_parent(self.lookup(), parent_id)?;
        let siblings = self.store.find_children(parent_id)?;

        let id = self.store.allocate_id()?;
        let mut node = Node::new(
            id,
            attributes.label,
            attributes.kind,
            parent_id,
            order::next_sort_order(&siblings),
            depth::depth_under(parent.as_ref()),
        );
        node.external_ref = attributes.external_ref;
        node.description = attributes.description;
        node.required_role = attributes.required_role;
        node.is_active = attributes.is_active;

        let saved = self.store.save(&node)?;
        self.cache.invalidate(CacheScope::All);
        info!(
            family = %self.family(),
            id = %saved.id,
            parent = ?saved.parent_id,
            sort_order = saved.sort_order,
            "Node created"
        );
        Ok(saved)
    }

    /// Edit non-structural attributes
    pub fn update(&self, id: NodeId, update: NodeUpdate) -> Result<Node, TreeError> {
        let lock = self.locks.get_lock(self.family());
        let _guard = lock.lock();

        let mut node = self.lookup().require(id)?;
        if update.is_empty() {
            return Ok(node);
        }
        update.apply_to(&mut node)?;

        let saved = self.store.save(&node)?;
        self.cache.invalidate(CacheScope::All);
        info!(family = %self.family(), id = %id, "Node updated");
        Ok(saved)
    }

    /// Re-parent a node, appending it after its new siblings
    ///
    /// Moving to the current parent changes nothing. Under `DepthPolicy::Cascade`
    /// the descendants' depth is rewritten in the same atomic write.
    pub fn move_node(&self, id: NodeId, new_parent: Option<NodeId>) -> Result<Node, TreeError> {
        let lock = self.locks.get_lock(self.family());
        let _guard = lock.lock();

        if new_parent == Some(id) {
            return Err(TreeError::SelfParent(id));
        }
        let mut node = self.lookup().require(id)?;
        if node.parent_id == new_parent {
            debug!(family = %self.family(), id = %id, "Move to current parent ignored");
            return Ok(node);
        }

        let parent = guard::validate_move(self.lookup(), id, new_parent)?;
        let siblings = self.store.find_children(new_parent)?;
        let old_parent = node.parent_id;

        node.parent_id = new_parent;
        node.sort_order = order::next_sort_order(&siblings);
        node.depth = depth::depth_under(parent.as_ref());
        node.touch();

        let dependents = match self.depth_policy {
            DepthPolicy::Cascade => depth::cascade(&node, |parent_id| {
                Ok(self.store.find_children(Some(parent_id))?)
            })?,
            DepthPolicy::NodeOnly => Vec::new(),
        };

        let saved = self
            .store
            .compare_and_set_parent(&node, old_parent, &dependents)?;
        self.cache.invalidate(CacheScope::All);
        info!(
            family = %self.family(),
            id = %id,
            from = ?old_parent,
            to = ?new_parent,
            cascaded = dependents.len(),
            "Node moved"
        );
        Ok(saved)
    }

    /// Apply a batch of position and parent changes atomically
    ///
    /// Each entry is validated against the state left by the entries before it.
    /// Any invalid entry rejects the whole batch and nothing is written.
    pub fn reorder(&self, entries: &[ReorderEntry]) -> Result<(), TreeError> {
        if entries.is_empty() {
            return Ok(());
        }
        let lock = self.locks.get_lock(self.family());
        let _guard = lock.lock();

        let mut working = index_by_id(self.store.find_all(None)?);
        let touched = order::apply_reorder(&mut working, entries, self.depth_policy)?;
        let changed: Vec<Node> = touched
            .iter()
            .filter_map(|id| working.remove(id))
            .collect();

        self.store.save_batch(&changed)?;
        self.cache.invalidate(CacheScope::All);
        info!(
            family = %self.family(),
            entries = entries.len(),
            written = changed.len(),
            "Reorder applied"
        );
        Ok(())
    }

    /// Delete a node with no children, returning the removed record
    pub fn delete(&self, id: NodeId) -> Result<Node, TreeError> {
        let lock = self.locks.get_lock(self.family());
        let _guard = lock.lock();

        let node = self.lookup().require(id)?;
        let children = self.store.find_children(Some(id))?;
        if !children.is_empty() {
            return Err(TreeError::HasChildren {
                id,
                count: children.len(),
            });
        }

        self.store.delete(id)?;
        self.cache.invalidate(CacheScope::All);
        info!(family = %self.family(), id = %id, "Node deleted");
        Ok(node)
    }

    /// Delete a node and everything below it in one atomic write
    ///
    /// Returns the removed records, the node itself first, parents before children.
    pub fn delete_subtree(&self, id: NodeId) -> Result<Vec<Node>, TreeError> {
        let lock = self.locks.get_lock(self.family());
        let _guard = lock.lock();

        let all = self.store.find_all(None)?;
        let mut by_parent: HashMap<NodeId, Vec<Node>> = HashMap::new();
        let mut root = None;
        for node in all {
            if node.id == id {
                root = Some(node.clone());
            }
            if let Some(parent) = node.parent_id {
                by_parent.entry(parent).or_default().push(node);
            }
        }
        let root = root.ok_or(TreeError::NodeNotFound(id))?;

        let mut removed = Vec::new();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([root]);
        while let Some(node) = queue.pop_front() {
            if !seen.insert(node.id) {
                continue;
            }
            if let Some(children) = by_parent.remove(&node.id) {
                queue.extend(children);
            }
            removed.push(node);
        }

        let ids: Vec<NodeId> = removed.iter().map(|n| n.id).collect();
        self.store.delete_batch(&ids)?;
        self.cache.invalidate(CacheScope::All);
        info!(family = %self.family(), id = %id, removed = ids.len(), "Subtree deleted");
        Ok(removed)
    }

    /// Activate or deactivate a node
    ///
    /// Deactivating a container hides its subtree from tree reads and stops it
    /// from accepting new children; existing children keep their parent.
    pub fn set_active(&self, id: NodeId, active: bool) -> Result<Node, TreeError> {
        self.change_active(id, |_| active)
    }

    /// Flip a node's activation state
    pub fn toggle_active(&self, id: NodeId) -> Result<Node, TreeError> {
        self.change_active(id, |current| !current)
    }

    fn change_active<F>(&self, id: NodeId, next: F) -> Result<Node, TreeError>
    where
        F: FnOnce(bool) -> bool,
    {
        let lock = self.locks.get_lock(self.family());
        let _guard = lock.lock();

        let mut node = self.lookup().require(id)?;
        let active = next(node.is_active);
        if node.is_active == active {
            return Ok(node);
        }
        node.is_active = active;
        node.touch();

        let saved = self.store.save(&node)?;
        self.cache.invalidate(CacheScope::All);
        info!(family = %self.family(), id = %id, active, "Activation changed");
        Ok(saved)
    }

    /// Recompute every stored depth from a full scan
    ///
    /// Returns the number of records rewritten.
    pub fn repair_depths(&self) -> Result<usize, TreeError> {
        let lock = self.locks.get_lock(self.family());
        let _guard = lock.lock();

        let fixed = depth::recompute_all(self.store.find_all(None)?);
        if fixed.is_empty() {
            debug!(family = %self.family(), "Stored depths already consistent");
            return Ok(0);
        }

        self.store.save_batch(&fixed)?;
        self.cache.invalidate(CacheScope::All);
        info!(family = %self.family(), repaired = fixed.len(), "Depths repaired");
        Ok(fixed.len())
    }
}
