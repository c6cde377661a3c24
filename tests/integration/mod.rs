//! Integration tests for the content-tree manager

mod cli_contracts;
mod concurrent_moves;
mod deep_trees;
mod error_ordering;
mod scenarios;
mod sled_persistence;

use canopy::config::TreeConfig;
use canopy::error::StorageError;
use canopy::store::{InMemoryNodeStore, NodeStore};
use canopy::tree::node::{Node, NodeKind};
use canopy::types::{NodeId, TreeFamily};
use canopy::TreeService;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub fn navigation_service() -> TreeService {
    TreeService::new(
        Arc::new(InMemoryNodeStore::new(TreeFamily::Navigation)),
        &TreeConfig::default(),
    )
}

pub fn assets_service() -> TreeService {
    TreeService::new(
        Arc::new(InMemoryNodeStore::new(TreeFamily::Assets)),
        &TreeConfig::default(),
    )
}

/// Store wrapper whose writes can be switched to fail
pub struct FlakyStore {
    pub inner: InMemoryNodeStore,
    pub fail_writes: AtomicBool,
}

impl FlakyStore {
    pub fn new(family: TreeFamily) -> Self {
        Self {
            inner: InMemoryNodeStore::new(family),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Database("write rejected".to_string()));
        }
        Ok(())
    }
}

impl NodeStore for FlakyStore {
    fn family(&self) -> TreeFamily {
        self.inner.family()
    }

    fn allocate_id(&self) -> Result<NodeId, StorageError> {
        self.inner.allocate_id()
    }

    fn find_by_id(&self, id: NodeId) -> Result<Option<Node>, StorageError> {
        self.inner.find_by_id(id)
    }

    fn find_all(&self, kind: Option<NodeKind>) -> Result<Vec<Node>, StorageError> {
        self.inner.find_all(kind)
    }

    fn find_children(&self, parent: Option<NodeId>) -> Result<Vec<Node>, StorageError> {
        self.inner.find_children(parent)
    }

    fn save(&self, node: &Node) -> Result<Node, StorageError> {
        self.check()?;
        self.inner.save(node)
    }

    fn save_batch(&self, nodes: &[Node]) -> Result<(), StorageError> {
        self.check()?;
        self.inner.save_batch(nodes)
    }

    fn compare_and_set_parent(
        &self,
        node: &Node,
        expected_parent: Option<NodeId>,
        dependents: &[Node],
    ) -> Result<Node, StorageError> {
        self.check()?;
        self.inner
            .compare_and_set_parent(node, expected_parent, dependents)
    }

    fn delete(&self, id: NodeId) -> Result<(), StorageError> {
        self.check()?;
        self.inner.delete(id)
    }

    fn delete_batch(&self, ids: &[NodeId]) -> Result<(), StorageError> {
        self.check()?;
        self.inner.delete_batch(ids)
    }
}
