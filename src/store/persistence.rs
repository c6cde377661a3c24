//! Sled-backed node store
//!
//! Each tree family lives in its own `sled::Tree`, keyed by the big-endian node
//! id. Records are bincode-encoded. There is no secondary parent index: child
//! queries scan the family's tree.

use crate::error::StorageError;
use crate::store::{sort_for_listing, sort_siblings, NodeStore};
use crate::tree::node::{Node, NodeKind};
use crate::types::{NodeId, TreeFamily};
use sled::transaction::{ConflictableTransactionError, TransactionError};
use std::collections::HashSet;
use std::path::Path;

pub struct SledNodeStore {
    family: TreeFamily,
    db: sled::Db,
    tree: sled::Tree,
}

impl SledNodeStore {
    /// Open (or create) a database at `path` and bind to the family's tree
    pub fn open(path: &Path, family: TreeFamily) -> Result<Self, StorageError> {
        std::fs::create_dir_all(path)?;
        let db = sled::open(path)?;
        Self::from_db(db, family)
    }

    /// Bind to the family's tree in an already open database
    pub fn from_db(db: sled::Db, family: TreeFamily) -> Result<Self, StorageError> {
        let tree = db.open_tree(family.as_str())?;
        Ok(Self { family, db, tree })
    }

    /// Flush pending writes to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        self.tree.flush()?;
        Ok(())
    }

    fn encode(node: &Node) -> Result<Vec<u8>, StorageError> {
        Ok(bincode::serialize(node)?)
    }

    fn decode(bytes: &[u8]) -> Result<Node, StorageError> {
        Ok(bincode::deserialize(bytes)?)
    }

    fn scan<F>(&self, mut keep: F) -> Result<Vec<Node>, StorageError>
    where
        F: FnMut(&Node) -> bool,
    {
        let mut out = Vec::new();
        for entry in self.tree.iter() {
            let (_, value) = entry?;
            let node = Self::decode(&value)?;
            if keep(&node) {
                out.push(node);
            }
        }
        Ok(out)
    }
}

impl NodeStore for SledNodeStore {
    fn family(&self) -> TreeFamily {
        self.family
    }

    fn allocate_id(&self) -> Result<NodeId, StorageError> {
        // generate_id starts at 0; ids start at 1
        Ok(NodeId(self.db.generate_id()? + 1))
    }

    fn find_by_id(&self, id: NodeId) -> Result<Option<Node>, StorageError> {
        match self.tree.get(id.to_key())? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn find_all(&self, kind: Option<NodeKind>) -> Result<Vec<Node>, StorageError> {
        let mut nodes = self.scan(|n| kind.map_or(true, |k| n.kind == k))?;
        sort_for_listing(&mut nodes);
        Ok(nodes)
    }

    fn find_children(&self, parent: Option<NodeId>) -> Result<Vec<Node>, StorageError> {
        let mut nodes = self.scan(|n| n.parent_id == parent)?;
        sort_siblings(&mut nodes);
        Ok(nodes)
    }

    fn save(&self, node: &Node) -> Result<Node, StorageError> {
        self.tree.insert(node.id.to_key(), Self::encode(node)?)?;
        Ok(node.clone())
    }

    fn save_batch(&self, nodes: &[Node]) -> Result<(), StorageError> {
        let mut batch = sled::Batch::default();
        for node in nodes {
            batch.insert(node.id.to_key().to_vec(), Self::encode(node)?);
        }
        self.tree.apply_batch(batch)?;
        Ok(())
    }

    fn compare_and_set_parent(
        &self,
        node: &Node,
        expected_parent: Option<NodeId>,
        dependents: &[Node],
    ) -> Result<Node, StorageError> {
        let key = node.id.to_key();
        let encoded = Self::encode(node)?;
        let mut writes = Vec::with_capacity(dependents.len());
        for dependent in dependents {
            writes.push((dependent.id.to_key(), Self::encode(dependent)?));
        }

        let result = self.tree.transaction(|tx| {
            let current = tx
                .get(key)?
                .ok_or(ConflictableTransactionError::Abort(StorageError::Conflict(node.id)))?;
            let stored = Self::decode(&current).map_err(ConflictableTransactionError::Abort)?;
            if stored.parent_id != expected_parent {
                return Err(ConflictableTransactionError::Abort(StorageError::Conflict(
                    node.id,
                )));
            }

            tx.insert(&key[..], encoded.as_slice())?;
            for (dep_key, bytes) in &writes {
                tx.insert(&dep_key[..], bytes.as_slice())?;
            }
            Ok(())
        });

        match result {
            Ok(()) => Ok(node.clone()),
            Err(TransactionError::Abort(err)) => Err(err),
            Err(TransactionError::Storage(err)) => Err(err.into()),
        }
    }

    fn delete(&self, id: NodeId) -> Result<(), StorageError> {
        if !self.scan(|n| n.parent_id == Some(id))?.is_empty() {
            return Err(StorageError::HasChildren(id));
        }
        self.tree.remove(id.to_key())?;
        Ok(())
    }

    fn delete_batch(&self, ids: &[NodeId]) -> Result<(), StorageError> {
        let doomed: HashSet<NodeId> = ids.iter().copied().collect();
        let survivors = self.scan(|n| {
            !doomed.contains(&n.id) && n.parent_id.map_or(false, |p| doomed.contains(&p))
        })?;
        if let Some(child) = survivors.first() {
            if let Some(parent) = child.parent_id {
                return Err(StorageError::HasChildren(parent));
            }
        }

        let mut batch = sled::Batch::default();
        for id in ids {
            batch.remove(id.to_key().to_vec());
        }
        self.tree.apply_batch(batch)?;
        Ok(())
    }
}
