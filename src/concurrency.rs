//! Structural write serialization
//!
//! Every structural mutation of a tree (create, move, reorder, delete, activation
//! change) holds its family's write lock from validation through persistence and
//! cache eviction. Two moves can therefore never be validated against the same
//! stale snapshot within one process. Reads take no lock.

use crate::types::TreeFamily;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

/// Per-family lock manager
///
/// Shared between the services of one process so that every writer of a family
/// goes through the same lock.
pub struct TreeLockManager {
    locks: RwLock<HashMap<TreeFamily, Arc<Mutex<()>>>>,
}

impl TreeLockManager {
    pub fn new() -> Self {
        Self {
            locks: RwLock::new(HashMap::new()),
        }
    }

    /// Get or create the structural lock for a family
    pub fn get_lock(&self, family: TreeFamily) -> Arc<Mutex<()>> {
        {
            let map = self.locks.read();
            if let Some(lock) = map.get(&family) {
                return Arc::clone(lock);
            }
        }

        // Another thread may have created it between the two acquisitions.
        let mut map = self.locks.write();
        Arc::clone(map.entry(family).or_insert_with(|| Arc::new(Mutex::new(()))))
    }
}

impl Default for TreeLockManager {
    fn default() -> Self {
        Self::new()
    }
}
