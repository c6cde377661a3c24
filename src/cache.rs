//! Tree Cache
//!
//! Memoizes assembled forests per audience. Any structural mutation evicts every
//! entry; there is no per-node tracking of which views contain what.
//!
//! A generation counter guards the window between fetching and storing: a forest
//! built from data read before an eviction is returned to its caller but never
//! stored.

use crate::audience::Audience;
use crate::error::TreeError;
use crate::tree::builder::Forest;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Which cache entries to evict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheScope {
    Key(Audience),
    All,
}

/// Cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
}

pub struct TreeCache {
    enabled: bool,
    entries: RwLock<HashMap<Audience, Arc<Forest>>>,
    generation: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl TreeCache {
    pub fn new() -> Self {
        Self::with_enabled(true)
    }

    /// A cache that never stores anything; every read rebuilds
    pub fn disabled() -> Self {
        Self::with_enabled(false)
    }

    pub fn with_enabled(enabled: bool) -> Self {
        Self {
            enabled,
            entries: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Return the cached forest for `key`, building and storing it on a miss
    ///
    /// A failed build stores nothing.
    pub fn get_or_build<F>(&self, key: Audience, build: F) -> Result<Arc<Forest>, TreeError>
    where
        F: FnOnce() -> Result<Forest, TreeError>,
    {
        let generation = {
            let entries = self.entries.read();
            if let Some(forest) = entries.get(&key) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(audience = %key, "Tree cache hit");
                return Ok(Arc::clone(forest));
            }
            self.generation.load(Ordering::SeqCst)
        };

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(audience = %key, "Tree cache miss");
        let forest = Arc::new(build()?);

        if self.enabled {
            let mut entries = self.entries.write();
            if self.generation.load(Ordering::SeqCst) == generation {
                let stored = entries.entry(key).or_insert_with(|| Arc::clone(&forest));
                return Ok(Arc::clone(stored));
            }
            debug!(audience = %key, "Tree cache evicted during build, result not stored");
        }

        Ok(forest)
    }

    /// Evict one key or everything
    pub fn invalidate(&self, scope: CacheScope) {
        let mut entries = self.entries.write();
        self.generation.fetch_add(1, Ordering::SeqCst);
        let evicted = match scope {
            CacheScope::Key(key) => usize::from(entries.remove(&key).is_some()),
            CacheScope::All => {
                let count = entries.len();
                entries.clear();
                count
            }
        };
        self.evictions.fetch_add(evicted as u64, Ordering::Relaxed);
        debug!(?scope, evicted, "Tree cache invalidated");
    }

    pub fn contains(&self, key: Audience) -> bool {
        self.entries.read().contains_key(&key)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.entries.read().len(),
        }
    }
}

impl Default for TreeCache {
    fn default() -> Self {
        Self::new()
    }
}
