//! Process-wide memoization of scope rollups

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

use super::rollup::{Scope, SummarizeResult};

#[derive(Debug, Default)]
struct CacheMaps {
    by_cluster: HashMap<String, SummarizeResult>,
    by_namespace: HashMap<String, SummarizeResult>,
    /// Bumped by every `clear`
    generation: u64,
}

/// Point-in-time cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub cluster_entries: usize,
    pub namespace_entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub clears: u64,
    pub generation: u64,
}

/// Result of a cache lookup
///
/// `generation` is passed back to [`SummaryCache::insert`] so a result
/// computed before a concurrent `clear` is not stored after it.
#[derive(Debug, Clone)]
pub struct CacheLookup {
    pub hit: Option<SummarizeResult>,
    pub generation: u64,
}

/// Cluster- and namespace-keyed rollup cache
///
/// Both maps sit behind one lock, so a reader never sees one map cleared
/// and the other not. Entries never expire.
#[derive(Debug, Default)]
pub struct SummaryCache {
    maps: RwLock<CacheMaps>,
    hits: AtomicU64,
    misses: AtomicU64,
    clears: AtomicU64,
}

impl SummaryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only single-dimension scopes are cached
    pub fn is_cacheable(scope: &Scope) -> bool {
        !matches!(scope, Scope::ClusterNamespace { .. })
    }

    pub fn lookup(&self, scope: &Scope) -> CacheLookup {
        let maps = self.read();
        let hit = match scope {
            Scope::Cluster(cluster) => maps.by_cluster.get(cluster).cloned(),
            Scope::Namespace(namespace) => maps.by_namespace.get(namespace).cloned(),
            Scope::ClusterNamespace { .. } => None,
        };
        if Self::is_cacheable(scope) {
            let counter = if hit.is_some() { &self.hits } else { &self.misses };
            counter.fetch_add(1, Ordering::Relaxed);
        }
        CacheLookup {
            hit,
            generation: maps.generation,
        }
    }

    /// Store a result looked up at `generation`
    ///
    /// Returns false for scopes that are never cached and when the cache
    /// was cleared since the lookup.
    pub fn insert(&self, scope: &Scope, result: SummarizeResult, generation: u64) -> bool {
        let mut maps = self.write();
        if maps.generation != generation {
            debug!(scope = %scope, "Cache cleared since lookup, result not stored");
            return false;
        }
        match scope {
            Scope::Cluster(cluster) => {
                maps.by_cluster.insert(cluster.clone(), result);
            }
            Scope::Namespace(namespace) => {
                maps.by_namespace.insert(namespace.clone(), result);
            }
            Scope::ClusterNamespace { .. } => return false,
        }
        true
    }

    /// Drop every entry in both maps under a single write lock
    ///
    /// Also clears a poisoned lock, since nothing written by the panicking
    /// writer survives.
    pub fn clear(&self) -> usize {
        let dropped = {
            let mut maps = self.write();
            let dropped = maps.by_cluster.len() + maps.by_namespace.len();
            maps.by_cluster.clear();
            maps.by_namespace.clear();
            maps.generation += 1;
            dropped
        };
        self.maps.clear_poison();
        self.clears.fetch_add(1, Ordering::Relaxed);
        debug!(dropped, "Summary cache cleared");
        dropped
    }

    /// A writer panicked while holding the lock and no clear has run since
    pub fn is_poisoned(&self) -> bool {
        self.maps.is_poisoned()
    }

    pub fn stats(&self) -> CacheStats {
        let maps = self.read();
        CacheStats {
            cluster_entries: maps.by_cluster.len(),
            namespace_entries: maps.by_namespace.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            clears: self.clears.load(Ordering::Relaxed),
            generation: maps.generation,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheMaps> {
        self.maps.read().unwrap_or_else(|poisoned| {
            warn!("Summary cache lock poisoned, reading recovered state");
            PoisonError::into_inner(poisoned)
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheMaps> {
        self.maps.write().unwrap_or_else(|poisoned| {
            warn!("Summary cache lock poisoned, writing recovered state");
            PoisonError::into_inner(poisoned)
        })
    }

    #[cfg(test)]
    pub(crate) fn poison(&self) {
        let _ = std::thread::scope(|s| {
            s.spawn(|| {
                let _guard = self.write();
                panic!("writer panicked while holding the cache lock");
            })
            .join()
        });
    }
}
