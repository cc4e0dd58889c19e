//! Bounded cache of resolved configuration views
//!
//! Entries are keyed by `(repository, version)` and evicted least recently
//! used first. The expensive computation on a miss runs outside the lock; the
//! result is installed in one short critical section.
//!
//! Each repository carries a generation counter that [`ConfigCache::invalidate`]
//! bumps. A value computed under an older generation is still handed to the
//! caller that computed it, but it is not installed, so an invalidation can
//! never be undone by a slow in-flight load.

use lru::LruCache;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Default number of resolved views kept.
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// Something holding per-repository state that can go stale.
pub trait Invalidate: Send + Sync {
    /// Drop everything derived from `repo`.
    fn invalidate(&self, repo: &str);

    /// Drop everything.
    fn invalidate_all(&self);
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    repo: String,
    version: Option<String>,
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries pushed out by the capacity bound.
    pub evictions: u64,
    /// Entries dropped by invalidation.
    pub invalidations: u64,
    /// Computed values not installed because the repository was invalidated
    /// while they were being computed.
    pub stale_discards: u64,
    /// Entries currently cached.
    pub size: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Generation snapshot taken when a miss starts computing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Generation {
    epoch: u64,
    repo: u64,
}

struct CacheState<V> {
    entries: LruCache<CacheKey, Arc<V>>,
    generations: HashMap<String, u64>,
    epoch: u64,
    stats: CacheStats,
}

impl<V> CacheState<V> {
    fn generation(&self, repo: &str) -> Generation {
        Generation {
            epoch: self.epoch,
            repo: self.generations.get(repo).copied().unwrap_or(0),
        }
    }
}

/// LRU cache of `Arc<V>` values keyed by repository and version.
pub struct ConfigCache<V> {
    state: Mutex<CacheState<V>>,
    capacity: NonZeroUsize,
}

impl<V> ConfigCache<V> {
    /// Create a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            state: Mutex::new(CacheState {
                entries: LruCache::new(capacity),
                generations: HashMap::new(),
                epoch: 0,
                stats: CacheStats::default(),
            }),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            size: state.entries.len(),
            ..state.stats
        }
    }

    /// Cached value without touching recency or statistics.
    pub fn peek(&self, repo: &str, version: Option<&str>) -> Option<Arc<V>> {
        let key = key(repo, version);
        self.state.lock().entries.peek(&key).cloned()
    }

    /// Return the cached value, computing and installing it on a miss.
    ///
    /// Concurrent misses for the same key may each compute; the last
    /// installer wins and every caller gets a valid value.
    pub fn get_or_compute<E>(
        &self,
        repo: &str,
        version: Option<&str>,
        compute: impl FnOnce() -> Result<Arc<V>, E>,
    ) -> Result<Arc<V>, E> {
        let key = key(repo, version);

        let generation = {
            let mut state = self.state.lock();
            if let Some(value) = state.entries.get(&key) {
                let value = Arc::clone(value);
                state.stats.hits += 1;
                return Ok(value);
            }
            state.stats.misses += 1;
            state.generation(repo)
        };

        tracing::debug!(repo, version, "Cache miss");
        let value = compute()?;

        let mut state = self.state.lock();
        if state.generation(repo) == generation {
            if let Some((evicted, _)) = state.entries.push(key.clone(), Arc::clone(&value)) {
                if evicted != key {
                    state.stats.evictions += 1;
                    tracing::trace!(repo = %evicted.repo, "Evicted least recently used view");
                }
            }
        } else {
            state.stats.stale_discards += 1;
            tracing::debug!(repo, version, "Discarding view computed before invalidation");
        }

        Ok(value)
    }

    /// Current generation counter of `repo`.
    pub fn generation(&self, repo: &str) -> u64 {
        self.state.lock().generations.get(repo).copied().unwrap_or(0)
    }
}

fn key(repo: &str, version: Option<&str>) -> CacheKey {
    CacheKey {
        repo: repo.to_string(),
        version: version.map(str::to_string),
    }
}

impl<V: Send + Sync> Invalidate for ConfigCache<V> {
    fn invalidate(&self, repo: &str) {
        let mut state = self.state.lock();
        *state.generations.entry(repo.to_string()).or_insert(0) += 1;

        let stale: Vec<CacheKey> = state
            .entries
            .iter()
            .filter(|(key, _)| key.repo == repo)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &stale {
            state.entries.pop(key);
        }
        state.stats.invalidations += stale.len() as u64;
        drop(state);

        tracing::debug!(repo, removed = stale.len(), "Invalidated cached views");
    }

    fn invalidate_all(&self) {
        let mut state = self.state.lock();
        state.epoch += 1;
        let removed = state.entries.len();
        state.entries.clear();
        state.stats.invalidations += removed as u64;
        drop(state);

        tracing::debug!(removed, "Invalidated all cached views");
    }
}

impl<V> std::fmt::Debug for ConfigCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigCache")
            .field("capacity", &self.capacity)
            .field("stats", &self.stats())
            .finish()
    }
}
