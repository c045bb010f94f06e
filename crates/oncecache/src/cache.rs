//! InMemoryCache: one table behind one reader/writer lock

use std::collections::HashMap;
use std::convert::Infallible;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use ahash::RandomState;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::config::CacheConfig;
use crate::error::Result;
use crate::stats::CacheStats;
use crate::{into_ok, Cache};

/// Compute-once cache guarding a single table with a single `RwLock`.
///
/// Hits take only the shared lock and never block each other. A miss takes
/// the exclusive lock and holds it while `compute` runs, so a slow
/// computation for one key delays insertion of every other key. Use
/// [`ShardedCache`](crate::ShardedCache) or [`KeyedCache`](crate::KeyedCache)
/// when that matters.
#[derive(Debug)]
pub struct InMemoryCache<K, V, S = RandomState> {
    /// Key -> value, write-once per key
    table: RwLock<HashMap<K, V, S>>,

    /// Hit/miss counters
    stats: Arc<CacheStats>,
}

impl<K, V, S: Default> Default for InMemoryCache<K, V, S> {
    fn default() -> Self {
        Self {
            table: RwLock::new(HashMap::default()),
            stats: Arc::default(),
        }
    }
}

impl<K, V> InMemoryCache<K, V, RandomState>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cache with room for `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, RandomState::new())
    }

    /// Create an empty cache from a config
    ///
    /// # Returns
    /// * `Result<InMemoryCache>` - Err if the config does not validate
    pub fn with_config(config: &CacheConfig) -> Result<Self> {
        config.validate()?;
        debug!(
            initial_capacity = config.initial_capacity,
            "creating in-memory cache"
        );
        Ok(Self::with_capacity(config.initial_capacity))
    }
}

impl<K, V, S> InMemoryCache<K, V, S>
where
    K: Eq + Hash,
    V: Clone,
    S: BuildHasher,
{
    /// Create an empty cache using `hasher` for the table
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(0, hasher)
    }

    /// Create an empty cache with room for `capacity` entries, using `hasher`
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self::with_shared_stats(capacity, hasher, Arc::default())
    }

    /// Create an empty cache that reports into `stats`
    pub(crate) fn with_shared_stats(capacity: usize, hasher: S, stats: Arc<CacheStats>) -> Self {
        Self {
            table: RwLock::new(HashMap::with_capacity_and_hasher(capacity, hasher)),
            stats,
        }
    }

    /// Get the stored value for `key`
    ///
    /// Never runs user code and never blocks other readers.
    pub fn get(&self, key: &K) -> Option<V> {
        self.table.read().get(key).cloned()
    }

    /// Check whether `key` has a value
    pub fn contains_key(&self, key: &K) -> bool {
        self.table.read().contains_key(key)
    }

    /// Get the stored value for `key`, or compute, store and return it
    ///
    /// `compute` runs at most once per key, even when many threads call this
    /// for the same absent key at once: one of them computes while holding
    /// the exclusive lock, the rest wait and then return the stored value.
    ///
    /// `compute` must not call back into this cache; the exclusive lock is
    /// held while it runs and the call would deadlock.
    pub fn get_or_set<F>(&self, key: K, compute: F) -> V
    where
        F: FnOnce() -> V,
    {
        into_ok(self.try_get_or_set(key, || Ok::<V, Infallible>(compute())))
    }

    /// Fallible [`get_or_set`](Self::get_or_set)
    ///
    /// If `compute` returns an error nothing is stored, the error goes back
    /// to this caller, and the key stays absent. Callers that were waiting
    /// on the exclusive lock re-check, find the key absent, and run their
    /// own `compute`.
    pub fn try_get_or_set<F, E>(&self, key: K, compute: F) -> std::result::Result<V, E>
    where
        F: FnOnce() -> std::result::Result<V, E>,
    {
        {
            let table = self.table.read();
            if let Some(value) = table.get(&key) {
                self.stats.record_hit();
                trace!("cache hit");
                return Ok(value.clone());
            }
        }

        let mut table = self.table.write();

        // Another writer may have stored the key between the two locks
        if let Some(value) = table.get(&key) {
            self.stats.record_contended_hit();
            trace!("cache hit after waiting for writer");
            return Ok(value.clone());
        }

        match compute() {
            Ok(value) => {
                table.insert(key, value.clone());
                self.stats.record_computation();
                debug!(entries = table.len(), "computed and stored value");
                Ok(value)
            }
            Err(err) => {
                self.stats.record_failure();
                debug!("computation failed, key left absent");
                Err(err)
            }
        }
    }

    /// Get the number of stored entries
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

impl<K, V, S> Cache<K, V> for InMemoryCache<K, V, S>
where
    K: Eq + Hash,
    V: Clone,
    S: BuildHasher,
{
    fn get(&self, key: &K) -> Option<V> {
        InMemoryCache::get(self, key)
    }

    fn try_get_or_set<F, E>(&self, key: K, compute: F) -> std::result::Result<V, E>
    where
        F: FnOnce() -> std::result::Result<V, E>,
    {
        InMemoryCache::try_get_or_set(self, key, compute)
    }
}
