//! ShardedCache: lock striping over `InMemoryCache` shards
//!
//! A key always maps to the same shard, and each shard runs the single-lock
//! algorithm unchanged, so the compute-once guarantee carries over per key.
//! A slow computation only stalls keys that share its shard.

use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use ahash::RandomState;
use tracing::debug;

use crate::cache::InMemoryCache;
use crate::config::{CacheConfig, DEFAULT_SHARDS};
use crate::error::{Error, Result};
use crate::stats::CacheStats;
use crate::Cache;

/// Compute-once cache split across a power-of-two number of locked shards
#[derive(Debug)]
pub struct ShardedCache<K, V> {
    shards: Box<[InMemoryCache<K, V>]>,

    /// Picks the shard; independent of the shards' own table hashers
    selector: RandomState,

    /// Shared by every shard
    stats: Arc<CacheStats>,
}

impl<K, V> Default for ShardedCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::build(DEFAULT_SHARDS, 0)
    }
}

impl<K, V> ShardedCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Create an empty cache with the default shard count
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cache with `shards` shards
    ///
    /// # Returns
    /// * `Result<ShardedCache>` - Err if `shards` is zero or not a power of two
    pub fn with_shards(shards: usize) -> Result<Self> {
        Self::with_config(&CacheConfig::new().with_shards(shards))
    }

    /// Create an empty cache from a config
    pub fn with_config(config: &CacheConfig) -> Result<Self> {
        config.validate()?;
        debug!(
            shards = config.shards,
            initial_capacity = config.initial_capacity,
            "creating sharded cache"
        );
        Ok(Self::build(config.shards, config.initial_capacity))
    }

    fn build(shards: usize, initial_capacity: usize) -> Self {
        debug_assert!(shards.is_power_of_two(), "{}", Error::InvalidShardCount(shards));

        let stats = Arc::new(CacheStats::new());
        let per_shard = initial_capacity.div_ceil(shards);
        let shards = (0..shards)
            .map(|_| {
                InMemoryCache::with_shared_stats(per_shard, RandomState::new(), Arc::clone(&stats))
            })
            .collect();

        Self {
            shards,
            selector: RandomState::new(),
            stats,
        }
    }

    fn shard(&self, key: &K) -> &InMemoryCache<K, V> {
        let hash = BuildHasher::hash_one(&self.selector, key) as usize;
        &self.shards[hash & (self.shards.len() - 1)]
    }

    /// Get the stored value for `key`
    pub fn get(&self, key: &K) -> Option<V> {
        self.shard(key).get(key)
    }

    /// Check whether `key` has a value
    pub fn contains_key(&self, key: &K) -> bool {
        self.shard(key).contains_key(key)
    }

    /// Get the stored value for `key`, or compute, store and return it
    ///
    /// `compute` runs at most once per key. While it runs, the key's shard is
    /// exclusively locked; `compute` must not call back into this cache.
    pub fn get_or_set<F>(&self, key: K, compute: F) -> V
    where
        F: FnOnce() -> V,
    {
        let shard = self.shard(&key);
        shard.get_or_set(key, compute)
    }

    /// Fallible [`get_or_set`](Self::get_or_set); failures store nothing
    pub fn try_get_or_set<F, E>(&self, key: K, compute: F) -> std::result::Result<V, E>
    where
        F: FnOnce() -> std::result::Result<V, E>,
    {
        let shard = self.shard(&key);
        shard.try_get_or_set(key, compute)
    }

    /// Get the number of stored entries, summed shard by shard
    pub fn len(&self) -> usize {
        self.shards.iter().map(InMemoryCache::len).sum()
    }

    /// Check if every shard is empty
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(InMemoryCache::is_empty)
    }

    /// Get the shard count
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Get cache statistics, aggregated over all shards
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

impl<K, V> Cache<K, V> for ShardedCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn get(&self, key: &K) -> Option<V> {
        ShardedCache::get(self, key)
    }

    fn try_get_or_set<F, E>(&self, key: K, compute: F) -> std::result::Result<V, E>
    where
        F: FnOnce() -> std::result::Result<V, E>,
    {
        ShardedCache::try_get_or_set(self, key, compute)
    }
}
