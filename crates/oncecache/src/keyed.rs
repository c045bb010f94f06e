//! KeyedCache: per-key in-flight cells
//!
//! The table maps each key to a shared `OnceCell`. The table lock is only
//! held long enough to find or insert a cell; `compute` then runs inside the
//! cell's own initialization, so callers racing on one key wait for each
//! other while callers on other keys carry on.

use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use ahash::RandomState;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::config::CacheConfig;
use crate::error::Result;
use crate::stats::CacheStats;
use crate::Cache;

type Slot<V> = Arc<OnceCell<V>>;

/// Compute-once cache that never holds the table lock while computing
#[derive(Debug)]
pub struct KeyedCache<K, V, S = RandomState> {
    /// Key -> cell; an empty cell is a computation in flight or one that failed
    table: RwLock<HashMap<K, Slot<V>, S>>,

    stats: Arc<CacheStats>,
}

impl<K, V, S: Default> Default for KeyedCache<K, V, S> {
    fn default() -> Self {
        Self {
            table: RwLock::new(HashMap::default()),
            stats: Arc::default(),
        }
    }
}

impl<K, V> KeyedCache<K, V, RandomState>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cache with room for `capacity` keys
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, RandomState::new())
    }

    /// Create an empty cache from a config
    pub fn with_config(config: &CacheConfig) -> Result<Self> {
        config.validate()?;
        debug!(
            initial_capacity = config.initial_capacity,
            "creating keyed cache"
        );
        Ok(Self::with_capacity(config.initial_capacity))
    }
}

impl<K, V, S> KeyedCache<K, V, S>
where
    K: Eq + Hash,
    V: Clone,
    S: BuildHasher,
{
    /// Create an empty cache with room for `capacity` keys, using `hasher`
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            table: RwLock::new(HashMap::with_capacity_and_hasher(capacity, hasher)),
            stats: Arc::default(),
        }
    }

    /// Get the stored value for `key`; a computation still in flight counts as absent
    pub fn get(&self, key: &K) -> Option<V> {
        self.table.read().get(key).and_then(|slot| slot.get().cloned())
    }

    /// Check whether `key` has a value
    pub fn contains_key(&self, key: &K) -> bool {
        self.table
            .read()
            .get(key)
            .is_some_and(|slot| slot.get().is_some())
    }

    /// Get the stored value for `key`, or compute, store and return it
    ///
    /// `compute` runs at most once per key. Only callers for the same key
    /// wait on it, and it may use this cache for other keys.
    pub fn get_or_set<F>(&self, key: K, compute: F) -> V
    where
        F: FnOnce() -> V,
    {
        crate::into_ok(self.try_get_or_set(key, || Ok(compute())))
    }

    /// Fallible [`get_or_set`](Self::get_or_set)
    ///
    /// A failure leaves the key's cell empty. A caller already waiting on the
    /// cell then runs its own `compute`.
    pub fn try_get_or_set<F, E>(&self, key: K, compute: F) -> std::result::Result<V, E>
    where
        F: FnOnce() -> std::result::Result<V, E>,
    {
        let found = self.table.read().get(&key).cloned();
        if let Some(value) = found.as_ref().and_then(|slot| slot.get()) {
            self.stats.record_hit();
            trace!("cache hit");
            return Ok(value.clone());
        }

        let slot = match found {
            Some(slot) => slot,
            None => Arc::clone(self.table.write().entry(key).or_default()),
        };

        let mut computed = false;
        let result = slot.get_or_try_init(|| {
            computed = true;
            compute()
        });

        match result {
            Ok(value) if computed => {
                self.stats.record_computation();
                debug!("computed and stored value");
                Ok(value.clone())
            }
            Ok(value) => {
                self.stats.record_contended_hit();
                trace!("cache hit after waiting for computation");
                Ok(value.clone())
            }
            Err(err) => {
                self.stats.record_failure();
                debug!("computation failed, key left absent");
                Err(err)
            }
        }
    }

    /// Get the number of stored values, not counting computations in flight
    pub fn len(&self) -> usize {
        self.table
            .read()
            .values()
            .filter(|slot| slot.get().is_some())
            .count()
    }

    /// Check if no value is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

impl<K, V, S> Cache<K, V> for KeyedCache<K, V, S>
where
    K: Eq + Hash,
    V: Clone,
    S: BuildHasher,
{
    fn get(&self, key: &K) -> Option<V> {
        KeyedCache::get(self, key)
    }

    fn try_get_or_set<F, E>(&self, key: K, compute: F) -> std::result::Result<V, E>
    where
        F: FnOnce() -> std::result::Result<V, E>,
    {
        KeyedCache::try_get_or_set(self, key, compute)
    }
}
