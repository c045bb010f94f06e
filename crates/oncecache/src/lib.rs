//! # oncecache
//!
//! In-memory key/value cache that computes each key's value exactly once.
//!
//! ## Architecture
//! - **InMemoryCache**: one table behind one `RwLock`, double-checked locking
//! - **ShardedCache**: lock striping over `InMemoryCache` shards
//! - **KeyedCache**: per-key in-flight cells, compute runs outside the table lock
//! - **Cache trait**: the capability all three share, so call sites can swap them
//!
//! ## Guarantees
//! - `compute` runs at most once per key, however many callers race on it
//! - Hits only ever take the shared lock
//! - A stored value never changes
//!
//! ```
//! use oncecache::InMemoryCache;
//!
//! let cache = InMemoryCache::new();
//! let value = cache.get_or_set("1".to_string(), || "1000".to_string());
//! assert_eq!(value, "1000");
//! assert_eq!(cache.get(&"1".to_string()), Some("1000".to_string()));
//! ```

#![warn(missing_docs)]

mod cache;
mod config;
mod error;
mod keyed;
mod sharded;
mod stats;

use std::convert::Infallible;
use std::sync::Arc;

pub use cache::InMemoryCache;
pub use config::{CacheConfig, DEFAULT_SHARDS};
pub use error::{Error, Result};
pub use keyed::KeyedCache;
pub use sharded::ShardedCache;
pub use stats::CacheStats;

/// Baseline key type
pub type Key = String;

/// Baseline value type
pub type Value = String;

/// Lookup and compute-once fetch over a shared table.
///
/// Implementations differ only in how much a running computation blocks
/// unrelated keys; the observable contract is the same for all of them.
pub trait Cache<K, V> {
    /// Return the stored value for `key`, or `None` if it was never set.
    fn get(&self, key: &K) -> Option<V>;

    /// Return the stored value for `key`, computing and storing it first if
    /// absent. If `compute` fails nothing is stored and the error is returned
    /// to this caller only; the next caller for `key` computes again.
    fn try_get_or_set<F, E>(&self, key: K, compute: F) -> std::result::Result<V, E>
    where
        F: FnOnce() -> std::result::Result<V, E>;

    /// Return the stored value for `key`, computing and storing it first if
    /// absent. `compute` runs at most once per key across all callers.
    fn get_or_set<F>(&self, key: K, compute: F) -> V
    where
        F: FnOnce() -> V,
    {
        into_ok(self.try_get_or_set(key, || Ok(compute())))
    }
}

impl<K, V, C: Cache<K, V>> Cache<K, V> for &C {
    fn get(&self, key: &K) -> Option<V> {
        (**self).get(key)
    }

    fn try_get_or_set<F, E>(&self, key: K, compute: F) -> std::result::Result<V, E>
    where
        F: FnOnce() -> std::result::Result<V, E>,
    {
        (**self).try_get_or_set(key, compute)
    }
}

impl<K, V, C: Cache<K, V>> Cache<K, V> for Arc<C> {
    fn get(&self, key: &K) -> Option<V> {
        (**self).get(key)
    }

    fn try_get_or_set<F, E>(&self, key: K, compute: F) -> std::result::Result<V, E>
    where
        F: FnOnce() -> std::result::Result<V, E>,
    {
        (**self).try_get_or_set(key, compute)
    }
}

fn into_ok<V>(result: std::result::Result<V, Infallible>) -> V {
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}
