//! Cache construction parameters

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default number of shards for [`ShardedCache`](crate::ShardedCache)
pub const DEFAULT_SHARDS: usize = 16;

/// Parameters used to build any of the cache variants.
///
/// Every field has a default, so a partial document deserializes:
///
/// ```
/// use oncecache::CacheConfig;
///
/// let config: CacheConfig = serde_json::from_str(r#"{ "shards": 8 }"#).unwrap();
/// assert_eq!(config.shards, 8);
/// assert_eq!(config.initial_capacity, 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Number of entries to preallocate room for (split across shards)
    pub initial_capacity: usize,

    /// Number of lock stripes; ignored by the single-lock variants
    pub shards: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 0,
            shards: DEFAULT_SHARDS,
        }
    }
}

impl CacheConfig {
    /// Create a config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial capacity
    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    /// Set the shard count
    pub fn with_shards(mut self, shards: usize) -> Self {
        self.shards = shards;
        self
    }

    /// Check that the config can build every variant
    pub fn validate(&self) -> Result<()> {
        if !self.shards.is_power_of_two() {
            return Err(Error::InvalidShardCount(self.shards));
        }
        Ok(())
    }
}
