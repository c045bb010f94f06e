//! Cache statistics tracking

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters describing how `get_or_set` calls were resolved.
///
/// Every call lands in exactly one of: hit, contended hit, computation,
/// failure. Plain lookups are not counted.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    contended_hits: AtomicU64,
    computations: AtomicU64,
    failures: AtomicU64,
}

impl CacheStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value found on the first, shared-lock check
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a value found only after waiting for another caller's computation
    pub fn record_contended_hit(&self) {
        self.contended_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a computation that produced and stored a value
    pub fn record_computation(&self) {
        self.computations.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a computation that returned an error
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total hits
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Get total contended hits
    pub fn contended_hits(&self) -> u64 {
        self.contended_hits.load(Ordering::Relaxed)
    }

    /// Get total successful computations
    pub fn computations(&self) -> u64 {
        self.computations.load(Ordering::Relaxed)
    }

    /// Get total failed computations
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Misses are calls that ran the compute function, successful or not
    pub fn misses(&self) -> u64 {
        self.computations() + self.failures()
    }

    /// Calculate hit ratio (0.0 to 1.0), counting contended hits as hits
    pub fn hit_ratio(&self) -> f64 {
        let hits = self.hits() + self.contended_hits();
        let total = hits + self.misses();
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}
