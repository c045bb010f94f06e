//! Error types for oncecache

/// Result type alias for oncecache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building a cache.
///
/// Lookups and computations never produce this type: absence is an `Option`
/// and fallible computations return the caller's own error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Shard count is zero or not a power of two
    #[error("invalid shard count: {0} (must be a non-zero power of two)")]
    InvalidShardCount(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidShardCount(3);
        assert_eq!(
            err.to_string(),
            "invalid shard count: 3 (must be a non-zero power of two)"
        );
    }
}
