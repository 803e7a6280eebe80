//! # Bloom Gate
//!
//! A seeded Bloom filter over byte-string keys, meant to sit in front of an
//! expensive exact lookup: a `false` answer is exact, a `true` answer means
//! "go and check".
//!
//! Index derivation is deterministic for a given configuration (hasher, seed,
//! strategy, hash count), so the same key always maps to the same bits.

pub mod bloom;
pub mod builder;
pub mod hash;
pub mod params;

pub use bloom::{BloomFilter, BloomStats};
pub use builder::{BloomFilterBuilder, FilterConfig, HasherKind};
pub use hash::{FnvKeyHasher, HashFamily, HashStrategy, KeyHasher, Murmur3KeyHasher};
pub use params::{optimal_parameters, BloomParameters};

use thiserror::Error;

/// Common error types for the library
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BloomError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("invalid size: bit array size must be > 0")]
    InvalidSize,
}

pub type Result<T> = std::result::Result<T, BloomError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_bloom_filter() {
        let mut bloom = BloomFilter::new(1000, 10).unwrap();

        bloom.insert("a");
        bloom.insert("b");
        bloom.insert("c");

        assert!(bloom.query("a"));
        assert!(bloom.query("b"));
        assert!(bloom.query("c"));
    }

    #[test]
    fn test_error_display() {
        let err = BloomFilter::new(0, 1).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid parameters: Bit count must be > 0"
        );
        assert!(BloomError::InvalidSize.to_string().contains("size"));
    }
}
