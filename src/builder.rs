//! Filter configuration
//!
//! A filter is fully described by its size, hash count, seed, index strategy
//! and hasher. Two filters built from equal configurations map every key to
//! the same bits.

use log::debug;

use crate::hash::{
    FnvKeyHasher, HashFamily, HashStrategy, KeyHasher, Murmur3KeyHasher, DEFAULT_SEED,
};
use crate::{params, BloomError, BloomFilter, Result};

/// Built-in hashers selectable by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HasherKind {
    #[default]
    Murmur3,
    Fnv,
}

impl HasherKind {
    /// Parse a hasher name (`murmur3` or `fnv`)
    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "murmur3" => Ok(HasherKind::Murmur3),
            "fnv" => Ok(HasherKind::Fnv),
            _ => Err(BloomError::InvalidParameters(format!(
                "Unknown hasher: {}",
                s
            ))),
        }
    }

    /// Create the hasher this kind names
    pub fn build(&self) -> Box<dyn KeyHasher> {
        match self {
            HasherKind::Murmur3 => Box::new(Murmur3KeyHasher),
            HasherKind::Fnv => Box::new(FnvKeyHasher),
        }
    }
}

/// Resolved configuration of a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterConfig {
    pub num_bits: u32,
    pub num_hashes: u32,
    pub seed: u64,
    pub strategy: HashStrategy,
    pub hasher: HasherKind,
}

impl FilterConfig {
    /// Configuration with the default seed, strategy and hasher
    pub fn new(num_bits: u32, num_hashes: u32) -> Self {
        FilterConfig {
            num_bits,
            num_hashes,
            seed: DEFAULT_SEED,
            strategy: HashStrategy::default(),
            hasher: HasherKind::default(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Sizing {
    Size { num_bits: u32, num_hashes: u32 },
    Capacity { expected_items: u64, target_fpr: f64 },
}

/// Builder for [`BloomFilter`] instances.
///
/// Sizing comes from either [`with_size()`](Self::with_size) or
/// [`with_capacity()`](Self::with_capacity); everything is validated in
/// [`build()`](Self::build).
pub struct BloomFilterBuilder {
    sizing: Sizing,
    seed: u64,
    strategy: HashStrategy,
    hasher: HasherKind,
    custom_hasher: Option<Box<dyn KeyHasher>>,
}

impl BloomFilterBuilder {
    /// Explicit bit count and hash count
    pub fn with_size(num_bits: u32, num_hashes: u32) -> Self {
        Self::from_sizing(Sizing::Size {
            num_bits,
            num_hashes,
        })
    }

    /// Optimal size and hash count for `expected_items` keys at `target_fpr`
    pub fn with_capacity(expected_items: u64, target_fpr: f64) -> Self {
        Self::from_sizing(Sizing::Capacity {
            expected_items,
            target_fpr,
        })
    }

    fn from_sizing(sizing: Sizing) -> Self {
        BloomFilterBuilder {
            sizing,
            seed: DEFAULT_SEED,
            strategy: HashStrategy::default(),
            hasher: HasherKind::default(),
            custom_hasher: None,
        }
    }

    /// Sets the hash seed (default: 9001).
    ///
    /// Filters with different seeds set different bits for the same key.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the index strategy (default: double hashing)
    pub fn strategy(mut self, strategy: HashStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Use one of the built-in hashers
    pub fn hasher_kind(mut self, hasher: HasherKind) -> Self {
        self.hasher = hasher;
        self.custom_hasher = None;
        self
    }

    /// Use a caller-supplied hasher
    pub fn hasher<H: KeyHasher + 'static>(mut self, hasher: H) -> Self {
        self.custom_hasher = Some(Box::new(hasher));
        self
    }

    /// Resolve sizing into a concrete configuration.
    ///
    /// A custom hasher is not part of the returned value.
    pub fn config(&self) -> Result<FilterConfig> {
        let (num_bits, num_hashes) = match self.sizing {
            Sizing::Size {
                num_bits,
                num_hashes,
            } => (num_bits, num_hashes),
            Sizing::Capacity {
                expected_items,
                target_fpr,
            } => {
                let derived = params::optimal_parameters(expected_items, target_fpr)?;
                (derived.num_bits, derived.num_hashes)
            }
        };

        if num_bits == 0 {
            return Err(BloomError::InvalidParameters(
                "Bit count must be > 0".to_string(),
            ));
        }
        if num_hashes == 0 {
            return Err(BloomError::InvalidParameters(
                "Number of hashes must be > 0".to_string(),
            ));
        }

        Ok(FilterConfig {
            num_bits,
            num_hashes,
            seed: self.seed,
            strategy: self.strategy,
            hasher: self.hasher,
        })
    }

    /// Builds the Bloom filter.
    pub fn build(self) -> Result<BloomFilter> {
        let config = self.config()?;
        match self.custom_hasher {
            Some(hasher) => {
                debug!("building bloom filter with custom hasher {}", hasher.name());
                let family =
                    HashFamily::new(config.num_hashes, config.seed, config.strategy, hasher)?;
                BloomFilter::with_hash_family(config.num_bits, family)
            }
            None => BloomFilter::with_config(config),
        }
    }
}
