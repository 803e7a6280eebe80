//! Key hashing for Bloom filters
//!
//! Keys are opaque byte strings. A [`KeyHasher`] is a pure function of
//! `(key, seed)`: every call builds its own hash state, so nothing is shared
//! between calls and identical configurations map identical keys to identical
//! values in every process.
//!
//! [`HashFamily`] turns one hasher into the `k` bit positions a filter uses,
//! either by double hashing (the default) or by `k` independently seeded
//! evaluations.

use std::hash::Hasher;
use std::io::Cursor;

use fnv::FnvHasher;

use crate::{BloomError, Result};

/// Seed used when the caller does not pick one.
///
/// Seeds are 64-bit everywhere in the filter configuration. MurmurHash3 takes
/// a 32-bit seed, so [`Murmur3KeyHasher`] folds the two halves together with
/// `(seed ^ (seed >> 32)) as u32`; seeds below 2^32 pass through unchanged.
pub const DEFAULT_SEED: u64 = 9001;

/// Stride between the per-function seeds of [`HashStrategy::Independent`]
/// and between the two halves of a 64-bit hasher's pair.
const SEED_STRIDE: u64 = 0x9e3779b97f4a7c15; // Golden ratio

/// Trait for seeded byte-string hash functions used in Bloom filters
pub trait KeyHasher: Send + Sync {
    /// Hash a key under the given seed
    fn hash(&self, key: &[u8], seed: u64) -> u64;

    /// Two base hashes for double hashing.
    ///
    /// The default derives the second value from a second seed; hashers with a
    /// wide output override this to answer with a single evaluation.
    fn hash_pair(&self, key: &[u8], seed: u64) -> (u64, u64) {
        (
            self.hash(key, seed),
            self.hash(key, seed.wrapping_add(SEED_STRIDE)),
        )
    }

    /// Get a name/identifier for this hash function
    fn name(&self) -> String;
}

/// MurmurHash3 x64 128-bit.
///
/// One evaluation produces both halves of the double-hashing pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct Murmur3KeyHasher;

impl KeyHasher for Murmur3KeyHasher {
    fn hash(&self, key: &[u8], seed: u64) -> u64 {
        murmur3_x64_128(key, fold_seed(seed)).0
    }

    fn hash_pair(&self, key: &[u8], seed: u64) -> (u64, u64) {
        murmur3_x64_128(key, fold_seed(seed))
    }

    fn name(&self) -> String {
        "murmur3_x64_128".to_string()
    }
}

/// FNV-1a 64-bit with the seed hashed ahead of the key.
///
/// Raw FNV output has weak low bits, which is exactly what `mod m` keeps, so
/// the result goes through the MurmurHash3 finalizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct FnvKeyHasher;

impl KeyHasher for FnvKeyHasher {
    fn hash(&self, key: &[u8], seed: u64) -> u64 {
        let mut hasher = FnvHasher::default();
        hasher.write(&seed.to_le_bytes());
        hasher.write(key);
        fmix64(hasher.finish())
    }

    fn name(&self) -> String {
        "fnv1a_64".to_string()
    }
}

/// How the `k` indices of a key are derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashStrategy {
    /// `index_i = (h1 + i * h2) mod m` from one hash pair
    #[default]
    DoubleHashing,
    /// `index_i = hash(key, seed + i * stride) mod m`, one evaluation per index
    Independent,
}

impl HashStrategy {
    /// Parse a strategy name (`double`, `double_hashing` or `independent`)
    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "double" | "double_hashing" => Ok(HashStrategy::DoubleHashing),
            "independent" => Ok(HashStrategy::Independent),
            _ => Err(BloomError::InvalidParameters(format!(
                "Unknown hash strategy: {}",
                s
            ))),
        }
    }

    /// Get the short name of this strategy
    pub fn name(&self) -> &'static str {
        match self {
            HashStrategy::DoubleHashing => "double",
            HashStrategy::Independent => "independent",
        }
    }
}

/// Maps a key to `k` positions in `[0, m)`.
pub struct HashFamily {
    hasher: Box<dyn KeyHasher>,
    num_hashes: u32,
    seed: u64,
    strategy: HashStrategy,
}

impl HashFamily {
    /// Create a hash family producing `num_hashes` indices per key
    pub fn new(
        num_hashes: u32,
        seed: u64,
        strategy: HashStrategy,
        hasher: Box<dyn KeyHasher>,
    ) -> Result<Self> {
        if num_hashes == 0 {
            return Err(BloomError::InvalidParameters(
                "Number of hashes must be > 0".to_string(),
            ));
        }

        Ok(HashFamily {
            hasher,
            num_hashes,
            seed,
            strategy,
        })
    }

    /// Double-hashing family over MurmurHash3 with the default seed
    pub fn with_defaults(num_hashes: u32) -> Result<Self> {
        Self::new(
            num_hashes,
            DEFAULT_SEED,
            HashStrategy::DoubleHashing,
            Box::new(Murmur3KeyHasher),
        )
    }

    /// The `k` indices of `key` in a filter of `num_bits` bits
    pub fn indices(&self, key: &[u8], num_bits: u32) -> Result<Vec<u32>> {
        if num_bits == 0 {
            return Err(BloomError::InvalidSize);
        }

        let mut out = Vec::with_capacity(self.num_hashes as usize);
        self.for_each_index(key, num_bits, |index| out.push(index));
        Ok(out)
    }

    /// Visit the `k` indices of `key` without allocating.
    ///
    /// `num_bits` must be non-zero; [`crate::BloomFilter`] rejects zero at
    /// construction. A zero size visits nothing.
    pub fn for_each_index<F>(&self, key: &[u8], num_bits: u32, mut f: F)
    where
        F: FnMut(u32),
    {
        self.all_indices(key, num_bits, |index| {
            f(index);
            true
        });
    }

    /// True if `pred` holds for every index of `key`, stopping at the first
    /// index where it does not. A zero size yields false.
    pub fn all_indices<F>(&self, key: &[u8], num_bits: u32, mut pred: F) -> bool
    where
        F: FnMut(u32) -> bool,
    {
        if num_bits == 0 {
            return false;
        }
        let modulus = num_bits as u64;

        match self.strategy {
            HashStrategy::DoubleHashing => {
                let (h1, h2) = self.hasher.hash_pair(key, self.seed);
                // An even or zero step would revisit the same slots.
                let h2 = h2 | 1;
                (0..self.num_hashes as u64).all(|i| {
                    let combined = h1.wrapping_add(i.wrapping_mul(h2));
                    pred((combined % modulus) as u32)
                })
            }
            HashStrategy::Independent => (0..self.num_hashes as u64).all(|i| {
                let seed = self.seed.wrapping_add(i.wrapping_mul(SEED_STRIDE));
                pred((self.hasher.hash(key, seed) % modulus) as u32)
            }),
        }
    }

    /// Get the number of indices produced per key
    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    /// Get the hash seed
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Get the index strategy
    pub fn strategy(&self) -> HashStrategy {
        self.strategy
    }

    /// Get the name of the underlying hasher
    pub fn hasher_name(&self) -> String {
        self.hasher.name()
    }
}

impl std::fmt::Debug for HashFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("HashFamily")
            .field("hasher", &self.hasher.name())
            .field("num_hashes", &self.num_hashes)
            .field("seed", &self.seed)
            .field("strategy", &self.strategy)
            .finish()
    }
}

/// MurmurHash3 x64 128-bit over a whole key, as `(low, high)` halves
pub fn murmur3_x64_128(key: &[u8], seed: u32) -> (u64, u64) {
    // Reading from an in-memory slice cannot fail, so the error arm is dead.
    let hash = murmur3::murmur3_x64_128(&mut Cursor::new(key), seed).unwrap_or_default();
    (hash as u64, (hash >> 64) as u64)
}

/// Fold a 64-bit seed into MurmurHash3's 32-bit seed
#[inline]
fn fold_seed(seed: u64) -> u32 {
    (seed ^ (seed >> 32)) as u32
}

/// Finalization mix: force all bits of a hash block to avalanche.
#[inline]
fn fmix64(mut k: u64) -> u64 {
    k ^= k >> 33;
    k = k.wrapping_mul(0xff51afd7ed558ccd);
    k ^= k >> 33;
    k = k.wrapping_mul(0xc4ceb9fe1a85ec53);
    k ^ (k >> 33)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_murmur3_reference_vectors() {
        // remainder > 8
        let (h1, h2) = murmur3_x64_128(b"The quick brown fox jumps over the lazy dog", 0);
        assert_eq!(h1, 0xe34bbc7bbc071b6c);
        assert_eq!(h2, 0x7a433ca9c49a9347);

        // remainder = 8
        let (h1, h2) = murmur3_x64_128(b"The quick brown fox jumps over the lazy1", 0);
        assert_eq!(h1, 0xe3301a827e5cdfe3);
        assert_eq!(h2, 0xbdbf05f8da0f0392);

        // remainder = 0
        let (h1, h2) = murmur3_x64_128(b"The quick brown fox jumps over t", 0);
        assert_eq!(h1, 0xdf6af91bb29bdacf);
        assert_eq!(h2, 0x91a341c58df1f3a6);
    }

    #[test]
    fn test_murmur3_hasher_matches_reference() {
        let hasher = Murmur3KeyHasher;
        assert_eq!(
            hasher.hash_pair(b"The quick brown fox jumps over the lazy dog", 0),
            (0xe34bbc7bbc071b6c, 0x7a433ca9c49a9347)
        );
        assert_eq!(
            hasher.hash(b"The quick brown fox jumps over t", 0),
            0xdf6af91bb29bdacf
        );
    }

    #[test]
    fn test_seed_folding() {
        assert_eq!(fold_seed(DEFAULT_SEED), 9001);
        assert_eq!(fold_seed(0xdeadbeef), 0xdeadbeef);
        assert_eq!(fold_seed(1 << 32), 1);

        // Small seeds reach MurmurHash3 unchanged
        assert_eq!(
            Murmur3KeyHasher.hash_pair(b"a", DEFAULT_SEED),
            murmur3_x64_128(b"a", 9001)
        );
        // High bits still change the mapping
        assert_ne!(
            Murmur3KeyHasher.hash(b"a", 9001),
            Murmur3KeyHasher.hash(b"a", 9001 | (1 << 40))
        );
    }

    #[test]
    fn test_hashers_are_pure() {
        let hashers: Vec<Box<dyn KeyHasher>> =
            vec![Box::new(Murmur3KeyHasher), Box::new(FnvKeyHasher)];

        for hasher in &hashers {
            assert_eq!(hasher.hash(b"key", 7), hasher.hash(b"key", 7));
            assert_eq!(hasher.hash_pair(b"key", 7), hasher.hash_pair(b"key", 7));
            assert_ne!(hasher.hash(b"key", 7), hasher.hash(b"key", 8));
            assert_ne!(hasher.hash(b"key", 7), hasher.hash(b"kez", 7));
        }
    }

    #[test]
    fn test_indices_in_range() {
        for strategy in [HashStrategy::DoubleHashing, HashStrategy::Independent] {
            let family = HashFamily::new(7, DEFAULT_SEED, strategy, Box::new(FnvKeyHasher))
                .unwrap();
            for m in [1u32, 2, 3, 64, 1000, u32::MAX] {
                let indices = family.indices(b"some key", m).unwrap();
                assert_eq!(indices.len(), 7);
                assert!(indices.iter().all(|&i| i < m));
            }
        }
    }

    #[test]
    fn test_indices_follow_double_hashing_formula() {
        let family = HashFamily::with_defaults(5).unwrap();
        let (h1, h2) = Murmur3KeyHasher.hash_pair(b"apple", DEFAULT_SEED);
        let h2 = h2 | 1;

        let expected: Vec<u32> = (0..5u64)
            .map(|i| (h1.wrapping_add(i.wrapping_mul(h2)) % 1000) as u32)
            .collect();
        assert_eq!(family.indices(b"apple", 1000).unwrap(), expected);
    }

    #[test]
    fn test_zero_size_rejected() {
        let family = HashFamily::with_defaults(3).unwrap();
        assert!(matches!(
            family.indices(b"key", 0),
            Err(BloomError::InvalidSize)
        ));
    }

    #[test]
    fn test_zero_hashes_rejected() {
        let result = HashFamily::new(
            0,
            DEFAULT_SEED,
            HashStrategy::DoubleHashing,
            Box::new(Murmur3KeyHasher),
        );
        assert!(matches!(result, Err(BloomError::InvalidParameters(_))));
    }

    #[test]
    fn test_same_configuration_same_indices() {
        let a = HashFamily::with_defaults(6).unwrap();
        let b = HashFamily::with_defaults(6).unwrap();
        assert_eq!(
            a.indices(b"stable", 4096).unwrap(),
            b.indices(b"stable", 4096).unwrap()
        );
    }

    #[test]
    fn test_seed_changes_mapping() {
        let a = HashFamily::new(
            6,
            1,
            HashStrategy::DoubleHashing,
            Box::new(Murmur3KeyHasher),
        )
        .unwrap();
        let b = HashFamily::new(
            6,
            2,
            HashStrategy::DoubleHashing,
            Box::new(Murmur3KeyHasher),
        )
        .unwrap();
        assert_ne!(
            a.indices(b"stable", 1 << 20).unwrap(),
            b.indices(b"stable", 1 << 20).unwrap()
        );
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!(
            HashStrategy::from_str("double").unwrap(),
            HashStrategy::DoubleHashing
        );
        assert_eq!(
            HashStrategy::from_str("independent").unwrap(),
            HashStrategy::Independent
        );
        assert!(HashStrategy::from_str("triple").is_err());
    }
}
