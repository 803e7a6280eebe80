//! Standard Bloom filter implementation
//!
//! A space-efficient probabilistic data structure for membership testing.
//! Bits are only ever set, never cleared, so a key that was inserted always
//! queries `true`.

use bit_vec::BitVec;
use log::debug;

use crate::builder::{BloomFilterBuilder, FilterConfig};
use crate::hash::{HashFamily, HashStrategy};
use crate::{params, BloomError, Result};

/// A standard Bloom filter over byte-string keys
pub struct BloomFilter {
    /// Packed bit array storing the filter data
    bits: BitVec,
    /// Derives the `k` bit positions of a key
    hash_family: HashFamily,
    num_bits: u32,
    /// Number of bits currently set
    bits_set: u64,
    /// Number of `insert` calls (for statistics)
    count: u64,
}

impl BloomFilter {
    /// Create a Bloom filter with `num_bits` bits and `num_hashes` hash
    /// functions, using the default hasher, seed and double hashing
    pub fn new(num_bits: u32, num_hashes: u32) -> Result<Self> {
        BloomFilterBuilder::with_size(num_bits, num_hashes).build()
    }

    /// Create a Bloom filter sized for `expected_items` keys at
    /// `target_fpr` false positive rate
    ///
    /// * `m = ceil(-(n * ln(p)) / (ln 2)^2)`
    /// * `k = round((m / n) * ln 2)`, at least 1
    pub fn from_capacity(expected_items: u64, target_fpr: f64) -> Result<Self> {
        BloomFilterBuilder::with_capacity(expected_items, target_fpr).build()
    }

    /// Create a Bloom filter from a resolved configuration
    pub fn with_config(config: FilterConfig) -> Result<Self> {
        let hasher = config.hasher.build();
        Self::with_hash_family(
            config.num_bits,
            HashFamily::new(config.num_hashes, config.seed, config.strategy, hasher)?,
        )
    }

    pub(crate) fn with_hash_family(num_bits: u32, hash_family: HashFamily) -> Result<Self> {
        if num_bits == 0 {
            return Err(BloomError::InvalidParameters(
                "Bit count must be > 0".to_string(),
            ));
        }

        debug!(
            "bloom filter: m={} k={} seed={} strategy={} hasher={}",
            num_bits,
            hash_family.num_hashes(),
            hash_family.seed(),
            hash_family.strategy().name(),
            hash_family.hasher_name()
        );

        Ok(BloomFilter {
            bits: BitVec::from_elem(num_bits as usize, false),
            hash_family,
            num_bits,
            bits_set: 0,
            count: 0,
        })
    }

    /// Insert a key into the filter
    pub fn insert<K: AsRef<[u8]> + ?Sized>(&mut self, key: &K) {
        let bits = &mut self.bits;
        let bits_set = &mut self.bits_set;

        self.hash_family
            .for_each_index(key.as_ref(), self.num_bits, |index| {
                let index = index as usize;
                if !bits[index] {
                    bits.set(index, true);
                    *bits_set += 1;
                }
            });

        self.count += 1;
    }

    /// Check if a key might be in the filter
    /// Returns true if the key might be present (with possible false positives)
    /// Returns false if the key is definitely not present
    pub fn query<K: AsRef<[u8]> + ?Sized>(&self, key: &K) -> bool {
        self.hash_family
            .all_indices(key.as_ref(), self.num_bits, |index| {
                self.bits[index as usize]
            })
    }

    /// Analytic false positive rate `(1 - e^(-k * n / m))^k` for the current
    /// number of inserts
    pub fn estimated_false_positive_rate(&self) -> f64 {
        params::false_positive_rate(self.num_bits, self.num_hashes(), self.count)
    }

    /// Get the current load factor (fraction of bits set)
    pub fn load_factor(&self) -> f64 {
        self.bits_set as f64 / self.num_bits as f64
    }

    /// Get statistics about the filter
    pub fn stats(&self) -> BloomStats {
        BloomStats {
            num_bits: self.num_bits,
            num_hash_functions: self.num_hashes(),
            items_inserted: self.count,
            bits_set: self.bits_set,
            load_factor: self.load_factor(),
            estimated_fpr: self.estimated_false_positive_rate(),
        }
    }

    /// Get the number of `insert` calls made so far
    pub fn items_inserted(&self) -> u64 {
        self.count
    }

    /// Check if nothing has been inserted
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Get the size of the bit array
    pub fn num_bits(&self) -> u32 {
        self.num_bits
    }

    /// Get the number of hash functions
    pub fn num_hashes(&self) -> u32 {
        self.hash_family.num_hashes()
    }

    /// Get the number of bits currently set
    pub fn bits_set(&self) -> u64 {
        self.bits_set
    }

    /// Get the hash seed
    pub fn seed(&self) -> u64 {
        self.hash_family.seed()
    }

    /// Get the index strategy
    pub fn strategy(&self) -> HashStrategy {
        self.hash_family.strategy()
    }

    /// Get the hash family that maps keys to bit positions
    pub fn hash_family(&self) -> &HashFamily {
        &self.hash_family
    }

    /// Read a single bit of the array
    pub fn bit(&self, index: u32) -> Option<bool> {
        self.bits.get(index as usize)
    }
}

impl std::fmt::Debug for BloomFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("BloomFilter")
            .field("num_bits", &self.num_bits)
            .field("hash_family", &self.hash_family)
            .field("bits_set", &self.bits_set)
            .field("items_inserted", &self.count)
            .finish()
    }
}

/// Statistics about a Bloom filter
#[derive(Debug, Clone)]
pub struct BloomStats {
    pub num_bits: u32,
    pub num_hash_functions: u32,
    pub items_inserted: u64,
    pub bits_set: u64,
    pub load_factor: f64,
    pub estimated_fpr: f64,
}

impl std::fmt::Display for BloomStats {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "BloomFilter Stats:\n\
             - Size: {} bits\n\
             - Hash functions: {}\n\
             - Items inserted: {}\n\
             - Bits set: {}\n\
             - Load factor: {:.3}\n\
             - Estimated FPR: {:.6}",
            self.num_bits,
            self.num_hash_functions,
            self.items_inserted,
            self.bits_set,
            self.load_factor,
            self.estimated_fpr
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_bits(bloom: &BloomFilter) -> Vec<u32> {
        (0..bloom.num_bits())
            .filter(|&i| bloom.bit(i) == Some(true))
            .collect()
    }

    #[test]
    fn test_bloom_filter_basic() {
        let mut bloom = BloomFilter::new(1000, 3).unwrap();

        bloom.insert("42");
        bloom.insert("1337");
        bloom.insert(b"9999");

        assert!(bloom.query("42"));
        assert!(bloom.query("1337"));
        assert!(bloom.query("9999"));

        // The load factor should be > 0 after insertions
        assert!(bloom.load_factor() > 0.0);
    }

    #[test]
    fn test_bloom_filter_rejects_zero_parameters() {
        assert!(matches!(
            BloomFilter::new(0, 5),
            Err(BloomError::InvalidParameters(_))
        ));
        assert!(matches!(
            BloomFilter::new(10, 0),
            Err(BloomError::InvalidParameters(_))
        ));
        assert!(BloomFilter::new(10, 5).is_ok());
    }

    #[test]
    fn test_bloom_filter_from_capacity() {
        let bloom = BloomFilter::from_capacity(500, 0.01).unwrap();
        assert_eq!(bloom.num_bits(), 4793);
        assert_eq!(bloom.num_hashes(), 7);

        assert!(BloomFilter::from_capacity(0, 0.01).is_err());
        assert!(BloomFilter::from_capacity(10, 0.0).is_err());
        assert!(BloomFilter::from_capacity(10, 1.0).is_err());
    }

    #[test]
    fn test_bloom_filter_false_negatives() {
        let mut bloom = BloomFilter::new(1000, 3).unwrap();

        let test_key = "99999";
        assert!(!bloom.query(test_key));

        // After insertion, it should definitely be found
        bloom.insert(test_key);
        assert!(bloom.query(test_key));
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut bloom = BloomFilter::new(512, 4).unwrap();

        bloom.insert("twice");
        let once = set_bits(&bloom);
        bloom.insert("twice");

        assert_eq!(set_bits(&bloom), once);
        assert_eq!(bloom.bits_set(), once.len() as u64);
        // Each call still counts as an insert
        assert_eq!(bloom.items_inserted(), 2);
    }

    #[test]
    fn test_insert_sets_hash_family_indices() {
        let mut bloom = BloomFilter::new(4096, 6).unwrap();
        bloom.insert("mapped");

        let indices = bloom
            .hash_family()
            .indices(b"mapped", bloom.num_bits())
            .unwrap();
        assert_eq!(indices.len(), 6);
        assert!(indices.iter().all(|&i| bloom.bit(i) == Some(true)));

        let mut expected = indices.clone();
        expected.sort_unstable();
        expected.dedup();
        assert_eq!(set_bits(&bloom), expected);
    }

    #[test]
    fn test_bits_set_matches_array() {
        let mut bloom = BloomFilter::new(2048, 5).unwrap();
        for i in 0..100 {
            bloom.insert(&format!("key-{}", i));
        }
        assert_eq!(bloom.bits_set(), set_bits(&bloom).len() as u64);
    }

    #[test]
    fn test_single_bit_filter() {
        let mut bloom = BloomFilter::new(1, 3).unwrap();
        assert!(!bloom.query("anything"));

        bloom.insert("a");
        // Every key maps to bit 0 now
        assert!(bloom.query("b"));
        assert_eq!(bloom.load_factor(), 1.0);
    }

    #[test]
    fn test_estimated_fpr() {
        let mut bloom = BloomFilter::new(1000, 5).unwrap();
        assert_eq!(bloom.estimated_false_positive_rate(), 0.0);

        for i in 0..100 {
            bloom.insert(&format!("item-{}", i));
        }

        let expected = (1.0 - (-5.0f64 * 100.0 / 1000.0).exp()).powi(5);
        assert!((bloom.estimated_false_positive_rate() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_bloom_filter_stats() {
        let mut bloom = BloomFilter::new(1000, 5).unwrap();

        for i in 0..100 {
            bloom.insert(&format!("{}", i));
        }

        let stats = bloom.stats();
        assert_eq!(stats.num_bits, 1000);
        assert_eq!(stats.num_hash_functions, 5);
        assert_eq!(stats.items_inserted, 100);
        assert!(stats.load_factor > 0.0);
        assert!(stats.estimated_fpr > 0.0);
        assert!(stats.to_string().contains("Hash functions: 5"));
    }
}
