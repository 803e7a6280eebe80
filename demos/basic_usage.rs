//! Basic usage examples for bloom-gate

use bloom_gate::{BloomFilter, BloomFilterBuilder, HashStrategy, HasherKind};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Bloom Gate Examples ===\n");

    // Example 1: A tiny filter with one hash function
    println!("1. Tiny filter (16 bits, 1 hash):");
    let mut bloom = BloomFilter::new(16, 1)?;

    let keys = ["a", "b", "c"];
    for key in &keys {
        bloom.insert(key);
    }
    for key in &keys {
        println!("  {} {}", key, bloom.query(key));
    }
    for key in &["d", "e", "f"] {
        println!("  {} {} (never inserted)", key, bloom.query(key));
    }
    println!("  {}", bloom.stats());
    println!();

    // Example 2: Sized from expected items and a target rate
    println!("2. Capacity-sized filter (1000 items, 1% FPR):");
    let mut sized = BloomFilter::from_capacity(1000, 0.01)?;
    println!(
        "  m = {} bits, k = {} hashes",
        sized.num_bits(),
        sized.num_hashes()
    );

    for i in 0..1000 {
        sized.insert(&format!("user:{}", i));
    }
    let false_positives = (0..1000)
        .filter(|i| sized.query(&format!("guest:{}", i)))
        .count();
    println!("  False positives on 1000 unseen keys: {}", false_positives);
    println!(
        "  Estimated FPR: {:.4}",
        sized.estimated_false_positive_rate()
    );
    println!();

    // Example 3: Guarding an expensive lookup
    println!("3. Pre-filter in front of a slow store:");
    let store = ["alpha", "beta", "gamma"];
    let mut gate = BloomFilterBuilder::with_capacity(store.len() as u64, 0.001)
        .seed(7)
        .strategy(HashStrategy::Independent)
        .hasher_kind(HasherKind::Fnv)
        .build()?;
    for key in &store {
        gate.insert(key);
    }

    for key in &["beta", "delta"] {
        if gate.query(key) {
            let found = store.contains(key);
            println!("  {}: possibly present, store says {}", key, found);
        } else {
            println!("  {}: definitely absent, store skipped", key);
        }
    }

    Ok(())
}
