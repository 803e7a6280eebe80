use std::time::Instant;

use bloom_gate::{BloomFilter, BloomFilterBuilder, HashStrategy, HasherKind};
use clap::Parser;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Sweep Bloom filter sizes and compare observed false positive rates with
/// the analytic estimate
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Keys inserted into every filter
    #[arg(short = 'n', long, default_value_t = 10_000)]
    items: u64,

    /// Disjoint keys probed after inserting
    #[arg(short, long, default_value_t = 10_000)]
    queries: u64,

    /// Target false positive rate for the capacity-sized reference filter
    #[arg(short = 'p', long, default_value_t = 0.01)]
    target_fpr: f64,

    /// Hash seed shared by every filter
    #[arg(long, default_value_t = 9001)]
    seed: u64,

    /// Seed for key generation
    #[arg(long, default_value_t = 42)]
    key_seed: u64,

    /// Index strategy: double | independent
    #[arg(long, default_value = "double")]
    strategy: String,

    /// Hasher: murmur3 | fnv
    #[arg(long, default_value = "murmur3")]
    hasher: String,

    /// Smallest swept size in bits per item
    #[arg(long, default_value_t = 2)]
    min_bits_per_item: u32,

    /// Largest swept size in bits per item
    #[arg(long, default_value_t = 16)]
    max_bits_per_item: u32,

    /// Step between swept sizes in bits per item
    #[arg(long, default_value_t = 2)]
    step: u32,
}

struct Row {
    num_bits: u32,
    num_hashes: u32,
    insert_time: f64,
    query_time: f64,
    false_positives: u64,
    observed_fpr: f64,
    analytic_fpr: f64,
}

/// Members and probes live in different namespaces, so no probe was inserted.
fn generate_keys(prefix: &str, count: u64, rng: &mut StdRng) -> Vec<String> {
    (0..count)
        .map(|i| format!("{}-{}-{:016x}", prefix, i, rng.gen::<u64>()))
        .collect()
}

fn run(filter: &mut BloomFilter, members: &[String], probes: &[String]) -> Row {
    let start = Instant::now();
    for key in members {
        filter.insert(key);
    }
    let insert_time = start.elapsed().as_secs_f64();

    let missing = members.iter().filter(|key| !filter.query(*key)).count();
    assert_eq!(missing, 0, "inserted keys must always be found");

    let start = Instant::now();
    let false_positives = probes.iter().filter(|key| filter.query(*key)).count() as u64;
    let query_time = start.elapsed().as_secs_f64();

    let observed_fpr = if probes.is_empty() {
        0.0
    } else {
        false_positives as f64 / probes.len() as f64
    };

    Row {
        num_bits: filter.num_bits(),
        num_hashes: filter.num_hashes(),
        insert_time,
        query_time,
        false_positives,
        observed_fpr,
        analytic_fpr: filter.estimated_false_positive_rate(),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let strategy = HashStrategy::from_str(&args.strategy)?;
    let hasher = HasherKind::from_str(&args.hasher)?;
    if args.step == 0 {
        return Err("step must be > 0".into());
    }

    let mut rng = StdRng::seed_from_u64(args.key_seed);
    let members = generate_keys("member", args.items, &mut rng);
    let probes = generate_keys("probe", args.queries, &mut rng);
    info!(
        "generated {} members and {} probes (key seed {})",
        members.len(),
        probes.len(),
        args.key_seed
    );

    let configure = |builder: BloomFilterBuilder| {
        builder
            .seed(args.seed)
            .strategy(strategy)
            .hasher_kind(hasher)
    };

    let mut results = Vec::new();

    let mut reference =
        configure(BloomFilterBuilder::with_capacity(args.items, args.target_fpr)).build()?;
    info!("reference filter: {:?}", reference);
    let reference_row = run(&mut reference, &members, &probes);

    let sweep = (args.min_bits_per_item..=args.max_bits_per_item).step_by(args.step as usize);
    for bits_per_item in sweep {
        let num_bits = (args.items.max(1) * bits_per_item as u64).min(u32::MAX as u64) as u32;
        let num_hashes = bloom_gate::params::optimal_num_hashes(num_bits, args.items);
        info!("testing m={} k={}", num_bits, num_hashes);

        let mut filter = configure(BloomFilterBuilder::with_size(num_bits, num_hashes)).build()?;
        results.push(run(&mut filter, &members, &probes));
    }

    println!("bits,hashes,insert_time,query_time,false_positives,observed_fpr,analytic_fpr");
    for row in &results {
        println!(
            "{},{},{:.6},{:.6},{},{:.6},{:.6}",
            row.num_bits,
            row.num_hashes,
            row.insert_time,
            row.query_time,
            row.false_positives,
            row.observed_fpr,
            row.analytic_fpr
        );
    }

    println!(
        "\nCapacity-sized filter (n={}, p={}): m={} k={}",
        args.items, args.target_fpr, reference_row.num_bits, reference_row.num_hashes
    );
    println!(
        "   Observed FPR: {:.6} ({} of {})",
        reference_row.observed_fpr, reference_row.false_positives, args.queries
    );
    println!("   Analytic FPR: {:.6}", reference_row.analytic_fpr);
    println!(
        "   Insert rate: {:.0} ops/s, Query rate: {:.0} ops/s",
        rate(args.items, reference_row.insert_time),
        rate(args.queries, reference_row.query_time)
    );
    println!("   {}", reference.stats());

    Ok(())
}

fn rate(ops: u64, seconds: f64) -> f64 {
    if seconds > 0.0 {
        ops as f64 / seconds
    } else {
        f64::INFINITY
    }
}
