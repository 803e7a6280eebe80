//! Parameter selection for Bloom filters
//!
//! Standard optimal-parameter derivation under the independent uniform hash
//! assumption.

use std::f64::consts::LN_2;

use log::debug;

use crate::{BloomError, Result};

/// Optimal Bloom filter parameters for a capacity and target rate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloomParameters {
    pub num_bits: u32,
    pub num_hashes: u32,
    pub expected_fpr: f64,
}

/// Calculate optimal Bloom filter parameters for `expected_items` keys at a
/// target false-positive rate
pub fn optimal_parameters(expected_items: u64, target_fpr: f64) -> Result<BloomParameters> {
    let num_bits = optimal_num_bits(expected_items, target_fpr)?;
    let num_hashes = optimal_num_hashes(num_bits, expected_items);
    let expected_fpr = false_positive_rate(num_bits, num_hashes, expected_items);

    debug!(
        "optimal parameters for n={} p={}: m={} k={} (analytic fpr {:.6})",
        expected_items, target_fpr, num_bits, num_hashes, expected_fpr
    );

    Ok(BloomParameters {
        num_bits,
        num_hashes,
        expected_fpr,
    })
}

/// Optimal number of bits: `m = ceil(-(n * ln(p)) / (ln 2)^2)`
pub fn optimal_num_bits(expected_items: u64, target_fpr: f64) -> Result<u32> {
    if expected_items == 0 {
        return Err(BloomError::InvalidParameters(
            "Expected item count must be > 0".to_string(),
        ));
    }
    // Written so that NaN fails too.
    if !(target_fpr > 0.0 && target_fpr < 1.0) {
        return Err(BloomError::InvalidParameters(format!(
            "Target false positive rate must be in (0, 1), got {}",
            target_fpr
        )));
    }

    let n = expected_items as f64;
    let bits = (-(n * target_fpr.ln()) / (LN_2 * LN_2)).ceil();
    if bits > u32::MAX as f64 {
        return Err(BloomError::InvalidParameters(format!(
            "{} items at rate {} need {} bits, more than {}",
            expected_items,
            target_fpr,
            bits,
            u32::MAX
        )));
    }

    Ok((bits as u32).max(1))
}

/// Optimal number of hash functions: `k = round((m / n) * ln 2)`, at least 1
pub fn optimal_num_hashes(num_bits: u32, expected_items: u64) -> u32 {
    if expected_items == 0 {
        return 1;
    }
    let k = (num_bits as f64 / expected_items as f64 * LN_2).round();
    (k as u32).max(1)
}

/// Analytic false-positive rate `(1 - e^(-k * n / m))^k`
///
/// Zero before anything is inserted; a zero-bit filter would match everything.
pub fn false_positive_rate(num_bits: u32, num_hashes: u32, items: u64) -> f64 {
    if items == 0 {
        return 0.0;
    }
    if num_bits == 0 {
        return 1.0;
    }

    let k = num_hashes as f64;
    let exponent = -k * items as f64 / num_bits as f64;
    (1.0 - exponent.exp()).powf(k)
}
