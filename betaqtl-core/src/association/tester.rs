//! Per-dataset correlation test for one pass (unpermuted or permutation k).

use crate::qc::prune;
use crate::stats::{center_scale, correlation_pvalue, p_to_z_two_tailed};

/// Per-dataset statistics of one pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatasetStats {
    pub r: f64,
    pub p: f64,
    pub z: f64,
    /// Pruned sample count.
    pub n: usize,
}

impl DatasetStats {
    /// Statistics of a correlation `r` over `n` samples.
    ///
    /// A NaN correlation (constant input) is reported as (0, 1, 0).
    pub fn from_correlation(r: f64, n: usize) -> Self {
        if r.is_nan() {
            return Self { r: 0.0, p: 1.0, z: 0.0, n };
        }
        let p = correlation_pvalue(r, n).max(f64::MIN_POSITIVE);
        let mut z = p_to_z_two_tailed(p);
        if r > 0.0 {
            z = -z;
        }
        Self { r, p, z, n }
    }
}

/// Result of one dataset's pass, including the alt allele tally.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassResult {
    pub stats: DatasetStats,
    pub alt_alleles: u64,
    pub total_alleles: u64,
}

/// Alt alleles carried by pruned dosages: 0.5 ≤ d ≤ 1.5 counts one,
/// d > 1.5 counts two.
pub fn count_alt_alleles(dosages: &[f64]) -> u64 {
    dosages
        .iter()
        .map(|&d| {
            if d > 1.5 {
                2
            } else if d >= 0.5 {
                1
            } else {
                0
            }
        })
        .sum()
}

/// Prune against `phenotype`, then correlate dosage with phenotype.
///
/// Returns `None` when fewer than `min_observations` samples remain.
pub fn association_pass(
    calls: &[Option<f64>],
    dosages: &[f64],
    phenotype: &[f64],
    min_observations: usize,
) -> Option<PassResult> {
    let pruned = prune(calls, dosages, phenotype);
    let n = pruned.dosages.len();
    if n < min_observations {
        return None;
    }
    let alt_alleles = count_alt_alleles(&pruned.dosages);

    let mut x = pruned.dosages;
    let mut y = pruned.phenotype;
    let r = if center_scale(&mut x) && center_scale(&mut y) {
        let dot: f64 = x.iter().zip(&y).map(|(a, b)| a * b).sum();
        (dot / (n - 1) as f64).clamp(-1.0, 1.0)
    } else {
        f64::NAN
    };

    Some(PassResult {
        stats: DatasetStats::from_correlation(r, n),
        alt_alleles,
        total_alleles: 2 * n as u64,
    })
}
