//! Sample-size weighted Z meta-analysis across datasets.
//!
//! Z = Σ √nᵢ zᵢ / √(Σ nᵢ). The effect size and its standard error are
//! recovered from Z, the allele frequency and the total sample size
//! (Zhu et al. 2016, Nat Genet 48:481-487).

use crate::association::tester::DatasetStats;
use crate::stats::z_to_p;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetaResult {
    pub z: f64,
    pub p: f64,
    /// Total sample size of the contributing datasets.
    pub n_total: usize,
    pub n_datasets: usize,
}

/// Combine per-dataset z-scores. Datasets that did not contribute (`None`)
/// or have a NaN z are skipped; fewer than `min_datasets` contributors
/// gives `None`.
pub fn meta_analyze(per_dataset: &[Option<DatasetStats>], min_datasets: usize) -> Option<MetaResult> {
    let mut weighted = 0.0;
    let mut sum_sq_weights = 0.0;
    let mut n_total = 0usize;
    let mut n_datasets = 0usize;
    for stats in per_dataset.iter().flatten() {
        if stats.z.is_nan() {
            continue;
        }
        let w = (stats.n as f64).sqrt();
        weighted += w * stats.z;
        sum_sq_weights += w * w;
        n_total += stats.n;
        n_datasets += 1;
    }
    if n_datasets == 0 || n_datasets < min_datasets || sum_sq_weights <= 0.0 {
        return None;
    }
    let z = weighted / sum_sq_weights.sqrt();
    Some(MetaResult {
        z,
        p: z_to_p(z),
        n_total,
        n_datasets,
    })
}

/// Effect size and standard error from a meta z-score.
///
/// `beta = z / √(2f(1-f)(n + z²))`, `se = 1 / √(2f(1-f)(n + z²))`.
/// Both are NaN for a monomorphic allele frequency.
pub fn effect_size(z: f64, allele_freq: f64, n: usize) -> (f64, f64) {
    let denom = (2.0 * allele_freq * (1.0 - allele_freq) * (n as f64 + z * z)).sqrt();
    if !(denom > 0.0) {
        return (f64::NAN, f64::NAN);
    }
    (z / denom, 1.0 / denom)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(z: f64, n: usize) -> Option<DatasetStats> {
        Some(DatasetStats { r: 0.0, p: z_to_p(z), z, n })
    }

    #[test]
    fn test_weighted_z() {
        let m = meta_analyze(&[stats(2.0, 100), stats(1.0, 25)], 2).unwrap();
        let expected = (10.0 * 2.0 + 5.0 * 1.0) / 125.0f64.sqrt();
        assert!((m.z - expected).abs() < 1e-12);
        assert_eq!(m.n_total, 125);
        assert_eq!(m.n_datasets, 2);
        assert!((m.p - z_to_p(expected)).abs() < 1e-15);
    }

    #[test]
    fn test_min_datasets_and_skips() {
        let per = [stats(2.0, 100), None, Some(DatasetStats { r: 0.0, p: 1.0, z: f64::NAN, n: 10 })];
        assert!(meta_analyze(&per, 2).is_none());
        let m = meta_analyze(&per, 1).unwrap();
        assert_eq!(m.n_datasets, 1);
        assert!((m.z - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_effect_size() {
        let (beta, se) = effect_size(3.0, 0.3, 200);
        let denom = (2.0f64 * 0.3 * 0.7 * 209.0).sqrt();
        assert!((beta - 3.0 / denom).abs() < 1e-12);
        assert!((se - 1.0 / denom).abs() < 1e-12);
        assert!(effect_size(1.0, 0.0, 10).0.is_nan());
    }
}
