//! Per-dataset variant quality control.

pub mod hwe;
pub mod imputation;
pub mod prune;

pub use hwe::hwe_exact;
pub use imputation::impute_missing_mean;
pub use prune::{prune, Pruned};

/// Thresholds a variant must meet within one dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QcThresholds {
    pub maf: f64,
    pub call_rate: f64,
    pub hwe: f64,
    /// Carriers needed in at least two genotype classes (0 disables).
    pub min_genotype_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QcResult {
    /// Alt allele frequency among called samples.
    pub alt_freq: f64,
    pub maf: f64,
    pub call_rate: f64,
    pub hwe_p: f64,
    pub n_called: usize,
    /// Carriers of 0, 1 and 2 alt alleles.
    pub genotype_counts: [usize; 3],
    pub pass: bool,
}

impl QcResult {
    /// Copy with the pass flag forced off.
    pub fn failed(self) -> Self {
        Self { pass: false, ..self }
    }
}

/// Evaluate QC on genotype calls. Calls are rounded to the nearest class.
pub fn variant_qc<I>(calls: I, thresholds: &QcThresholds) -> QcResult
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut counts = [0usize; 3];
    let mut total = 0usize;
    for call in calls {
        total += 1;
        if let Some(g) = call.filter(|g| g.is_finite()) {
            counts[g.round().clamp(0.0, 2.0) as usize] += 1;
        }
    }
    let called: usize = counts.iter().sum();
    if called == 0 {
        return QcResult {
            alt_freq: f64::NAN,
            maf: f64::NAN,
            call_rate: 0.0,
            hwe_p: f64::NAN,
            n_called: 0,
            genotype_counts: counts,
            pass: false,
        };
    }

    let alt_freq = (counts[1] + 2 * counts[2]) as f64 / (2 * called) as f64;
    let maf = alt_freq.min(1.0 - alt_freq);
    let call_rate = called as f64 / total as f64;
    let hwe_p = hwe_exact(counts[1], counts[0], counts[2]);
    let classes_ok = thresholds.min_genotype_count == 0
        || counts
            .iter()
            .filter(|&&c| c >= thresholds.min_genotype_count)
            .count()
            >= 2;

    QcResult {
        alt_freq,
        maf,
        call_rate,
        hwe_p,
        n_called: called,
        genotype_counts: counts,
        pass: maf >= thresholds.maf
            && call_rate >= thresholds.call_rate
            && hwe_p >= thresholds.hwe
            && classes_ok,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> QcThresholds {
        QcThresholds {
            maf: 0.01,
            call_rate: 0.95,
            hwe: 0.0001,
            min_genotype_count: 0,
        }
    }

    #[test]
    fn test_qc_counts_and_pass() {
        let calls: Vec<Option<f64>> = [0.0, 1.0, 1.0, 2.0, 0.0, 1.0, 0.0, 1.0]
            .iter()
            .map(|&g| Some(g))
            .collect();
        let qc = variant_qc(calls, &thresholds());
        assert_eq!(qc.genotype_counts, [3, 4, 1]);
        assert!((qc.alt_freq - 6.0 / 16.0).abs() < 1e-12);
        assert_eq!(qc.call_rate, 1.0);
        assert!(qc.pass);
    }

    #[test]
    fn test_qc_zero_call_rate_fails() {
        let qc = variant_qc(vec![None, None, None], &thresholds());
        assert!(!qc.pass);
        assert_eq!(qc.call_rate, 0.0);
    }

    #[test]
    fn test_qc_call_rate_and_monomorphic() {
        let qc = variant_qc(vec![Some(0.0), Some(1.0), None, Some(2.0)], &thresholds());
        assert_eq!(qc.call_rate, 0.75);
        assert!(!qc.pass);

        let mono = variant_qc(vec![Some(0.0); 20], &thresholds());
        assert_eq!(mono.maf, 0.0);
        assert!(!mono.pass);
    }

    #[test]
    fn test_min_genotype_count() {
        let t = QcThresholds {
            min_genotype_count: 3,
            ..thresholds()
        };
        // classes: 0 -> 10, 1 -> 2, 2 -> 0
        let mut calls = vec![Some(0.0); 10];
        calls.extend([Some(1.0), Some(1.0)]);
        assert!(!variant_qc(calls.clone(), &t).pass);
        calls.push(Some(1.0));
        assert!(variant_qc(calls, &t).pass);
    }

    #[test]
    fn test_dosage_like_calls_round() {
        let qc = variant_qc(vec![Some(0.4), Some(1.6), Some(0.9)], &thresholds());
        assert_eq!(qc.genotype_counts, [1, 1, 1]);
    }
}
