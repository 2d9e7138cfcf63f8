//! Run configuration for cis-QTL mapping.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::qc::QcThresholds;

/// Errors raised while validating a [`CisQtlConfig`].
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must lie in [{lo}, {hi}], got {value}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        lo: f64,
        hi: f64,
    },
    #[error("min_observations must be at least 3, got {0}")]
    TooFewObservations(usize),
    #[error("min_datasets must be at least 1")]
    NoDatasetsRequired,
    #[error("no datasets are available")]
    NoDatasets,
}

/// All settings of a cis-QTL run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CisQtlConfig {
    /// Number of phenotype permutations per gene.
    pub n_permutations: usize,
    /// Half-width of the window around the gene position, in bp.
    pub cis_window: u64,
    /// Root seed of the permutation seed table.
    pub seed: u64,
    /// Rank-transform the phenotype within each dataset.
    pub rank_data: bool,
    /// Replace missing genotypes with the mean of a QC-passing dataset.
    pub replace_missing_genotypes: bool,
    pub maf_threshold: f64,
    pub call_rate_threshold: f64,
    pub hwe_threshold: f64,
    /// Minimum pruned sample count for a dataset to contribute.
    pub min_observations: usize,
    /// Minimum number of contributing datasets for a meta-analysis.
    pub min_datasets: usize,
    /// Minimum carriers per genotype class (0 disables the check).
    pub min_genotype_count: usize,
    /// Write every tested variant to the all-effects table.
    pub output_all: bool,
    /// Write per-variant QC statistics.
    pub output_snp_log: bool,
    /// Write per-variant permutation p-values.
    pub dump_permutation_pvalues: bool,
    /// Lower bound of the Beta-adjusted p-value.
    pub beta_pvalue_floor: f64,
    /// P-values below this are printed in scientific notation.
    pub scientific_threshold: f64,
}

impl Default for CisQtlConfig {
    fn default() -> Self {
        Self {
            n_permutations: 1000,
            cis_window: 1_000_000,
            seed: 123_456_789,
            rank_data: true,
            replace_missing_genotypes: false,
            maf_threshold: 0.01,
            call_rate_threshold: 0.95,
            hwe_threshold: 0.0001,
            min_observations: 10,
            min_datasets: 2,
            min_genotype_count: 0,
            output_all: false,
            output_snp_log: false,
            dump_permutation_pvalues: false,
            beta_pvalue_floor: 2.0e-323,
            scientific_threshold: 1e-5,
        }
    }
}

fn check_range(name: &'static str, value: f64, lo: f64, hi: f64) -> Result<(), ConfigError> {
    if value.is_nan() || value < lo || value > hi {
        return Err(ConfigError::OutOfRange { name, value, lo, hi });
    }
    Ok(())
}

impl CisQtlConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("maf_threshold", self.maf_threshold, 0.0, 0.5)?;
        check_range("call_rate_threshold", self.call_rate_threshold, 0.0, 1.0)?;
        check_range("hwe_threshold", self.hwe_threshold, 0.0, 1.0)?;
        check_range("beta_pvalue_floor", self.beta_pvalue_floor, 0.0, 1.0)?;
        check_range("scientific_threshold", self.scientific_threshold, 0.0, 1.0)?;
        if self.min_observations < 3 {
            return Err(ConfigError::TooFewObservations(self.min_observations));
        }
        if self.min_datasets == 0 {
            return Err(ConfigError::NoDatasetsRequired);
        }
        Ok(())
    }

    /// Validate and clamp `min_datasets` to the number of available datasets.
    pub fn resolve(mut self, n_datasets: usize) -> Result<Self, ConfigError> {
        self.validate()?;
        if n_datasets == 0 {
            return Err(ConfigError::NoDatasets);
        }
        if self.min_datasets > n_datasets {
            warn!(
                "min_datasets ({}) exceeds the number of datasets ({}); using {}",
                self.min_datasets, n_datasets, n_datasets
            );
            self.min_datasets = n_datasets;
        }
        Ok(self)
    }

    pub fn qc_thresholds(&self) -> QcThresholds {
        QcThresholds {
            maf: self.maf_threshold,
            call_rate: self.call_rate_threshold,
            hwe: self.hwe_threshold,
            min_genotype_count: self.min_genotype_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let cfg = CisQtlConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.n_permutations, 1000);
        assert_eq!(cfg.seed, 123_456_789);
    }

    #[test]
    fn test_invalid_maf() {
        let cfg = CisQtlConfig {
            maf_threshold: 0.7,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::OutOfRange { name: "maf_threshold", .. })
        ));
    }

    #[test]
    fn test_resolve_clamps_min_datasets() {
        let cfg = CisQtlConfig {
            min_datasets: 5,
            ..Default::default()
        };
        let cfg = cfg.resolve(2).unwrap();
        assert_eq!(cfg.min_datasets, 2);
        assert_eq!(
            CisQtlConfig::default().resolve(0),
            Err(ConfigError::NoDatasets)
        );
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg: CisQtlConfig = serde_json::from_str(r#"{"n_permutations": 10}"#).unwrap();
        assert_eq!(cfg.n_permutations, 10);
        assert_eq!(cfg.cis_window, 1_000_000);
    }
}
