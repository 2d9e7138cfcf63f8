//! betaqtl-core: statistics and gene engine for multi-cohort cis-QTL mapping
//!
//! Per-dataset variant QC with exact HWE, correlation tests, sample-size
//! weighted Z meta-analysis, top variant selection and a Beta-approximated
//! permutation null, driven per gene by a parallel worker.

pub mod association;
pub mod config;
pub mod engine;
pub mod null_model;
pub mod output;
pub mod permutation;
pub mod qc;
pub mod stats;
pub mod top_effect;

pub use config::{CisQtlConfig, ConfigError};
pub use engine::{run_genes, GeneOutcome, GeneWorker, RunSummary, VariantLimits};
pub use permutation::SeedTable;
