//! Gene-level orchestration.

pub mod partition;
pub mod runner;
pub mod worker;

pub use runner::{run_genes, RunSummary};
pub use worker::{GeneOutcome, GeneWorker, VariantLimits};
