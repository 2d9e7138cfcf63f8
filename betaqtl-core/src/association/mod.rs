//! Per-dataset association tests and their meta-analysis.

pub mod meta;
pub mod tester;

pub use meta::{effect_size, meta_analyze, MetaResult};
pub use tester::{association_pass, count_alt_alleles, DatasetStats, PassResult};
