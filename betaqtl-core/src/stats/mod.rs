//! Correlation, p-value/z-score conversions, rank transforms and the
//! incomplete beta function.

pub mod beta;
pub mod correlation;
pub mod rank;

pub use beta::regularized_beta;
pub use correlation::{center_scale, correlation_pvalue, p_to_z_two_tailed, pearson, z_to_p};
pub use rank::rank_average;
