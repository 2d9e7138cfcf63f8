//! Beta-approximated permutation null.
//!
//! The per-permutation minimum meta p-values of a gene follow approximately
//! a Beta(α, β) distribution. The shapes are fitted by maximum likelihood
//! (method-of-moments start, Nelder-Mead over ln α and ln β) and the
//! observed top p-value is calibrated as I_p(α, β).

pub mod nelder_mead;

use statrs::function::gamma::ln_gamma;
use thiserror::Error;

use self::nelder_mead::{nelder_mead_2d, NelderMeadOptions};
use crate::stats::regularized_beta;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum BetaFitError {
    #[error("need at least 2 permutation p-values, got {0}")]
    TooFewValues(usize),
    #[error("permutation p-values are degenerate (mean {mean}, variance {variance})")]
    Degenerate { mean: f64, variance: f64 },
    #[error("Beta MLE did not converge after {0} iterations")]
    NotConverged(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BetaShape {
    pub alpha: f64,
    pub beta: f64,
}

impl BetaShape {
    /// Beta CDF at `p`.
    pub fn cdf(&self, p: f64) -> f64 {
        regularized_beta(self.alpha, self.beta, p.clamp(0.0, 1.0))
    }
}

/// Method-of-moments estimate of Beta shapes.
pub fn beta_moments(pvalues: &[f64]) -> Result<BetaShape, BetaFitError> {
    let n = pvalues.len();
    if n < 2 {
        return Err(BetaFitError::TooFewValues(n));
    }
    let mean = pvalues.iter().sum::<f64>() / n as f64;
    let variance = pvalues.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let degenerate = BetaFitError::Degenerate { mean, variance };
    if !(mean > 0.0 && mean < 1.0 && variance > 0.0) {
        return Err(degenerate);
    }
    let alpha = mean * (mean * (1.0 - mean) / variance - 1.0);
    let beta = alpha * (1.0 / mean - 1.0);
    if !(alpha > 0.0 && beta > 0.0) {
        return Err(degenerate);
    }
    Ok(BetaShape { alpha, beta })
}

/// Maximum likelihood Beta shapes for p-values in (0, 1].
pub fn fit_beta_mle(pvalues: &[f64]) -> Result<BetaShape, BetaFitError> {
    let start = beta_moments(pvalues)?;

    let n = pvalues.len() as f64;
    let (sum_ln_p, sum_ln_1mp) = pvalues.iter().fold((0.0, 0.0), |(a, b), &p| {
        let p = p.clamp(f64::MIN_POSITIVE, 1.0 - f64::EPSILON);
        (a + p.ln(), b + (-p).ln_1p())
    });
    let neg_log_lik = |x: [f64; 2]| {
        let (a, b) = (x[0].exp(), x[1].exp());
        if !(a.is_finite() && b.is_finite() && a > 0.0 && b > 0.0) {
            return f64::INFINITY;
        }
        let ln_beta_fn = ln_gamma(a) + ln_gamma(b) - ln_gamma(a + b);
        n * ln_beta_fn - (a - 1.0) * sum_ln_p - (b - 1.0) * sum_ln_1mp
    };

    let opts = NelderMeadOptions::default();
    let min = nelder_mead_2d(
        neg_log_lik,
        [start.alpha.ln(), start.beta.ln()],
        [0.1, 0.1],
        &opts,
    );
    if !min.converged || !min.value.is_finite() {
        return Err(BetaFitError::NotConverged(min.iterations));
    }
    Ok(BetaShape {
        alpha: min.x[0].exp(),
        beta: min.x[1].exp(),
    })
}

/// How the gene-level p-value was obtained.
#[derive(Debug, Clone, PartialEq)]
pub enum NullStatus {
    /// Beta fit succeeded.
    Fitted,
    /// One or no permutations; nothing to fit.
    Skipped,
    /// Beta fit failed; the adjusted p-value is the empirical proportion.
    Failed(BetaFitError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BetaNullModel {
    pub alpha: f64,
    pub beta: f64,
    pub adjusted_p: f64,
    /// Fraction of permutation minima at or below the observed p-value.
    pub proportion_better: f64,
    pub status: NullStatus,
}

/// Calibrate the observed top p-value of a gene against its permutation
/// minima.
pub fn calibrate(perm_min: &[f64], observed_p: f64, floor: f64) -> BetaNullModel {
    let n = perm_min.len();
    if n <= 1 {
        return BetaNullModel {
            alpha: f64::NAN,
            beta: f64::NAN,
            adjusted_p: 1.0,
            proportion_better: 1.0,
            status: NullStatus::Skipped,
        };
    }

    let better = perm_min.iter().filter(|&&p| p <= observed_p).count();
    let proportion_better = better as f64 / n as f64;

    match fit_beta_mle(perm_min) {
        Ok(shape) => BetaNullModel {
            alpha: shape.alpha,
            beta: shape.beta,
            adjusted_p: shape.cdf(observed_p).max(floor),
            proportion_better,
            status: NullStatus::Fitted,
        },
        Err(e) => BetaNullModel {
            alpha: f64::NAN,
            beta: f64::NAN,
            adjusted_p: proportion_better,
            proportion_better,
            status: NullStatus::Failed(e),
        },
    }
}
