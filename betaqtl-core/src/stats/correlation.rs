//! Pearson correlation and its conversion to p-values and z-scores.
//!
//! For a correlation r over n samples the two-tailed p-value of the
//! t-statistic with df = n - 2 is the regularized incomplete beta function
//!   p = I_{1 - r^2}(df / 2, 1 / 2)
//! and the signed z-score is Φ⁻¹(p / 2), negated when r > 0.

use std::f64::consts::SQRT_2;

use statrs::function::erf::{erfc, erfc_inv};

use super::beta::regularized_beta;

/// Center to mean zero and scale to unit sample standard deviation.
///
/// Returns `false` and fills with NaN when the values are constant.
pub fn center_scale(x: &mut [f64]) -> bool {
    let n = x.len();
    if n < 2 {
        x.iter_mut().for_each(|v| *v = f64::NAN);
        return false;
    }
    let mean = x.iter().sum::<f64>() / n as f64;
    let ss: f64 = x.iter().map(|v| (v - mean).powi(2)).sum();
    let sd = (ss / (n - 1) as f64).sqrt();
    if !(sd > 0.0) || !sd.is_finite() {
        x.iter_mut().for_each(|v| *v = f64::NAN);
        return false;
    }
    for v in x.iter_mut() {
        *v = (*v - mean) / sd;
    }
    true
}

/// Pearson correlation. NaN when either vector is constant.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    let mut xs = x.to_vec();
    let mut ys = y.to_vec();
    if !center_scale(&mut xs) || !center_scale(&mut ys) {
        return f64::NAN;
    }
    let dot: f64 = xs.iter().zip(&ys).map(|(a, b)| a * b).sum();
    (dot / (x.len() - 1) as f64).clamp(-1.0, 1.0)
}

/// Two-tailed p-value of a correlation over `n` samples.
pub fn correlation_pvalue(r: f64, n: usize) -> f64 {
    if r.is_nan() || n < 3 {
        return 1.0;
    }
    let df = (n - 2) as f64;
    let x = (1.0 - r * r).clamp(0.0, 1.0);
    regularized_beta(df / 2.0, 0.5, x)
}

/// Convert a two-tailed p-value to a z-score (non-positive).
pub fn p_to_z_two_tailed(p: f64) -> f64 {
    let p = p.clamp(f64::MIN_POSITIVE, 1.0);
    -SQRT_2 * erfc_inv(p)
}

/// Two-tailed p-value of a z-score, floored at the smallest positive normal f64.
pub fn z_to_p(z: f64) -> f64 {
    if z.is_nan() {
        return 1.0;
    }
    erfc(z.abs() / SQRT_2).clamp(f64::MIN_POSITIVE, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_scale() {
        let mut x = vec![1.0, 2.0, 3.0];
        assert!(center_scale(&mut x));
        assert!((x[0] + 1.0).abs() < 1e-12);
        assert!(x[1].abs() < 1e-12);
        let mut c = vec![2.0, 2.0, 2.0];
        assert!(!center_scale(&mut c));
        assert!(c[0].is_nan());
    }

    #[test]
    fn test_pearson() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        assert!((pearson(&x, &y) - 1.0).abs() < 1e-12);
        let yn = [8.0, 6.0, 4.0, 2.0];
        assert!((pearson(&x, &yn) + 1.0).abs() < 1e-12);
        assert!(pearson(&x, &[1.0; 4]).is_nan());
    }

    #[test]
    fn test_correlation_pvalue_known() {
        // r = 0.5, n = 12: t = 0.5*sqrt(10)/sqrt(0.75) = 1.8257, two-tailed p ≈ 0.0979
        let p = correlation_pvalue(0.5, 12);
        assert!((p - 0.0979).abs() < 1e-3, "p = {}", p);
        assert_eq!(correlation_pvalue(0.0, 12), 1.0);
        assert_eq!(correlation_pvalue(f64::NAN, 12), 1.0);
    }

    #[test]
    fn test_p_to_z() {
        assert!((p_to_z_two_tailed(0.05) + 1.959964).abs() < 1e-5);
        assert!(p_to_z_two_tailed(1.0).abs() < 1e-12);
        assert!(p_to_z_two_tailed(0.0).is_finite());
    }

    #[test]
    fn test_z_to_p() {
        assert!((z_to_p(1.959964) - 0.05).abs() < 1e-6);
        assert!((z_to_p(-1.959964) - 0.05).abs() < 1e-6);
        assert_eq!(z_to_p(0.0), 1.0);
        assert_eq!(z_to_p(100.0), f64::MIN_POSITIVE);
    }
}
