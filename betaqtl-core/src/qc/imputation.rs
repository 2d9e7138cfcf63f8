//! Mean imputation of missing genotypes.

fn mean_present(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n > 0 {
        Some(sum / n as f64)
    } else {
        None
    }
}

/// Replace missing calls with the mean called genotype and the dosages of
/// those samples with the mean non-missing dosage.
pub fn impute_missing_mean(calls: &mut [Option<f64>], dosages: &mut [f64]) {
    let Some(mean_call) = mean_present(calls.iter().flatten().copied()) else {
        return;
    };
    let mean_dosage = mean_present(dosages.iter().copied()).unwrap_or(mean_call);
    for (c, d) in calls.iter_mut().zip(dosages.iter_mut()) {
        if c.is_none() {
            *c = Some(mean_call);
            *d = mean_dosage;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impute_missing() {
        let mut calls = vec![Some(0.0), None, Some(2.0), Some(1.0)];
        let mut dosages = vec![0.0, f64::NAN, 2.0, 0.8];
        impute_missing_mean(&mut calls, &mut dosages);
        assert_eq!(calls[1], Some(1.0));
        assert!((dosages[1] - 2.8 / 3.0).abs() < 1e-12);
        assert_eq!(dosages[3], 0.8);
    }

    #[test]
    fn test_impute_all_missing_is_noop() {
        let mut calls = vec![None, None];
        let mut dosages = vec![f64::NAN, f64::NAN];
        impute_missing_mean(&mut calls, &mut dosages);
        assert_eq!(calls, vec![None, None]);
    }
}
