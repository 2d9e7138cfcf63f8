//! Removal of samples with missing data before a test.

/// Aligned per-sample vectors with every missing entry removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pruned {
    pub calls: Vec<f64>,
    pub dosages: Vec<f64>,
    pub phenotype: Vec<f64>,
}

/// Drop samples whose call is missing, dosage is NaN or phenotype is NaN.
/// Sample order is preserved.
pub fn prune(calls: &[Option<f64>], dosages: &[f64], phenotype: &[f64]) -> Pruned {
    debug_assert_eq!(calls.len(), dosages.len());
    debug_assert_eq!(calls.len(), phenotype.len());
    let mut out = Pruned {
        calls: Vec::with_capacity(calls.len()),
        dosages: Vec::with_capacity(calls.len()),
        phenotype: Vec::with_capacity(calls.len()),
    };
    for ((call, &d), &y) in calls.iter().zip(dosages).zip(phenotype) {
        match call {
            Some(g) if !d.is_nan() && !y.is_nan() => {
                out.calls.push(*g);
                out.dosages.push(d);
                out.phenotype.push(y);
            }
            _ => {}
        }
    }
    out
}
