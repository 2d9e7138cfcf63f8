//! Average ranks for per-dataset phenotype ranking.

use std::cmp::Ordering;

/// 1-based ranks with ties sharing their average rank. NaN entries stay NaN
/// and do not take part in the ranking.
pub fn rank_average(values: &[f64]) -> Vec<f64> {
    let mut indexed: Vec<(usize, f64)> = values
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .collect();
    indexed.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

    let mut ranks = vec![f64::NAN; values.len()];
    let m = indexed.len();
    let mut i = 0;
    while i < m {
        let mut j = i + 1;
        while j < m && indexed[j].1 == indexed[i].1 {
            j += 1;
        }
        let r = (i + j + 1) as f64 / 2.0;
        for &(idx, _) in &indexed[i..j] {
            ranks[idx] = r;
        }
        i = j;
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_ties_and_nan() {
        let r = rank_average(&[3.0, 1.0, f64::NAN, 3.0, 2.0]);
        assert_eq!(r[0], 3.5);
        assert_eq!(r[1], 1.0);
        assert!(r[2].is_nan());
        assert_eq!(r[3], 3.5);
        assert_eq!(r[4], 2.0);
    }

    #[test]
    fn test_rank_empty() {
        assert!(rank_average(&[]).is_empty());
    }
}
