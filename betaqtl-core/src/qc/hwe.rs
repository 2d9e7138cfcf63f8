//! Exact test of Hardy-Weinberg equilibrium.
//!
//! Wigginton, Cutler & Abecasis (2005), Am J Hum Genet 76:887-893.
//! Heterozygote count probabilities are built outward from the mode by
//! recurrence, then normalized.

/// Exact HWE p-value for the observed heterozygote and homozygote counts.
pub fn hwe_exact(obs_hets: usize, obs_hom1: usize, obs_hom2: usize) -> f64 {
    let n = (obs_hets + obs_hom1 + obs_hom2) as i64;
    if n == 0 {
        return 1.0;
    }
    let obs_hets = obs_hets as i64;
    let obs_homr = obs_hom1.min(obs_hom2) as i64;
    let rare_copies = 2 * obs_homr + obs_hets;
    let mut het_probs = vec![0.0f64; rare_copies as usize + 1];

    let mut mid = rare_copies * (2 * n - rare_copies) / (2 * n);
    if (rare_copies & 1) ^ (mid & 1) != 0 {
        mid += 1;
    }

    het_probs[mid as usize] = 1.0;
    let mut sum = 1.0;

    let mut hets = mid;
    let mut homr = (rare_copies - mid) / 2;
    let mut homc = n - hets - homr;
    while hets > 1 {
        let next = het_probs[hets as usize] * (hets * (hets - 1)) as f64
            / (4.0 * (homr + 1) as f64 * (homc + 1) as f64);
        het_probs[(hets - 2) as usize] = next;
        sum += next;
        hets -= 2;
        homr += 1;
        homc += 1;
    }

    hets = mid;
    homr = (rare_copies - mid) / 2;
    homc = n - hets - homr;
    while hets <= rare_copies - 2 {
        let next = het_probs[hets as usize] * 4.0 * homr as f64 * homc as f64
            / ((hets + 2) as f64 * (hets + 1) as f64);
        het_probs[(hets + 2) as usize] = next;
        sum += next;
        hets += 2;
        homr -= 1;
        homc -= 1;
    }

    let observed = het_probs[obs_hets as usize] / sum;
    let p: f64 = het_probs
        .iter()
        .map(|&h| h / sum)
        .filter(|&h| h <= observed * (1.0 + 1e-12))
        .sum();
    p.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hwe_small_exact() {
        // n = 3, AA = 2, BB = 1, no hets: P(0 hets) = 0.2, P(2 hets) = 0.8
        assert!((hwe_exact(0, 2, 1) - 0.2).abs() < 1e-12);
        assert!((hwe_exact(2, 1, 0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_hwe_monomorphic() {
        assert_eq!(hwe_exact(0, 100, 0), 1.0);
        assert_eq!(hwe_exact(0, 0, 0), 1.0);
    }

    #[test]
    fn test_hwe_equilibrium_and_deviation() {
        // p = 0.5, n = 100 in exact proportions
        assert!(hwe_exact(50, 25, 25) > 0.5);
        // no heterozygotes at p = 0.5
        assert!(hwe_exact(0, 50, 50) < 1e-20);
    }
}
