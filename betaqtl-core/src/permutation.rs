//! Permutation seeds and phenotype shuffling.
//!
//! One table of seeds is drawn from the root seed at the start of a run.
//! Permutation `k` shuffles every dataset of every variant with `seeds[k]`,
//! so a permutation moves the same samples for all variants of a gene.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedTable {
    seeds: Vec<u64>,
}

impl SeedTable {
    pub fn new(root_seed: u64, n_permutations: usize) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(root_seed);
        let seeds = (0..n_permutations).map(|_| rng.gen::<u64>()).collect();
        Self { seeds }
    }

    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    pub fn get(&self, k: usize) -> u64 {
        self.seeds[k]
    }

    pub fn seeds(&self) -> &[u64] {
        &self.seeds
    }
}

/// Copy `values` and shuffle the copy with a generator seeded by `seed`.
pub fn shuffled(values: &[f64], seed: u64) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut out = values.to_vec();
    out.shuffle(&mut rng);
    out
}
