//! Per-gene tracking of the strongest variant.

use crate::association::DatasetStats;

/// Meta-analysed association of one variant with one gene.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantEffect {
    pub variant_id: String,
    pub chrom: String,
    pub pos: u64,
    /// Alleles as `REF/ALT`.
    pub alleles: String,
    pub effect_allele: String,
    pub effect_allele_freq: f64,
    pub meta_p: f64,
    pub meta_z: f64,
    pub meta_n: usize,
    pub n_datasets: usize,
    pub beta: f64,
    pub se: f64,
    /// One entry per dataset in run order; `None` when it did not contribute.
    pub per_dataset: Vec<Option<DatasetStats>>,
    /// Distance to the gene position in bp.
    pub distance: u64,
}

/// Keeps the best variant seen so far for one gene.
///
/// A candidate replaces the current best when its p-value is lower. On
/// equal p-values the larger |Z| wins; on equal |Z| the candidate is
/// rejected only if it lies strictly farther from the gene.
#[derive(Debug, Default)]
pub struct TopEffectTracker {
    best: Option<VariantEffect>,
}

impl TopEffectTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a candidate. Returns `true` when it became the new best.
    pub fn offer(&mut self, candidate: VariantEffect) -> bool {
        let replace = match &self.best {
            None => true,
            Some(best) => {
                if candidate.meta_p < best.meta_p {
                    true
                } else if candidate.meta_p > best.meta_p {
                    false
                } else {
                    let (cz, bz) = (candidate.meta_z.abs(), best.meta_z.abs());
                    if cz > bz {
                        true
                    } else if cz < bz {
                        false
                    } else {
                        candidate.distance <= best.distance
                    }
                }
            }
        };
        if replace {
            self.best = Some(candidate);
        }
        replace
    }

    pub fn into_best(self) -> Option<VariantEffect> {
        self.best
    }
}
