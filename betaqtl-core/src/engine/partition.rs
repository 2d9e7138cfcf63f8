//! Per-dataset views of phenotype and variant vectors.

use betaqtl_geno::dataset::Dataset;
use betaqtl_geno::VariantRecord;

use crate::stats::rank_average;

/// Gather `values[i]` for each index.
pub fn select_values(values: &[f64], indices: &[usize]) -> Vec<f64> {
    indices.iter().map(|&i| values[i]).collect()
}

/// Split a gene's expression vector into one vector per dataset, ranking
/// each when `rank` is set.
pub fn partition_phenotype(expression: &[f64], datasets: &[Dataset], rank: bool) -> Vec<Vec<f64>> {
    datasets
        .iter()
        .map(|ds| {
            let values = select_values(expression, &ds.expression_indices);
            if rank {
                rank_average(&values)
            } else {
                values
            }
        })
        .collect()
}

/// Calls and dosages of one dataset for a variant.
pub fn partition_variant(record: &VariantRecord, dataset: &Dataset) -> (Vec<Option<f64>>, Vec<f64>) {
    let calls = dataset
        .genotype_indices
        .iter()
        .map(|&i| record.genotypes[i].map(f64::from))
        .collect();
    let dosages = select_values(&record.dosages, &dataset.genotype_indices);
    (calls, dosages)
}
