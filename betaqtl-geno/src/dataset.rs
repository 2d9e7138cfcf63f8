//! Sample linkage and dataset construction.
//!
//! A linkage file maps genotype samples to expression samples and assigns
//! each pair to a dataset:
//!
//! ```text
//! genotypeSample    expressionSample    dataset
//! G1                E1                  cohortA
//! ```
//!
//! Datasets keep the order in which they first appear in the file. That
//! order is the column order of every per-dataset output field.

use std::collections::{HashMap, HashSet};
use std::io::BufRead;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::io::open_text;

/// One row of the linkage file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleLink {
    pub genotype_sample: String,
    pub expression_sample: String,
    pub dataset: String,
}

/// A cohort: paired genotype and expression sample positions.
///
/// `genotype_indices[i]` and `expression_indices[i]` refer to the same
/// individual.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub name: String,
    /// Positions in the genotype sample vector of the variant source.
    pub genotype_indices: Vec<usize>,
    /// Positions in the expression matrix sample columns.
    pub expression_indices: Vec<usize>,
}

impl Dataset {
    pub fn n_samples(&self) -> usize {
        self.genotype_indices.len()
    }
}

/// Datasets plus the genotype samples their indices refer to.
#[derive(Debug, Clone)]
pub struct DatasetLinkage {
    /// Genotype samples to request from the variant source, in order.
    pub genotype_samples: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl DatasetLinkage {
    pub fn dataset_names(&self) -> Vec<String> {
        self.datasets.iter().map(|d| d.name.clone()).collect()
    }
}

/// Read a linkage file. A header line starting with `#` is skipped.
pub fn parse_link_file(path: &Path) -> Result<Vec<SampleLink>> {
    let reader = open_text(path)?;
    let mut links = Vec::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').map(|s| s.trim()).collect();
        if fields.len() < 3 {
            bail!(
                "Line {} of {} has {} fields, expected 3",
                line_num + 1,
                path.display(),
                fields.len()
            );
        }
        links.push(SampleLink {
            genotype_sample: fields[0].to_string(),
            expression_sample: fields[1].to_string(),
            dataset: fields[2].to_string(),
        });
    }
    Ok(links)
}

/// Resolve links against the genotype and expression sample headers.
///
/// Links whose samples are missing from either source are dropped. An
/// expression sample may only be linked once; later duplicates are dropped.
/// Datasets left without samples are removed.
pub fn build_datasets(
    links: &[SampleLink],
    genotype_ids: &[String],
    expression_ids: &[String],
) -> Result<DatasetLinkage> {
    let geno_map: HashMap<&str, usize> = genotype_ids
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();
    let expr_map: HashMap<&str, usize> = expression_ids
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();

    let mut genotype_samples: Vec<String> = Vec::new();
    let mut subset_pos: HashMap<&str, usize> = HashMap::new();
    let mut datasets: Vec<Dataset> = Vec::new();
    let mut dataset_pos: HashMap<&str, usize> = HashMap::new();
    let mut used_expression: HashSet<&str> = HashSet::new();
    let mut dropped = 0usize;

    for link in links {
        let (Some(_), Some(&expr_idx)) = (
            geno_map.get(link.genotype_sample.as_str()),
            expr_map.get(link.expression_sample.as_str()),
        ) else {
            dropped += 1;
            continue;
        };
        if !used_expression.insert(link.expression_sample.as_str()) {
            warn!(
                "Expression sample {} is linked more than once; keeping the first link",
                link.expression_sample
            );
            continue;
        }

        let geno_idx = *subset_pos
            .entry(link.genotype_sample.as_str())
            .or_insert_with(|| {
                genotype_samples.push(link.genotype_sample.clone());
                genotype_samples.len() - 1
            });
        let ds_idx = *dataset_pos.entry(link.dataset.as_str()).or_insert_with(|| {
            datasets.push(Dataset {
                name: link.dataset.clone(),
                genotype_indices: Vec::new(),
                expression_indices: Vec::new(),
            });
            datasets.len() - 1
        });
        datasets[ds_idx].genotype_indices.push(geno_idx);
        datasets[ds_idx].expression_indices.push(expr_idx);
    }

    if dropped > 0 {
        info!("{} links refer to samples absent from the input files", dropped);
    }
    if datasets.is_empty() {
        bail!("No linked samples remain after matching genotype and expression samples");
    }
    for ds in &datasets {
        info!("Dataset {}: {} samples", ds.name, ds.n_samples());
    }

    Ok(DatasetLinkage {
        genotype_samples,
        datasets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn link(g: &str, e: &str, d: &str) -> SampleLink {
        SampleLink {
            genotype_sample: g.into(),
            expression_sample: e.into(),
            dataset: d.into(),
        }
    }

    #[test]
    fn test_parse_link_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("links.txt");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "#genotype\texpression\tdataset").unwrap();
        writeln!(f, "G1\tE1\tA").unwrap();
        writeln!(f, "G2\tE2\tB").unwrap();
        drop(f);
        let links = parse_link_file(&path).unwrap();
        assert_eq!(links, vec![link("G1", "E1", "A"), link("G2", "E2", "B")]);
    }

    #[test]
    fn test_build_datasets_order_and_indices() {
        let geno = ids(&["G1", "G2", "G3", "G4"]);
        let expr = ids(&["E4", "E3", "E2", "E1"]);
        let links = vec![
            link("G3", "E3", "B"),
            link("G1", "E1", "A"),
            link("G2", "E2", "B"),
            link("G9", "E4", "A"),
        ];
        let linkage = build_datasets(&links, &geno, &expr).unwrap();

        assert_eq!(linkage.dataset_names(), vec!["B", "A"]);
        assert_eq!(linkage.genotype_samples, ids(&["G3", "G1", "G2"]));
        let b = &linkage.datasets[0];
        assert_eq!(b.genotype_indices, vec![0, 2]);
        assert_eq!(b.expression_indices, vec![1, 2]);
        let a = &linkage.datasets[1];
        assert_eq!(a.genotype_indices, vec![1]);
        assert_eq!(a.expression_indices, vec![3]);
    }

    #[test]
    fn test_build_datasets_none_linked() {
        let links = vec![link("X", "Y", "A")];
        assert!(build_datasets(&links, &ids(&["G1"]), &ids(&["E1"])).is_err());
    }
}
