//! Variant and gene limit files.

use std::collections::{HashMap, HashSet};
use std::io::BufRead;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::io::open_text;

/// Read a one-column identifier list (first whitespace-separated token per line).
pub fn parse_id_list(path: &Path) -> Result<HashSet<String>> {
    let reader = open_text(path)?;
    let mut ids = HashSet::new();
    for line in reader.lines() {
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        if let Some(id) = line.split_whitespace().next() {
            ids.insert(id.to_string());
        }
    }
    Ok(ids)
}

/// Variant allow-lists per gene, read from `gene<TAB>variant` rows.
#[derive(Debug, Clone, Default)]
pub struct VariantGeneLimits {
    by_gene: HashMap<String, HashSet<String>>,
    empty: HashSet<String>,
}

impl VariantGeneLimits {
    /// Variants allowed for `gene`. A gene without rows gets an empty set.
    pub fn variants_for(&self, gene: &str) -> &HashSet<String> {
        self.by_gene.get(gene).unwrap_or(&self.empty)
    }

    pub fn genes(&self) -> impl Iterator<Item = &String> {
        self.by_gene.keys()
    }

    pub fn n_pairs(&self) -> usize {
        self.by_gene.values().map(|s| s.len()).sum()
    }
}

pub fn parse_variant_gene_limits(path: &Path) -> Result<VariantGeneLimits> {
    let reader = open_text(path)?;
    let mut by_gene: HashMap<String, HashSet<String>> = HashMap::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.as_slice() {
            [] => continue,
            [gene, variant, ..] => {
                by_gene
                    .entry(gene.to_string())
                    .or_default()
                    .insert(variant.to_string());
            }
            [_] => bail!(
                "Line {} of {} needs a gene and a variant",
                line_num + 1,
                path.display()
            ),
        }
    }
    Ok(VariantGeneLimits {
        by_gene,
        empty: HashSet::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snps.txt");
        std::fs::write(&path, "rs1\nrs2 extra\n\nrs1\n").unwrap();
        let ids = parse_id_list(&path).unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("rs2"));
    }

    #[test]
    fn test_variant_gene_limits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pairs.txt");
        std::fs::write(&path, "G1\trs1\nG1\trs2\nG2\trs3\n").unwrap();
        let limits = parse_variant_gene_limits(&path).unwrap();
        assert_eq!(limits.n_pairs(), 3);
        assert!(limits.variants_for("G1").contains("rs2"));
        assert!(limits.variants_for("G3").is_empty());
    }

    #[test]
    fn test_variant_gene_limits_short_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pairs.txt");
        std::fs::write(&path, "G1\n").unwrap();
        assert!(parse_variant_gene_limits(&path).is_err());
    }
}
