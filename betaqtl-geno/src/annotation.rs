//! Gene annotation file parser.
//!
//! Tab-delimited with a header naming at least the columns
//! `Gene`, `Chr`, `ChrStart`, `ChrEnd` and `Strand` (`Symbol` optional).
//! The reference position is the start coordinate on the `+` strand and
//! the end coordinate on the `-` strand.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use tracing::info;

use crate::io::open_text;
use crate::traits::{AnnotationLookup, GeneAnnotation, Strand};

/// Gene annotations keyed by gene identifier.
#[derive(Debug, Clone, Default)]
pub struct AnnotationTable {
    genes: HashMap<String, GeneAnnotation>,
}

impl AnnotationTable {
    pub fn from_annotations(annotations: impl IntoIterator<Item = GeneAnnotation>) -> Self {
        Self {
            genes: annotations
                .into_iter()
                .map(|a| (a.gene_id.clone(), a))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }
}

impl AnnotationLookup for AnnotationTable {
    fn lookup(&self, gene_id: &str) -> Option<&GeneAnnotation> {
        self.genes.get(gene_id)
    }
}

fn column(headers: &[&str], names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
}

fn get_field<'a>(fields: &[&'a str], idx: usize, line_no: usize, path: &Path) -> Result<&'a str> {
    fields
        .get(idx)
        .copied()
        .ok_or_else(|| anyhow!("Line {} of {} has too few fields", line_no, path.display()))
}

/// Parse an annotation file into an [`AnnotationTable`].
pub fn parse_annotation_file(path: &Path) -> Result<AnnotationTable> {
    let reader = open_text(path)?;
    let mut lines = reader.lines();
    let header = match lines.next() {
        Some(line) => line.with_context(|| format!("Failed to read {}", path.display()))?,
        None => bail!("Empty annotation file: {}", path.display()),
    };
    let headers: Vec<&str> = header.split('\t').map(|s| s.trim()).collect();

    let missing = |name: &str| anyhow!("Column '{}' not found in {}", name, path.display());
    let gene_idx = column(&headers, &["Gene", "ArrayAddress"]).ok_or_else(|| missing("Gene"))?;
    let chr_idx = column(&headers, &["Chr"]).ok_or_else(|| missing("Chr"))?;
    let start_idx = column(&headers, &["ChrStart"]).ok_or_else(|| missing("ChrStart"))?;
    let end_idx = column(&headers, &["ChrEnd"]).ok_or_else(|| missing("ChrEnd"))?;
    let strand_idx = column(&headers, &["Strand"]).ok_or_else(|| missing("Strand"))?;
    let symbol_idx = column(&headers, &["Symbol", "GeneSymbol"]);

    let mut genes = HashMap::new();
    for (line_num, line) in lines.enumerate() {
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').map(|s| s.trim()).collect();
        let field = |idx: usize| get_field(&fields, idx, line_num + 2, path);

        let gene_id = field(gene_idx)?.to_string();
        let start: u64 = field(start_idx)?
            .parse()
            .with_context(|| format!("Invalid ChrStart on line {}", line_num + 2))?;
        let end: u64 = field(end_idx)?
            .parse()
            .with_context(|| format!("Invalid ChrEnd on line {}", line_num + 2))?;
        let strand = Strand::parse(field(strand_idx)?);
        let pos = match strand {
            Strand::Negative => end,
            _ => start,
        };
        let symbol = match symbol_idx {
            Some(i) => field(i)?.to_string(),
            None => gene_id.clone(),
        };

        genes.insert(
            gene_id.clone(),
            GeneAnnotation {
                gene_id,
                symbol,
                chrom: field(chr_idx)?.to_string(),
                pos,
                strand,
            },
        );
    }

    info!("Loaded {} gene annotations from {}", genes.len(), path.display());
    Ok(AnnotationTable { genes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_annotation_strand_position() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("annot.txt");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "Platform\tGene\tSymbol\tChr\tChrStart\tChrEnd\tStrand").unwrap();
        writeln!(f, "p\tG1\tABC\t1\t1000\t2000\t+").unwrap();
        writeln!(f, "p\tG2\tDEF\t2\t5000\t6000\t-").unwrap();
        drop(f);

        let table = parse_annotation_file(&path).unwrap();
        assert_eq!(table.len(), 2);
        let g1 = table.lookup("G1").unwrap();
        assert_eq!(g1.pos, 1000);
        assert_eq!(g1.symbol, "ABC");
        assert_eq!(g1.strand, Strand::Positive);
        let g2 = table.lookup("G2").unwrap();
        assert_eq!(g2.pos, 6000);
        assert_eq!(g2.chrom, "2");
        assert!(table.lookup("G3").is_none());
    }

    #[test]
    fn test_missing_column_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("annot.txt");
        std::fs::write(&path, "Gene\tChr\tChrStart\n").unwrap();
        assert!(parse_annotation_file(&path).is_err());
    }
}
