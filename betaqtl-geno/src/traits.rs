//! Core traits for variant and annotation access.

use std::collections::HashSet;
use std::fmt;

use anyhow::Result;

/// A closed genomic interval on one chromosome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenomicRegion {
    /// Chromosome name as it appears in the variant file (e.g. "22").
    pub chrom: String,
    /// First position included (1-based).
    pub start: u64,
    /// Last position included.
    pub end: u64,
}

impl GenomicRegion {
    /// Cis-window around `pos`, clipped at zero on the left.
    pub fn around(chrom: &str, pos: u64, window: u64) -> Self {
        Self {
            chrom: chrom.to_string(),
            start: pos.saturating_sub(window),
            end: pos.saturating_add(window),
        }
    }

    pub fn contains(&self, chrom: &str, pos: u64) -> bool {
        self.chrom == chrom && pos >= self.start && pos <= self.end
    }
}

impl fmt::Display for GenomicRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chrom, self.start, self.end)
    }
}

/// A biallelic variant with per-sample genotype calls and dosages.
#[derive(Debug, Clone)]
pub struct VariantRecord {
    /// Chromosome.
    pub chrom: String,
    /// Position in base pairs.
    pub pos: u64,
    /// Variant ID (e.g. rsID).
    pub id: String,
    /// Reference allele.
    pub ref_allele: String,
    /// Alternative (effect) allele.
    pub alt_allele: String,
    /// Hard calls as alt allele counts. `None` marks a missing call.
    pub genotypes: Vec<Option<u8>>,
    /// Dosage values (0.0 to 2.0), NaN for missing.
    pub dosages: Vec<f64>,
}

impl VariantRecord {
    /// Alleles rendered as `REF/ALT`.
    pub fn alleles(&self) -> String {
        format!("{}/{}", self.ref_allele, self.alt_allele)
    }
}

/// Single-pass stream of variants over one region.
///
/// `Ok(None)` entries are records the source could not turn into a usable
/// variant; callers skip them.
pub type VariantCursor<'a> = Box<dyn Iterator<Item = Result<Option<VariantRecord>>> + Send + 'a>;

/// Trait for range queries against a variant store.
///
/// The store is shared read-only across worker threads. Every `fetch` call
/// returns a fresh cursor owned by the caller, so each gene streams its own
/// window without coordinating with other genes.
pub trait VariantSource: Send + Sync {
    /// Get the list of sample IDs in the current subset, in vector order.
    fn sample_ids(&self) -> &[String];

    /// Restrict subsequent cursors to these samples, in this order.
    fn set_sample_subset(&mut self, ids: &[String]) -> Result<()>;

    /// Open a cursor over all variants inside `region`.
    ///
    /// When `allow_list` is given, only variants whose ID is in the set are
    /// yielded.
    fn fetch<'a>(
        &'a self,
        region: &GenomicRegion,
        allow_list: Option<&'a HashSet<String>>,
    ) -> Result<VariantCursor<'a>>;
}

/// Strand of a gene feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Positive,
    Negative,
    Unknown,
}

impl Strand {
    pub fn parse(s: &str) -> Self {
        match s {
            "+" | "1" | "+1" => Strand::Positive,
            "-" | "-1" => Strand::Negative,
            _ => Strand::Unknown,
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Strand::Positive => "+",
            Strand::Negative => "-",
            Strand::Unknown => "?",
        };
        f.write_str(s)
    }
}

/// Annotation of a single gene.
#[derive(Debug, Clone)]
pub struct GeneAnnotation {
    pub gene_id: String,
    pub symbol: String,
    pub chrom: String,
    /// Reference position (TSS) used to center the cis-window.
    pub pos: u64,
    pub strand: Strand,
}

/// Lookup of gene annotations by gene identifier.
pub trait AnnotationLookup: Send + Sync {
    fn lookup(&self, gene_id: &str) -> Option<&GeneAnnotation>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_around_clips_at_zero() {
        let r = GenomicRegion::around("1", 500, 1000);
        assert_eq!(r.start, 0);
        assert_eq!(r.end, 1500);
        assert!(r.contains("1", 0));
        assert!(!r.contains("2", 100));
    }

    #[test]
    fn test_strand_parse() {
        assert_eq!(Strand::parse("+"), Strand::Positive);
        assert_eq!(Strand::parse("-"), Strand::Negative);
        assert_eq!(Strand::parse("NA"), Strand::Unknown);
        assert_eq!(Strand::Negative.to_string(), "-");
    }
}
