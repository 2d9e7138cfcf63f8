//! Windowed VCF reader.
//!
//! Reads genotype calls (GT) and dosages (DS) from plain or bgzip/gzip
//! text VCF files sorted by position. Each `fetch` opens its own
//! streaming cursor that skips ahead to the requested window and stops
//! as soon as it has moved past it.

use std::collections::HashSet;
use std::io::{BufRead, Lines};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::debug;

use crate::io::open_text;
use crate::traits::{GenomicRegion, VariantCursor, VariantRecord, VariantSource};

/// Reader for text VCF files.
pub struct VcfReader {
    /// Path to the VCF file.
    path: PathBuf,
    /// Sample IDs from the header, in file order.
    file_sample_ids: Vec<String>,
    /// Sample IDs exposed to callers (the subset, if one is set).
    sample_ids: Vec<String>,
    /// Column indices (relative to the first sample column) of the subset.
    sample_subset: Option<Vec<usize>>,
    /// Whether to prefer DS (dosage) over GT (genotype) for dosages.
    prefer_dosage: bool,
}

impl VcfReader {
    /// Open a VCF file and read its sample header.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let reader = open_text(&path)?;

        let mut sample_ids = None;
        for line in reader.lines() {
            let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
            if line.starts_with("##") {
                continue;
            }
            if line.starts_with('#') {
                let fields: Vec<&str> = line.split('\t').collect();
                if fields.len() < 10 {
                    bail!("VCF header of {} has no sample columns", path.display());
                }
                sample_ids = Some(fields[9..].iter().map(|s| s.to_string()).collect::<Vec<_>>());
            }
            break;
        }

        let file_sample_ids = match sample_ids {
            Some(ids) => ids,
            None => bail!("No #CHROM header line found in {}", path.display()),
        };
        debug!(
            "Opened VCF {} with {} samples",
            path.display(),
            file_sample_ids.len()
        );

        Ok(Self {
            path,
            sample_ids: file_sample_ids.clone(),
            file_sample_ids,
            sample_subset: None,
            prefer_dosage: true,
        })
    }

    /// Set whether to prefer DS (dosage) field over GT (genotype) field.
    pub fn set_prefer_dosage(&mut self, prefer: bool) {
        self.prefer_dosage = prefer;
    }
}

impl VariantSource for VcfReader {
    fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    fn set_sample_subset(&mut self, ids: &[String]) -> Result<()> {
        let index: std::collections::HashMap<&str, usize> = self
            .file_sample_ids
            .iter()
            .enumerate()
            .map(|(i, s)| (s.as_str(), i))
            .collect();
        let mut indices = Vec::with_capacity(ids.len());
        let mut new_ids = Vec::with_capacity(ids.len());
        for id in ids {
            match index.get(id.as_str()) {
                Some(&i) => {
                    indices.push(i);
                    new_ids.push(id.clone());
                }
                None => bail!("Sample {} is not present in {}", id, self.path.display()),
            }
        }
        self.sample_subset = Some(indices);
        self.sample_ids = new_ids;
        Ok(())
    }

    fn fetch<'a>(
        &'a self,
        region: &GenomicRegion,
        allow_list: Option<&'a HashSet<String>>,
    ) -> Result<VariantCursor<'a>> {
        let lines = open_text(&self.path)?.lines();
        Ok(Box::new(WindowCursor {
            lines,
            region: region.clone(),
            allow_list,
            subset: self.sample_subset.as_deref(),
            prefer_dosage: self.prefer_dosage,
            seen_chrom: false,
            done: false,
        }))
    }
}

/// Streaming cursor over the records of one window.
struct WindowCursor<'a> {
    lines: Lines<Box<dyn BufRead + Send>>,
    region: GenomicRegion,
    allow_list: Option<&'a HashSet<String>>,
    subset: Option<&'a [usize]>,
    prefer_dosage: bool,
    seen_chrom: bool,
    done: bool,
}

impl Iterator for WindowCursor<'_> {
    type Item = Result<Option<VariantRecord>>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            };
            if line.starts_with('#') || line.is_empty() {
                continue;
            }

            let mut head = line.splitn(4, '\t');
            let chrom = head.next().unwrap_or("");
            let pos: u64 = match head.next().and_then(|p| p.parse().ok()) {
                Some(p) => p,
                None => return Some(Ok(None)),
            };

            if chrom != self.region.chrom {
                if self.seen_chrom {
                    // sorted input: the chromosome block has ended
                    self.done = true;
                }
                continue;
            }
            self.seen_chrom = true;
            if pos < self.region.start {
                continue;
            }
            if pos > self.region.end {
                self.done = true;
                break;
            }

            if let Some(allowed) = self.allow_list {
                let id = head.next().unwrap_or(".");
                if !allowed.contains(id) {
                    continue;
                }
            }

            return Some(Ok(parse_record(&line, self.subset, self.prefer_dosage)));
        }
        None
    }
}

/// Parse a VCF data line into a biallelic variant record.
///
/// Returns `None` for multi-allelic sites and records without GT or DS.
fn parse_record(line: &str, subset: Option<&[usize]>, prefer_dosage: bool) -> Option<VariantRecord> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 10 {
        return None;
    }
    let alt = fields[4];
    if alt.contains(',') {
        return None;
    }

    let format_fields: Vec<&str> = fields[8].split(':').collect();
    let ds_idx = format_fields.iter().position(|&f| f == "DS");
    let gt_idx = format_fields.iter().position(|&f| f == "GT");
    if ds_idx.is_none() && gt_idx.is_none() {
        return None;
    }

    let sample_fields = &fields[9..];
    let columns: Vec<usize> = match subset {
        Some(indices) => indices.to_vec(),
        None => (0..sample_fields.len()).collect(),
    };

    let mut genotypes = Vec::with_capacity(columns.len());
    let mut dosages = Vec::with_capacity(columns.len());
    for &col in &columns {
        let parts: Vec<&str> = match sample_fields.get(col) {
            Some(s) => s.split(':').collect(),
            None => Vec::new(),
        };
        let gt = gt_idx
            .and_then(|i| parts.get(i))
            .and_then(|s| parse_gt(s));
        let ds = match (prefer_dosage, ds_idx.and_then(|i| parts.get(i))) {
            (true, Some(s)) => s.parse::<f64>().unwrap_or(f64::NAN),
            _ => gt.map(f64::from).unwrap_or(f64::NAN),
        };
        genotypes.push(gt);
        dosages.push(ds);
    }

    let id = if fields[2] == "." {
        format!("{}:{}", fields[0], fields[1])
    } else {
        fields[2].to_string()
    };

    Some(VariantRecord {
        chrom: fields[0].to_string(),
        pos: fields[1].parse().ok()?,
        id,
        ref_allele: fields[3].to_string(),
        alt_allele: alt.to_string(),
        genotypes,
        dosages,
    })
}

/// Parse a GT field (e.g., "0/1", "1|0", "./.") to an alt allele count.
fn parse_gt(gt: &str) -> Option<u8> {
    let mut count = 0u8;
    let mut n_alleles = 0;
    for allele in gt.split(['/', '|']) {
        match allele {
            "0" => {}
            "1" => count += 1,
            _ => return None,
        }
        n_alleles += 1;
    }
    if n_alleles == 2 {
        Some(count)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const VCF: &str = "##fileformat=VCFv4.2\n\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\tS2\tS3\n\
1\t100\trs1\tA\tG\t.\tPASS\t.\tGT\t0/0\t0/1\t1/1\n\
1\t200\trs2\tC\tT\t.\tPASS\t.\tGT:DS\t0|1:0.9\t./.:.\t1|1:1.8\n\
1\t300\trs3\tC\tT,G\t.\tPASS\t.\tGT\t0/1\t0/2\t1/1\n\
1\t400\t.\tG\tA\t.\tPASS\t.\tGT\t0/0\t0/0\t0/1\n\
2\t150\trs5\tA\tC\t.\tPASS\t.\tGT\t0/1\t0/1\t0/1\n";

    fn write_vcf(dir: &Path) -> PathBuf {
        let path = dir.join("test.vcf");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(VCF.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_parse_gt() {
        assert_eq!(parse_gt("0/0"), Some(0));
        assert_eq!(parse_gt("0/1"), Some(1));
        assert_eq!(parse_gt("1|1"), Some(2));
        assert_eq!(parse_gt("./."), None);
        assert_eq!(parse_gt("0/2"), None);
        assert_eq!(parse_gt("1"), None);
    }

    #[test]
    fn test_fetch_window() {
        let dir = tempfile::tempdir().unwrap();
        let reader = VcfReader::new(write_vcf(dir.path())).unwrap();
        assert_eq!(reader.sample_ids(), &["S1", "S2", "S3"]);

        let region = GenomicRegion { chrom: "1".into(), start: 150, end: 400 };
        let items: Vec<Option<VariantRecord>> =
            reader.fetch(&region, None).unwrap().map(|r| r.unwrap()).collect();
        // rs2, multi-allelic rs3 (null entry), unnamed site at 400
        assert_eq!(items.len(), 3);
        let rs2 = items[0].as_ref().unwrap();
        assert_eq!(rs2.id, "rs2");
        assert_eq!(rs2.genotypes, vec![Some(1), None, Some(2)]);
        assert!((rs2.dosages[0] - 0.9).abs() < 1e-12);
        assert!(rs2.dosages[1].is_nan());
        assert!(items[1].is_none());
        assert_eq!(items[2].as_ref().unwrap().id, "1:400");
    }

    #[test]
    fn test_fetch_subset_and_allow_list() {
        let dir = tempfile::tempdir().unwrap();
        let mut reader = VcfReader::new(write_vcf(dir.path())).unwrap();
        reader
            .set_sample_subset(&["S3".to_string(), "S1".to_string()])
            .unwrap();

        let allowed: HashSet<String> = ["rs1".to_string()].into_iter().collect();
        let region = GenomicRegion { chrom: "1".into(), start: 0, end: 1000 };
        let items: Vec<VariantRecord> = reader
            .fetch(&region, Some(&allowed))
            .unwrap()
            .filter_map(|r| r.unwrap())
            .collect();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].genotypes, vec![Some(2), Some(0)]);
        assert_eq!(items[0].dosages, vec![2.0, 0.0]);
    }

    #[test]
    fn test_genotype_calls_replace_dosages() {
        let dir = tempfile::tempdir().unwrap();
        let mut reader = VcfReader::new(write_vcf(dir.path())).unwrap();
        let region = GenomicRegion { chrom: "1".into(), start: 200, end: 200 };

        let rs2 = reader.fetch(&region, None).unwrap().next().unwrap().unwrap().unwrap();
        assert_eq!(rs2.dosages[2], 1.8);

        reader.set_prefer_dosage(false);
        let rs2 = reader.fetch(&region, None).unwrap().next().unwrap().unwrap().unwrap();
        assert_eq!(rs2.dosages[0], 1.0);
        assert!(rs2.dosages[1].is_nan());
        assert_eq!(rs2.dosages[2], 2.0);
    }

    #[test]
    fn test_unknown_sample_subset_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut reader = VcfReader::new(write_vcf(dir.path())).unwrap();
        assert!(reader.set_sample_subset(&["S9".to_string()]).is_err());
    }
}
