//! In-memory variant source.
//!
//! Holds a fixed list of variants. Used for tests and for callers that
//! already have genotypes loaded.

use std::collections::{HashMap, HashSet};

use anyhow::{bail, Result};

use crate::traits::{GenomicRegion, VariantCursor, VariantRecord, VariantSource};

pub struct InMemoryVariantSource {
    file_sample_ids: Vec<String>,
    sample_ids: Vec<String>,
    sample_subset: Option<Vec<usize>>,
    records: Vec<VariantRecord>,
}

impl InMemoryVariantSource {
    /// Build a source from records whose per-sample vectors follow `sample_ids`.
    ///
    /// Records are sorted by chromosome and position.
    pub fn new(sample_ids: Vec<String>, mut records: Vec<VariantRecord>) -> Result<Self> {
        for rec in &records {
            if rec.genotypes.len() != sample_ids.len() || rec.dosages.len() != sample_ids.len() {
                bail!(
                    "Variant {} has {} genotypes and {} dosages, expected {}",
                    rec.id,
                    rec.genotypes.len(),
                    rec.dosages.len(),
                    sample_ids.len()
                );
            }
        }
        records.sort_by(|a, b| a.chrom.cmp(&b.chrom).then(a.pos.cmp(&b.pos)));
        Ok(Self {
            sample_ids: sample_ids.clone(),
            file_sample_ids: sample_ids,
            sample_subset: None,
            records,
        })
    }

    fn subset_record(&self, rec: &VariantRecord) -> VariantRecord {
        match &self.sample_subset {
            None => rec.clone(),
            Some(idx) => VariantRecord {
                genotypes: idx.iter().map(|&i| rec.genotypes[i]).collect(),
                dosages: idx.iter().map(|&i| rec.dosages[i]).collect(),
                ..rec.clone()
            },
        }
    }
}

impl VariantSource for InMemoryVariantSource {
    fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    fn set_sample_subset(&mut self, ids: &[String]) -> Result<()> {
        let index: HashMap<&str, usize> = self
            .file_sample_ids
            .iter()
            .enumerate()
            .map(|(i, s)| (s.as_str(), i))
            .collect();
        let indices = ids
            .iter()
            .map(|id| match index.get(id.as_str()) {
                Some(&i) => Ok(i),
                None => bail!("Sample {} is not present in the variant source", id),
            })
            .collect::<Result<Vec<_>>>()?;
        self.sample_subset = Some(indices);
        self.sample_ids = ids.to_vec();
        Ok(())
    }

    fn fetch<'a>(
        &'a self,
        region: &GenomicRegion,
        allow_list: Option<&'a HashSet<String>>,
    ) -> Result<VariantCursor<'a>> {
        let region = region.clone();
        let iter = self
            .records
            .iter()
            .filter(move |rec| region.contains(&rec.chrom, rec.pos))
            .filter(move |rec| allow_list.map_or(true, |set| set.contains(&rec.id)))
            .map(move |rec| Ok(Some(self.subset_record(rec))));
        Ok(Box::new(iter))
    }
}
