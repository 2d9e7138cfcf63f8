//! Per-gene cis-QTL mapping.
//!
//! For one gene the worker streams the variants of its cis-window, runs
//! per-dataset QC, the unpermuted association pass and all permutation
//! passes, then calibrates the strongest variant against the permutation
//! minima. Genes are independent; a worker can be shared across threads.

use std::borrow::Cow;
use std::collections::HashSet;

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::{debug, warn};

use betaqtl_geno::dataset::Dataset;
use betaqtl_geno::expression::GeneExpression;
use betaqtl_geno::limits::VariantGeneLimits;
use betaqtl_geno::{AnnotationLookup, GeneAnnotation, GenomicRegion, VariantRecord, VariantSource};

use crate::association::{association_pass, effect_size, meta_analyze, DatasetStats};
use crate::config::CisQtlConfig;
use crate::null_model::{calibrate, NullStatus};
use crate::output::rows::{self, VariantQcSummary};
use crate::output::QtlOutputs;
use crate::permutation::{shuffled, SeedTable};
use crate::qc::{impute_missing_mean, prune, variant_qc, QcResult, QcThresholds};
use crate::top_effect::{TopEffectTracker, VariantEffect};

use super::partition::{partition_phenotype, partition_variant};

/// Optional restrictions on which variants are tested.
#[derive(Debug, Clone, Default)]
pub struct VariantLimits {
    /// Variants allowed for every gene.
    pub variants: Option<HashSet<String>>,
    /// Variants allowed per gene.
    pub variant_gene: Option<VariantGeneLimits>,
}

/// What happened to one gene.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneOutcome {
    /// Top effect written with a Beta-adjusted p-value.
    Tested {
        n_tested: usize,
        top_p: f64,
        adjusted_p: f64,
    },
    /// Beta fit failed; only the empirical p-value is known. Not written.
    Degraded { n_tested: usize, empirical_p: f64 },
    /// No variant in the window passed QC and meta-analysis.
    Untested { n_in_window: usize },
    NoAnnotation,
}

/// A dataset that passed QC for the current variant.
struct PreparedDataset {
    calls: Vec<Option<f64>>,
    dosages: Vec<f64>,
}

struct GeneState {
    tracker: TopEffectTracker,
    perm_min: Vec<f64>,
    n_in_window: usize,
    n_tested: usize,
}

pub struct GeneWorker<'a> {
    source: &'a dyn VariantSource,
    annotations: &'a dyn AnnotationLookup,
    datasets: &'a [Dataset],
    seeds: &'a SeedTable,
    config: &'a CisQtlConfig,
    outputs: &'a QtlOutputs,
    limits: Option<&'a VariantLimits>,
    thresholds: QcThresholds,
}

impl<'a> GeneWorker<'a> {
    pub fn new(
        source: &'a dyn VariantSource,
        annotations: &'a dyn AnnotationLookup,
        datasets: &'a [Dataset],
        seeds: &'a SeedTable,
        config: &'a CisQtlConfig,
        outputs: &'a QtlOutputs,
    ) -> Self {
        Self {
            source,
            annotations,
            datasets,
            seeds,
            config,
            outputs,
            limits: None,
            thresholds: config.qc_thresholds(),
        }
    }

    pub fn with_limits(mut self, limits: &'a VariantLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    pub fn outputs(&self) -> &QtlOutputs {
        self.outputs
    }

    /// Map one gene. Errors are I/O failures of the source or the sinks.
    pub fn run_gene(&self, gene: &GeneExpression) -> Result<GeneOutcome> {
        let Some(annotation) = self.annotations.lookup(&gene.gene_id) else {
            debug!("No annotation for {}", gene.gene_id);
            self.outputs.log_message(&format!(
                "Skipping {} since it has no annotation.",
                gene.gene_id
            ))?;
            return Ok(GeneOutcome::NoAnnotation);
        };

        let region =
            GenomicRegion::around(&annotation.chrom, annotation.pos, self.config.cis_window);
        let phenotypes = partition_phenotype(&gene.values, self.datasets, self.config.rank_data);
        let allow_list = self.allow_list(&gene.gene_id);
        let cursor = self
            .source
            .fetch(&region, allow_list.as_deref())
            .with_context(|| format!("Failed to query {} for {}", region, gene.gene_id))?;

        let mut state = GeneState {
            tracker: TopEffectTracker::new(),
            perm_min: vec![1.0; self.seeds.len()],
            n_in_window: 0,
            n_tested: 0,
        };
        for item in cursor {
            let item = item.with_context(|| format!("Failed to read {} for {}", region, gene.gene_id))?;
            let Some(record) = item else { continue };
            state.n_in_window += 1;
            self.test_variant(annotation, &record, &phenotypes, &mut state)?;
        }

        self.finish_gene(annotation, state)
    }

    fn allow_list(&self, gene_id: &str) -> Option<Cow<'a, HashSet<String>>> {
        let limits = self.limits?;
        match (&limits.variants, &limits.variant_gene) {
            (None, None) => None,
            (Some(v), None) => Some(Cow::Borrowed(v)),
            (None, Some(vg)) => Some(Cow::Borrowed(vg.variants_for(gene_id))),
            (Some(v), Some(vg)) => Some(Cow::Owned(
                vg.variants_for(gene_id).intersection(v).cloned().collect(),
            )),
        }
    }

    /// QC every dataset for this variant. Failing datasets are `None`.
    fn prepare_datasets(
        &self,
        record: &VariantRecord,
        phenotypes: &[Vec<f64>],
    ) -> (Vec<Option<PreparedDataset>>, Vec<QcResult>) {
        let mut prepared = Vec::with_capacity(self.datasets.len());
        let mut qc_results = Vec::with_capacity(self.datasets.len());
        for (dataset, phenotype) in self.datasets.iter().zip(phenotypes) {
            let (mut calls, mut dosages) = partition_variant(record, dataset);
            let qc = variant_qc(calls.iter().copied(), &self.thresholds);
            if !qc.pass {
                qc_results.push(qc);
                prepared.push(None);
                continue;
            }
            if self.config.replace_missing_genotypes {
                impute_missing_mean(&mut calls, &mut dosages);
            }
            let pruned = prune(&calls, &dosages, phenotype);
            let pruned_qc = variant_qc(pruned.calls.iter().map(|&c| Some(c)), &self.thresholds);
            if !pruned_qc.pass || pruned.dosages.len() < self.config.min_observations {
                qc_results.push(pruned_qc.failed());
                prepared.push(None);
                continue;
            }
            qc_results.push(pruned_qc);
            prepared.push(Some(PreparedDataset { calls, dosages }));
        }
        (prepared, qc_results)
    }

    fn test_variant(
        &self,
        gene: &GeneAnnotation,
        record: &VariantRecord,
        phenotypes: &[Vec<f64>],
        state: &mut GeneState,
    ) -> Result<()> {
        let min_obs = self.config.min_observations;
        let min_datasets = self.config.min_datasets;
        let sci = self.config.scientific_threshold;

        let (prepared, qc_results) = self.prepare_datasets(record, phenotypes);
        let n_passing = prepared.iter().filter(|p| p.is_some()).count();
        if n_passing < min_datasets {
            return self.write_snp_qc(&gene.gene_id, record, None, 0, n_passing, qc_results);
        }

        // unpermuted pass: the only writer of the tracker and effect rows
        let mut alt_alleles = 0u64;
        let mut total_alleles = 0u64;
        let observed: Vec<Option<DatasetStats>> = prepared
            .iter()
            .zip(phenotypes)
            .map(|(prep, phenotype)| {
                let prep = prep.as_ref()?;
                let res = association_pass(&prep.calls, &prep.dosages, phenotype, min_obs)?;
                alt_alleles += res.alt_alleles;
                total_alleles += res.total_alleles;
                Some(res.stats)
            })
            .collect();
        let overall_af = (total_alleles > 0).then(|| alt_alleles as f64 / total_alleles as f64);
        self.write_snp_qc(
            &gene.gene_id,
            record,
            overall_af,
            total_alleles,
            n_passing,
            qc_results,
        )?;

        if let Some(meta) = meta_analyze(&observed, min_datasets) {
            let af = overall_af.unwrap_or(f64::NAN);
            let (beta, se) = effect_size(meta.z, af, meta.n_total);
            let effect = VariantEffect {
                variant_id: record.id.clone(),
                chrom: record.chrom.clone(),
                pos: record.pos,
                alleles: record.alleles(),
                effect_allele: record.alt_allele.clone(),
                effect_allele_freq: af,
                meta_p: meta.p,
                meta_z: meta.z,
                meta_n: meta.n_total,
                n_datasets: meta.n_datasets,
                beta,
                se,
                per_dataset: observed,
                distance: record.pos.abs_diff(gene.pos),
            };
            state.n_tested += 1;
            if let Some(sink) = &self.outputs.all_effects {
                sink.append_line(&rows::all_effects_row(gene, &effect, sci))?;
            }
            state.tracker.offer(effect);
        }

        if self.seeds.is_empty() {
            return Ok(());
        }
        let mut perm_p = vec![1.0; self.seeds.len()];
        perm_p.par_iter_mut().enumerate().for_each(|(k, slot)| {
            let seed = self.seeds.get(k);
            let stats: Vec<Option<DatasetStats>> = prepared
                .iter()
                .zip(phenotypes)
                .map(|(prep, phenotype)| {
                    let prep = prep.as_ref()?;
                    let permuted = shuffled(phenotype, seed);
                    association_pass(&prep.calls, &prep.dosages, &permuted, min_obs)
                        .map(|res| res.stats)
                })
                .collect();
            if let Some(meta) = meta_analyze(&stats, min_datasets) {
                *slot = meta.p;
            }
        });

        for (best, &p) in state.perm_min.iter_mut().zip(&perm_p) {
            if p < *best {
                *best = p;
            }
        }
        if let Some(sink) = &self.outputs.permutations {
            sink.append_line(&rows::permutations_row(&gene.gene_id, &record.id, &perm_p, sci))?;
        }
        Ok(())
    }

    fn write_snp_qc(
        &self,
        gene_id: &str,
        record: &VariantRecord,
        overall_alt_freq: Option<f64>,
        total_alleles: u64,
        n_passing: usize,
        per_dataset: Vec<QcResult>,
    ) -> Result<()> {
        let Some(sink) = &self.outputs.snp_qc_log else {
            return Ok(());
        };
        let summary = VariantQcSummary {
            variant_id: record.id.clone(),
            alleles: record.alleles(),
            overall_alt_freq,
            total_alleles,
            n_passing,
            per_dataset,
        };
        sink.append_line(&rows::snp_qc_row(
            gene_id,
            &summary,
            self.config.scientific_threshold,
        ))
    }

    fn finish_gene(&self, gene: &GeneAnnotation, state: GeneState) -> Result<GeneOutcome> {
        let GeneState {
            tracker,
            perm_min,
            n_in_window,
            n_tested,
        } = state;

        let Some(top) = tracker.into_best() else {
            let message = format!(
                "{} has {} SNPs in the CIS-window, but none passed QC.",
                gene.gene_id, n_in_window
            );
            debug!("{}", message);
            self.outputs.log_message(&message)?;
            return Ok(GeneOutcome::Untested { n_in_window });
        };

        let null = calibrate(&perm_min, top.meta_p, self.config.beta_pvalue_floor);
        if let NullStatus::Failed(err) = &null.status {
            warn!("{}: {}", gene.gene_id, err);
            self.outputs.log_message(&format!(
                "{} failed: Beta MLE Model did not converge.",
                gene.gene_id
            ))?;
            return Ok(GeneOutcome::Degraded {
                n_tested,
                empirical_p: null.proportion_better,
            });
        }

        self.outputs.top_effects.append_line(&rows::top_effects_row(
            gene,
            &top,
            n_tested,
            &null,
            self.config.scientific_threshold,
        ))?;
        debug!(
            "{}: top variant {} (p = {:e}, adjusted p = {:e}, {} tested)",
            gene.gene_id, top.variant_id, top.meta_p, null.adjusted_p, n_tested
        );
        Ok(GeneOutcome::Tested {
            n_tested,
            top_p: top.meta_p,
            adjusted_p: null.adjusted_p,
        })
    }
}
