//! Parallel dispatch of genes to a shared [`GeneWorker`].

use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use betaqtl_geno::expression::GeneExpression;

use super::worker::{GeneOutcome, GeneWorker};

/// Outcome counts of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub n_genes: usize,
    pub tested: usize,
    pub degraded: usize,
    pub untested: usize,
    pub no_annotation: usize,
    pub failed: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: &Option<GeneOutcome>) {
        self.n_genes += 1;
        match outcome {
            Some(GeneOutcome::Tested { .. }) => self.tested += 1,
            Some(GeneOutcome::Degraded { .. }) => self.degraded += 1,
            Some(GeneOutcome::Untested { .. }) => self.untested += 1,
            Some(GeneOutcome::NoAnnotation) => self.no_annotation += 1,
            None => self.failed += 1,
        }
    }
}

/// Map all genes in parallel. A failing gene is logged and skipped.
pub fn run_genes(worker: &GeneWorker<'_>, genes: &[GeneExpression]) -> RunSummary {
    info!("Mapping {} genes", genes.len());
    let done = AtomicUsize::new(0);
    let step = (genes.len() / 10).max(1);

    let outcomes: Vec<Option<GeneOutcome>> = genes
        .par_iter()
        .map(|gene| {
            let outcome = match worker.run_gene(gene) {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    warn!("Gene {} failed: {:#}", gene.gene_id, e);
                    if let Err(log_err) = worker
                        .outputs()
                        .log_message(&format!("{} failed: {:#}", gene.gene_id, e))
                    {
                        warn!("Could not write to the run log: {:#}", log_err);
                    }
                    None
                }
            };
            let n = done.fetch_add(1, Ordering::Relaxed) + 1;
            if n % step == 0 {
                info!("{}/{} genes done", n, genes.len());
            }
            outcome
        })
        .collect();

    let mut summary = RunSummary::default();
    for outcome in &outcomes {
        summary.record(outcome);
    }
    info!(
        "Tested {} genes ({} degraded, {} untested, {} without annotation, {} failed)",
        summary.tested, summary.degraded, summary.untested, summary.no_annotation, summary.failed
    );
    summary
}
