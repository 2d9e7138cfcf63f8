//! Header and row layout of the result tables.

use betaqtl_geno::GeneAnnotation;

use crate::null_model::BetaNullModel;
use crate::qc::QcResult;
use crate::top_effect::VariantEffect;

use super::format::{format_number, format_opt, format_pvalue, join_datasets, MISSING};

/// QC outcome of one variant across all datasets.
#[derive(Debug, Clone)]
pub struct VariantQcSummary {
    pub variant_id: String,
    pub alleles: String,
    /// Alt allele frequency over all contributing datasets, if any contributed.
    pub overall_alt_freq: Option<f64>,
    pub total_alleles: u64,
    pub n_passing: usize,
    pub per_dataset: Vec<QcResult>,
}

fn labelled(label: &str, datasets: &[String]) -> String {
    format!("{}({})", label, datasets.join(";"))
}

fn effect_columns(datasets: &[String]) -> Vec<String> {
    let mut cols: Vec<String> = [
        "Gene",
        "GeneChr",
        "GenePos",
        "GeneStrand",
        "GeneSymbol",
        "SNP",
        "SNPChr",
        "SNPPos",
        "SNPAlleles",
        "SNPEffectAllele",
        "SNPEffectAlleleFreq",
        "MetaP",
        "MetaPN",
        "MetaPZ",
        "MetaBeta",
        "MetaSE",
        "NrDatasets",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    cols.push(labelled("DatasetCorrelationCoefficients", datasets));
    cols.push(labelled("DatasetZScores", datasets));
    cols.push(labelled("DatasetSampleSizes", datasets));
    cols
}

pub fn all_effects_header(datasets: &[String]) -> String {
    effect_columns(datasets).join("\t")
}

pub fn top_effects_header(datasets: &[String]) -> String {
    let mut cols = effect_columns(datasets);
    cols.extend(
        [
            "NrTestedSNPs",
            "ProportionBetterPermPvals",
            "BetaDistAlpha",
            "BetaDistBeta",
            "BetaAdjustedMetaP",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    cols.join("\t")
}

fn effect_fields(gene: &GeneAnnotation, e: &VariantEffect, sci: f64) -> Vec<String> {
    let r = join_datasets(
        e.per_dataset
            .iter()
            .map(|s| format_opt(s.as_ref(), |s| format_number(s.r))),
    );
    let z = join_datasets(
        e.per_dataset
            .iter()
            .map(|s| format_opt(s.as_ref(), |s| format_number(s.z))),
    );
    let n = join_datasets(
        e.per_dataset
            .iter()
            .map(|s| format_opt(s.as_ref(), |s| s.n.to_string())),
    );
    vec![
        gene.gene_id.clone(),
        gene.chrom.clone(),
        gene.pos.to_string(),
        gene.strand.to_string(),
        gene.symbol.clone(),
        e.variant_id.clone(),
        e.chrom.clone(),
        e.pos.to_string(),
        e.alleles.clone(),
        e.effect_allele.clone(),
        format_number(e.effect_allele_freq),
        format_pvalue(e.meta_p, sci),
        e.meta_n.to_string(),
        format_number(e.meta_z),
        format_number(e.beta),
        format_number(e.se),
        e.n_datasets.to_string(),
        r,
        z,
        n,
    ]
}

pub fn all_effects_row(gene: &GeneAnnotation, e: &VariantEffect, sci: f64) -> String {
    effect_fields(gene, e, sci).join("\t")
}

pub fn top_effects_row(
    gene: &GeneAnnotation,
    e: &VariantEffect,
    n_tested: usize,
    null: &BetaNullModel,
    sci: f64,
) -> String {
    let mut fields = effect_fields(gene, e, sci);
    fields.push(n_tested.to_string());
    fields.push(format_number(null.proportion_better));
    fields.push(format_number(null.alpha));
    fields.push(format_number(null.beta));
    fields.push(format_pvalue(null.adjusted_p, sci));
    fields.join("\t")
}

pub fn permutations_header(n_permutations: usize) -> String {
    let mut cols = vec!["Gene".to_string(), "SNP".to_string()];
    cols.extend((0..n_permutations).map(|k| format!("Perm{}", k)));
    cols.join("\t")
}

pub fn permutations_row(gene_id: &str, variant_id: &str, pvalues: &[f64], sci: f64) -> String {
    let mut fields = vec![gene_id.to_string(), variant_id.to_string()];
    fields.extend(pvalues.iter().map(|&p| format_pvalue(p, sci)));
    fields.join("\t")
}

pub fn snp_qc_header(datasets: &[String]) -> String {
    [
        "Gene".to_string(),
        "Variant".to_string(),
        "Alleles".to_string(),
        "OverallAltAlleleFreq".to_string(),
        "NrTotalAlleles".to_string(),
        "NrDatasetsPassingQC".to_string(),
        labelled("PassQC", datasets),
        labelled("MAF", datasets),
        labelled("CR", datasets),
        labelled("HWE-P", datasets),
    ]
    .join("\t")
}

pub fn snp_qc_row(gene_id: &str, qc: &VariantQcSummary, sci: f64) -> String {
    let pass = join_datasets(
        qc.per_dataset
            .iter()
            .map(|q| if q.pass { "T" } else { "F" }.to_string()),
    );
    let maf = join_datasets(qc.per_dataset.iter().map(|q| format_number(q.maf)));
    let cr = join_datasets(qc.per_dataset.iter().map(|q| format_number(q.call_rate)));
    let hwe = join_datasets(qc.per_dataset.iter().map(|q| format_pvalue(q.hwe_p, sci)));
    [
        gene_id.to_string(),
        qc.variant_id.clone(),
        qc.alleles.clone(),
        format_opt(qc.overall_alt_freq, format_number),
        if qc.overall_alt_freq.is_some() {
            qc.total_alleles.to_string()
        } else {
            MISSING.to_string()
        },
        qc.n_passing.to_string(),
        pass,
        maf,
        cr,
        hwe,
    ]
    .join("\t")
}
