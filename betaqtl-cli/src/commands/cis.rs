//! cis-QTL mapping.
//!
//! betaqtl cis --vcf ... --expression ... --annotation ... --link ... --out ...

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, warn};

use betaqtl_core::output::{write_config, OutputPaths, QtlOutputs};
use betaqtl_core::{run_genes, CisQtlConfig, GeneWorker, SeedTable, VariantLimits};
use betaqtl_geno::annotation::parse_annotation_file;
use betaqtl_geno::dataset::{build_datasets, parse_link_file};
use betaqtl_geno::expression::{parse_expression_file, GeneExpression};
use betaqtl_geno::limits::{parse_id_list, parse_variant_gene_limits};
use betaqtl_geno::vcf::VcfReader;
use betaqtl_geno::{AnnotationLookup, VariantSource};

#[derive(Args)]
pub struct CisArgs {
    /// VCF file (plain or gzip), sorted by position
    #[arg(long)]
    vcf: PathBuf,

    /// Expression matrix: gene<TAB>sample... header, one gene per row
    #[arg(long)]
    expression: PathBuf,

    /// Gene annotation (Gene, Symbol, Chr, ChrStart, ChrEnd, Strand)
    #[arg(long)]
    annotation: PathBuf,

    /// Sample links: genotypeSample<TAB>expressionSample<TAB>dataset
    #[arg(long)]
    link: PathBuf,

    /// Output prefix
    #[arg(long)]
    out: String,

    /// Only test genes annotated on this chromosome
    #[arg(long)]
    chromosome: Option<String>,

    /// Variant IDs to test (one per line)
    #[arg(long)]
    snp_limit: Option<PathBuf>,

    /// Gene IDs to test (one per line)
    #[arg(long)]
    gene_limit: Option<PathBuf>,

    /// Variant-gene pairs to test (gene<TAB>variant)
    #[arg(long)]
    snp_gene_limit: Option<PathBuf>,

    /// Number of permutations per gene
    #[arg(long, default_value = "1000")]
    perm: usize,

    /// Half-width of the cis-window in bp
    #[arg(long, default_value = "1000000")]
    window: u64,

    /// Root seed of the permutation seeds
    #[arg(long, default_value = "123456789")]
    seed: u64,

    /// Use expression values as-is instead of ranking them per dataset
    #[arg(long)]
    no_rank: bool,

    /// Replace missing genotypes with the dataset mean
    #[arg(long)]
    replace_missing_genotypes: bool,

    /// Use GT hard calls as dosages even when the VCF carries DS
    #[arg(long)]
    use_genotype_calls: bool,

    /// Minimum minor allele frequency per dataset
    #[arg(long, default_value = "0.01")]
    maf: f64,

    /// Minimum call rate per dataset
    #[arg(long, default_value = "0.95")]
    call_rate: f64,

    /// Minimum HWE p-value per dataset
    #[arg(long, default_value = "0.0001")]
    hwe: f64,

    /// Minimum number of observations per dataset
    #[arg(long, default_value = "10")]
    min_observations: usize,

    /// Minimum number of datasets with a test statistic
    #[arg(long, default_value = "2")]
    min_datasets: usize,

    /// Minimum carriers in at least two genotype classes (0 disables)
    #[arg(long, default_value = "0")]
    min_genotype_count: usize,

    /// Write every tested variant to <out>-AllEffects.txt.gz
    #[arg(long)]
    output_all: bool,

    /// Write per-variant QC statistics to <out>-snpqclog.txt.gz
    #[arg(long)]
    output_snp_log: bool,

    /// Write permutation p-values to <out>-Permutations.txt.gz
    #[arg(long)]
    dump_permutations: bool,
}

impl CisArgs {
    fn config(&self) -> CisQtlConfig {
        CisQtlConfig {
            n_permutations: self.perm,
            cis_window: self.window,
            seed: self.seed,
            rank_data: !self.no_rank,
            replace_missing_genotypes: self.replace_missing_genotypes,
            maf_threshold: self.maf,
            call_rate_threshold: self.call_rate,
            hwe_threshold: self.hwe,
            min_observations: self.min_observations,
            min_datasets: self.min_datasets,
            min_genotype_count: self.min_genotype_count,
            output_all: self.output_all,
            output_snp_log: self.output_snp_log,
            dump_permutation_pvalues: self.dump_permutations,
            ..Default::default()
        }
    }

    fn limits(&self) -> Result<VariantLimits> {
        let variants = match &self.snp_limit {
            Some(path) => {
                let ids = parse_id_list(path)?;
                info!("Limiting to {} variants", ids.len());
                Some(ids)
            }
            None => None,
        };
        let variant_gene = match &self.snp_gene_limit {
            Some(path) => {
                let pairs = parse_variant_gene_limits(path)?;
                info!("Limiting to {} variant-gene pairs", pairs.n_pairs());
                Some(pairs)
            }
            None => None,
        };
        Ok(VariantLimits {
            variants,
            variant_gene,
        })
    }
}

fn select_genes(
    genes: Vec<GeneExpression>,
    annotations: &dyn AnnotationLookup,
    chromosome: Option<&str>,
) -> Vec<GeneExpression> {
    let Some(chrom) = chromosome else {
        return genes;
    };
    genes
        .into_iter()
        .filter(|g| {
            annotations
                .lookup(&g.gene_id)
                .map_or(true, |a| a.chrom == chrom)
        })
        .collect()
}

pub fn run(args: CisArgs) -> Result<()> {
    info!("=== cis-QTL mapping ===");
    let config = args.config();
    config.validate()?;

    let mut reader = VcfReader::new(&args.vcf)?;
    reader.set_prefer_dosage(!args.use_genotype_calls);
    info!("VCF: {} samples", reader.sample_ids().len());

    let gene_filter = args.gene_limit.as_deref().map(parse_id_list).transpose()?;
    let expression = parse_expression_file(&args.expression, gene_filter.as_ref())?;
    info!(
        "Expression: {} genes x {} samples",
        expression.n_genes(),
        expression.n_samples()
    );

    let annotations = parse_annotation_file(&args.annotation)?;
    info!("Annotation: {} genes", annotations.len());

    let links = parse_link_file(&args.link)?;
    let linkage = build_datasets(&links, reader.sample_ids(), &expression.sample_ids)?;
    for dataset in &linkage.datasets {
        info!("Dataset {}: {} samples", dataset.name, dataset.n_samples());
    }
    reader.set_sample_subset(&linkage.genotype_samples)?;

    let config = config.resolve(linkage.datasets.len())?;
    let limits = args.limits()?;
    let seeds = SeedTable::new(config.seed, config.n_permutations);

    let paths = OutputPaths::from_prefix(&args.out);
    write_config(&paths.config, &config)?;
    let outputs = QtlOutputs::create(&paths, &config, &linkage.dataset_names())?;

    let genes = select_genes(expression.genes, &annotations, args.chromosome.as_deref());
    if genes.is_empty() {
        warn!("No genes left to test");
    }

    let worker = GeneWorker::new(
        &reader,
        &annotations,
        &linkage.datasets,
        &seeds,
        &config,
        &outputs,
    )
    .with_limits(&limits);
    let summary = run_genes(&worker, &genes);
    outputs.finish()?;

    std::fs::write(
        &paths.finished,
        format!("Tested genes:\t{}\n", summary.tested),
    )
    .with_context(|| format!("Failed to write {}", paths.finished.display()))?;

    info!("Results written with prefix {}", args.out);
    info!("Summary: {}", serde_json::to_string(&summary)?);
    Ok(())
}
