//! Expression matrix parser.
//!
//! Reads a tab-delimited matrix with one gene per row:
//!
//! ```text
//! gene    S1    S2    S3
//! ENSG1   0.5   NA    1.2
//! ```
//!
//! Missing values (`NA`, `NaN`, `.`, empty) become NaN.

use std::collections::HashSet;
use std::io::BufRead;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::io::{open_text, parse_value};

/// Expression values of one gene over all expression samples.
#[derive(Debug, Clone)]
pub struct GeneExpression {
    pub gene_id: String,
    pub values: Vec<f64>,
}

/// Parsed expression matrix.
#[derive(Debug, Clone)]
pub struct ExpressionMatrix {
    /// Sample IDs from the header, in column order.
    pub sample_ids: Vec<String>,
    /// Genes in file order.
    pub genes: Vec<GeneExpression>,
}

impl ExpressionMatrix {
    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    pub fn n_genes(&self) -> usize {
        self.genes.len()
    }
}

/// Parse an expression matrix, optionally keeping only genes in `gene_filter`.
pub fn parse_expression_file(
    path: &Path,
    gene_filter: Option<&HashSet<String>>,
) -> Result<ExpressionMatrix> {
    let reader = open_text(path)?;
    let mut lines = reader.lines();

    let header = match lines.next() {
        Some(line) => line.with_context(|| format!("Failed to read {}", path.display()))?,
        None => bail!("Empty expression file: {}", path.display()),
    };
    let sample_ids: Vec<String> = header
        .split('\t')
        .skip(1)
        .map(|s| s.trim().to_string())
        .collect();
    if sample_ids.is_empty() {
        bail!("Expression header of {} has no sample columns", path.display());
    }

    let mut genes = Vec::new();
    let mut seen = HashSet::new();
    for (line_num, line) in lines.enumerate() {
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split('\t');
        let gene_id = fields.next().unwrap_or("").trim().to_string();
        if let Some(filter) = gene_filter {
            if !filter.contains(&gene_id) {
                continue;
            }
        }
        let values: Vec<f64> = fields.map(|f| parse_value(f.trim())).collect();
        if values.len() != sample_ids.len() {
            bail!(
                "Line {} of {} has {} values, expected {}",
                line_num + 2,
                path.display(),
                values.len(),
                sample_ids.len()
            );
        }
        if !seen.insert(gene_id.clone()) {
            bail!("Gene {} appears twice in {}", gene_id, path.display());
        }
        genes.push(GeneExpression { gene_id, values });
    }

    info!(
        "Loaded expression for {} genes x {} samples from {}",
        genes.len(),
        sample_ids.len(),
        path.display()
    );
    Ok(ExpressionMatrix { sample_ids, genes })
}
