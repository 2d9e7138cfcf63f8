//! betaqtl-geno: input sources for cis-QTL mapping
//!
//! Provides the `VariantSource` and `AnnotationLookup` traits with a
//! windowed VCF reader and an in-memory source, plus parsers for the
//! expression matrix, gene annotation, sample linkage and limit files.

pub mod annotation;
pub mod dataset;
pub mod expression;
pub mod io;
pub mod limits;
pub mod memory;
pub mod traits;
pub mod vcf;

pub use traits::{
    AnnotationLookup, GeneAnnotation, GenomicRegion, Strand, VariantCursor, VariantRecord,
    VariantSource,
};
