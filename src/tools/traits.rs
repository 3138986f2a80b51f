//! Trait definitions for the external tools a taxon is handed to
//!
//! The pipeline only knows these interfaces; the concrete wrappers around
//! `makeblastdb` and `fas.doAnno` live next to them, and tests substitute
//! their own implementations.
use crate::Result;
use std::path::{Path, PathBuf};

/// Builds a protein BLAST database from a FASTA file
#[cfg_attr(test, mockall::automock)]
pub trait BlastIndexer {
    /// Build the index for `fasta` with all output files starting with `prefix`
    fn build_index(&self, fasta: &Path, prefix: &Path) -> Result<()>;

    /// Verify that the tool is available
    fn verify_installation(&self) -> Result<()>;
}

/// Arguments for one annotation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRequest {
    pub fasta: PathBuf,
    pub output_dir: PathBuf,
    pub workers: usize,
    pub force: bool,
}

/// Computes protein feature annotations for a canonical FASTA file
#[cfg_attr(test, mockall::automock)]
pub trait Annotator {
    fn annotate(&self, request: &AnnotationRequest) -> Result<()>;

    /// Verify that the tool is available
    fn verify_installation(&self) -> Result<()>;
}
