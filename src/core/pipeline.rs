//! Ingestion of exactly one taxon
//!
//! Stages run in a fixed order:
//! resolve identity, check the rank (optional), normalize and materialize the
//! FASTA, build the BLAST index (core taxa only), annotate (unless disabled).
//! Normalization and materialization failures end the run with an error. The
//! two tool stages record their failure in the [`TaxonOutcome`] instead, and
//! nothing already written is rolled back.

use crate::bio::fasta::open_fasta;
use crate::bio::taxonomy::TaxonomyLookup;
use crate::core::identity::{IdentityResolver, RankCheck, TaxonKey};
use crate::core::normalizer::{AlphabetPolicy, DuplicatePolicy, NormalizeStats, Normalizer};
use crate::storage::record_store::{Materialization, RecordStore};
use crate::tools::traits::{Annotator, BlastIndexer};
use crate::{IngestError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestOptions {
    pub alphabet: AlphabetPolicy,
    pub duplicates: DuplicatePolicy,
    /// Build a BLAST database for this taxon
    pub core_taxa: bool,
    /// Run the annotation tool
    pub annotate: bool,
    /// Workers handed to the annotation tool
    pub cpus: usize,
    /// Overwrite existing records
    pub force: bool,
    /// Run the advisory species-rank check
    pub check_rank: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            alphabet: AlphabetPolicy::default(),
            duplicates: DuplicatePolicy::default(),
            core_taxa: false,
            annotate: true,
            cpus: num_cpus::get().saturating_sub(1).max(1),
            force: false,
            check_rank: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    ResolveIdentity,
    ValidateRank,
    NormalizeSequences,
    Materialize,
    BuildBlastIndex,
    RunAnnotation,
    Done,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::ResolveIdentity => "resolve-identity",
            PipelineStage::ValidateRank => "validate-rank",
            PipelineStage::NormalizeSequences => "normalize",
            PipelineStage::Materialize => "materialize",
            PipelineStage::BuildBlastIndex => "blast-index",
            PipelineStage::RunAnnotation => "annotate",
            PipelineStage::Done => "done",
        };
        write!(f, "{}", name)
    }
}

/// Result of an optional tool stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageStatus {
    NotRequested,
    /// Output already present
    Skipped,
    Completed,
    Failed { message: String },
}

impl StageStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, StageStatus::Failed { .. })
    }

    fn from_result(stage: PipelineStage, key: &TaxonKey, result: Result<bool>) -> Self {
        match result {
            Ok(true) => StageStatus::Completed,
            Ok(false) => StageStatus::Skipped,
            Err(e) => {
                warn!(taxon = %key, stage = %stage, "{}", e);
                StageStatus::Failed {
                    message: e.to_string(),
                }
            }
        }
    }
}

/// What happened to one taxon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonOutcome {
    pub key: TaxonKey,
    pub fasta: PathBuf,
    /// `false` when a complete record was already present
    pub written: bool,
    pub stats: NormalizeStats,
    pub blast: StageStatus,
    pub annotation: StageStatus,
}

impl TaxonOutcome {
    pub fn has_failures(&self) -> bool {
        self.blast.is_failed() || self.annotation.is_failed()
    }
}

/// Runs the stages for one taxon against a store and a set of collaborators
pub struct TaxonPipeline<'a> {
    store: &'a RecordStore,
    taxonomy: &'a dyn TaxonomyLookup,
    indexer: &'a dyn BlastIndexer,
    annotator: &'a dyn Annotator,
}

impl<'a> TaxonPipeline<'a> {
    pub fn new(
        store: &'a RecordStore,
        taxonomy: &'a dyn TaxonomyLookup,
        indexer: &'a dyn BlastIndexer,
        annotator: &'a dyn Annotator,
    ) -> Self {
        Self {
            store,
            taxonomy,
            indexer,
            annotator,
        }
    }

    pub fn resolver(&self) -> IdentityResolver<'a> {
        IdentityResolver::new(self.taxonomy)
    }

    /// Resolve the key for `taxonomy_id` and ingest `input` under it
    pub fn run(
        &self,
        input: &Path,
        taxonomy_id: u32,
        name: Option<&str>,
        version: Option<&str>,
        options: &IngestOptions,
    ) -> Result<TaxonOutcome> {
        debug!(stage = %PipelineStage::ResolveIdentity, taxonomy_id);
        let resolver = self.resolver();
        let key = resolver.resolve(taxonomy_id, name, version);
        info!(taxon = %key, "Resolved taxon key");

        if options.check_rank {
            debug!(stage = %PipelineStage::ValidateRank, taxon = %key);
            if let RankCheck::NotFound = resolver.validate_rank(taxonomy_id) {
                debug!(taxon = %key, "Continuing without taxonomy information");
            }
        }

        self.run_with_key(input, &key, options)
    }

    /// Ingest `input` under an already resolved key
    pub fn run_with_key(
        &self,
        input: &Path,
        key: &TaxonKey,
        options: &IngestOptions,
    ) -> Result<TaxonOutcome> {
        if !input.is_file() {
            return Err(IngestError::Configuration(format!(
                "Input FASTA {} not found",
                input.display()
            )));
        }
        self.store.ensure_layout()?;

        debug!(stage = %PipelineStage::NormalizeSequences, taxon = %key, input = %input.display());
        let reader = open_fasta(input)?;
        let mut records = Normalizer::new(options.alphabet, options.duplicates).normalize(reader);

        debug!(stage = %PipelineStage::Materialize, taxon = %key);
        let materialized = self.store.materialize(key, &mut records, options.force)?;
        let stats = records.stats();
        if stats.renamed_duplicates > 0 {
            warn!(taxon = %key, renamed = stats.renamed_duplicates, "Duplicate sequence IDs were renamed");
        }

        let blast = if options.core_taxa {
            debug!(stage = %PipelineStage::BuildBlastIndex, taxon = %key);
            StageStatus::from_result(
                PipelineStage::BuildBlastIndex,
                key,
                self.store.build_blast_index(key, self.indexer, options.force),
            )
        } else {
            StageStatus::NotRequested
        };

        let annotation = if options.annotate {
            debug!(stage = %PipelineStage::RunAnnotation, taxon = %key);
            StageStatus::from_result(
                PipelineStage::RunAnnotation,
                key,
                self.store
                    .run_annotation(key, self.annotator, options.cpus, options.force)
                    .map(|_| true),
            )
        } else {
            StageStatus::NotRequested
        };

        debug!(stage = %PipelineStage::Done, taxon = %key);
        Ok(TaxonOutcome {
            key: key.clone(),
            fasta: materialized.fasta().to_path_buf(),
            written: matches!(materialized, Materialization::Written { .. }),
            stats,
            blast,
            annotation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bio::taxonomy::{TaxonomyDB, TaxonomyInfo};
    use crate::tools::traits::{MockAnnotator, MockBlastIndexer};
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn taxonomy() -> TaxonomyDB {
        let mut db = TaxonomyDB::new();
        db.add_taxon(TaxonomyInfo {
            taxon_id: 9606,
            scientific_name: "Homo sapiens".to_string(),
            rank: "species".to_string(),
            parent_id: None,
        });
        db
    }

    fn options() -> IngestOptions {
        IngestOptions {
            annotate: false,
            cpus: 1,
            ..IngestOptions::default()
        }
    }

    fn write_input(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("input.fa");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_run_resolves_and_materializes() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::new(dir.path().join("out"));
        let input = write_input(dir.path(), ">sp|P1|X some protein\nMKV*\n>p2\nLL\n");
        let db = taxonomy();
        let indexer = MockBlastIndexer::new();
        let annotator = MockAnnotator::new();
        let pipeline = TaxonPipeline::new(&store, &db, &indexer, &annotator);

        let outcome = pipeline.run(&input, 9606, None, Some("1"), &options()).unwrap();
        assert_eq!(outcome.key.to_string(), "HOMSA@9606@1");
        assert!(outcome.written);
        assert_eq!(outcome.stats.pipe_rewrites, 1);
        assert_eq!(outcome.blast, StageStatus::NotRequested);
        assert_eq!(
            fs::read_to_string(&outcome.fasta).unwrap(),
            ">sp_P1_X\nMKV\n>p2\nLL\n"
        );
    }

    #[test]
    fn test_tool_failures_are_recorded() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::new(dir.path().join("out"));
        let input = write_input(dir.path(), ">p1\nMKV\n");
        let db = taxonomy();

        let mut indexer = MockBlastIndexer::new();
        indexer.expect_build_index().times(1).returning(|_, prefix| {
            Err(IngestError::CollaboratorFailure {
                tool: "makeblastdb".into(),
                taxon: prefix.display().to_string(),
                message: "exit 1".into(),
            })
        });
        let mut annotator = MockAnnotator::new();
        annotator.expect_annotate().times(1).returning(|_| Ok(()));

        let pipeline = TaxonPipeline::new(&store, &db, &indexer, &annotator);
        let opts = IngestOptions {
            core_taxa: true,
            annotate: true,
            ..options()
        };
        let outcome = pipeline.run(&input, 9606, Some("human"), Some("2"), &opts).unwrap();

        assert_eq!(outcome.key.to_string(), "HUMAN@9606@2");
        assert!(outcome.blast.is_failed());
        assert_eq!(outcome.annotation, StageStatus::Completed);
        assert!(outcome.has_failures());
        assert!(store.is_materialized(&outcome.key));
    }

    #[test]
    fn test_invalid_alphabet_is_fatal_and_leaves_no_record() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::new(dir.path().join("out"));
        let input = write_input(dir.path(), ">p1\nMK1V\n");
        let db = taxonomy();
        let mut indexer = MockBlastIndexer::new();
        indexer.expect_build_index().never();
        let annotator = MockAnnotator::new();
        let pipeline = TaxonPipeline::new(&store, &db, &indexer, &annotator);

        let key = TaxonKey::new("HOMSA", 9606, "1");
        let opts = IngestOptions {
            core_taxa: true,
            ..options()
        };
        let err = pipeline.run_with_key(&input, &key, &opts).unwrap_err();
        assert!(matches!(err, IngestError::InvalidAlphabet { ref id } if id == "p1"));
        assert!(!store.exists(&key));
    }

    #[test]
    fn test_missing_input() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::new(dir.path());
        let db = TaxonomyDB::new();
        let indexer = MockBlastIndexer::new();
        let annotator = MockAnnotator::new();
        let pipeline = TaxonPipeline::new(&store, &db, &indexer, &annotator);

        let err = pipeline
            .run(&dir.path().join("none.fa"), 1, None, None, &options())
            .unwrap_err();
        assert!(matches!(err, IngestError::Configuration(_)));
    }
}
