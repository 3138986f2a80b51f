//! Manifest-driven ingestion of many taxa
//!
//! All keys are resolved and checked for collisions before anything in the
//! store changes. Without `force`, any collision aborts the run. Entries are
//! then processed one after another in manifest order; a failing taxon is
//! recorded and the batch moves on.

use crate::bio::taxonomy::TaxonomyLookup;
use crate::core::identity::{IdentityResolver, TaxonKey};
use crate::core::manifest::{read_manifest, ManifestEntry};
use crate::core::pipeline::{IngestOptions, TaxonOutcome, TaxonPipeline};
use crate::storage::record_store::RecordStore;
use crate::tools::traits::{Annotator, BlastIndexer};
use crate::utils::progress::batch_progress;
use crate::{Collision, IngestError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOptions {
    pub ingest: IngestOptions,
    pub show_progress: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            ingest: IngestOptions::default(),
            show_progress: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntryStatus {
    Succeeded { outcome: TaxonOutcome },
    Skipped { reason: String },
    Failed { error: String },
}

/// Outcome of one manifest row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryReport {
    pub file: String,
    pub key: Option<TaxonKey>,
    #[serde(flatten)]
    pub status: EntryStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub output_root: PathBuf,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Keys that collided and were overwritten because of `force`
    pub overwritten: Vec<TaxonKey>,
    pub entries: Vec<EntryReport>,
}

impl BatchReport {
    fn new(output_root: &Path) -> Self {
        Self {
            output_root: output_root.to_path_buf(),
            succeeded: 0,
            skipped: 0,
            failed: 0,
            overwritten: Vec::new(),
            entries: Vec::new(),
        }
    }

    fn push(&mut self, file: &str, key: Option<TaxonKey>, status: EntryStatus) {
        match status {
            EntryStatus::Succeeded { .. } => self.succeeded += 1,
            EntryStatus::Skipped { .. } => self.skipped += 1,
            EntryStatus::Failed { .. } => self.failed += 1,
        }
        self.entries.push(EntryReport {
            file: file.to_string(),
            key,
            status,
        });
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| IngestError::Parse(format!("Failed to serialize report: {}", e)))
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// A manifest row ready to run
struct Job<'m> {
    entry: &'m ManifestEntry,
    input: PathBuf,
    key: TaxonKey,
}

pub struct BatchOrchestrator<'a> {
    store: &'a RecordStore,
    taxonomy: &'a dyn TaxonomyLookup,
    indexer: &'a dyn BlastIndexer,
    annotator: &'a dyn Annotator,
}

impl<'a> BatchOrchestrator<'a> {
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

    pub fn run(
        &self,
        manifest: &Path,
        input_dir: &Path,
        options: &BatchOptions,
    ) -> Result<BatchReport> {
        let entries = read_manifest(manifest)?;
        self.run_entries(&entries, input_dir, options)
    }

    /// Run already parsed manifest entries
    pub fn run_entries(
        &self,
        entries: &[ManifestEntry],
        input_dir: &Path,
        options: &BatchOptions,
    ) -> Result<BatchReport> {
        if !input_dir.is_dir() {
            return Err(IngestError::Configuration(format!(
                "Input folder {} not found",
                input_dir.display()
            )));
        }

        let mut report = BatchReport::new(self.store.root());
        let resolver = IdentityResolver::new(self.taxonomy);
        let existing: HashSet<TaxonKey> = self.store.list_taxa()?.into_iter().collect();
        info!(
            entries = entries.len(),
            existing = existing.len(),
            "Loaded manifest"
        );

        let mut jobs = Vec::new();
        let mut seen: HashMap<TaxonKey, &str> = HashMap::new();
        let mut collisions = Vec::new();
        let mut overwrite = Vec::new();

        for entry in entries {
            let input = input_dir.join(&entry.input_file);
            if !input.is_file() {
                warn!(file = %entry.input_file, line = entry.line, "Input file not found, skipping");
                report.push(
                    &entry.input_file,
                    None,
                    EntryStatus::Skipped {
                        reason: format!("{} not found", input.display()),
                    },
                );
                continue;
            }

            let key = resolver.resolve(
                entry.taxonomy_id,
                entry.name.as_deref(),
                entry.version.as_deref(),
            );
            let in_store = existing.contains(&key);
            let earlier = seen.get(&key).copied();
            if in_store || earlier.is_some() {
                if let Some(first) = earlier {
                    let first = Collision {
                        file: first.to_string(),
                        key: key.to_string(),
                    };
                    if !collisions.contains(&first) {
                        collisions.push(first);
                    }
                }
                collisions.push(Collision {
                    file: entry.input_file.clone(),
                    key: key.to_string(),
                });
                if in_store && !overwrite.contains(&key) {
                    overwrite.push(key.clone());
                }
            }
            seen.entry(key.clone()).or_insert(entry.input_file.as_str());
            jobs.push(Job { entry, input, key });
        }

        if !collisions.is_empty() {
            if !options.ingest.force {
                return Err(IngestError::Collision(collisions));
            }
            warn!(count = collisions.len(), "Taxa already present will be overwritten");
            for key in &overwrite {
                self.store.plan_overwrite(key).apply()?;
            }
            report.overwritten = overwrite;
        }

        let pipeline =
            TaxonPipeline::new(self.store, self.taxonomy, self.indexer, self.annotator);
        let pb = batch_progress(jobs.len() as u64, options.show_progress);

        for job in jobs {
            pb.set_message(job.key.to_string());
            if options.ingest.check_rank {
                resolver.validate_rank(job.entry.taxonomy_id);
            }
            let status = match pipeline.run_with_key(&job.input, &job.key, &options.ingest) {
                Ok(outcome) => EntryStatus::Succeeded { outcome },
                Err(e) => {
                    error!(taxon = %job.key, file = %job.entry.input_file, "{}", e);
                    EntryStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };
            report.push(&job.entry.input_file, Some(job.key), status);
            pb.inc(1);
        }
        pb.finish_and_clear();

        info!(
            succeeded = report.succeeded,
            skipped = report.skipped,
            failed = report.failed,
            "Batch finished"
        );
        Ok(report)
    }
}
