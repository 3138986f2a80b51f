//! On-disk taxon records under one output root
//!
//! A record is `genome_dir/<KEY>/<KEY>.fa` plus a `.checked` marker written
//! after the FASTA is complete. The BLAST index and annotations are derived
//! artifacts built from that FASTA by external tools.

use crate::bio::fasta::write_record;
use crate::bio::sequence::Sequence;
use crate::core::identity::TaxonKey;
use crate::core::paths::StoreLayout;
use crate::storage::overwrite::OverwritePlan;
use crate::tools::traits::{AnnotationRequest, Annotator, BlastIndexer};
use crate::Result;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Result of [`RecordStore::materialize`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Materialization {
    /// The FASTA was (re)written with this many records
    Written { fasta: PathBuf, records: usize },
    /// A complete record already existed and was left untouched
    AlreadyPresent { fasta: PathBuf },
}

impl Materialization {
    pub fn fasta(&self) -> &Path {
        match self {
            Materialization::Written { fasta, .. } => fasta,
            Materialization::AlreadyPresent { fasta } => fasta,
        }
    }

    pub fn was_written(&self) -> bool {
        matches!(self, Materialization::Written { .. })
    }
}

#[derive(Debug, Clone)]
pub struct RecordStore {
    layout: StoreLayout,
    purge_annotations: bool,
}

impl RecordStore {
    /// Store rooted at `root`. Forced overwrites also purge the annotation entry.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            layout: StoreLayout::new(root),
            purge_annotations: true,
        }
    }

    /// Whether a forced overwrite removes the taxon's weight-store entry
    pub fn with_annotation_purge(mut self, purge: bool) -> Self {
        self.purge_annotations = purge;
        self
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    /// Create `genome_dir` under the root if needed
    pub fn ensure_layout(&self) -> Result<()> {
        fs::create_dir_all(self.layout.genome_root())?;
        Ok(())
    }

    /// A taxon directory exists, complete or not
    pub fn exists(&self, key: &TaxonKey) -> bool {
        self.layout.genome_dir(key).is_dir()
    }

    /// The FASTA is non-empty and its `.checked` marker is present
    pub fn is_materialized(&self, key: &TaxonKey) -> bool {
        let fasta_ok = fs::metadata(self.layout.fasta_path(key))
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false);
        fasta_ok && self.layout.checked_marker(key).is_file()
    }

    /// Keys of every taxon directory in `genome_dir`, sorted
    pub fn list_taxa(&self) -> Result<Vec<TaxonKey>> {
        let genome_root = self.layout.genome_root();
        if !genome_root.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in fs::read_dir(&genome_root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let name = name.to_string_lossy();
            match name.parse::<TaxonKey>() {
                Ok(key) => keys.push(key),
                Err(_) => debug!(dir = %name, "Ignoring non-taxon directory"),
            }
        }
        keys.sort_by_key(|k| k.to_string());
        Ok(keys)
    }

    /// Plan the removals a forced overwrite of `key` performs
    pub fn plan_overwrite(&self, key: &TaxonKey) -> OverwritePlan {
        OverwritePlan::plan(&self.layout, key, true, self.purge_annotations)
    }

    /// Write the canonical FASTA for `key` from normalized records.
    ///
    /// A complete record is left alone unless `force` is set. The FASTA goes
    /// to a temporary file first and is renamed into place only once the
    /// whole stream succeeded; on failure nothing is left behind.
    pub fn materialize<I>(&self, key: &TaxonKey, records: I, force: bool) -> Result<Materialization>
    where
        I: IntoIterator<Item = Result<Sequence>>,
    {
        let fasta = self.layout.fasta_path(key);

        if !force && self.is_materialized(key) {
            info!(taxon = %key, "{} already exists", fasta.display());
            return Ok(Materialization::AlreadyPresent { fasta });
        }

        if force && self.exists(key) {
            self.plan_overwrite(key).apply()?;
        }

        let genome_dir = self.layout.genome_dir(key);
        let created_dir = !genome_dir.exists();
        fs::create_dir_all(&genome_dir)?;

        let tmp = genome_dir.join(format!(".{}.fa.tmp", key));
        match write_records(&tmp, records) {
            Ok(count) => {
                fs::rename(&tmp, &fasta)?;
                write_checked_marker(&self.layout.checked_marker(key))?;
                if count == 0 {
                    warn!(taxon = %key, "No sequences written");
                }
                info!(taxon = %key, records = count, "Wrote {}", fasta.display());
                Ok(Materialization::Written {
                    fasta,
                    records: count,
                })
            }
            Err(e) => {
                let _ = fs::remove_file(&tmp);
                if created_dir {
                    let _ = fs::remove_dir_all(&genome_dir);
                }
                Err(e)
            }
        }
    }

    /// Build the BLAST database for a materialized taxon.
    ///
    /// Returns `false` when an index already exists and `force` is unset.
    pub fn build_blast_index(
        &self,
        key: &TaxonKey,
        indexer: &dyn BlastIndexer,
        force: bool,
    ) -> Result<bool> {
        let prefix = self.layout.blast_prefix(key);
        let index_marker = prefix.with_file_name(format!("{}.phr", key));
        if !force && index_marker.exists() {
            info!(taxon = %key, "BLAST DB already exists");
            return Ok(false);
        }

        info!(taxon = %key, "Creating BLAST DB");
        fs::create_dir_all(self.layout.blast_dir(key))?;
        indexer.build_index(&self.layout.fasta_path(key), &prefix)?;
        self.link_blast_fasta(key)?;
        Ok(true)
    }

    /// Run the annotation tool over the canonical FASTA, writing into `weight_dir`
    pub fn run_annotation(
        &self,
        key: &TaxonKey,
        annotator: &dyn Annotator,
        workers: usize,
        force: bool,
    ) -> Result<()> {
        let output_dir = self.layout.weight_root();
        fs::create_dir_all(&output_dir)?;
        let request = AnnotationRequest {
            fasta: self.layout.fasta_path(key),
            output_dir,
            workers,
            force,
        };
        info!(taxon = %key, workers, "Annotating");
        annotator.annotate(&request)
    }

    fn link_blast_fasta(&self, key: &TaxonKey) -> Result<()> {
        let link = self.layout.blast_dir(key).join(format!("{}.fa", key));
        if link.symlink_metadata().is_ok() {
            return Ok(());
        }

        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(self.layout.blast_fasta_link_target(key), &link)?;
        }
        #[cfg(not(unix))]
        {
            fs::copy(self.layout.fasta_path(key), &link)?;
        }
        debug!(taxon = %key, link = %link.display(), "Linked FASTA into BLAST dir");
        Ok(())
    }
}

fn write_records<I>(path: &Path, records: I) -> Result<usize>
where
    I: IntoIterator<Item = Result<Sequence>>,
{
    let mut writer = BufWriter::new(File::create(path)?);
    let mut count = 0;
    for record in records {
        write_record(&mut writer, &record?)?;
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}

fn write_checked_marker(path: &Path) -> Result<()> {
    let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.6f").to_string();
    fs::write(path, stamp)?;
    Ok(())
}
