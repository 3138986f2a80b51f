//! Forced overwrite of an existing taxon record
//!
//! Planning only inspects the filesystem; nothing is removed until
//! [`OverwritePlan::apply`] runs, and each removal is logged before it happens.

use crate::core::identity::TaxonKey;
use crate::core::paths::StoreLayout;
use crate::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Kind of artifact scheduled for deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Genome,
    BlastIndex,
    Annotation,
}

impl ArtifactKind {
    fn label(self) -> &'static str {
        match self {
            ArtifactKind::Genome => "genome record",
            ArtifactKind::BlastIndex => "BLAST index",
            ArtifactKind::Annotation => "annotation",
        }
    }
}

/// One existing path that a forced overwrite removes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRemoval {
    pub kind: ArtifactKind,
    pub path: PathBuf,
}

/// Every existing artifact of one taxon that must go before it is recreated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverwritePlan {
    key: TaxonKey,
    removals: Vec<PlannedRemoval>,
}

impl OverwritePlan {
    /// Inspect the store for artifacts of `key`.
    ///
    /// With `include_blast` false the BLAST directory is left alone; with
    /// `include_annotations` false the weight-store entry is left alone.
    pub fn plan(
        layout: &StoreLayout,
        key: &TaxonKey,
        include_blast: bool,
        include_annotations: bool,
    ) -> Self {
        let mut candidates = vec![(ArtifactKind::Genome, layout.genome_dir(key))];
        if include_blast {
            candidates.push((ArtifactKind::BlastIndex, layout.blast_dir(key)));
        }
        if include_annotations {
            candidates.push((ArtifactKind::Annotation, layout.weight_entry(key)));
            candidates.push((ArtifactKind::Annotation, layout.weight_entry_dir(key)));
        }

        let removals = candidates
            .into_iter()
            .filter(|(_, path)| path.symlink_metadata().is_ok())
            .map(|(kind, path)| PlannedRemoval { kind, path })
            .collect();

        Self {
            key: key.clone(),
            removals,
        }
    }

    pub fn key(&self) -> &TaxonKey {
        &self.key
    }

    pub fn removals(&self) -> &[PlannedRemoval] {
        &self.removals
    }

    pub fn is_empty(&self) -> bool {
        self.removals.is_empty()
    }

    /// Delete every planned path. Paths that vanished since planning are skipped.
    pub fn apply(self) -> Result<usize> {
        let mut removed = 0;
        for removal in &self.removals {
            warn!(
                taxon = %self.key,
                path = %removal.path.display(),
                "Removing existing {}",
                removal.kind.label()
            );
            if remove_path(&removal.path)? {
                removed += 1;
            } else {
                debug!(path = %removal.path.display(), "Already gone");
            }
        }
        Ok(removed)
    }
}

fn remove_path(path: &Path) -> Result<bool> {
    let meta = match path.symlink_metadata() {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    };
    if meta.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn populated_store() -> (TempDir, StoreLayout, TaxonKey) {
        let dir = TempDir::new().unwrap();
        let layout = StoreLayout::new(dir.path());
        let key = TaxonKey::new("HUMAN", 9606, "3");
        fs::create_dir_all(layout.genome_dir(&key)).unwrap();
        fs::write(layout.fasta_path(&key), ">a\nMKV\n").unwrap();
        fs::create_dir_all(layout.blast_dir(&key)).unwrap();
        fs::create_dir_all(layout.weight_root()).unwrap();
        fs::write(layout.weight_entry(&key), "{}").unwrap();
        (dir, layout, key)
    }

    #[test]
    fn test_plan_does_not_mutate() {
        let (_dir, layout, key) = populated_store();
        let plan = OverwritePlan::plan(&layout, &key, true, true);
        assert_eq!(plan.removals().len(), 3);
        assert!(layout.fasta_path(&key).exists());
        assert!(layout.weight_entry(&key).exists());
    }

    #[test]
    fn test_apply_removes_everything_planned() {
        let (_dir, layout, key) = populated_store();
        let removed = OverwritePlan::plan(&layout, &key, true, true).apply().unwrap();
        assert_eq!(removed, 3);
        assert!(!layout.genome_dir(&key).exists());
        assert!(!layout.blast_dir(&key).exists());
        assert!(!layout.weight_entry(&key).exists());
    }

    #[test]
    fn test_annotations_kept_when_excluded() {
        let (_dir, layout, key) = populated_store();
        let plan = OverwritePlan::plan(&layout, &key, false, false);
        assert_eq!(plan.removals().len(), 1);
        assert_eq!(plan.removals()[0].kind, ArtifactKind::Genome);
        plan.apply().unwrap();
        assert!(layout.weight_entry(&key).exists());
        assert!(layout.blast_dir(&key).exists());
    }

    #[test]
    fn test_empty_plan_for_unknown_taxon() {
        let dir = TempDir::new().unwrap();
        let layout = StoreLayout::new(dir.path());
        let plan = OverwritePlan::plan(&layout, &TaxonKey::new("MUSMU", 10090, "1"), true, true);
        assert!(plan.is_empty());
        assert_eq!(plan.apply().unwrap(), 0);
    }
}
