#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use taxon_ingest::bio::taxonomy::{TaxonomyDB, TaxonomyInfo};
use taxon_ingest::tools::{AnnotationRequest, Annotator, BlastIndexer};
use taxon_ingest::{IngestError, Result};
use tempfile::TempDir;

/// Scratch input folder and output root
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub input_dir: PathBuf,
    pub output_root: PathBuf,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let input_dir = temp_dir.path().join("input");
        let output_root = temp_dir.path().join("data");
        fs::create_dir_all(&input_dir).expect("Failed to create input dir");

        TestEnvironment {
            temp_dir,
            input_dir,
            output_root,
        }
    }

    pub fn create_input_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.input_dir.join(name);
        fs::write(&path, content).expect("Failed to write input");
        path
    }

    pub fn create_manifest(&self, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join("mapping.txt");
        fs::write(&path, content).expect("Failed to write manifest");
        path
    }
}

/// Small taxonomy with a few well known species
pub fn test_taxonomy() -> TaxonomyDB {
    let mut db = TaxonomyDB::new();
    for (id, name, rank) in [
        (9606, "Homo sapiens", "species"),
        (10090, "Mus musculus", "species"),
        (562, "Escherichia coli", "species"),
        (9605, "Homo", "genus"),
    ] {
        db.add_taxon(TaxonomyInfo {
            taxon_id: id,
            scientific_name: name.to_string(),
            rank: rank.to_string(),
            parent_id: None,
        });
    }
    db
}

/// Index builder that writes a stub `.phr` file and remembers its calls
#[derive(Default)]
pub struct RecordingIndexer {
    pub calls: Mutex<Vec<(PathBuf, PathBuf)>>,
    pub fail: bool,
}

impl RecordingIndexer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl BlastIndexer for RecordingIndexer {
    fn build_index(&self, fasta: &Path, prefix: &Path) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((fasta.to_path_buf(), prefix.to_path_buf()));
        if self.fail {
            return Err(IngestError::CollaboratorFailure {
                tool: "makeblastdb".to_string(),
                taxon: prefix.file_name().unwrap().to_string_lossy().into_owned(),
                message: "exited with 1".to_string(),
            });
        }
        let mut phr = prefix.as_os_str().to_owned();
        phr.push(".phr");
        fs::write(PathBuf::from(phr), b"index")?;
        Ok(())
    }

    fn verify_installation(&self) -> Result<()> {
        Ok(())
    }
}

/// Annotator that writes `<stem>.json` into the output dir
#[derive(Default)]
pub struct RecordingAnnotator {
    pub requests: Mutex<Vec<AnnotationRequest>>,
}

impl Annotator for RecordingAnnotator {
    fn annotate(&self, request: &AnnotationRequest) -> Result<()> {
        self.requests.lock().unwrap().push(request.clone());
        let stem = request.fasta.file_stem().unwrap().to_string_lossy().into_owned();
        fs::write(request.output_dir.join(format!("{}.json", stem)), b"{}")?;
        Ok(())
    }

    fn verify_installation(&self) -> Result<()> {
        Ok(())
    }
}

pub fn taxon_ingest_cmd() -> Command {
    Command::cargo_bin("taxon-ingest").unwrap()
}
