use crate::core::identity::TaxonKey;
use std::path::{Path, PathBuf};

pub const GENOME_DIR: &str = "genome_dir";
pub const BLAST_DIR: &str = "blast_dir";
pub const WEIGHT_DIR: &str = "weight_dir";
pub const CHECKED_SUFFIX: &str = ".checked";
pub const LOG_FILE: &str = "taxon-ingest.log";

/// Get the taxon-ingest home directory
/// Checks TAXON_INGEST_HOME environment variable, falls back to ${HOME}/.taxon-ingest
pub fn ingest_home() -> PathBuf {
    if let Ok(path) = std::env::var("TAXON_INGEST_HOME") {
        return PathBuf::from(path);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".taxon-ingest")
}

/// Default location of the configuration file
pub fn default_config_path() -> PathBuf {
    ingest_home().join("config.toml")
}

/// Data directory from TAXON_INGEST_DATA_DIR, if set
pub fn data_dir_from_env() -> Option<PathBuf> {
    std::env::var("TAXON_INGEST_DATA_DIR")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
}

/// Directory layout of one output root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    root: PathBuf,
}

impl StoreLayout {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn genome_root(&self) -> PathBuf {
        self.root.join(GENOME_DIR)
    }

    pub fn blast_root(&self) -> PathBuf {
        self.root.join(BLAST_DIR)
    }

    pub fn weight_root(&self) -> PathBuf {
        self.root.join(WEIGHT_DIR)
    }

    /// `genome_dir/<KEY>`
    pub fn genome_dir(&self, key: &TaxonKey) -> PathBuf {
        self.genome_root().join(key.to_string())
    }

    /// `genome_dir/<KEY>/<KEY>.fa`
    pub fn fasta_path(&self, key: &TaxonKey) -> PathBuf {
        self.genome_dir(key).join(format!("{}.fa", key))
    }

    /// `genome_dir/<KEY>/<KEY>.fa.checked`
    pub fn checked_marker(&self, key: &TaxonKey) -> PathBuf {
        self.genome_dir(key).join(format!("{}.fa{}", key, CHECKED_SUFFIX))
    }

    /// `blast_dir/<KEY>`
    pub fn blast_dir(&self, key: &TaxonKey) -> PathBuf {
        self.blast_root().join(key.to_string())
    }

    /// Prefix handed to the index builder: `blast_dir/<KEY>/<KEY>`
    pub fn blast_prefix(&self, key: &TaxonKey) -> PathBuf {
        self.blast_dir(key).join(key.to_string())
    }

    /// Annotation JSON written by the annotation tool: `weight_dir/<KEY>.json`
    pub fn weight_entry(&self, key: &TaxonKey) -> PathBuf {
        self.weight_root().join(format!("{}.json", key))
    }

    /// Per-taxon scratch directory some annotation runs leave in `weight_dir`
    pub fn weight_entry_dir(&self, key: &TaxonKey) -> PathBuf {
        self.weight_root().join(key.to_string())
    }

    /// Relative link target from the BLAST directory back to the canonical FASTA
    pub fn blast_fasta_link_target(&self, key: &TaxonKey) -> PathBuf {
        Path::new("..")
            .join("..")
            .join(GENOME_DIR)
            .join(key.to_string())
            .join(format!("{}.fa", key))
    }

    pub fn log_file(&self) -> PathBuf {
        self.root.join(LOG_FILE)
    }
}
