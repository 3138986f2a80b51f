//! Configuration file for taxon-ingest

use crate::core::normalizer::{AlphabetPolicy, DuplicatePolicy};
use crate::IngestError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PathsConfig {
    /// Output root holding genome_dir, blast_dir and weight_dir
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// NCBI taxdump directory with names.dmp and nodes.dmp
    #[serde(default)]
    pub taxdump_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolsConfig {
    #[serde(default = "default_makeblastdb")]
    pub makeblastdb: String,
    #[serde(default = "default_annotator")]
    pub annotator: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct IngestConfig {
    /// Annotation workers (0 = available cores - 1)
    #[serde(default)]
    pub cpus: usize,
    #[serde(default)]
    pub alphabet: AlphabetPolicy,
    #[serde(default)]
    pub duplicates: DuplicatePolicy,
}

fn default_makeblastdb() -> String {
    "makeblastdb".to_string()
}

fn default_annotator() -> String {
    "fas.doAnno".to_string()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            makeblastdb: default_makeblastdb(),
            annotator: default_annotator(),
        }
    }
}

impl IngestConfig {
    /// Worker count to hand to the annotation tool
    pub fn effective_cpus(&self) -> usize {
        if self.cpus == 0 {
            num_cpus::get().saturating_sub(1).max(1)
        } else {
            self.cpus
        }
    }
}

pub fn default_config() -> Config {
    Config::default()
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, IngestError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| IngestError::Configuration(format!("Failed to parse config: {}", e)))?;
    Ok(config)
}

/// Load the config if the file exists, otherwise use defaults
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> Result<Config, IngestError> {
    let path = path.as_ref();
    if path.exists() {
        load_config(path)
    } else {
        Ok(default_config())
    }
}

pub fn save_config<P: AsRef<Path>>(path: P, config: &Config) -> Result<(), IngestError> {
    let contents = toml::to_string_pretty(config)
        .map_err(|e| IngestError::Configuration(format!("Failed to serialize config: {}", e)))?;
    std::fs::write(path, contents)?;
    Ok(())
}
