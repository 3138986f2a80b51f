//! Tab-delimited batch manifest
//!
//! ```text
//! # filename<TAB>taxonomyId<TAB>taxonName<TAB>version
//! human.fa	9606	HUMAN	3
//! ecoli.faa.gz	562
//! ```

use crate::core::identity::{parse_taxonomy_id, validate_key_component};
use crate::{IngestError, Result};
use std::fs;
use std::path::Path;

/// One manifest row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// File name relative to the input directory
    pub input_file: String,
    pub taxonomy_id: u32,
    pub name: Option<String>,
    pub version: Option<String>,
    /// 1-based line number, for messages
    pub line: usize,
}

pub fn read_manifest<P: AsRef<Path>>(path: P) -> Result<Vec<ManifestEntry>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(IngestError::Configuration(format!(
            "Manifest {} not found",
            path.display()
        )));
    }
    let contents = fs::read_to_string(path)?;
    parse_manifest(&contents)
}

pub fn parse_manifest(contents: &str) -> Result<Vec<ManifestEntry>> {
    let mut entries = Vec::new();
    for (idx, raw) in contents.lines().enumerate() {
        // any line containing '#' is a comment
        if raw.trim().is_empty() || raw.contains('#') {
            continue;
        }
        entries.push(parse_line(raw, idx + 1)?);
    }
    Ok(entries)
}

fn parse_line(raw: &str, line: usize) -> Result<ManifestEntry> {
    let fields: Vec<&str> = raw.split('\t').map(str::trim).collect();
    let input_file = fields[0];
    if input_file.is_empty() || fields.len() < 2 {
        return Err(IngestError::Configuration(format!(
            "Manifest line {}: expected <filename>\\t<taxonomyId>[\\t<name>[\\t<version>]]",
            line
        )));
    }

    let taxonomy_id = parse_taxonomy_id(fields[1]).map_err(|e| at_line(line, e))?;

    let optional = |i: usize| {
        fields
            .get(i)
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string())
    };
    let name = optional(2);
    let version = optional(3);
    for (kind, value) in [("name", &name), ("version", &version)] {
        if let Some(value) = value {
            validate_key_component(kind, value).map_err(|e| at_line(line, e))?;
        }
    }

    Ok(ManifestEntry {
        input_file: input_file.to_string(),
        taxonomy_id,
        name,
        version,
        line,
    })
}

fn at_line(line: usize, err: IngestError) -> IngestError {
    match err {
        IngestError::Configuration(msg) => {
            IngestError::Configuration(format!("Manifest line {}: {}", line, msg))
        }
        other => other,
    }
}
