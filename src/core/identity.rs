//! Canonical taxon naming: `NAME@TAXID@VERSION`

use crate::bio::taxonomy::{TaxonomicRank, TaxonomyLookup};
use crate::{IngestError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

/// Canonical identity of one genome record in the store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaxonKey {
    pub name: String,
    pub taxonomy_id: u32,
    pub version: String,
}

impl TaxonKey {
    pub fn new(name: impl Into<String>, taxonomy_id: u32, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            taxonomy_id,
            version: version.into(),
        }
    }
}

impl fmt::Display for TaxonKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}@{}", self.name, self.taxonomy_id, self.version)
    }
}

impl FromStr for TaxonKey {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('@').collect();
        if parts.len() != 3 || parts[0].is_empty() || parts[2].is_empty() {
            return Err(IngestError::Parse(format!(
                "Invalid taxon key '{}'. Expected NAME@TAXID@VERSION",
                s
            )));
        }
        let taxonomy_id = parse_taxonomy_id(parts[1])?;
        Ok(Self::new(parts[0], taxonomy_id, parts[2]))
    }
}

/// Parse a taxonomy ID as given on the command line or in a manifest
pub fn parse_taxonomy_id(raw: &str) -> Result<u32> {
    match raw.trim().parse::<u32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(IngestError::Configuration(format!(
            "Invalid taxonomy ID '{}': expected a positive integer",
            raw.trim()
        ))),
    }
}

/// Reject user-supplied name or version components that would break the key
pub fn validate_key_component(kind: &str, value: &str) -> Result<()> {
    if value
        .chars()
        .any(|c| c == '@' || c == '/' || c == '\\' || c.is_whitespace())
    {
        return Err(IngestError::Configuration(format!(
            "Invalid taxon {} '{}': must not contain '@', path separators or whitespace",
            kind, value
        )));
    }
    Ok(())
}

/// Default proteome version: today's date as YYMMDD
pub fn today_version() -> String {
    chrono::Local::now().format("%y%m%d").to_string()
}

/// Build an acronym from a scientific name: first three letters of the
/// genus token and first two of the species token, uppercased.
pub fn synthesize_name(scientific_name: &str) -> Option<String> {
    let cleaned: String = scientific_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();
    let mut tokens = cleaned.split_whitespace();
    let genus = tokens.next()?;
    let species = tokens.next()?;

    let prefix = |token: &str, n: usize| token.chars().take(n).collect::<String>().to_uppercase();
    Some(format!("{}{}", prefix(genus, 3), prefix(species, 2)))
}

/// Outcome of the advisory rank check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RankCheck {
    Species { name: String },
    OtherRank { rank: String },
    NotFound,
}

/// Turns taxonomy IDs into taxon keys using an explicitly supplied taxonomy
pub struct IdentityResolver<'a> {
    taxonomy: &'a dyn TaxonomyLookup,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(taxonomy: &'a dyn TaxonomyLookup) -> Self {
        Self { taxonomy }
    }

    /// Resolve the canonical key. Never fails: an unknown taxon becomes `UNK<taxid>`.
    pub fn resolve(
        &self,
        taxonomy_id: u32,
        name_override: Option<&str>,
        version_override: Option<&str>,
    ) -> TaxonKey {
        let name = match name_override.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => name.to_uppercase(),
            None => self.taxon_name(taxonomy_id),
        };
        let version = version_override
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or_else(today_version);

        TaxonKey::new(name, taxonomy_id, version)
    }

    /// Acronym for a taxon from the taxonomy, or `UNK<taxid>`
    pub fn taxon_name(&self, taxonomy_id: u32) -> String {
        self.taxonomy
            .lookup_name(taxonomy_id)
            .and_then(|name| synthesize_name(&name))
            .unwrap_or_else(|| format!("UNK{}", taxonomy_id))
    }

    /// Report whether the taxon is a species. Advisory only.
    pub fn validate_rank(&self, taxonomy_id: u32) -> RankCheck {
        match self.taxonomy.lookup_rank(taxonomy_id) {
            None => {
                warn!(taxonomy_id, "Taxonomy ID not found in the taxonomy database");
                RankCheck::NotFound
            }
            Some(rank) if TaxonomicRank::from(rank.as_str()) == TaxonomicRank::Species => {
                let name = self.taxonomy.lookup_name(taxonomy_id).unwrap_or_default();
                info!(taxonomy_id, name = %name, "Taxonomy info");
                RankCheck::Species { name }
            }
            Some(rank) => {
                warn!(taxonomy_id, rank = %rank, "Rank of taxon is not species");
                RankCheck::OtherRank { rank }
            }
        }
    }
}
