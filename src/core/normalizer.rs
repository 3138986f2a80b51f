//! Canonicalization of raw FASTA records
//!
//! Every record coming out of [`Normalizer::normalize`] has a one-token ID
//! without pipes, an ID unique within its file (according to the
//! [`DuplicatePolicy`]) and a residue string made of ASCII letters only.
//! Records are processed lazily; the first failure ends the stream.

use crate::bio::sequence::Sequence;
use crate::{IngestError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;
use tracing::{debug, warn};

/// What to do with non-alphabetic characters in residue strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlphabetPolicy {
    /// Fail the whole file
    #[default]
    Reject,
    /// Substitute `X`
    Replace,
    /// Drop the character
    Delete,
}

impl AlphabetPolicy {
    /// Map the mutually exclusive `--replace` / `--delete` flags to a policy
    pub fn from_flags(replace: bool, delete: bool) -> Result<Self> {
        match (replace, delete) {
            (true, true) => Err(IngestError::Configuration(
                "only one option can be chosen between --replace and --delete".to_string(),
            )),
            (true, false) => Ok(Self::Replace),
            (false, true) => Ok(Self::Delete),
            (false, false) => Ok(Self::Reject),
        }
    }

    fn apply(self, seq: &mut Sequence) -> Result<()> {
        if !seq.has_non_alphabetic() {
            return Ok(());
        }
        match self {
            Self::Reject => {
                return Err(IngestError::InvalidAlphabet { id: seq.id.clone() });
            }
            Self::Replace => {
                seq.residues = seq
                    .residues
                    .chars()
                    .map(|c| if c.is_ascii_alphabetic() { c } else { 'X' })
                    .collect();
            }
            Self::Delete => {
                seq.residues.retain(|c| c.is_ascii_alphabetic());
            }
        }
        Ok(())
    }
}

impl FromStr for AlphabetPolicy {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "replace" => Ok(Self::Replace),
            "delete" => Ok(Self::Delete),
            _ => Err(IngestError::Configuration(format!(
                "Unknown alphabet policy '{}'. Valid options: reject, replace, delete",
                s
            ))),
        }
    }
}

/// What to do when two records of one file end up with the same ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Fail the whole file
    #[default]
    Reject,
    /// Append `_1`, `_2`, ... until the ID is unique
    Suffix,
    /// Write duplicates unchanged
    Keep,
}

impl FromStr for DuplicatePolicy {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "suffix" => Ok(Self::Suffix),
            "keep" => Ok(Self::Keep),
            _ => Err(IngestError::Configuration(format!(
                "Unknown duplicate policy '{}'. Valid options: reject, suffix, keep",
                s
            ))),
        }
    }
}

/// Counters collected while a file is normalized
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeStats {
    pub records: usize,
    pub pipe_rewrites: usize,
    pub sanitized: usize,
    pub renamed_duplicates: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    alphabet: AlphabetPolicy,
    duplicates: DuplicatePolicy,
}

impl Normalizer {
    pub fn new(alphabet: AlphabetPolicy, duplicates: DuplicatePolicy) -> Self {
        Self {
            alphabet,
            duplicates,
        }
    }

    pub fn normalize<I>(&self, records: I) -> NormalizedRecords<I::IntoIter>
    where
        I: IntoIterator<Item = Result<Sequence>>,
    {
        NormalizedRecords {
            inner: records.into_iter(),
            alphabet: self.alphabet,
            duplicates: self.duplicates,
            seen: HashSet::new(),
            stats: NormalizeStats::default(),
            failed: false,
        }
    }
}

/// Lazy stream of canonical records
pub struct NormalizedRecords<I> {
    inner: I,
    alphabet: AlphabetPolicy,
    duplicates: DuplicatePolicy,
    seen: HashSet<String>,
    stats: NormalizeStats,
    failed: bool,
}

impl<I> NormalizedRecords<I> {
    pub fn stats(&self) -> NormalizeStats {
        self.stats
    }

    fn normalize_record(&mut self, mut seq: Sequence) -> Result<Sequence> {
        seq.description = None;

        if seq.id.is_empty() {
            return Err(IngestError::InvalidIdentifier {
                id: seq.id,
                reason: "empty identifier".to_string(),
            });
        }

        if seq.id.contains('|') {
            if self.stats.pipe_rewrites == 0 {
                warn!(id = %seq.id, "Sequence IDs contain pipe(s). They will be replaced by \"_\"");
            }
            seq.id = seq.id.replace('|', "_");
            self.stats.pipe_rewrites += 1;
        }

        if seq.id.chars().any(char::is_whitespace) {
            return Err(IngestError::InvalidIdentifier {
                id: seq.id,
                reason: "sequence IDs must not contain whitespace".to_string(),
            });
        }

        if seq.residues.ends_with('*') {
            seq.residues.pop();
        }

        if seq.has_non_alphabetic() {
            self.alphabet.apply(&mut seq)?;
            self.stats.sanitized += 1;
        }

        self.ensure_unique(&mut seq)?;
        self.stats.records += 1;
        Ok(seq)
    }

    fn ensure_unique(&mut self, seq: &mut Sequence) -> Result<()> {
        if self.seen.insert(seq.id.clone()) {
            return Ok(());
        }
        match self.duplicates {
            DuplicatePolicy::Reject => Err(IngestError::DuplicateIdentifier { id: seq.id.clone() }),
            DuplicatePolicy::Suffix => {
                let mut index = 1;
                let mut candidate = format!("{}_{}", seq.id, index);
                while !self.seen.insert(candidate.clone()) {
                    index += 1;
                    candidate = format!("{}_{}", seq.id, index);
                }
                warn!(id = %seq.id, renamed = %candidate, "Duplicate sequence ID renamed");
                seq.id = candidate;
                self.stats.renamed_duplicates += 1;
                Ok(())
            }
            DuplicatePolicy::Keep => {
                debug!(id = %seq.id, "Keeping duplicate sequence ID");
                Ok(())
            }
        }
    }
}

impl<I> Iterator for NormalizedRecords<I>
where
    I: Iterator<Item = Result<Sequence>>,
{
    type Item = Result<Sequence>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let result = match self.inner.next()? {
            Ok(seq) => self.normalize_record(seq),
            Err(e) => Err(e),
        };
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}
