pub mod bio;
pub mod cli;
pub mod core;
pub mod storage;
pub mod tools;
pub mod utils;

pub use crate::core::batch::{BatchOptions, BatchOrchestrator, BatchReport};
pub use crate::core::identity::{IdentityResolver, TaxonKey};
pub use crate::core::normalizer::{AlphabetPolicy, DuplicatePolicy, Normalizer};
pub use crate::core::pipeline::{IngestOptions, TaxonOutcome, TaxonPipeline};
pub use crate::storage::record_store::RecordStore;

use thiserror::Error;

/// A manifest entry whose key is already taken, either in the store or by
/// an earlier row of the same manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub file: String,
    pub key: String,
}

fn format_collisions(collisions: &[Collision]) -> String {
    collisions
        .iter()
        .map(|c| format!("{} -> {}", c.file, c.key))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("{} taxa already present (use --force to overwrite): {}", .0.len(), format_collisions(.0))]
    Collision(Vec<Collision>),

    #[error("Invalid sequence identifier '{id}': {reason}")]
    InvalidIdentifier { id: String, reason: String },

    #[error("Sequence {id} contains special characters (use --replace or --delete)")]
    InvalidAlphabet { id: String },

    #[error("Duplicate sequence identifier '{id}'")]
    DuplicateIdentifier { id: String },

    #[error("{tool} failed for {taxon}: {message}")]
    CollaboratorFailure {
        tool: String,
        taxon: String,
        message: String,
    },
}

impl IngestError {
    /// Errors raised by malformed FASTA content. These stop one taxon, never a batch.
    pub fn is_content_error(&self) -> bool {
        matches!(
            self,
            IngestError::Parse(_)
                | IngestError::InvalidIdentifier { .. }
                | IngestError::InvalidAlphabet { .. }
                | IngestError::DuplicateIdentifier { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
