use serde::{Deserialize, Serialize};

/// One FASTA record. `description` holds whatever followed the first
/// whitespace of the header line; it is never written to the canonical store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sequence {
    pub id: String,
    pub description: Option<String>,
    pub residues: String,
}

impl Sequence {
    pub fn new(id: impl Into<String>, residues: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: None,
            residues: residues.into(),
        }
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    /// Header line as written to the canonical FASTA (ID only).
    pub fn header(&self) -> String {
        format!(">{}", self.id)
    }

    pub fn has_non_alphabetic(&self) -> bool {
        self.residues.chars().any(|c| !c.is_ascii_alphabetic())
    }
}
