use crate::tools::traits::BlastIndexer;
use crate::tools::{locate, run_tool};
use crate::Result;
use std::path::{Path, PathBuf};
use std::process::Command;

/// `makeblastdb` wrapper building protein databases
#[derive(Debug, Clone)]
pub struct MakeBlastDb {
    binary: PathBuf,
}

impl MakeBlastDb {
    /// Use the given binary name or path; resolution through PATH happens
    /// when the command is spawned.
    pub fn new<P: Into<PathBuf>>(binary: P) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn command(&self, fasta: &Path, prefix: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-dbtype")
            .arg("prot")
            .arg("-in")
            .arg(fasta)
            .arg("-out")
            .arg(prefix);
        cmd
    }
}

impl Default for MakeBlastDb {
    fn default() -> Self {
        Self::new("makeblastdb")
    }
}

impl BlastIndexer for MakeBlastDb {
    fn build_index(&self, fasta: &Path, prefix: &Path) -> Result<()> {
        let taxon = prefix
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        run_tool("makeblastdb", &taxon, self.command(fasta, prefix))
    }

    fn verify_installation(&self) -> Result<()> {
        locate(&self.binary.to_string_lossy()).map(|_| ())
    }
}
