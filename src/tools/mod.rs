//! Wrappers around the external tools invoked after a taxon is materialized

pub mod annotation;
pub mod blast;
pub mod traits;

pub use annotation::FasAnnotator;
pub use blast::MakeBlastDb;
pub use traits::{AnnotationRequest, Annotator, BlastIndexer};

use crate::{IngestError, Result};
use std::process::Command;
use tracing::debug;

/// Number of stderr lines kept in a failure message
const STDERR_TAIL_LINES: usize = 5;

/// Run a tool to completion, turning spawn failures and non-zero exits into
/// `CollaboratorFailure`.
pub(crate) fn run_tool(tool: &str, taxon: &str, mut cmd: Command) -> Result<()> {
    debug!(tool, command = ?cmd, "Running external tool");

    let output = cmd.output().map_err(|e| IngestError::CollaboratorFailure {
        tool: tool.to_string(),
        taxon: taxon.to_string(),
        message: format!("could not start: {}", e),
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.trim().is_empty() {
        debug!(tool, "{}", stdout.trim_end());
    }

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let lines: Vec<&str> = stderr.lines().collect();
    let tail = lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n");
    Err(IngestError::CollaboratorFailure {
        tool: tool.to_string(),
        taxon: taxon.to_string(),
        message: if tail.is_empty() {
            format!("exited with {}", output.status)
        } else {
            format!("exited with {}: {}", output.status, tail)
        },
    })
}

/// Check that a binary can be found on PATH (or at the given path)
pub(crate) fn locate(tool: &str) -> Result<std::path::PathBuf> {
    which::which(tool).map_err(|_| {
        IngestError::Configuration(format!("{} not found in PATH", tool))
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_successful_tool() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("echo done");
        assert!(run_tool("sh", "HUMAN@9606@1", cmd).is_ok());
    }

    #[test]
    fn test_failing_tool_reports_stderr_tail() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("echo first >&2; echo broken index >&2; exit 3");
        let err = run_tool("makeblastdb", "HUMAN@9606@1", cmd).unwrap_err();
        match err {
            IngestError::CollaboratorFailure { tool, taxon, message } => {
                assert_eq!(tool, "makeblastdb");
                assert_eq!(taxon, "HUMAN@9606@1");
                assert!(message.contains("broken index"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_binary() {
        let cmd = Command::new("/nonexistent/definitely-not-a-tool");
        let err = run_tool("ghost", "X@1@1", cmd).unwrap_err();
        assert!(matches!(err, IngestError::CollaboratorFailure { .. }));
        assert!(locate("/nonexistent/definitely-not-a-tool").is_err());
    }
}
