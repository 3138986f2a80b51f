use crate::tools::traits::{AnnotationRequest, Annotator};
use crate::tools::{locate, run_tool};
use crate::Result;
use std::path::{Path, PathBuf};
use std::process::Command;

/// `fas.doAnno` wrapper writing feature annotations into the weight store
#[derive(Debug, Clone)]
pub struct FasAnnotator {
    binary: PathBuf,
}

impl FasAnnotator {
    pub fn new<P: Into<PathBuf>>(binary: P) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn command(&self, request: &AnnotationRequest) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-i")
            .arg(&request.fasta)
            .arg("-o")
            .arg(&request.output_dir)
            .arg("--cpus")
            .arg(request.workers.max(1).to_string());
        if request.force {
            cmd.arg("--force");
        }
        cmd
    }
}

impl Default for FasAnnotator {
    fn default() -> Self {
        Self::new("fas.doAnno")
    }
}

impl Annotator for FasAnnotator {
    fn annotate(&self, request: &AnnotationRequest) -> Result<()> {
        let taxon = request
            .fasta
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        run_tool("fas.doAnno", &taxon, self.command(request))
    }

    fn verify_installation(&self) -> Result<()> {
        locate(&self.binary.to_string_lossy()).map(|_| ())
    }
}
