use super::{load_config, CommonArgs, IngestContext};
use crate::cli::output::{action, section_header, success, tree, warning};
use crate::core::identity::{parse_taxonomy_id, validate_key_component};
use crate::core::pipeline::{StageStatus, TaxonOutcome, TaxonPipeline};
use clap::Args;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct AddTaxonArgs {
    /// Input FASTA file (optionally gzip-compressed)
    #[arg(short = 'f', long, value_name = "FILE")]
    pub fasta: PathBuf,

    /// NCBI taxonomy ID
    #[arg(short = 'i', long, value_name = "TAXID")]
    pub taxid: String,

    /// Taxon name (default: derived from the scientific name, e.g. HOMSA)
    #[arg(short = 'n', long)]
    pub name: Option<String>,

    /// Proteome version (default: today as YYMMDD)
    #[arg(long = "prot-version", value_name = "VERSION")]
    pub prot_version: Option<String>,

    #[command(flatten)]
    pub common: CommonArgs,
}

pub fn run(args: AddTaxonArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let ctx = IngestContext::build(&config, &args.common)?;

    let taxonomy_id = parse_taxonomy_id(&args.taxid)?;
    if let Some(name) = &args.name {
        validate_key_component("name", name)?;
    }
    if let Some(version) = &args.prot_version {
        validate_key_component("version", version)?;
    }

    action(&format!("Adding {}", args.fasta.display()));
    let pipeline = TaxonPipeline::new(&ctx.store, &ctx.taxonomy, &ctx.indexer, &ctx.annotator);
    let outcome = pipeline.run(
        &args.fasta,
        taxonomy_id,
        args.name.as_deref(),
        args.prot_version.as_deref(),
        &ctx.options,
    )?;

    print_outcome(&outcome, ctx.store.root());
    Ok(())
}

pub(crate) fn stage_label(status: &StageStatus) -> String {
    match status {
        StageStatus::NotRequested => "not requested".to_string(),
        StageStatus::Skipped => "already present".to_string(),
        StageStatus::Completed => "done".to_string(),
        StageStatus::Failed { message } => format!("failed ({})", message),
    }
}

fn print_outcome(outcome: &TaxonOutcome, root: &Path) {
    section_header(&outcome.key.to_string());
    let fasta_state = if outcome.written {
        format!("{} sequences written", outcome.stats.records)
    } else {
        "already exists".to_string()
    };
    tree(&[
        ("FASTA", fasta_state),
        ("BLAST DB", stage_label(&outcome.blast)),
        ("Annotation", stage_label(&outcome.annotation)),
    ]);

    if outcome.has_failures() {
        warning(&format!(
            "{} was added but not every step succeeded",
            outcome.key
        ));
    } else {
        success(&format!(
            "Output for {} can be found in {}",
            outcome.key,
            root.display()
        ));
    }
}
