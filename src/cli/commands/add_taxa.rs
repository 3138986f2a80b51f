use super::add_taxon::stage_label;
use super::{load_config, CommonArgs, IngestContext};
use crate::cli::output::{action, error, info, section_header, success, tree_item, warning};
use crate::core::batch::{BatchOptions, BatchOrchestrator, BatchReport, EntryStatus};
use crate::utils::DeferredLogFile;
use clap::Args;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct AddTaxaArgs {
    /// Folder containing the input FASTA files
    #[arg(short = 'i', long, value_name = "DIR")]
    pub input: PathBuf,

    /// Tab-delimited mapping file: filename, taxonomy ID, [name], [version]
    #[arg(short = 'm', long, value_name = "FILE")]
    pub mapping: PathBuf,

    /// Write a JSON report of the run
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

pub fn run(
    args: AddTaxaArgs,
    config_path: Option<&Path>,
    log_file: &DeferredLogFile,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let ctx = IngestContext::build(&config, &args.common)?;
    log_file.attach(&ctx.store.layout().log_file())?;

    let options = BatchOptions {
        ingest: ctx.options.clone(),
        show_progress: !args.no_progress,
    };

    action(&format!(
        "Adding taxa from {} into {}",
        args.mapping.display(),
        ctx.store.root().display()
    ));
    let orchestrator =
        BatchOrchestrator::new(&ctx.store, &ctx.taxonomy, &ctx.indexer, &ctx.annotator);
    let report = orchestrator.run(&args.mapping, &args.input, &options)?;

    if let Some(path) = &args.report {
        report.write_json(path)?;
        info(&format!("Report written to {}", path.display()));
    }

    print_report(&report);
    Ok(())
}

fn print_report(report: &BatchReport) {
    section_header("Summary");
    for key in &report.overwritten {
        warning(&format!("{} was overwritten", key));
    }

    for (i, entry) in report.entries.iter().enumerate() {
        let is_last = i + 1 == report.entries.len();
        let label = match &entry.key {
            Some(key) => format!("{} ({})", entry.file, key),
            None => entry.file.clone(),
        };
        let value = match &entry.status {
            EntryStatus::Succeeded { outcome } => format!(
                "ok, BLAST DB {}, annotation {}",
                stage_label(&outcome.blast),
                stage_label(&outcome.annotation)
            ),
            EntryStatus::Skipped { reason } => format!("skipped: {}", reason),
            EntryStatus::Failed { error } => format!("failed: {}", error),
        };
        tree_item(is_last, &label, Some(&value));
    }

    let summary = format!(
        "{} added, {} skipped, {} failed",
        report.succeeded, report.skipped, report.failed
    );
    if report.has_failures() {
        error(&summary);
    } else {
        success(&summary);
    }
    info(&format!(
        "Output can be found in {} within genome_dir [and blast_dir, weight_dir]",
        report.output_root.display()
    ));
}
