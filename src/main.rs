use clap::Parser;
use colored::*;
use std::process;
use taxon_ingest::cli::commands;
use taxon_ingest::cli::{Cli, Commands};
use taxon_ingest::utils::DeferredLogFile;
use taxon_ingest::IngestError;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    let cli = Cli::parse();

    let log_file = DeferredLogFile::new();
    init_logging(cli.verbose, &log_file);

    if let Err(e) = run(cli, &log_file) {
        eprintln!("{} {}", "Error:".red().bold(), e);

        let exit_code = match e.downcast_ref::<IngestError>() {
            Some(IngestError::Configuration(_)) => 2,
            Some(IngestError::Io(_)) => 3,
            Some(err) if err.is_content_error() => 4,
            Some(IngestError::Collision(_)) => 5,
            _ => 1,
        };
        process::exit(exit_code);
    }
}

fn run(cli: Cli, log_file: &DeferredLogFile) -> anyhow::Result<()> {
    let config_path = cli.config;
    match cli.command {
        Commands::AddTaxon(args) => commands::add_taxon::run(args, config_path.as_deref()),
        Commands::AddTaxa(args) => {
            commands::add_taxa::run(args, config_path.as_deref(), log_file)
        }
    }
}

/// The file layer stays silent until a batch run attaches `<root>/taxon-ingest.log`
fn init_logging(verbose: u8, log_file: &DeferredLogFile) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let log_level =
        std::env::var("TAXON_INGEST_LOG").unwrap_or_else(|_| default_level.to_string());
    let filter = EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new(default_level));

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(log_file.clone());

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
}
