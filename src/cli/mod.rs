pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "taxon-ingest",
    version,
    about = "Register genome FASTA files as canonically named taxa in a shared data store",
    long_about = "taxon-ingest normalizes per-species protein FASTA files and stores each one \
                  under a NAME@TAXID@VERSION key in genome_dir, optionally building a BLAST \
                  database and running the feature annotation tool for it."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (default: $TAXON_INGEST_HOME/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add one taxon from a FASTA file
    AddTaxon(commands::add_taxon::AddTaxonArgs),

    /// Add every taxon listed in a mapping file
    AddTaxa(commands::add_taxa::AddTaxaArgs),
}
