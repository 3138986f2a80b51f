pub mod add_taxa;
pub mod add_taxon;

use crate::bio::taxonomy::TaxonomyDB;
use crate::core::config::{self, Config};
use crate::core::normalizer::{AlphabetPolicy, DuplicatePolicy};
use crate::core::paths;
use crate::core::pipeline::IngestOptions;
use crate::storage::record_store::RecordStore;
use crate::tools::{Annotator, BlastIndexer, FasAnnotator, MakeBlastDb};
use crate::{IngestError, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Options shared by `add-taxon` and `add-taxa`
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Output root holding genome_dir, blast_dir and weight_dir
    #[arg(short = 'o', long = "out-path", value_name = "DIR")]
    pub out_path: Option<PathBuf>,

    /// Build a BLAST database (needed for core taxa)
    #[arg(short = 'c', long)]
    pub core_taxa: bool,

    /// Do not annotate with fas.doAnno
    #[arg(short = 'a', long)]
    pub no_anno: bool,

    /// Annotation workers (default: available cores - 1)
    #[arg(long, value_name = "N")]
    pub cpus: Option<usize>,

    /// Replace non-alphabetic residues with X
    #[arg(long)]
    pub replace: bool,

    /// Delete non-alphabetic residues
    #[arg(long)]
    pub delete: bool,

    /// Handling of repeated sequence IDs: reject, suffix, keep
    #[arg(long, value_name = "POLICY")]
    pub duplicates: Option<DuplicatePolicy>,

    /// Overwrite taxa that already exist
    #[arg(long)]
    pub force: bool,

    /// NCBI taxdump directory with names.dmp and nodes.dmp
    #[arg(long, value_name = "DIR")]
    pub taxdump: Option<PathBuf>,
}

/// Load the config named on the command line, or the default one if present
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            if !path.is_file() {
                return Err(IngestError::Configuration(format!(
                    "Config file {} not found",
                    path.display()
                )));
            }
            config::load_config(path)
        }
        None => config::load_config_or_default(paths::default_config_path()),
    }
}

/// `--out-path`, then TAXON_INGEST_DATA_DIR, then `paths.data_dir`
pub fn resolve_output_root(flag: Option<&Path>, config: &Config) -> Result<PathBuf> {
    flag.map(Path::to_path_buf)
        .or_else(paths::data_dir_from_env)
        .or_else(|| config.paths.data_dir.clone())
        .ok_or_else(|| {
            IngestError::Configuration(
                "No output path given. Use --out-path, TAXON_INGEST_DATA_DIR or paths.data_dir in the config"
                    .to_string(),
            )
        })
}

/// Load the NCBI taxonomy; without a dump every name falls back to UNK<taxid>
pub fn load_taxonomy(dir: Option<&Path>) -> Result<TaxonomyDB> {
    let Some(dir) = dir else {
        warn!("No taxonomy dump configured; taxon names default to UNK<taxid>");
        return Ok(TaxonomyDB::new());
    };
    if !dir.join("names.dmp").is_file() || !dir.join("nodes.dmp").is_file() {
        warn!(dir = %dir.display(), "names.dmp/nodes.dmp not found; taxon names default to UNK<taxid>");
        return Ok(TaxonomyDB::new());
    }
    let db = TaxonomyDB::load_ncbi_dump(dir)?;
    info!(taxa = db.taxa_count(), "Loaded taxonomy");
    Ok(db)
}

/// Everything a command needs, built once per invocation
pub struct IngestContext {
    pub store: RecordStore,
    pub taxonomy: TaxonomyDB,
    pub indexer: MakeBlastDb,
    pub annotator: FasAnnotator,
    pub options: IngestOptions,
}

impl IngestContext {
    pub fn build(config: &Config, args: &CommonArgs) -> Result<Self> {
        let alphabet = if args.replace || args.delete {
            AlphabetPolicy::from_flags(args.replace, args.delete)?
        } else {
            config.ingest.alphabet
        };

        let root = resolve_output_root(args.out_path.as_deref(), config)?;
        let store = RecordStore::new(&root).with_annotation_purge(!args.no_anno);

        let taxdump = args.taxdump.as_ref().or(config.paths.taxdump_dir.as_ref());
        let taxonomy = load_taxonomy(taxdump.map(PathBuf::as_path))?;

        let indexer = MakeBlastDb::new(&config.tools.makeblastdb);
        if args.core_taxa {
            if let Err(e) = indexer.verify_installation() {
                warn!("{}; BLAST databases will not be built", e);
            }
        }

        let annotator = FasAnnotator::new(&config.tools.annotator);
        if !args.no_anno {
            if let Err(e) = annotator.verify_installation() {
                warn!("{}; annotation will fail for every taxon", e);
            }
        }

        let options = IngestOptions {
            alphabet,
            duplicates: args.duplicates.unwrap_or(config.ingest.duplicates),
            core_taxa: args.core_taxa,
            annotate: !args.no_anno,
            cpus: args.cpus.filter(|&n| n > 0).unwrap_or_else(|| config.ingest.effective_cpus()),
            force: args.force,
            check_rank: true,
        };

        Ok(Self {
            store,
            taxonomy,
            indexer,
            annotator,
            options,
        })
    }
}
