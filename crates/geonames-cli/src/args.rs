use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the geonames importer
#[derive(Debug, Parser)]
#[command(
    name = "geonames",
    version,
    about = "Hierarchy-aware importer for the GeoNames gazetteer dumps"
)]
pub struct CliArgs {
    /// JSON configuration file (default: built-in settings)
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the downloaded dumps (overrides the config)
    #[arg(short = 'd', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Row reading strategy: low, normal or max
    #[arg(short = 'm', long = "memory-mode", global = true)]
    pub memory_mode: Option<String>,

    /// Log filter, e.g. `info` or `geonames_core=debug` (default: $RUST_LOG, then info)
    #[arg(long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[arg(long = "log-format", global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run every dataset through the importer
    Import {
        /// Write the resulting entity store here
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Write the hierarchy tree here
        #[arg(long = "tree-snapshot")]
        tree_snapshot: Option<PathBuf>,
    },

    /// Summarize an entity store snapshot
    Inspect {
        /// Snapshot written by `import --snapshot`
        snapshot: PathBuf,

        /// Also list entities with this name (case and accent insensitive)
        #[arg(long)]
        find: Option<String>,
    },

    /// Remove the data directory
    CleanUp,
}
