//! geonames: command-line interface for geonames-core
//!
//! Imports a local copy of the GeoNames dumps into an in-memory,
//! hierarchy-aware entity store and optionally writes it to disk.
//!
//! Usage examples
//! --------------
//!
//! - Import everything below `./data`, keeping memory use low
//!   $ geonames --data-dir data import --snapshot geonames.bin
//!
//! - Same, reading each file fully into memory, with debug logs as JSON
//!   $ geonames -m max --log-level debug --log-format json import
//!
//! - Count the entities of a snapshot per kind, and look one up by name
//!   $ geonames inspect geonames.bin
//!   $ geonames inspect geonames.bin --find moskva
//!
//! - Remove the downloaded dumps
//!   $ geonames --data-dir data clean-up
//!
//! Downloading the dumps is not part of this tool; fetch them from
//! <https://download.geonames.org/export/> into the data directory.
mod args;

use crate::args::{CliArgs, Commands, LogFormat};
use anyhow::Context;
use clap::Parser;
use geonames_core::{EntityKind, ImportConfig, Importer, MemoryMode, MemoryStore};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    init_logging(args.log_level.as_deref(), args.log_format);

    let config = load_config(&args)?;

    match args.command {
        Commands::Import {
            snapshot,
            tree_snapshot,
        } => {
            let mut importer = Importer::new(config, MemoryStore::new())?;
            let summary = importer.run();
            println!("{summary}");

            let (tree, store) = importer.into_parts();
            if let Some(path) = tree_snapshot {
                tree.save(&path)
                    .with_context(|| format!("writing tree snapshot {}", path.display()))?;
                info!("Tree snapshot written to {}", path.display());
            }
            if let Some(path) = snapshot {
                store
                    .save(&path)
                    .with_context(|| format!("writing store snapshot {}", path.display()))?;
                info!("Store snapshot written to {}", path.display());
            }
        }

        Commands::Inspect { snapshot, find } => {
            let store = MemoryStore::load(&snapshot)
                .with_context(|| format!("reading store snapshot {}", snapshot.display()))?;
            println!("Entity store {}:", snapshot.display());
            println!("  Entities: {}", store.len());
            for kind in EntityKind::ALL {
                println!(
                    "  {kind}: {}",
                    store.of_kind(kind, &config.feature_classes).len()
                );
            }
            println!("  Max depth: {}", store.max_depth());

            if let Some(name) = find {
                let matches = store.find_by_name(&name);
                if matches.is_empty() {
                    println!("No entities found matching: {name}");
                }
                for entity in matches {
                    let trail: Vec<&str> = store
                        .ancestors(entity.id)
                        .iter()
                        .map(|e| e.record.name.as_str())
                        .collect();
                    println!(
                        "{} [{}] {} - {}",
                        entity.id,
                        entity.kind(&config.feature_classes),
                        entity.record.name,
                        trail.join(" > ")
                    );
                }
            }
        }

        Commands::CleanUp => {
            if config.data_dir.exists() {
                std::fs::remove_dir_all(&config.data_dir).with_context(|| {
                    format!("removing data directory {}", config.data_dir.display())
                })?;
                info!("Removed {}", config.data_dir.display());
            } else {
                error!("Data directory {} does not exist", config.data_dir.display());
            }
        }
    }

    Ok(())
}

fn init_logging(level: Option<&str>, format: LogFormat) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    // A second init (tests, embedding) is not an error worth failing on.
    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

fn load_config(args: &CliArgs) -> anyhow::Result<ImportConfig> {
    let mut config = match &args.config {
        #[cfg(feature = "json")]
        Some(path) => ImportConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        #[cfg(not(feature = "json"))]
        Some(path) => anyhow::bail!(
            "cannot read {}: built without the `json` feature",
            path.display()
        ),
        None => ImportConfig::default(),
    };

    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(mode) = &args.memory_mode {
        config.memory_mode = mode.parse::<MemoryMode>()?;
    }
    config.validate()?;
    Ok(config)
}
