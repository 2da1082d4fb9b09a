//! Basic usage example for geonames-rs
//!
//! This example demonstrates how to:
//! - Configure an import against a local dump directory
//! - Run every dataset through the importer
//! - Walk the resulting entity tree
//!
//! Run with the GeoNames dumps below `./data`:
//! `cargo run --example basic_import -- data`

use geonames_rs::{EntityKind, FeatureClasses, ImportConfig, Importer, MemoryMode, MemoryStore, Result};

fn main() -> Result<()> {
    let data_dir = std::env::args().nth(1).unwrap_or_else(|| "data".to_owned());
    println!("=== GeoNames-RS Basic Import ===\n");

    let config = ImportConfig {
        data_dir: data_dir.into(),
        memory_mode: MemoryMode::Normal,
        ..ImportConfig::default()
    };
    let mut importer = Importer::new(config, MemoryStore::new())?;
    let summary = importer.run();
    println!("{summary}\n");

    let (_, store) = importer.into_parts();
    let classes = FeatureClasses::default();

    println!("--- Countries and their regions ---");
    for country in store.of_kind(EntityKind::Country, &classes) {
        let regions = store
            .children(country.id)
            .into_iter()
            .filter(|e| e.kind(&classes) == EntityKind::Region)
            .count();
        println!("{} ({regions} regions)", country.record.name);
    }

    if let Some(city) = store.of_kind(EntityKind::City, &classes).first() {
        let trail: Vec<&str> = store
            .ancestors(city.id)
            .iter()
            .map(|e| e.record.asciiname.as_str())
            .collect();
        println!("\n{} lies in {}", city.record.asciiname, trail.join(" > "));
    }
    Ok(())
}
