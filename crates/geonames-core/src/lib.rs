// crates/geonames-core/src/lib.rs

//! Hierarchy-aware bulk importer for the GeoNames dumps.
//!
//! The pipeline reads the hierarchy edges into a [`HierarchyTree`] first,
//! then streams gazetteer rows through the [`Materializer`], which persists
//! each entity only once its parent exists.
//!
//! ```no_run
//! use geonames_core::{ImportConfig, Importer, MemoryStore};
//!
//! let mut importer = Importer::new(ImportConfig::default(), MemoryStore::new())?;
//! let summary = importer.run();
//! println!("{summary}");
//! # Ok::<(), geonames_core::GeoNamesError>(())
//! ```

pub mod config;
pub mod error;
pub mod hierarchy;
pub mod import;
pub mod schema;
pub mod snapshot;
pub mod source;
pub mod store;
pub mod text;

// Re-exports
pub use crate::config::{AllowList, DatasetConfig, FeatureClasses, ImportConfig, MemoryMode};
pub use crate::error::{GeoNamesError, HierarchyError, Result, StoreError};
pub use crate::hierarchy::{HierarchyTree, Materializer, NodeState, Submission};
pub use crate::import::{Dataset, DatasetOutcome, DatasetReport, ImportSummary, Importer};
pub use crate::schema::{EntityKind, GeoNameRecord, RowSchema, Schema, TypedRecord};
pub use crate::source::{RawRow, RowSource, SourceRow};
pub use crate::store::{Entity, EntityStore, MemoryStore};
