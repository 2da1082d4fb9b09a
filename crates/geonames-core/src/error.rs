// crates/geonames-core/src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, GeoNamesError>;

/// Errors raised by the importer.
///
/// Per-field validation failures are *not* represented here: they are
/// collected by the schemas as [`crate::schema::FieldErrors`] and only ever
/// counted by the orchestrator.
#[derive(Debug, Error)]
pub enum GeoNamesError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "archive")]
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[cfg(feature = "json")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("Source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Corrupt hierarchy: {0}")]
    Hierarchy(#[from] HierarchyError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Structural corruption of the hierarchy edge list. Fatal for the
/// hierarchy pass that raised it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyError {
    #[error("cannot attach {child}: parent {parent} is not in the tree")]
    MissingParent { child: i64, parent: i64 },

    #[error("root id {0} cannot be attached as a child")]
    RootAsChild(i64),

    #[error("node {0} is not in the tree")]
    UnknownNode(i64),
}

/// Failures reported by an [`crate::store::EntityStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("entity {0} already exists")]
    DuplicateEntity(i64),

    #[error("parent entity {parent} of {id} does not exist")]
    MissingParentEntity { id: i64, parent: i64 },

    #[error("too many children under one path prefix")]
    PathOverflow,
}
