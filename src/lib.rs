//! Workspace facade: re-exports [`geonames_core`] so the importer can be
//! used as `geonames_rs::...` from the root package.
pub use geonames_core::*;
