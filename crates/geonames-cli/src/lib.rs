//! geonames-cli
//! ============
//!
//! Command-line interface for the `geonames-core` importer.
//!
//! This crate primarily provides a binary (`geonames`). We include a small
//! library target so that docs.rs renders a documentation page and shows this
//! overview.
//!
//! Basic usage:
//!
//! ```text
//! geonames --help
//! geonames --data-dir data import --snapshot geonames.bin
//! geonames inspect geonames.bin
//! geonames clean-up
//! ```
//!
//! For programmatic access to the importer, use the [`geonames-core`] crate
//! directly.
#![cfg_attr(docsrs, feature(doc_cfg))]

// This library target intentionally exposes no API; the binary is the primary
// deliverable.
