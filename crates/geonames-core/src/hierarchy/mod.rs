// crates/geonames-core/src/hierarchy/mod.rs

//! # Hierarchy
//!
//! [`HierarchyTree`] is built from the `parent → child` edge list, before any
//! entity data is read. The [`Materializer`] then persists gazetteer records
//! against it, deferring children whose parent does not exist yet.

mod materializer;
mod tree;

pub use materializer::{Materializer, Submission};
pub use tree::{EdgeOutcome, HierarchyTree, NodeState, TreeNode};
