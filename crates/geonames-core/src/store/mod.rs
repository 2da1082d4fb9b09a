// crates/geonames-core/src/store/mod.rs

//! # Persistence Collaborator
//!
//! The materializer only needs three operations from storage, captured by
//! [`EntityStore`]. [`MemoryStore`] is the bundled materialized-path
//! implementation.

mod memory;

pub use memory::{Entity, MemoryStore, PATH_ALPHABET, STEP_LEN};

use crate::error::StoreError;
use crate::schema::GeoNameRecord;
use std::fmt::Debug;

/// Storage seen by the deferred materializer.
pub trait EntityStore {
    /// Handle to a persisted entity.
    type Ref: Clone + Debug;

    /// Persist `id` as a top-level entity.
    fn create_root_entity(&mut self, id: i64, record: &GeoNameRecord) -> Result<Self::Ref, StoreError>;

    /// Persist `id` under an already persisted entity.
    fn create_child_entity(
        &mut self,
        parent: &Self::Ref,
        id: i64,
        record: &GeoNameRecord,
    ) -> Result<Self::Ref, StoreError>;

    fn find_entity(&self, id: i64) -> Option<Self::Ref>;
}
