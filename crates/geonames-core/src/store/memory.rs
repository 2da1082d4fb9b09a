// crates/geonames-core/src/store/memory.rs
use super::EntityStore;
use crate::config::FeatureClasses;
use crate::error::{Result, StoreError};
use crate::schema::{EntityKind, GeoNameRecord};
use crate::snapshot::{read_snapshot, write_snapshot, CompressionMode};
use crate::text::{equals_folded, fold_key};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Characters of one path step, in sort order.
pub const PATH_ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
/// Characters per tree level.
pub const STEP_LEN: usize = 4;

const MAX_SIBLINGS: u64 = 36u64.pow(STEP_LEN as u32) - 1;

/// A persisted gazetteer entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: i64,
    pub parent: Option<i64>,
    /// Materialized path: one [`STEP_LEN`] step per ancestor, then its own.
    pub path: String,
    pub record: GeoNameRecord,
    numchild: u64,
}

impl Entity {
    /// 1 for top-level entities.
    pub fn depth(&self) -> usize {
        self.path.len() / STEP_LEN
    }

    pub fn kind(&self, classes: &FeatureClasses) -> EntityKind {
        classes.kind_of(self.record.feature_code.as_deref())
    }

    pub fn child_count(&self) -> u64 {
        self.numchild
    }
}

/// Encodes the `n`-th sibling (1-based) as one path step.
fn step(n: u64) -> std::result::Result<String, StoreError> {
    if n == 0 || n > MAX_SIBLINGS {
        return Err(StoreError::PathOverflow);
    }
    let mut out = [b'0'; STEP_LEN];
    let mut rest = n;
    for slot in out.iter_mut().rev() {
        *slot = PATH_ALPHABET[(rest % 36) as usize];
        rest /= 36;
    }
    Ok(out.iter().map(|&b| b as char).collect())
}

/// In-memory materialized-path entity store.
///
/// Entities are addressed by id or by path; ancestors are found from path
/// prefixes without walking parent pointers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStore {
    entities: HashMap<i64, Entity>,
    by_path: HashMap<String, i64>,
    root_count: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn by_path(&self, path: &str) -> Option<&Entity> {
        self.by_path.get(path).and_then(|id| self.entities.get(id))
    }

    /// Top-level entities, in creation order.
    pub fn roots(&self) -> Vec<&Entity> {
        self.sorted(self.entities.values().filter(|e| e.parent.is_none()))
    }

    /// Direct children of `id`, in creation order.
    pub fn children(&self, id: i64) -> Vec<&Entity> {
        self.sorted(self.entities.values().filter(|e| e.parent == Some(id)))
    }

    /// Ancestors of `id`, outermost first.
    pub fn ancestors(&self, id: i64) -> Vec<&Entity> {
        let Some(entity) = self.entities.get(&id) else {
            return Vec::new();
        };
        (1..entity.depth())
            .filter_map(|level| self.by_path(&entity.path[..level * STEP_LEN]))
            .collect()
    }

    /// Every entity below `id`, in path order.
    pub fn descendants(&self, id: i64) -> Vec<&Entity> {
        let Some(entity) = self.entities.get(&id) else {
            return Vec::new();
        };
        self.sorted(
            self.entities
                .values()
                .filter(|e| e.path.len() > entity.path.len() && e.path.starts_with(&entity.path)),
        )
    }

    /// Entities classified as `kind`, in path order.
    pub fn of_kind(&self, kind: EntityKind, classes: &FeatureClasses) -> Vec<&Entity> {
        self.sorted(self.entities.values().filter(|e| e.kind(classes) == kind))
    }

    /// Entities whose name, ASCII name or one of the alternate names equals
    /// `name` after Unicode folding, in path order.
    pub fn find_by_name(&self, name: &str) -> Vec<&Entity> {
        let key = fold_key(name);
        self.sorted(self.entities.values().filter(|e| {
            let r = &e.record;
            equals_folded(&r.name, name)
                || fold_key(&r.asciiname) == key
                || r.alternatenames.iter().any(|alt| fold_key(alt) == key)
        }))
    }

    pub fn max_depth(&self) -> usize {
        self.entities.values().map(Entity::depth).max().unwrap_or(0)
    }

    fn sorted<'a>(&'a self, it: impl Iterator<Item = &'a Entity>) -> Vec<&'a Entity> {
        let mut v: Vec<_> = it.collect();
        v.sort_by(|a, b| a.path.cmp(&b.path));
        v
    }

    fn insert(&mut self, id: i64, parent: Option<i64>, path: String, record: &GeoNameRecord) {
        self.by_path.insert(path.clone(), id);
        self.entities.insert(
            id,
            Entity {
                id,
                parent,
                path,
                record: record.clone(),
                numchild: 0,
            },
        );
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write_snapshot(path.as_ref(), self, CompressionMode::default())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        read_snapshot(path.as_ref(), CompressionMode::default())
    }
}

impl EntityStore for MemoryStore {
    type Ref = i64;

    fn create_root_entity(&mut self, id: i64, record: &GeoNameRecord) -> std::result::Result<i64, StoreError> {
        if self.entities.contains_key(&id) {
            return Err(StoreError::DuplicateEntity(id));
        }
        let path = step(self.root_count + 1)?;
        self.root_count += 1;
        self.insert(id, None, path, record);
        Ok(id)
    }

    fn create_child_entity(
        &mut self,
        parent: &i64,
        id: i64,
        record: &GeoNameRecord,
    ) -> std::result::Result<i64, StoreError> {
        if self.entities.contains_key(&id) {
            return Err(StoreError::DuplicateEntity(id));
        }
        let parent_entity = self
            .entities
            .get_mut(parent)
            .ok_or(StoreError::MissingParentEntity {
                id,
                parent: *parent,
            })?;
        let path = format!("{}{}", parent_entity.path, step(parent_entity.numchild + 1)?);
        parent_entity.numchild += 1;
        self.insert(id, Some(*parent), path, record);
        Ok(id)
    }

    fn find_entity(&self, id: i64) -> Option<i64> {
        self.entities.contains_key(&id).then_some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RowSchema;
    use crate::source::RawRow;

    fn record(id: i64, code: &str) -> GeoNameRecord {
        GeoNameRecord::from_row(&RawRow::from_pairs([
            ("geonameid", id.to_string()),
            ("name", format!("place {id}")),
            ("feature_class", "A".to_owned()),
            ("feature_code", code.to_owned()),
            ("country_code", "RU".to_owned()),
        ]))
        .unwrap()
    }

    #[test]
    fn steps_are_base36() {
        assert_eq!(step(1).unwrap(), "0001");
        assert_eq!(step(36).unwrap(), "0010");
        assert_eq!(step(MAX_SIBLINGS).unwrap(), "ZZZZ");
        assert_eq!(step(MAX_SIBLINGS + 1), Err(StoreError::PathOverflow));
    }

    #[test]
    fn builds_materialized_paths() {
        let mut store = MemoryStore::new();
        let eu = store.create_root_entity(6255148, &record(6255148, "CONT")).unwrap();
        let ru = store.create_child_entity(&eu, 2017370, &record(2017370, "PCLF")).unwrap();
        let msk = store.create_child_entity(&ru, 524894, &record(524894, "ADM1")).unwrap();
        let city = store.create_child_entity(&msk, 524901, &record(524901, "PPLC")).unwrap();
        store.create_child_entity(&ru, 1, &record(1, "ADM1")).unwrap();

        assert_eq!(store.get(city).unwrap().path, "0001000100010001");
        assert_eq!(store.get(1).unwrap().path, "000100010002");
        assert_eq!(store.get(city).unwrap().depth(), 4);
        assert_eq!(
            store.ancestors(city).iter().map(|e| e.id).collect::<Vec<_>>(),
            vec![6255148, 2017370, 524894]
        );
        assert_eq!(store.children(ru).len(), 2);
        assert_eq!(store.descendants(ru).len(), 3);
        assert_eq!(store.max_depth(), 4);

        assert_eq!(store.find_by_name("PLACE 524901")[0].id, city);
        assert!(store.find_by_name("nowhere").is_empty());

        let classes = FeatureClasses::default();
        assert_eq!(store.of_kind(EntityKind::Region, &classes).len(), 2);
        assert_eq!(store.of_kind(EntityKind::City, &classes)[0].id, city);
    }

    #[test]
    fn refuses_duplicates_and_unknown_parents() {
        let mut store = MemoryStore::new();
        store.create_root_entity(1, &record(1, "CONT")).unwrap();
        assert_eq!(
            store.create_root_entity(1, &record(1, "CONT")),
            Err(StoreError::DuplicateEntity(1))
        );
        assert_eq!(
            store.create_child_entity(&99, 2, &record(2, "PPL")),
            Err(StoreError::MissingParentEntity { id: 2, parent: 99 })
        );
        assert_eq!(store.find_entity(1), Some(1));
        assert_eq!(store.find_entity(2), None);
    }

    #[test]
    fn snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.bin");
        let mut store = MemoryStore::new();
        let root = store.create_root_entity(1, &record(1, "CONT")).unwrap();
        store.create_child_entity(&root, 2, &record(2, "PCLI")).unwrap();
        store.save(&path).unwrap();

        let loaded = MemoryStore::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get(2), store.get(2));
        assert_eq!(loaded.by_path("00010001").map(|e| e.id), Some(2));
    }
}
