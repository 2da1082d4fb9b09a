// crates/geonames-core/src/hierarchy/materializer.rs
use super::tree::{HierarchyTree, NodeState};
use crate::error::{GeoNamesError, Result, StoreError};
use crate::schema::GeoNameRecord;
use crate::store::EntityStore;
use std::collections::{BTreeSet, VecDeque};
use tracing::{debug, error, warn};

/// Result of handing one record to the [`Materializer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission<R> {
    /// Persisted now; `flushed` staged descendants followed it and `failed`
    /// were refused by the store and stay staged.
    Created {
        entity: R,
        flushed: usize,
        failed: usize,
    },
    /// Parent not persisted yet; the record waits on the node.
    Staged,
    /// The id is ignore-listed (or is the root sentinel).
    Ignored,
    /// No tree node for the id; the record was dropped.
    Orphan,
    /// The id was already persisted; the record was dropped.
    AlreadyCreated,
}

impl<R> Submission<R> {
    pub fn entity(&self) -> Option<&R> {
        match self {
            Self::Created { entity, .. } => Some(entity),
            _ => None,
        }
    }
}

/// Persists gazetteer records in tree order regardless of arrival order.
///
/// Each node goes `absent → created` or `absent → staged → created`, at most
/// once. Creating a node releases its staged descendants through an explicit
/// work queue, so deep hierarchies never grow the call stack.
pub struct Materializer<'a, S: EntityStore> {
    tree: &'a mut HierarchyTree,
    store: &'a mut S,
    root_codes: BTreeSet<String>,
}

impl<'a, S: EntityStore> Materializer<'a, S> {
    pub fn new(tree: &'a mut HierarchyTree, store: &'a mut S) -> Self {
        Self {
            tree,
            store,
            root_codes: BTreeSet::new(),
        }
    }

    /// Records with these feature codes that the hierarchy never mentioned
    /// are attached straight under the root instead of being dropped.
    pub fn with_root_codes(mut self, codes: impl IntoIterator<Item = String>) -> Self {
        self.root_codes = codes.into_iter().collect();
        self
    }

    pub fn submit(&mut self, record: GeoNameRecord) -> Result<Submission<S::Ref>> {
        let id = record.geonameid;
        let root = self.tree.root();

        if id == root || self.tree.is_ignored(id) {
            debug!("Ignoring record {id}");
            return Ok(Submission::Ignored);
        }

        if !self.tree.contains(id) {
            let known_root = record
                .feature_code
                .as_ref()
                .is_some_and(|code| self.root_codes.contains(code));
            if !known_root {
                warn!("Orphan record {id} ({}): not in the hierarchy", record.name);
                return Ok(Submission::Orphan);
            }
            self.tree.ensure_node(id, root)?;
        }

        if self.tree.state(id) == NodeState::Created {
            warn!("Record {id} already persisted; dropping duplicate");
            return Ok(Submission::AlreadyCreated);
        }

        let parent = self
            .tree
            .parent_of(id)
            .ok_or(crate::error::HierarchyError::UnknownNode(id))?;

        let entity = if parent == root {
            self.store.create_root_entity(id, &record)?
        } else if self.tree.is_created(parent) {
            let parent_ref = self.parent_ref(id, parent)?;
            self.store.create_child_entity(&parent_ref, id, &record)?
        } else {
            if self.tree.stage(id, record)?.is_some() {
                debug!("Replaced staged record for {id}");
            }
            self.tree.enqueue_pending(parent, id)?;
            return Ok(Submission::Staged);
        };

        self.tree.mark_created(id)?;
        let (flushed, failed) = self.flush(id, entity.clone())?;
        Ok(Submission::Created {
            entity,
            flushed,
            failed,
        })
    }

    fn parent_ref(&self, id: i64, parent: i64) -> Result<S::Ref> {
        self.store
            .find_entity(parent)
            .ok_or(GeoNamesError::Store(StoreError::MissingParentEntity { id, parent }))
    }

    /// Persists every staged node waiting (directly or transitively) on
    /// `id`. Returns how many were created and how many the store refused.
    ///
    /// A refused child keeps its payload and its pending entry, so a later
    /// submission of the same id retries it; its siblings are still flushed.
    fn flush(&mut self, id: i64, entity: S::Ref) -> Result<(usize, usize)> {
        let mut queue = VecDeque::from([(id, entity)]);
        let mut created = 0;
        let mut failed = 0;

        while let Some((parent, parent_ref)) = queue.pop_front() {
            for child in self.tree.flush_pending(parent) {
                let Some(payload) = self.tree.take_staged(child) else {
                    debug!("Pending child {child} of {parent} has no staged record");
                    continue;
                };
                match self.store.create_child_entity(&parent_ref, child, &payload) {
                    Ok(child_ref) => {
                        self.tree.mark_created(child)?;
                        created += 1;
                        queue.push_back((child, child_ref));
                    }
                    Err(e) => {
                        error!("Could not persist staged record {child} under {parent}: {e}");
                        self.tree.stage(child, payload)?;
                        self.tree.enqueue_pending(parent, child)?;
                        failed += 1;
                    }
                }
            }
        }

        if created > 0 {
            debug!("Flushed {created} staged descendants of {id}");
        }
        Ok((created, failed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Edge, RowSchema};
    use crate::source::RawRow;
    use crate::store::MemoryStore;

    fn record(id: i64, code: &str) -> GeoNameRecord {
        GeoNameRecord::from_row(&RawRow::from_pairs([
            ("geonameid", id.to_string()),
            ("name", format!("n{id}")),
            ("feature_class", "A".to_owned()),
            ("feature_code", code.to_owned()),
            ("country_code", "UA".to_owned()),
        ]))
        .unwrap()
    }

    fn tree(edges: &[(i64, i64)]) -> HierarchyTree {
        let mut tree = HierarchyTree::new(0, [99]);
        for &(p, c) in edges {
            tree.add_edge(&Edge::new(p, c, Some("ADM"))).unwrap();
        }
        tree
    }

    #[test]
    fn child_waits_for_parent() {
        let mut t = tree(&[(0, 100), (100, 200)]);
        let mut store = MemoryStore::new();
        let mut m = Materializer::new(&mut t, &mut store);

        assert_eq!(m.submit(record(200, "PPL")).unwrap(), Submission::Staged);
        assert_eq!(m.tree.state(200), NodeState::Staged);
        assert!(m.tree.get(100).unwrap().pending_children().contains(&200));
        assert_eq!(m.tree.staged_count(), 1);

        let created = m.submit(record(100, "ADM1")).unwrap();
        assert_eq!(
            created,
            Submission::Created {
                entity: 100,
                flushed: 1,
                failed: 0
            }
        );
        assert_eq!(m.tree.state(100), NodeState::Created);
        assert_eq!(m.tree.state(200), NodeState::Created);
        assert!(m.tree.get(200).unwrap().staged().is_none());
        assert_eq!(m.tree.staged_count(), 0);

        drop(m);
        assert_eq!(store.get(200).unwrap().parent, Some(100));
        assert_eq!(store.get(100).unwrap().parent, None);
    }

    #[test]
    fn reverse_arrival_flushes_transitively() {
        let mut t = tree(&[(0, 1), (1, 2), (2, 3)]);
        let mut store = MemoryStore::new();
        {
            let mut m = Materializer::new(&mut t, &mut store);
            assert_eq!(m.submit(record(3, "PPL")).unwrap(), Submission::Staged);
            assert_eq!(m.submit(record(2, "ADM2")).unwrap(), Submission::Staged);
            let first = m.submit(record(1, "ADM1")).unwrap();
            assert_eq!(first.entity(), Some(&1));
            assert_eq!(
                first,
                Submission::Created {
                    entity: 1,
                    flushed: 2,
                    failed: 0
                }
            );
        }

        assert_eq!(store.len(), 3);
        assert_eq!(store.get(3).unwrap().parent, Some(2));
        assert_eq!(store.get(2).unwrap().parent, Some(1));
        assert_eq!(store.get(1).unwrap().parent, None);
        assert_eq!(store.get(3).unwrap().path, "000100010001");
    }

    #[test]
    fn never_persists_twice() {
        let mut t = tree(&[(0, 1), (1, 2)]);
        let mut store = MemoryStore::new();
        let mut m = Materializer::new(&mut t, &mut store);

        m.submit(record(2, "PPL")).unwrap();
        m.submit(record(2, "PPL")).unwrap();
        m.submit(record(1, "ADM1")).unwrap();
        assert_eq!(m.submit(record(1, "ADM1")).unwrap(), Submission::AlreadyCreated);
        assert_eq!(m.submit(record(2, "PPL")).unwrap(), Submission::AlreadyCreated);
        drop(m);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn orphans_and_ignored_ids_are_dropped() {
        let mut t = tree(&[(0, 1)]);
        let mut store = MemoryStore::new();
        let mut m = Materializer::new(&mut t, &mut store);

        assert_eq!(m.submit(record(555, "PPL")).unwrap(), Submission::Orphan);
        assert_eq!(m.submit(record(99, "PPL")).unwrap(), Submission::Ignored);
        assert!(!m.tree.contains(555));
        drop(m);
        assert!(store.is_empty());
    }

    #[test]
    fn known_root_codes_attach_to_root() {
        let mut t = tree(&[(6255148, 2017370)]);
        let mut store = MemoryStore::new();
        let mut m =
            Materializer::new(&mut t, &mut store).with_root_codes(["CONT".to_owned()]);

        // Continent absent from the tree, but classified as root-level.
        assert_eq!(m.submit(record(6255146, "CONT")).unwrap().entity(), Some(&6255146));
        assert_eq!(m.submit(record(2017371, "PPL")).unwrap(), Submission::Orphan);
    }

    #[test]
    fn intermediate_without_record_keeps_children_waiting() {
        let mut t = tree(&[(0, 1), (1, 2), (2, 3)]);
        let mut store = MemoryStore::new();
        let mut m = Materializer::new(&mut t, &mut store);

        assert_eq!(m.submit(record(3, "PPL")).unwrap(), Submission::Staged);
        assert_eq!(
            m.submit(record(1, "ADM1")).unwrap(),
            Submission::Created {
                entity: 1,
                flushed: 0,
                failed: 0
            }
        );
        assert_eq!(m.tree.state(3), NodeState::Staged);
        assert_eq!(
            m.submit(record(2, "ADM2")).unwrap(),
            Submission::Created {
                entity: 2,
                flushed: 1,
                failed: 0
            }
        );
        assert_eq!(m.tree.state(3), NodeState::Created);
    }

    #[test]
    fn deep_cascade_is_iterative() {
        let depth = 2_000;
        let mut t = HierarchyTree::new(0, []);
        for id in 1..=depth {
            t.add_edge(&Edge::new(id - 1, id, None)).unwrap();
        }
        let mut store = MemoryStore::new();
        let mut m = Materializer::new(&mut t, &mut store);
        for id in (2..=depth).rev() {
            m.submit(record(id, "PPL")).unwrap();
        }
        let first = m.submit(record(1, "ADM1")).unwrap();
        assert_eq!(
            first,
            Submission::Created {
                entity: 1,
                flushed: (depth - 1) as usize,
                failed: 0
            }
        );
    }

    /// Delegates to a [`MemoryStore`] but refuses to persist one id.
    struct Refusing {
        inner: MemoryStore,
        refuse: Option<i64>,
    }

    impl EntityStore for Refusing {
        type Ref = i64;

        fn create_root_entity(
            &mut self,
            id: i64,
            record: &GeoNameRecord,
        ) -> std::result::Result<i64, StoreError> {
            self.inner.create_root_entity(id, record)
        }

        fn create_child_entity(
            &mut self,
            parent: &i64,
            id: i64,
            record: &GeoNameRecord,
        ) -> std::result::Result<i64, StoreError> {
            if self.refuse == Some(id) {
                return Err(StoreError::PathOverflow);
            }
            self.inner.create_child_entity(parent, id, record)
        }

        fn find_entity(&self, id: i64) -> Option<i64> {
            self.inner.find_entity(id)
        }
    }

    #[test]
    fn refused_child_stays_staged_and_siblings_flush() {
        let mut t = tree(&[(0, 1), (1, 2), (1, 3), (2, 4)]);
        let mut store = Refusing {
            inner: MemoryStore::new(),
            refuse: Some(2),
        };
        {
            let mut m = Materializer::new(&mut t, &mut store);
            assert_eq!(m.submit(record(4, "PPL")).unwrap(), Submission::Staged);
            assert_eq!(m.submit(record(2, "ADM2")).unwrap(), Submission::Staged);
            assert_eq!(m.submit(record(3, "ADM2")).unwrap(), Submission::Staged);
            assert_eq!(
                m.submit(record(1, "ADM1")).unwrap(),
                Submission::Created {
                    entity: 1,
                    flushed: 1,
                    failed: 1
                }
            );
        }
        assert_eq!(t.state(1), NodeState::Created);
        assert_eq!(t.state(3), NodeState::Created);
        assert_eq!(t.state(2), NodeState::Staged);
        assert_eq!(t.state(4), NodeState::Staged);
        assert!(t.get(1).unwrap().pending_children().contains(&2));
        assert!(t.get(2).unwrap().pending_children().contains(&4));
        assert_eq!(t.staged_count(), 2);
        assert!(store.inner.get(3).is_some());
        assert!(store.inner.get(2).is_none());

        // Once the store accepts it, resubmitting the id releases its subtree.
        store.refuse = None;
        let mut m = Materializer::new(&mut t, &mut store);
        assert_eq!(
            m.submit(record(2, "ADM2")).unwrap(),
            Submission::Created {
                entity: 2,
                flushed: 1,
                failed: 0
            }
        );
        assert_eq!(m.tree.staged_count(), 0);
        drop(m);
        assert_eq!(store.inner.len(), 4);
        assert_eq!(store.inner.get(4).unwrap().parent, Some(2));
    }
}
