// crates/geonames-core/src/hierarchy/tree.rs
use crate::error::{HierarchyError, Result};
use crate::schema::{Edge, GeoNameRecord};
use crate::snapshot::{read_snapshot, write_snapshot, CompressionMode};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::{debug, warn};

/// Lifecycle of a node as seen by the materializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Not in the tree, or in the tree with no record yet.
    Absent,
    /// Record received, parent not persisted yet.
    Staged,
    Created,
}

/// One entity id in the hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    id: i64,
    /// `None` only for the root.
    parent: Option<i64>,
    children: BTreeSet<i64>,
    /// Attached under the root only because it was first seen as a parent.
    provisional: bool,
    created: bool,
    pending_children: BTreeSet<i64>,
    staged: Option<GeoNameRecord>,
}

impl TreeNode {
    fn new(id: i64, parent: Option<i64>, provisional: bool) -> Self {
        Self {
            id,
            parent,
            children: BTreeSet::new(),
            provisional,
            created: false,
            pending_children: BTreeSet::new(),
            staged: None,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn parent(&self) -> Option<i64> {
        self.parent
    }

    pub fn children(&self) -> &BTreeSet<i64> {
        &self.children
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn pending_children(&self) -> &BTreeSet<i64> {
        &self.pending_children
    }

    pub fn staged(&self) -> Option<&GeoNameRecord> {
        self.staged.as_ref()
    }

    pub fn state(&self) -> NodeState {
        if self.created {
            NodeState::Created
        } else if self.staged.is_some() {
            NodeState::Staged
        } else {
            NodeState::Absent
        }
    }
}

/// What [`HierarchyTree::add_edge`] did with one edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOutcome {
    Attached,
    /// A provisional node was moved under its real parent.
    Moved,
    /// The child already hangs under this (or another, earlier) parent.
    Duplicate,
    /// Either side is ignore-listed.
    Ignored,
    /// Child is the root sentinel or the parent itself.
    Sentinel,
    /// Moving the child would close a cycle.
    Cycle,
}

/// In-memory tree of entity ids built from the hierarchy edge list.
///
/// The tree owns all node state; the materializer only goes through the
/// methods below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyTree {
    root: i64,
    ignore: BTreeSet<i64>,
    nodes: HashMap<i64, TreeNode>,
}

impl HierarchyTree {
    pub fn new(root: i64, ignore: impl IntoIterator<Item = i64>) -> Self {
        let mut root_node = TreeNode::new(root, None, false);
        root_node.created = true;
        Self {
            root,
            ignore: ignore.into_iter().filter(|id| *id != root).collect(),
            nodes: HashMap::from([(root, root_node)]),
        }
    }

    pub fn from_config(config: &crate::config::ImportConfig) -> Self {
        Self::new(config.root_id, config.ignore_ids.iter().copied())
    }

    pub fn root(&self) -> i64 {
        self.root
    }

    pub fn is_ignored(&self, id: i64) -> bool {
        self.ignore.contains(&id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: i64) -> Option<&TreeNode> {
        self.nodes.get(&id)
    }

    /// Number of nodes, root included.
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    pub fn parent_of(&self, id: i64) -> Option<i64> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: i64) -> impl Iterator<Item = i64> + '_ {
        self.nodes
            .get(&id)
            .into_iter()
            .flat_map(|n| n.children.iter().copied())
    }

    pub fn state(&self, id: i64) -> NodeState {
        self.nodes.get(&id).map_or(NodeState::Absent, TreeNode::state)
    }

    pub fn is_created(&self, id: i64) -> bool {
        self.nodes.get(&id).is_some_and(|n| n.created)
    }

    /// Ids already persisted, root excluded.
    pub fn created_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.nodes
            .values()
            .filter(|n| n.created && n.id != self.root)
            .map(|n| n.id)
    }

    /// Longest root-to-leaf path, in edges.
    pub fn depth(&self) -> usize {
        let mut memo: HashMap<i64, usize> = HashMap::with_capacity(self.nodes.len());
        memo.insert(self.root, 0);
        let mut deepest = 0;

        for &start in self.nodes.keys() {
            // Walk up until a known depth, then fill the path back down.
            let mut path = Vec::new();
            let mut cursor = start;
            let base = loop {
                if let Some(&d) = memo.get(&cursor) {
                    break d;
                }
                path.push(cursor);
                match self.parent_of(cursor) {
                    Some(p) => cursor = p,
                    None => break 0,
                }
            };
            for (offset, id) in path.iter().rev().enumerate() {
                memo.insert(*id, base + offset + 1);
            }
            deepest = deepest.max(memo.get(&start).copied().unwrap_or(0));
        }
        deepest
    }

    fn is_ancestor(&self, ancestor: i64, mut id: i64) -> bool {
        loop {
            if id == ancestor {
                return true;
            }
            match self.parent_of(id) {
                Some(p) => id = p,
                None => return false,
            }
        }
    }

    fn attach(&mut self, id: i64, parent: i64, provisional: bool) -> std::result::Result<(), HierarchyError> {
        if id == self.root {
            return Err(HierarchyError::RootAsChild(id));
        }
        let parent_node = self
            .nodes
            .get_mut(&parent)
            .ok_or(HierarchyError::MissingParent { child: id, parent })?;
        parent_node.children.insert(id);
        self.nodes
            .insert(id, TreeNode::new(id, Some(parent), provisional));
        Ok(())
    }

    /// Creates `id` under `parent` unless it already exists. A missing
    /// parent is first created under the root. Returns whether a node was
    /// created for `id`.
    pub fn ensure_node(&mut self, id: i64, parent: i64) -> std::result::Result<bool, HierarchyError> {
        if self.contains(id) {
            return Ok(false);
        }
        if !self.contains(parent) {
            self.attach(parent, self.root, true)?;
        }
        self.attach(id, parent, false)?;
        Ok(true)
    }

    /// Feeds one edge of the hierarchy file into the tree.
    pub fn add_edge(&mut self, edge: &Edge) -> std::result::Result<EdgeOutcome, HierarchyError> {
        let (parent, child) = (edge.parent, edge.child);

        if self.is_ignored(parent) || self.is_ignored(child) {
            debug!("Skipping edge {parent} -> {child}: ignore-listed");
            return Ok(EdgeOutcome::Ignored);
        }
        if child == self.root || child == parent {
            if parent != self.root && !self.contains(parent) {
                self.attach(parent, self.root, true)?;
            }
            return Ok(EdgeOutcome::Sentinel);
        }

        if self.ensure_node(child, parent)? {
            return Ok(EdgeOutcome::Attached);
        }

        let (current, provisional, created) = self
            .nodes
            .get(&child)
            .map(|n| (n.parent, n.provisional, n.created))
            .ok_or(HierarchyError::UnknownNode(child))?;
        if current == Some(parent) {
            if parent == self.root {
                self.set_provisional(child, false);
            }
            return Ok(EdgeOutcome::Duplicate);
        }
        if !provisional || created {
            debug!("Keeping first parent of {child}; ignoring {parent}");
            return Ok(EdgeOutcome::Duplicate);
        }
        if self.is_ancestor(child, parent) {
            warn!("Edge {parent} -> {child} would close a cycle; skipped");
            return Ok(EdgeOutcome::Cycle);
        }

        self.reparent(child, parent)?;
        Ok(EdgeOutcome::Moved)
    }

    fn set_provisional(&mut self, id: i64, provisional: bool) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.provisional = provisional;
        }
    }

    fn reparent(&mut self, id: i64, new_parent: i64) -> std::result::Result<(), HierarchyError> {
        if !self.contains(new_parent) {
            self.attach(new_parent, self.root, true)?;
        }
        let old_parent = self.parent_of(id).ok_or(HierarchyError::UnknownNode(id))?;
        if let Some(old) = self.nodes.get_mut(&old_parent) {
            old.children.remove(&id);
        }
        self.nodes
            .get_mut(&new_parent)
            .ok_or(HierarchyError::MissingParent {
                child: id,
                parent: new_parent,
            })?
            .children
            .insert(id);
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(HierarchyError::UnknownNode(id))?;
        node.parent = Some(new_parent);
        node.provisional = false;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Materializer operations
    // -------------------------------------------------------------------------

    /// Flips `created`. Irreversible; also drops any staged payload.
    pub fn mark_created(&mut self, id: i64) -> std::result::Result<(), HierarchyError> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(HierarchyError::UnknownNode(id))?;
        node.created = true;
        node.staged = None;
        Ok(())
    }

    /// Stores `record` on a not-yet-created node, returning any payload it
    /// replaces.
    pub fn stage(
        &mut self,
        id: i64,
        record: GeoNameRecord,
    ) -> std::result::Result<Option<GeoNameRecord>, HierarchyError> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(HierarchyError::UnknownNode(id))?;
        if node.created {
            return Ok(Some(record));
        }
        Ok(node.staged.replace(record))
    }

    /// Records still waiting for a parent that was never persisted.
    pub fn staged_count(&self) -> usize {
        self.nodes.values().filter(|n| n.staged.is_some()).count()
    }

    pub fn take_staged(&mut self, id: i64) -> Option<GeoNameRecord> {
        self.nodes.get_mut(&id).and_then(|n| n.staged.take())
    }

    pub fn enqueue_pending(&mut self, parent: i64, child: i64) -> std::result::Result<(), HierarchyError> {
        self.nodes
            .get_mut(&parent)
            .ok_or(HierarchyError::UnknownNode(parent))?
            .pending_children
            .insert(child);
        Ok(())
    }

    /// Empties and returns the pending set of `id`.
    pub fn flush_pending(&mut self, id: i64) -> BTreeSet<i64> {
        self.nodes
            .get_mut(&id)
            .map(|n| std::mem::take(&mut n.pending_children))
            .unwrap_or_default()
    }

    // -------------------------------------------------------------------------
    // Snapshots
    // -------------------------------------------------------------------------

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write_snapshot(path.as_ref(), self, CompressionMode::default())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        read_snapshot(path.as_ref(), CompressionMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(parent: i64, child: i64) -> Edge {
        Edge::new(parent, child, Some("ADM"))
    }

    fn build(edges: &[(i64, i64)]) -> HierarchyTree {
        let mut tree = HierarchyTree::new(0, [1_000_000]);
        for &(p, c) in edges {
            tree.add_edge(&edge(p, c)).unwrap();
        }
        tree
    }

    fn shape(tree: &HierarchyTree) -> Vec<(i64, Option<i64>)> {
        let mut v: Vec<_> = tree.nodes.values().map(|n| (n.id, n.parent)).collect();
        v.sort();
        v
    }

    #[test]
    fn root_starts_created() {
        let tree = HierarchyTree::new(0, []);
        assert!(tree.is_created(0));
        assert_eq!(tree.size(), 1);
        assert_eq!(tree.depth(), 0);
    }

    #[test]
    fn edge_order_does_not_change_shape() {
        let a = build(&[(1, 2), (0, 1)]);
        let b = build(&[(0, 1), (1, 2)]);
        assert_eq!(shape(&a), shape(&b));
        assert_eq!(a.parent_of(2), Some(1));
        assert_eq!(a.parent_of(1), Some(0));
    }

    #[test]
    fn provisional_parent_moves_under_real_parent() {
        let a = build(&[(5, 6), (1, 5), (0, 1)]);
        let b = build(&[(0, 1), (1, 5), (5, 6)]);
        assert_eq!(a.parent_of(5), Some(1));
        assert_eq!(shape(&a), shape(&b));
        assert_eq!(a.depth(), 3);
        assert_eq!(a.children(0).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn duplicate_edges_are_no_ops() {
        let mut tree = build(&[(0, 1), (1, 2)]);
        assert_eq!(tree.add_edge(&edge(1, 2)).unwrap(), EdgeOutcome::Duplicate);
        // A second, different parent does not steal an explicitly placed node.
        tree.add_edge(&edge(0, 7)).unwrap();
        assert_eq!(tree.add_edge(&edge(7, 2)).unwrap(), EdgeOutcome::Duplicate);
        assert_eq!(tree.parent_of(2), Some(1));
    }

    #[test]
    fn ignore_listed_edges_create_nothing() {
        let mut tree = HierarchyTree::new(0, [42]);
        assert_eq!(tree.add_edge(&edge(42, 42)).unwrap(), EdgeOutcome::Ignored);
        assert_eq!(tree.add_edge(&edge(42, 7)).unwrap(), EdgeOutcome::Ignored);
        assert_eq!(tree.add_edge(&edge(7, 42)).unwrap(), EdgeOutcome::Ignored);
        assert!(!tree.contains(42));
        assert!(!tree.contains(7));
        assert_eq!(tree.size(), 1);
    }

    #[test]
    fn sentinel_children_are_dropped() {
        let mut tree = HierarchyTree::new(0, []);
        assert_eq!(tree.add_edge(&edge(3, 0)).unwrap(), EdgeOutcome::Sentinel);
        assert_eq!(tree.add_edge(&edge(4, 4)).unwrap(), EdgeOutcome::Sentinel);
        assert_eq!(tree.parent_of(3), Some(0));
        assert_eq!(tree.parent_of(4), Some(0));
        assert_eq!(tree.size(), 3);
    }

    #[test]
    fn cycles_are_refused() {
        let mut tree = HierarchyTree::new(0, []);
        tree.add_edge(&edge(1, 2)).unwrap();
        assert_eq!(tree.add_edge(&edge(2, 1)).unwrap(), EdgeOutcome::Cycle);
        assert_eq!(tree.parent_of(1), Some(0));
        assert_eq!(tree.parent_of(2), Some(1));
    }

    #[test]
    fn ensure_node_is_idempotent() {
        let mut tree = HierarchyTree::new(0, []);
        assert!(tree.ensure_node(10, 9).unwrap());
        assert!(!tree.ensure_node(10, 9).unwrap());
        assert!(!tree.ensure_node(10, 0).unwrap());
        assert_eq!(tree.parent_of(10), Some(9));
        assert_eq!(tree.parent_of(9), Some(0));
    }

    #[test]
    fn root_cannot_become_a_child() {
        let mut tree = HierarchyTree::new(0, []);
        assert!(!tree.ensure_node(0, 5).unwrap());
        assert_eq!(
            tree.attach(0, 0, false).unwrap_err(),
            HierarchyError::RootAsChild(0)
        );
        assert_eq!(
            tree.attach(9, 77, false).unwrap_err(),
            HierarchyError::MissingParent { child: 9, parent: 77 }
        );
    }

    #[test]
    fn deep_chains_do_not_recurse() {
        let mut tree = HierarchyTree::new(0, []);
        for id in 1..50_000 {
            tree.add_edge(&edge(id - 1, id)).unwrap();
        }
        assert_eq!(tree.depth(), 49_999);
    }

    #[test]
    fn snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree.bin");
        let tree = build(&[(0, 1), (1, 2), (1, 3)]);
        tree.save(&path).unwrap();
        assert_eq!(HierarchyTree::load(&path).unwrap(), tree);
    }
}
