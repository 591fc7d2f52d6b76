//! Read-only adjacency view of the blocking graph.
//!
//! # Overview
//!
//! [`GraphIndex`] materializes the directed blocking graph from a
//! [`WorkUnitDataset`] snapshot. An edge `A → B` means "A blocks B".
//!
//! The edge set is the union of both declarations: `B ∈ A.blocks` and
//! `A ∈ B.blockedBy` each contribute `A → B`. On a consistent dataset the two
//! agree; on a drifted one the union is the conservative view (a half-mirrored
//! edge still constrains ordering). References to ids that are not in the
//! dataset are skipped, so every node in the index is a real unit.
//!
//! Successor and predecessor sets are kept sorted, which makes every
//! traversal built on top of the index deterministic.
//!
//! The index is immutable once built; rebuild it after mutating the dataset.

#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

use std::collections::{BTreeMap, BTreeSet};

use crate::dataset::WorkUnitDataset;
use crate::model::{BlockingEdge, RelationshipKind};

// ---------------------------------------------------------------------------
// GraphIndex
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphIndex {
    /// unit id → ids it blocks.
    successors: BTreeMap<String, BTreeSet<String>>,
    /// unit id → ids blocking it.
    predecessors: BTreeMap<String, BTreeSet<String>>,
    /// Every unit in the source dataset.
    nodes: BTreeSet<String>,
}

impl GraphIndex {
    /// Build the index from a dataset snapshot.
    ///
    /// # Complexity
    ///
    /// O(N + R log R) where N is the unit count and R the number of blocking
    /// entries.
    pub fn from_dataset(dataset: &WorkUnitDataset) -> Self {
        let mut index = Self {
            nodes: dataset.ids().map(str::to_string).collect(),
            ..Self::default()
        };

        for unit in dataset.units() {
            for kind in [RelationshipKind::Blocks, RelationshipKind::BlockedBy] {
                for target in unit.relationships.get(kind) {
                    if let Some(edge) = BlockingEdge::from_declaration(&unit.id, kind, target) {
                        index.insert_edge(edge);
                    }
                }
            }
        }

        index
    }

    fn insert_edge(&mut self, edge: BlockingEdge) {
        if !self.nodes.contains(&edge.blocker) || !self.nodes.contains(&edge.blocked) {
            return;
        }
        self.predecessors
            .entry(edge.blocked.clone())
            .or_default()
            .insert(edge.blocker.clone());
        self.successors
            .entry(edge.blocker)
            .or_default()
            .insert(edge.blocked);
    }

    /// Ids that `id` blocks, ascending.
    pub fn successors(&self, id: &str) -> impl Iterator<Item = &str> {
        self.successors
            .get(id)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Ids blocking `id`, ascending.
    pub fn predecessors(&self, id: &str) -> impl Iterator<Item = &str> {
        self.predecessors
            .get(id)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains(id)
    }

    pub fn contains_edge(&self, blocker: &str, blocked: &str) -> bool {
        self.successors
            .get(blocker)
            .is_some_and(|targets| targets.contains(blocked))
    }

    /// All node ids, ascending.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    /// All distinct edges, ordered by blocker then blocked.
    pub fn edges(&self) -> impl Iterator<Item = BlockingEdge> + '_ {
        self.successors.iter().flat_map(|(blocker, targets)| {
            targets
                .iter()
                .map(move |blocked| BlockingEdge::new(blocker.as_str(), blocked.as_str()))
        })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.successors.values().map(BTreeSet::len).sum()
    }

    /// Units with at least one blocker.
    pub fn blocked_nodes(&self) -> impl Iterator<Item = &str> {
        self.predecessors
            .iter()
            .filter(|(_, blockers)| !blockers.is_empty())
            .map(|(id, _)| id.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(ids: &[&str]) -> WorkUnitDataset {
        let mut ds = WorkUnitDataset::new();
        for id in ids {
            ds.create_work_unit(id, id).expect("create");
        }
        ds
    }

    fn declare(ds: &mut WorkUnitDataset, unit: &str, kind: RelationshipKind, target: &str) {
        ds.get_mut(unit)
            .expect("unit")
            .relationships
            .insert(kind, target);
    }

    #[test]
    fn empty_dataset_has_no_edges() {
        let index = GraphIndex::from_dataset(&WorkUnitDataset::new());
        assert_eq!(index.node_count(), 0);
        assert_eq!(index.edge_count(), 0);
    }

    #[test]
    fn mirrored_pair_is_one_edge() {
        let mut ds = dataset(&["A", "B"]);
        declare(&mut ds, "A", RelationshipKind::Blocks, "B");
        declare(&mut ds, "B", RelationshipKind::BlockedBy, "A");

        let index = GraphIndex::from_dataset(&ds);
        assert_eq!(index.edge_count(), 1);
        assert!(index.contains_edge("A", "B"));
        assert!(!index.contains_edge("B", "A"));
        assert_eq!(index.successors("A").collect::<Vec<_>>(), vec!["B"]);
        assert_eq!(index.predecessors("B").collect::<Vec<_>>(), vec!["A"]);
    }

    #[test]
    fn half_mirrored_edge_is_still_indexed() {
        let mut ds = dataset(&["A", "B", "C"]);
        declare(&mut ds, "A", RelationshipKind::Blocks, "B");
        declare(&mut ds, "C", RelationshipKind::BlockedBy, "B");

        let index = GraphIndex::from_dataset(&ds);
        let edges: Vec<_> = index.edges().collect();
        assert_eq!(
            edges,
            vec![BlockingEdge::new("A", "B"), BlockingEdge::new("B", "C")]
        );
    }

    #[test]
    fn dangling_references_are_skipped() {
        let mut ds = dataset(&["A"]);
        declare(&mut ds, "A", RelationshipKind::Blocks, "GHOST");
        declare(&mut ds, "A", RelationshipKind::BlockedBy, "PHANTOM");

        let index = GraphIndex::from_dataset(&ds);
        assert_eq!(index.edge_count(), 0);
        assert!(!index.contains_node("GHOST"));
    }

    #[test]
    fn soft_links_are_not_edges() {
        let mut ds = dataset(&["A", "B"]);
        declare(&mut ds, "A", RelationshipKind::DependsOn, "B");
        declare(&mut ds, "A", RelationshipKind::RelatesTo, "B");

        let index = GraphIndex::from_dataset(&ds);
        assert_eq!(index.edge_count(), 0);
    }

    #[test]
    fn successors_are_sorted() {
        let mut ds = dataset(&["A", "B", "C", "D"]);
        declare(&mut ds, "A", RelationshipKind::Blocks, "D");
        declare(&mut ds, "A", RelationshipKind::Blocks, "B");
        declare(&mut ds, "A", RelationshipKind::Blocks, "C");

        let index = GraphIndex::from_dataset(&ds);
        assert_eq!(index.successors("A").collect::<Vec<_>>(), vec!["B", "C", "D"]);
        assert_eq!(index.blocked_nodes().collect::<Vec<_>>(), vec!["B", "C", "D"]);
    }
}
