//! petgraph view of the blocking graph.
//!
//! # Overview
//!
//! [`BlockingDag`] copies a [`GraphIndex`] into a [`petgraph`] directed graph
//! so the longest-path computations can run over a topological order.
//!
//! ## Edge Direction
//!
//! An edge `A → B` means "A **blocks** B": A must be done before B can
//! proceed. `B ∈ A.blocks` and `A ∈ B.blockedBy` both produce that edge, and
//! dangling references are dropped by the index before they get here.
//!
//! ## Acyclicity
//!
//! Construction refuses a cyclic graph with `CycleDetected`, so every
//! `BlockingDag` has a valid topological order. A cycle can only exist in a
//! document that was edited outside the mutator.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;

use anyhow::Result;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{debug, instrument};
use worklink_core::WorkUnitDataset;
use worklink_core::error::GraphError;
use worklink_core::graph::{GraphIndex, find_cycle};

// ---------------------------------------------------------------------------
// BlockingDag
// ---------------------------------------------------------------------------

/// An acyclic blocking graph with a precomputed topological order.
///
/// Nodes carry unit ids and are inserted in ascending id order, so node
/// indices and the topological order are deterministic for a given dataset.
#[derive(Debug)]
pub struct BlockingDag {
    /// Directed graph: nodes = unit ids, edges = blocking relationships.
    pub graph: DiGraph<String, ()>,
    /// Mapping from unit id to petgraph `NodeIndex`.
    pub node_map: HashMap<String, NodeIndex>,
    topo: Vec<NodeIndex>,
}

impl BlockingDag {
    /// Build the DAG for every unit in `dataset`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::CycleDetected`] when the blocking graph contains
    /// a cycle.
    #[instrument(skip(dataset), fields(units = dataset.len()))]
    pub fn from_dataset(dataset: &WorkUnitDataset) -> Result<Self> {
        Self::from_index(&GraphIndex::from_dataset(dataset))
    }

    /// Build the DAG from an already materialized index.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::CycleDetected`] when the index contains a cycle.
    pub fn from_index(index: &GraphIndex) -> Result<Self> {
        if let Some(cycle) = find_cycle(index) {
            debug!(%cycle, "refusing to build DAG over cyclic graph");
            return Err(GraphError::from(cycle).into());
        }

        let mut graph = DiGraph::<String, ()>::with_capacity(index.node_count(), index.edge_count());
        let mut node_map: HashMap<String, NodeIndex> = HashMap::with_capacity(index.node_count());

        for id in index.nodes() {
            let idx = graph.add_node(id.to_string());
            node_map.insert(id.to_string(), idx);
        }

        for edge in index.edges() {
            if let (Some(&from), Some(&to)) = (node_map.get(&edge.blocker), node_map.get(&edge.blocked))
            {
                graph.add_edge(from, to, ());
            }
        }

        // find_cycle already ruled out cycles; toposort agrees on the same edge set.
        let topo = toposort(&graph, None).map_err(|cycle| {
            let id = graph
                .node_weight(cycle.node_id())
                .cloned()
                .unwrap_or_default();
            anyhow::anyhow!("blocking graph is cyclic at {id}")
        })?;

        Ok(Self {
            graph,
            node_map,
            topo,
        })
    }

    /// Return the number of nodes (units) in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Return the number of edges (blocking relationships) in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Look up the `NodeIndex` for a unit id.
    #[must_use]
    pub fn node_index(&self, unit_id: &str) -> Option<NodeIndex> {
        self.node_map.get(unit_id).copied()
    }

    /// Return the unit id label for a node.
    #[must_use]
    pub fn unit_id(&self, idx: NodeIndex) -> Option<&str> {
        self.graph.node_weight(idx).map(String::as_str)
    }

    /// Nodes in topological order: every blocker precedes what it blocks.
    #[must_use]
    pub fn topological_order(&self) -> &[NodeIndex] {
        &self.topo
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use worklink_core::RelationshipKind;

    fn dataset_with_edges(ids: &[&str], edges: &[(&str, &str)]) -> WorkUnitDataset {
        let mut ds = WorkUnitDataset::new();
        for id in ids {
            ds.create_work_unit(id, id).expect("create");
        }
        for (blocker, blocked) in edges {
            let unit = ds.get_mut(blocker).expect("blocker");
            unit.relationships.blocks.push((*blocked).to_string());
            let unit = ds.get_mut(blocked).expect("blocked");
            unit.relationships.blocked_by.push((*blocker).to_string());
        }
        ds
    }

    fn position(dag: &BlockingDag, id: &str) -> usize {
        let idx = dag.node_index(id).expect("node");
        dag.topological_order()
            .iter()
            .position(|&n| n == idx)
            .expect("in order")
    }

    #[test]
    fn empty_dataset_builds_empty_dag() {
        let dag = BlockingDag::from_dataset(&WorkUnitDataset::new()).expect("dag");
        assert_eq!(dag.node_count(), 0);
        assert_eq!(dag.edge_count(), 0);
        assert!(dag.topological_order().is_empty());
    }

    #[test]
    fn isolated_units_are_nodes() {
        let ds = dataset_with_edges(&["A", "B", "C"], &[("A", "B")]);
        let dag = BlockingDag::from_dataset(&ds).expect("dag");
        assert_eq!(dag.node_count(), 3);
        assert_eq!(dag.edge_count(), 1);
        assert!(dag.node_index("C").is_some());
    }

    #[test]
    fn mirrored_pair_is_one_edge() {
        let ds = dataset_with_edges(&["A", "B"], &[("A", "B")]);
        let dag = BlockingDag::from_dataset(&ds).expect("dag");
        assert_eq!(dag.edge_count(), 1);
    }

    #[test]
    fn blocked_by_only_declaration_is_an_edge() {
        let mut ds = dataset_with_edges(&["A", "B"], &[]);
        ds.get_mut("B")
            .expect("B")
            .relationships
            .insert(RelationshipKind::BlockedBy, "A");
        let dag = BlockingDag::from_dataset(&ds).expect("dag");
        assert_eq!(dag.edge_count(), 1);
        assert!(position(&dag, "A") < position(&dag, "B"));
    }

    #[test]
    fn topological_order_respects_edges() {
        let ds = dataset_with_edges(
            &["A", "B", "C", "D"],
            &[("A", "B"), ("B", "C"), ("A", "D"), ("D", "C")],
        );
        let dag = BlockingDag::from_dataset(&ds).expect("dag");
        assert!(position(&dag, "A") < position(&dag, "B"));
        assert!(position(&dag, "B") < position(&dag, "C"));
        assert!(position(&dag, "D") < position(&dag, "C"));
    }

    #[test]
    fn cyclic_graph_is_refused() {
        let ds = dataset_with_edges(&["A", "B"], &[("A", "B"), ("B", "A")]);
        let err = BlockingDag::from_dataset(&ds).expect_err("cycle");
        let graph_err = err.downcast_ref::<GraphError>().expect("graph error");
        assert!(matches!(graph_err, GraphError::CycleDetected { .. }));
    }

    #[test]
    fn unit_id_round_trips_node_index() {
        let ds = dataset_with_edges(&["A", "B"], &[("A", "B")]);
        let dag = BlockingDag::from_dataset(&ds).expect("dag");
        let idx = dag.node_index("B").expect("B");
        assert_eq!(dag.unit_id(idx), Some("B"));
    }
}
