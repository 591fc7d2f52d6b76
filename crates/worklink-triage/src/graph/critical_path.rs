//! Critical path between two work units.
//!
//! # Overview
//!
//! The critical path from `from` to `to` is the directed blocking path with
//! the largest total `estimate`, both endpoints included. Any delay on a
//! unit of that path delays `to` by the same amount.
//!
//! # Algorithm
//!
//! 1. Build the [`BlockingDag`] (refusing cyclic graphs).
//! 2. **Forward pass** in topological order, starting at `from`: for each
//!    reached node `v` and each successor `s`,
//!    `best[s] = max(best[s], best[v] + weight(s))`.
//! 3. **Path reconstruction**: walk predecessor links back from `to`.
//!
//! Missing, negative or non-finite estimates weigh 0. Among predecessors
//! giving the same total the smallest unit id wins, so the result is stable
//! across runs.

#![allow(clippy::module_name_repetitions)]

use std::cmp::Ordering;
use std::collections::HashMap;

use anyhow::Result;
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use serde::Serialize;
use tracing::{debug, instrument};
use worklink_core::WorkUnitDataset;
use worklink_core::error::GraphError;

use crate::graph::build::BlockingDag;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// The heaviest path between two units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriticalPath {
    /// Unit ids in blocking order, `from` first and `to` last.
    pub path: Vec<String>,
    /// Sum of the estimates along `path`.
    pub total: f64,
}

impl CriticalPath {
    /// Number of units on the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.path.len()
    }

    /// Always false for a computed path; endpoints are inclusive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.path.iter().any(|p| p == id)
    }
}

#[derive(Debug, Clone, Copy)]
struct Best {
    total: f64,
    via: Option<NodeIndex>,
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Compute the maximum-total-estimate path from `from` to `to`.
///
/// Returns `Ok(None)` when `to` is not reachable from `from`. When
/// `from == to` the path is that single unit.
///
/// # Errors
///
/// - [`GraphError::NotFound`] when either endpoint is not in the dataset.
/// - [`GraphError::CycleDetected`] when the blocking graph has a cycle.
#[instrument(skip(dataset))]
pub fn critical_path(dataset: &WorkUnitDataset, from: &str, to: &str) -> Result<Option<CriticalPath>> {
    for id in [from, to] {
        if !dataset.contains(id) {
            return Err(GraphError::NotFound { id: id.to_string() }.into());
        }
    }

    let dag = BlockingDag::from_dataset(dataset)?;
    let weight = |idx: NodeIndex| {
        dag.unit_id(idx)
            .and_then(|id| dataset.get(id))
            .map_or(0.0, worklink_core::WorkUnit::weight)
    };

    let (Some(start), Some(goal)) = (dag.node_index(from), dag.node_index(to)) else {
        return Ok(None);
    };

    let mut best: HashMap<NodeIndex, Best> = HashMap::new();
    best.insert(
        start,
        Best {
            total: weight(start),
            via: None,
        },
    );

    for &v in dag.topological_order() {
        let Some(&current) = best.get(&v) else {
            continue;
        };
        for succ in dag.graph.neighbors_directed(v, Direction::Outgoing) {
            let candidate = current.total + weight(succ);
            match best.get(&succ) {
                Some(existing) if !improves(&dag, candidate, v, existing) => {}
                _ => {
                    best.insert(
                        succ,
                        Best {
                            total: candidate,
                            via: Some(v),
                        },
                    );
                }
            }
        }
    }

    let Some(&end) = best.get(&goal) else {
        debug!(from, to, "no blocking path between units");
        return Ok(None);
    };

    let mut path = Vec::new();
    let mut cursor = Some(goal);
    while let Some(idx) = cursor {
        if let Some(id) = dag.unit_id(idx) {
            path.push(id.to_string());
        }
        cursor = best.get(&idx).and_then(|b| b.via);
    }
    path.reverse();

    debug!(len = path.len(), total = end.total, "critical path computed");
    Ok(Some(CriticalPath {
        path,
        total: end.total,
    }))
}

/// A heavier total wins; an equal total wins when the new predecessor's id
/// sorts before the recorded one.
fn improves(dag: &BlockingDag, candidate: f64, via: NodeIndex, existing: &Best) -> bool {
    match candidate.total_cmp(&existing.total) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => match existing.via {
            Some(prev) => dag.unit_id(via) < dag.unit_id(prev),
            None => false,
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use worklink_core::WorkUnit;

    fn dataset(units: &[(&str, Option<f64>)], edges: &[(&str, &str)]) -> WorkUnitDataset {
        let mut ds = WorkUnitDataset::new();
        for (id, estimate) in units {
            let mut unit = WorkUnit::new(*id, *id);
            unit.estimate = *estimate;
            ds.insert_unit(unit).expect("insert");
        }
        for (blocker, blocked) in edges {
            ds.get_mut(blocker)
                .expect("blocker")
                .relationships
                .blocks
                .push((*blocked).to_string());
            ds.get_mut(blocked)
                .expect("blocked")
                .relationships
                .blocked_by
                .push((*blocker).to_string());
        }
        ds
    }

    fn ids(path: &CriticalPath) -> Vec<&str> {
        path.path.iter().map(String::as_str).collect()
    }

    #[test]
    fn heaviest_branch_wins() {
        let ds = dataset(
            &[
                ("AUTH", Some(8.0)),
                ("API", Some(5.0)),
                ("UI", Some(3.0)),
                ("DB", Some(2.0)),
                ("DEPLOY", Some(0.0)),
            ],
            &[
                ("AUTH", "API"),
                ("API", "UI"),
                ("UI", "DEPLOY"),
                ("AUTH", "DB"),
                ("DB", "DEPLOY"),
            ],
        );
        let cp = critical_path(&ds, "AUTH", "DEPLOY")
            .expect("ok")
            .expect("reachable");
        assert_eq!(ids(&cp), vec!["AUTH", "API", "UI", "DEPLOY"]);
        assert!((cp.total - 16.0).abs() < f64::EPSILON);
    }

    #[test]
    fn same_unit_is_a_single_node_path() {
        let ds = dataset(&[("A", Some(4.0))], &[]);
        let cp = critical_path(&ds, "A", "A").expect("ok").expect("path");
        assert_eq!(ids(&cp), vec!["A"]);
        assert!((cp.total - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unreachable_target_is_none() {
        let ds = dataset(&[("A", None), ("B", None), ("C", None)], &[("A", "B")]);
        assert!(critical_path(&ds, "A", "C").expect("ok").is_none());
        assert!(critical_path(&ds, "B", "A").expect("ok").is_none());
    }

    #[test]
    fn missing_estimates_weigh_zero() {
        let ds = dataset(
            &[("A", Some(1.0)), ("B", None), ("C", Some(2.0))],
            &[("A", "B"), ("B", "C")],
        );
        let cp = critical_path(&ds, "A", "C").expect("ok").expect("path");
        assert_eq!(ids(&cp), vec!["A", "B", "C"]);
        assert!((cp.total - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn equal_weight_tie_prefers_smallest_id() {
        let ds = dataset(
            &[
                ("S", Some(1.0)),
                ("Y", Some(2.0)),
                ("X", Some(2.0)),
                ("T", Some(1.0)),
            ],
            &[("S", "Y"), ("S", "X"), ("Y", "T"), ("X", "T")],
        );
        let cp = critical_path(&ds, "S", "T").expect("ok").expect("path");
        assert_eq!(ids(&cp), vec!["S", "X", "T"]);
    }

    #[test]
    fn longer_lighter_path_loses_to_shorter_heavier() {
        let ds = dataset(
            &[
                ("S", None),
                ("A", Some(1.0)),
                ("B", Some(1.0)),
                ("H", Some(5.0)),
                ("T", None),
            ],
            &[("S", "A"), ("A", "B"), ("B", "T"), ("S", "H"), ("H", "T")],
        );
        let cp = critical_path(&ds, "S", "T").expect("ok").expect("path");
        assert_eq!(ids(&cp), vec!["S", "H", "T"]);
    }

    #[test]
    fn unknown_endpoint_is_not_found() {
        let ds = dataset(&[("A", None)], &[]);
        let err = critical_path(&ds, "A", "ZZZ").expect_err("missing");
        assert_eq!(
            err.downcast_ref::<GraphError>(),
            Some(&GraphError::NotFound { id: "ZZZ".into() })
        );
    }

    #[test]
    fn cyclic_document_is_refused() {
        let ds = dataset(&[("A", None), ("B", None)], &[("A", "B"), ("B", "A")]);
        let err = critical_path(&ds, "A", "B").expect_err("cycle");
        assert!(matches!(
            err.downcast_ref::<GraphError>(),
            Some(GraphError::CycleDetected { .. })
        ));
    }
}
