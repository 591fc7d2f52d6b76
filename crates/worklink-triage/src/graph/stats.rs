//! Aggregate relationship statistics.
//!
//! # Statistics Provided
//!
//! - **total_units**: number of work units in the dataset.
//! - **blocks / blocked_by / depends_on / relates_to**: sum of that array's
//!   length over all units. Not deduplicated: a mirrored blocking pair counts
//!   once in `blocks` and once in `blocked_by`.
//! - **blocking_edges**: distinct blocking edges between existing units.
//! - **blocked_units**: units whose status is `blocked`.
//! - **units_with_relationships**: units with at least one entry in any
//!   array.
//! - **density**: `blocking_edges / (n * (n - 1))`; 0.0 below two units.

use serde::Serialize;
use tracing::instrument;
use worklink_core::graph::GraphIndex;
use worklink_core::{RelationshipKind, WorkUnitDataset};

// ---------------------------------------------------------------------------
// GraphStats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    pub total_units: usize,
    pub blocks: usize,
    pub blocked_by: usize,
    pub depends_on: usize,
    pub relates_to: usize,
    pub blocking_edges: usize,
    pub blocked_units: usize,
    pub units_with_relationships: usize,
    pub density: f64,
}

impl GraphStats {
    /// Compute statistics for `dataset`.
    #[must_use]
    #[instrument(skip(dataset), fields(units = dataset.len()))]
    pub fn from_dataset(dataset: &WorkUnitDataset) -> Self {
        let sum = |kind: RelationshipKind| -> usize {
            dataset
                .units()
                .map(|u| u.relationships.get(kind).len())
                .sum()
        };

        let index = GraphIndex::from_dataset(dataset);
        let total_units = dataset.len();
        let blocking_edges = index.edge_count();

        Self {
            total_units,
            blocks: sum(RelationshipKind::Blocks),
            blocked_by: sum(RelationshipKind::BlockedBy),
            depends_on: sum(RelationshipKind::DependsOn),
            relates_to: sum(RelationshipKind::RelatesTo),
            blocking_edges,
            blocked_units: dataset.units().filter(|u| u.is_blocked()).count(),
            units_with_relationships: dataset
                .units()
                .filter(|u| !u.relationships.is_empty())
                .count(),
            density: compute_density(total_units, blocking_edges),
        }
    }

    /// Per-kind total for `kind`.
    #[must_use]
    pub const fn count(&self, kind: RelationshipKind) -> usize {
        match kind {
            RelationshipKind::Blocks => self.blocks,
            RelationshipKind::BlockedBy => self.blocked_by,
            RelationshipKind::DependsOn => self.depends_on,
            RelationshipKind::RelatesTo => self.relates_to,
        }
    }

    /// Return `true` if the dataset has no blocking edges.
    #[must_use]
    pub const fn is_flat(&self) -> bool {
        self.blocking_edges == 0
    }
}

/// Shorthand for [`GraphStats::from_dataset`].
#[must_use]
pub fn stats(dataset: &WorkUnitDataset) -> GraphStats {
    GraphStats::from_dataset(dataset)
}

#[allow(clippy::cast_precision_loss)]
fn compute_density(node_count: usize, edge_count: usize) -> f64 {
    if node_count < 2 {
        return 0.0_f64;
    }
    let max_edges = (node_count * (node_count - 1)) as f64;
    edge_count as f64 / max_edges
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
