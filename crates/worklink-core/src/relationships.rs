//! Adding, removing and clearing relationships.
//!
//! Blocking kinds are always written on both units (`A.blocks ∋ B` together
//! with `B.blockedBy ∋ A`) and pass through the cycle guard first. Soft kinds
//! (`dependsOn`, `relatesTo`) live only on the declaring unit.
//!
//! Every check runs before the dataset is touched, so a failed call leaves
//! the snapshot unchanged.

use chrono::Utc;
use tracing::{debug, info, instrument};

use crate::dataset::WorkUnitDataset;
use crate::error::GraphError;
use crate::graph::{GraphIndex, can_add_blocking_edge};
use crate::model::{BlockingEdge, RelationshipKind};
use crate::transitions::{StatusChange, TransitionEngine};

/// Record `unit <kind> target`.
///
/// For blocking kinds the edge is normalized to `blocker → blocked`, checked
/// against the cycle guard, written on both sides, and the blocked unit is
/// handed to the transition engine. Returns the automatic status changes.
///
/// # Errors
///
/// - [`GraphError::NotFound`] if either unit is unknown.
/// - [`GraphError::SelfReference`] if `unit == target`.
/// - [`GraphError::AlreadyExists`] if the entry is already recorded.
/// - [`GraphError::CycleDetected`] if the edge would close a blocking loop.
#[instrument(skip(dataset, engine))]
pub fn add_relationship(
    dataset: &mut WorkUnitDataset,
    engine: &TransitionEngine,
    unit: &str,
    kind: RelationshipKind,
    target: &str,
) -> Result<Vec<StatusChange>, GraphError> {
    let declaring = dataset.require(unit)?;
    dataset.require(target)?;
    if unit == target {
        return Err(GraphError::SelfReference {
            id: unit.to_string(),
        });
    }
    if declaring.relationships.contains(kind, target) {
        return Err(GraphError::AlreadyExists {
            unit: unit.to_string(),
            kind,
            target: target.to_string(),
        });
    }

    let at = Utc::now();
    let Some(edge) = BlockingEdge::from_declaration(unit, kind, target) else {
        dataset.require_mut(unit)?.relationships.insert(kind, target);
        dataset.require_mut(unit)?.touch(at);
        info!(unit, %kind, target, "relationship added");
        return Ok(Vec::new());
    };

    let index = GraphIndex::from_dataset(dataset);
    if let Err(cycle) = can_add_blocking_edge(&index, &edge.blocker, &edge.blocked) {
        debug!(%edge, %cycle, "blocking edge rejected");
        return Err(cycle.into());
    }

    write_edge(dataset, &edge)?;
    dataset.require_mut(&edge.blocker)?.touch(at);
    dataset.require_mut(&edge.blocked)?.touch(at);
    info!(%edge, "blocking edge added");

    Ok(engine
        .block(dataset, &edge.blocked, &edge.blocker, at)?
        .into_iter()
        .collect())
}

/// Remove `unit <kind> target`, and its mirror for blocking kinds.
///
/// Idempotent: returns `false` when nothing was recorded. No status changes
/// follow a removal. `target` may be a dangling id, so references left behind
/// by a hand edit can be dropped; the mirror is only touched when the
/// counterpart exists.
///
/// # Errors
///
/// [`GraphError::NotFound`] if `unit` is unknown.
#[instrument(skip(dataset))]
pub fn remove_relationship(
    dataset: &mut WorkUnitDataset,
    unit: &str,
    kind: RelationshipKind,
    target: &str,
) -> Result<bool, GraphError> {
    dataset.require(unit)?;

    let at = Utc::now();
    let removed = match BlockingEdge::from_declaration(unit, kind, target) {
        Some(edge) => {
            let mut removed = false;
            for (side, side_kind, other) in [
                (&edge.blocker, RelationshipKind::Blocks, &edge.blocked),
                (&edge.blocked, RelationshipKind::BlockedBy, &edge.blocker),
            ] {
                let Some(holder) = dataset.get_mut(side) else {
                    continue;
                };
                if holder.relationships.remove(side_kind, other) {
                    holder.touch(at);
                    removed = true;
                }
            }
            removed
        }
        None => {
            let holder = dataset.require_mut(unit)?;
            let removed = holder.relationships.remove(kind, target);
            if removed {
                holder.touch(at);
            }
            removed
        }
    };

    if removed {
        info!(unit, %kind, target, "relationship removed");
    }
    Ok(removed)
}

/// Apply several relationships from `unit`, in order, as one transaction.
///
/// Each item is checked against the graph as updated by the items before it.
/// Work happens on a scratch copy that replaces the dataset only when every
/// item succeeds.
///
/// # Errors
///
/// The first item's error; the dataset is left untouched.
#[instrument(skip(dataset, engine, items), fields(count = items.len()))]
pub fn add_relationships(
    dataset: &mut WorkUnitDataset,
    engine: &TransitionEngine,
    unit: &str,
    items: &[(RelationshipKind, String)],
) -> Result<Vec<StatusChange>, GraphError> {
    let mut scratch = dataset.clone();
    let mut changes = Vec::new();

    for (position, (kind, target)) in items.iter().enumerate() {
        match add_relationship(&mut scratch, engine, unit, *kind, target) {
            Ok(item_changes) => changes.extend(item_changes),
            Err(err) => {
                debug!(position, %kind, target, %err, "bulk add aborted");
                return Err(err);
            }
        }
    }

    *dataset = scratch;
    Ok(changes)
}

/// Drop every outgoing relationship of `unit` and every blocking reference
/// to it held by other units.
///
/// Soft links other units hold toward `unit` are kept. Returns the number of
/// entries removed.
///
/// # Errors
///
/// [`GraphError::NotFound`] if `unit` is unknown.
#[instrument(skip(dataset))]
pub fn clear_relationships(
    dataset: &mut WorkUnitDataset,
    unit: &str,
) -> Result<usize, GraphError> {
    let at = Utc::now();
    let owned = dataset.require_mut(unit)?.relationships.take_all();
    let mut removed = owned.len();
    if removed > 0 {
        dataset.require_mut(unit)?.touch(at);
    }

    for other in dataset.units_mut() {
        let dropped = usize::from(other.relationships.remove(RelationshipKind::Blocks, unit))
            + usize::from(other.relationships.remove(RelationshipKind::BlockedBy, unit));
        if dropped > 0 {
            other.touch(at);
            removed += dropped;
        }
    }

    info!(unit, removed, "relationships cleared");
    Ok(removed)
}

fn write_edge(dataset: &mut WorkUnitDataset, edge: &BlockingEdge) -> Result<(), GraphError> {
    dataset
        .require_mut(&edge.blocker)?
        .relationships
        .insert(RelationshipKind::Blocks, &edge.blocked);
    dataset
        .require_mut(&edge.blocked)?
        .relationships
        .insert(RelationshipKind::BlockedBy, &edge.blocker);
    Ok(())
}
