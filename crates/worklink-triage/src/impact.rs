//! Impact of completing a unit, and the ready-work list.

#![allow(clippy::module_name_repetitions)]

use serde::Serialize;
use tracing::instrument;
use worklink_core::WorkUnitDataset;
use worklink_core::error::GraphError;

/// What finishing `unit` affects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactReport {
    pub unit: String,
    /// Every unit listing `unit` in its `blockedBy`, ascending.
    pub ready_to_proceed: Vec<String>,
    /// Subset of `ready_to_proceed` with no other blocker left undone.
    pub fully_unblocked: Vec<String>,
}

impl ImpactReport {
    /// Number of direct blockees.
    #[must_use]
    pub fn count(&self) -> usize {
        self.ready_to_proceed.len()
    }
}

/// Direct blockees of `id`.
///
/// A blocker that no longer exists in the dataset does not hold a unit back.
///
/// # Errors
///
/// Returns [`GraphError::NotFound`] when `id` is not in the dataset.
#[instrument(skip(dataset))]
pub fn impact(dataset: &WorkUnitDataset, id: &str) -> Result<ImpactReport, GraphError> {
    if !dataset.contains(id) {
        return Err(GraphError::NotFound { id: id.to_string() });
    }

    let ready_to_proceed: Vec<String> = dataset
        .units()
        .filter(|u| u.relationships.blocked_by.iter().any(|b| b == id))
        .map(|u| u.id.clone())
        .collect();

    let fully_unblocked = ready_to_proceed
        .iter()
        .filter(|blockee| {
            dataset.get(blockee).is_some_and(|u| {
                u.relationships
                    .blocked_by
                    .iter()
                    .filter(|b| b.as_str() != id)
                    .all(|b| dataset.get(b).is_none_or(worklink_core::WorkUnit::is_done))
            })
        })
        .cloned()
        .collect();

    Ok(ImpactReport {
        unit: id.to_string(),
        ready_to_proceed,
        fully_unblocked,
    })
}

/// Units not done whose every existing blocker is done, ascending.
#[must_use]
pub fn ready_work(dataset: &WorkUnitDataset) -> Vec<String> {
    dataset
        .units()
        .filter(|u| !u.is_done())
        .filter(|u| {
            u.relationships
                .blocked_by
                .iter()
                .all(|b| dataset.get(b).is_none_or(worklink_core::WorkUnit::is_done))
        })
        .map(|u| u.id.clone())
        .collect()
}
