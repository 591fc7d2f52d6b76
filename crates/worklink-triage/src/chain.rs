//! Linear blocking chains.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{instrument, warn};
use worklink_core::WorkUnitDataset;
use worklink_core::error::GraphError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainReport {
    /// Unit ids in walk order, starting at the requested unit.
    pub path: Vec<String>,
    /// Number of units in `path`.
    pub depth: usize,
}

/// Follow the first stored `blocks` entry from `id` until a unit blocks
/// nothing that exists.
///
/// Branching units follow their first entry. A revisited unit ends the walk,
/// which only happens in documents with a cycle.
///
/// # Errors
///
/// Returns [`GraphError::NotFound`] when `id` is not in the dataset.
#[instrument(skip(dataset))]
pub fn chain(dataset: &WorkUnitDataset, id: &str) -> Result<ChainReport, GraphError> {
    let mut current = dataset
        .get(id)
        .ok_or_else(|| GraphError::NotFound { id: id.to_string() })?;

    let mut seen: HashSet<&str> = HashSet::new();
    let mut path = Vec::new();

    loop {
        seen.insert(current.id.as_str());
        path.push(current.id.clone());

        let Some(next) = current
            .relationships
            .blocks
            .first()
            .and_then(|next| dataset.get(next))
        else {
            break;
        };
        if seen.contains(next.id.as_str()) {
            warn!(unit = %next.id, "blocking chain revisits a unit");
            break;
        }
        current = next;
    }

    Ok(ChainReport {
        depth: path.len(),
        path,
    })
}
