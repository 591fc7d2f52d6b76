//! Deletion guard and cascade.
//!
//! A unit that still blocks other work cannot be deleted unless the caller
//! asks for a cascade. A permitted delete strips every reference to the
//! removed id from all remaining units, soft links included.
//!
//! Units left without blockers keep their current status; deletion never
//! triggers an automatic unblock.

use chrono::Utc;
use tracing::{info, instrument};

use crate::dataset::WorkUnitDataset;
use crate::error::GraphError;
use crate::model::WorkUnit;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    /// Delete even when the unit blocks other work, stripping those links.
    pub cascade_dependencies: bool,
}

impl DeleteOptions {
    #[must_use]
    pub const fn cascade() -> Self {
        Self {
            cascade_dependencies: true,
        }
    }
}

/// Remove `id` from the dataset and return it.
///
/// # Errors
///
/// - [`GraphError::NotFound`] if `id` is unknown.
/// - [`GraphError::BlocksOtherWork`] if the unit has outgoing `blocks`
///   entries and cascade is off.
#[instrument(skip(dataset))]
pub fn delete_work_unit(
    dataset: &mut WorkUnitDataset,
    id: &str,
    options: DeleteOptions,
) -> Result<WorkUnit, GraphError> {
    let unit = dataset.require(id)?;
    if !unit.relationships.blocks.is_empty() && !options.cascade_dependencies {
        return Err(GraphError::BlocksOtherWork {
            id: id.to_string(),
            blocked_ids: unit.relationships.blocks.clone(),
        });
    }

    let removed = dataset
        .remove_unit(id)
        .ok_or_else(|| GraphError::not_found(id))?;

    let at = Utc::now();
    let mut stripped = 0;
    for other in dataset.units_mut() {
        let count = other.relationships.remove_everywhere(id);
        if count > 0 {
            other.touch(at);
            stripped += count;
        }
    }

    info!(unit = id, stripped, "work unit deleted");
    Ok(removed)
}
