//! The whole-document work-unit dataset.
//!
//! A [`WorkUnitDataset`] is the unit of load and save: every operation takes
//! one snapshot, mutates it in memory, and hands the complete next snapshot
//! back to the store.
//!
//! Besides the id → unit map it carries the **states index**, a status →
//! ordered id list that partitions units by their current status. All status
//! changes inside this crate go through [`WorkUnitDataset::change_status`],
//! which keeps the index in step.

#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::model::{Status, Timestamp, WorkUnit};

/// Document format version written into `meta.version`.
pub const DATASET_VERSION: &str = "1.0.0";

/// Document metadata refreshed on every save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetMeta {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<Timestamp>,
}

impl Default for DatasetMeta {
    fn default() -> Self {
        Self {
            version: DATASET_VERSION.to_string(),
            last_updated: None,
        }
    }
}

/// A unit whose states-index placement disagrees with its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDrift {
    pub id: String,
    /// The unit's actual status, or `None` when the index names an unknown id.
    pub expected: Option<Status>,
    /// Every bucket the id was found in (empty when it is missing).
    pub found: Vec<Status>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkUnitDataset {
    #[serde(default)]
    pub meta: DatasetMeta,
    #[serde(default = "empty_buckets")]
    states: BTreeMap<Status, Vec<String>>,
    #[serde(default)]
    work_units: BTreeMap<String, WorkUnit>,
}

impl Default for WorkUnitDataset {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkUnitDataset {
    /// Empty dataset with every states-index bucket present.
    pub fn new() -> Self {
        Self {
            meta: DatasetMeta::default(),
            states: empty_buckets(),
            work_units: BTreeMap::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    pub fn get(&self, id: &str) -> Option<&WorkUnit> {
        self.work_units.get(id)
    }

    /// Mutable access for editing informational fields (title, estimate,
    /// description). Status and relationships should be changed through the
    /// transition engine and relationship mutator.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut WorkUnit> {
        self.work_units.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.work_units.contains_key(id)
    }

    /// Unit ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.work_units.keys().map(String::as_str)
    }

    /// Units in ascending id order.
    pub fn units(&self) -> impl Iterator<Item = &WorkUnit> {
        self.work_units.values()
    }

    pub fn len(&self) -> usize {
        self.work_units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.work_units.is_empty()
    }

    /// Ids currently filed under `status`, in insertion order.
    pub fn bucket(&self, status: Status) -> &[String] {
        self.states.get(&status).map_or(&[], Vec::as_slice)
    }

    pub(crate) fn require(&self, id: &str) -> Result<&WorkUnit, GraphError> {
        self.work_units.get(id).ok_or_else(|| GraphError::not_found(id))
    }

    pub(crate) fn require_mut(&mut self, id: &str) -> Result<&mut WorkUnit, GraphError> {
        self.work_units
            .get_mut(id)
            .ok_or_else(|| GraphError::not_found(id))
    }

    pub(crate) fn units_mut(&mut self) -> impl Iterator<Item = &mut WorkUnit> {
        self.work_units.values_mut()
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Create a new unit in `backlog` with no relationships.
    ///
    /// # Errors
    ///
    /// [`GraphError::DuplicateUnit`] if `id` is already taken.
    pub fn create_work_unit(
        &mut self,
        id: &str,
        title: &str,
    ) -> Result<&mut WorkUnit, GraphError> {
        self.insert_unit(WorkUnit::new(id, title))
    }

    /// Insert a fully built unit, filing it under its current status.
    ///
    /// # Errors
    ///
    /// [`GraphError::DuplicateUnit`] if the unit's id is already taken.
    pub fn insert_unit(&mut self, unit: WorkUnit) -> Result<&mut WorkUnit, GraphError> {
        if self.work_units.contains_key(&unit.id) {
            return Err(GraphError::DuplicateUnit { id: unit.id });
        }
        let id = unit.id.clone();
        self.states.entry(unit.status).or_default().push(id.clone());
        Ok(self.work_units.entry(id).or_insert(unit))
    }

    /// Remove a unit and its index entry. References held by other units are
    /// left alone.
    pub(crate) fn remove_unit(&mut self, id: &str) -> Option<WorkUnit> {
        let unit = self.work_units.remove(id)?;
        for bucket in self.states.values_mut() {
            bucket.retain(|entry| entry != id);
        }
        Some(unit)
    }

    /// Move `id` to `status`, appending history and re-filing it in the index.
    ///
    /// Returns `false` (and changes nothing) when the unit is already in
    /// `status`. `blocked_reason` is left to the caller.
    pub(crate) fn change_status(
        &mut self,
        id: &str,
        status: Status,
        at: Timestamp,
    ) -> Result<bool, GraphError> {
        let unit = self.require_mut(id)?;
        let from = unit.status;
        if !unit.record_status(status, at) {
            return Ok(false);
        }
        if let Some(bucket) = self.states.get_mut(&from) {
            bucket.retain(|entry| entry != id);
        }
        let bucket = self.states.entry(status).or_default();
        if !bucket.iter().any(|entry| entry == id) {
            bucket.push(id.to_string());
        }
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // States index
    // -----------------------------------------------------------------------

    /// Report every id whose index placement does not match its status:
    /// missing, misfiled, filed more than once, or unknown.
    pub fn verify_states_index(&self) -> Vec<IndexDrift> {
        let mut found: BTreeMap<&str, Vec<Status>> = BTreeMap::new();
        for (status, ids) in &self.states {
            for id in ids {
                found.entry(id.as_str()).or_default().push(*status);
            }
        }

        let mut drift = Vec::new();
        for unit in self.work_units.values() {
            let placements = found.remove(unit.id.as_str()).unwrap_or_default();
            if placements != [unit.status] {
                drift.push(IndexDrift {
                    id: unit.id.clone(),
                    expected: Some(unit.status),
                    found: placements,
                });
            }
        }
        for (id, placements) in found {
            drift.push(IndexDrift {
                id: id.to_string(),
                expected: None,
                found: placements,
            });
        }
        drift
    }

    /// Recompute the states index from unit statuses.
    pub fn rebuild_states_index(&mut self) {
        let mut states = empty_buckets();
        for unit in self.work_units.values() {
            states.entry(unit.status).or_default().push(unit.id.clone());
        }
        self.states = states;
    }

    /// Stamp `meta.last_updated`; called by stores right before writing.
    pub fn mark_saved(&mut self) {
        self.meta.last_updated = Some(Utc::now());
    }
}

fn empty_buckets() -> BTreeMap<Status, Vec<String>> {
    Status::ALL.into_iter().map(|s| (s, Vec::new())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WorkUnitDataset {
        let mut ds = WorkUnitDataset::new();
        ds.create_work_unit("A", "Alpha").expect("create A");
        ds.create_work_unit("B", "Beta").expect("create B");
        ds
    }

    #[test]
    fn create_files_unit_in_backlog() {
        let ds = sample();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.bucket(Status::Backlog), ["A".to_string(), "B".to_string()]);
        assert!(ds.verify_states_index().is_empty());
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let mut ds = sample();
        let err = ds.create_work_unit("A", "again").expect_err("duplicate");
        assert_eq!(err, GraphError::DuplicateUnit { id: "A".into() });
        assert_eq!(ds.len(), 2);
    }

    #[test]
    fn change_status_moves_index_entry() {
        let mut ds = sample();
        let changed = ds
            .change_status("A", Status::Implementing, Utc::now())
            .expect("change");
        assert!(changed);
        assert_eq!(ds.bucket(Status::Backlog), ["B".to_string()]);
        assert_eq!(ds.bucket(Status::Implementing), ["A".to_string()]);
        assert!(ds.verify_states_index().is_empty());
    }

    #[test]
    fn change_to_same_status_is_noop() {
        let mut ds = sample();
        let changed = ds
            .change_status("A", Status::Backlog, Utc::now())
            .expect("change");
        assert!(!changed);
        assert_eq!(ds.get("A").map(|u| u.state_history.len()), Some(1));
    }

    #[test]
    fn change_status_of_unknown_unit_fails() {
        let mut ds = sample();
        let err = ds
            .change_status("Z", Status::Done, Utc::now())
            .expect_err("missing");
        assert_eq!(err, GraphError::NotFound { id: "Z".into() });
    }

    #[test]
    fn remove_unit_drops_index_entry() {
        let mut ds = sample();
        let removed = ds.remove_unit("A").expect("removed");
        assert_eq!(removed.id, "A");
        assert!(!ds.contains("A"));
        assert_eq!(ds.bucket(Status::Backlog), ["B".to_string()]);
    }

    #[test]
    fn verify_reports_misfiled_and_unknown_ids() {
        let mut ds = sample();
        ds.states.insert(Status::Done, vec!["A".into(), "GHOST".into()]);

        let drift = ds.verify_states_index();
        assert_eq!(drift.len(), 2);
        assert_eq!(drift[0].id, "A");
        assert_eq!(drift[0].expected, Some(Status::Backlog));
        assert_eq!(drift[0].found, vec![Status::Backlog, Status::Done]);
        assert_eq!(drift[1].id, "GHOST");
        assert_eq!(drift[1].expected, None);
    }

    #[test]
    fn rebuild_restores_partition() {
        let mut ds = sample();
        ds.states.clear();
        assert_eq!(ds.verify_states_index().len(), 2);
        ds.rebuild_states_index();
        assert!(ds.verify_states_index().is_empty());
        assert_eq!(ds.bucket(Status::Blocked), &[] as &[String]);
    }

    #[test]
    fn document_json_shape() {
        let mut ds = sample();
        ds.mark_saved();
        let json = serde_json::to_value(&ds).expect("serialize");
        assert_eq!(json["meta"]["version"], DATASET_VERSION);
        assert!(json["meta"]["lastUpdated"].is_string());
        assert_eq!(json["states"]["backlog"], serde_json::json!(["A", "B"]));
        assert_eq!(json["workUnits"]["A"]["title"], "Alpha");

        let back: WorkUnitDataset = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, ds);
    }

    #[test]
    fn empty_document_reads_as_empty_dataset() {
        let ds: WorkUnitDataset = serde_json::from_str("{}").expect("deserialize");
        assert!(ds.is_empty());
        assert_eq!(ds.meta.version, DATASET_VERSION);
    }
}
