//! Consistency checks and mirror repair.
//!
//! [`validate`] runs two independent checks:
//!
//! - `referential-integrity`: every id in a relationship list names a unit.
//! - `bidirectional-blocking`: every `blocks`/`blockedBy` entry has its mirror
//!   on the counterpart unit.
//!
//! [`repair`] fixes only what it can fix safely: missing mirrors between two
//! existing units. Dangling references are reported and left alone.

#![allow(clippy::module_name_repetitions)]

use std::fmt;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::dataset::WorkUnitDataset;
use crate::graph::{CyclePath, GraphIndex, find_all_cycles};
use crate::model::RelationshipKind;

pub const REFERENTIAL_INTEGRITY: &str = "referential-integrity";
pub const BIDIRECTIONAL_BLOCKING: &str = "bidirectional-blocking";

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// One offending relationship entry: `unit.<kind>` contains `target`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Violation {
    pub unit: String,
    pub kind: RelationshipKind,
    pub target: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} → {}", self.unit, self.kind, self.target)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub name: &'static str,
    pub passed: bool,
    pub violations: Vec<Violation>,
}

impl CheckResult {
    fn from_violations(name: &'static str, violations: Vec<Violation>) -> Self {
        Self {
            name,
            passed: violations.is_empty(),
            violations,
        }
    }

    /// Distinct unit ids owning a violating entry, ascending.
    #[must_use]
    pub fn failing_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.violations.iter().map(|v| v.unit.clone()).collect();
        ids.dedup();
        ids
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub checks: Vec<CheckResult>,
}

impl ValidationReport {
    #[must_use]
    pub fn check(&self, name: &str) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairReport {
    pub success: bool,
    pub message: String,
    pub repaired_count: usize,
    /// Dangling references left for manual attention.
    pub unresolved: Vec<Violation>,
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

/// Run every consistency check against `dataset`.
#[instrument(skip(dataset), fields(units = dataset.len()))]
pub fn validate(dataset: &WorkUnitDataset) -> ValidationReport {
    let checks = vec![
        CheckResult::from_violations(REFERENTIAL_INTEGRITY, dangling_references(dataset)),
        CheckResult::from_violations(BIDIRECTIONAL_BLOCKING, missing_mirrors(dataset)),
    ];
    for check in checks.iter().filter(|c| !c.passed) {
        warn!(
            check = check.name,
            violations = check.violations.len(),
            "consistency check failed"
        );
    }
    ValidationReport {
        valid: checks.iter().all(|c| c.passed),
        checks,
    }
}

fn dangling_references(dataset: &WorkUnitDataset) -> Vec<Violation> {
    dataset
        .units()
        .flat_map(|unit| {
            unit.relationships
                .iter()
                .filter(move |(_, target)| !dataset.contains(target))
                .map(move |(kind, target)| Violation {
                    unit: unit.id.clone(),
                    kind,
                    target: target.to_string(),
                })
        })
        .collect()
}

/// Blocking entries whose counterpart exists but lacks the mirror.
fn missing_mirrors(dataset: &WorkUnitDataset) -> Vec<Violation> {
    dataset
        .units()
        .flat_map(|unit| {
            unit.relationships
                .iter()
                .filter_map(|(kind, target)| kind.mirror().map(|mirror| (kind, mirror, target)))
                .filter(move |(_, mirror, target)| {
                    dataset
                        .get(target)
                        .is_some_and(|other| !other.relationships.contains(*mirror, &unit.id))
                })
                .map(move |(kind, _, target)| Violation {
                    unit: unit.id.clone(),
                    kind,
                    target: target.to_string(),
                })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Repair
// ---------------------------------------------------------------------------

/// Insert every missing mirror between existing units.
///
/// `success` is `false` only when dangling references remain, since those
/// need a human decision.
#[instrument(skip(dataset))]
pub fn repair(dataset: &mut WorkUnitDataset) -> RepairReport {
    let missing = missing_mirrors(dataset);
    let at = Utc::now();
    let mut repaired_count = 0;

    for violation in &missing {
        let Some(mirror) = violation.kind.mirror() else {
            continue;
        };
        if let Some(other) = dataset.get_mut(&violation.target) {
            if other.relationships.insert(mirror, &violation.unit) {
                other.touch(at);
                repaired_count += 1;
            }
        }
    }

    let unresolved = dangling_references(dataset);
    let mut message = if repaired_count == 0 {
        "No missing mirrors found".to_string()
    } else {
        format!("Repaired {repaired_count} missing mirror(s)")
    };
    if !unresolved.is_empty() {
        message.push_str(&format!(
            "; {} dangling reference(s) need manual attention",
            unresolved.len()
        ));
    }
    info!(repaired_count, unresolved = unresolved.len(), "repair finished");

    RepairReport {
        success: unresolved.is_empty(),
        message,
        repaired_count,
        unresolved,
    }
}

/// Blocking loops present in the dataset. Empty for any dataset only ever
/// mutated through the relationship mutator.
pub fn cycle_report(dataset: &WorkUnitDataset) -> Vec<CyclePath> {
    find_all_cycles(&GraphIndex::from_dataset(dataset))
}
