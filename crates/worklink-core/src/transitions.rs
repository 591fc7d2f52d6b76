//! Status changes and the automatic block/unblock reactions.
//!
//! Any explicit transition between declared states is allowed. Two reactions
//! layer on top of it:
//!
//! - **Blocker added**: when a unit gains a blocker that is not done, it moves
//!   to `blocked` with `blockedReason = "Blocked by {blocker}"`. A unit that
//!   is already blocked keeps its reason, or gets this one if it had none.
//! - **Completion**: when a unit moves to `done`, every unit it was blocking
//!   that is still `blocked` is re-evaluated against the [`UnblockPolicy`] and
//!   released to `backlog` when the policy is satisfied.
//!
//! Every change, manual or automatic, goes through
//! [`WorkUnitDataset::change_status`] so the history and the states index stay
//! in step.

#![allow(clippy::module_name_repetitions)]

use std::{fmt, str::FromStr};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::WorklinkConfig;
use crate::dataset::WorkUnitDataset;
use crate::error::GraphError;
use crate::model::{ParseEnumError, Status, Timestamp, normalize};

/// When a blocked unit with several blockers is released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnblockPolicy {
    /// Release only once every blocker is done.
    #[default]
    AllBlockersDone,
    /// Release as soon as any blocker completes.
    AnyBlockerDone,
}

impl UnblockPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AllBlockersDone => "all-blockers-done",
            Self::AnyBlockerDone => "any-blocker-done",
        }
    }
}

impl fmt::Display for UnblockPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnblockPolicy {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "allblockersdone" | "all" => Ok(Self::AllBlockersDone),
            "anyblockerdone" | "any" => Ok(Self::AnyBlockerDone),
            _ => Err(ParseEnumError {
                expected: "unblock policy",
                got: s.to_string(),
            }),
        }
    }
}

/// Why a status changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TransitionCause {
    /// Requested explicitly.
    Manual,
    /// A blocker that is not done was linked.
    BlockerAdded { blocker: String },
    /// A blocker completed and the unblock policy was satisfied.
    BlockerCompleted { blocker: String },
}

/// One status change applied to the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub id: String,
    pub from: Status,
    pub to: Status,
    pub cause: TransitionCause,
}

impl StatusChange {
    #[must_use]
    pub const fn is_automatic(&self) -> bool {
        !matches!(self.cause, TransitionCause::Manual)
    }
}

impl fmt::Display for StatusChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} → {}", self.id, self.from, self.to)?;
        match &self.cause {
            TransitionCause::Manual => Ok(()),
            TransitionCause::BlockerAdded { blocker } => write!(f, " (blocked by {blocker})"),
            TransitionCause::BlockerCompleted { blocker } => {
                write!(f, " ({blocker} completed)")
            }
        }
    }
}

/// Applies status changes and their automatic reactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionEngine {
    policy: UnblockPolicy,
}

impl TransitionEngine {
    #[must_use]
    pub const fn new(policy: UnblockPolicy) -> Self {
        Self { policy }
    }

    /// Engine using the `[workflow] unblock_policy` setting.
    #[must_use]
    pub const fn from_config(config: &WorklinkConfig) -> Self {
        Self::new(config.workflow.unblock_policy)
    }

    #[must_use]
    pub const fn policy(&self) -> UnblockPolicy {
        self.policy
    }

    /// Explicitly move `id` to `status`.
    ///
    /// Setting the current status is a no-op. Any manual change clears
    /// `blockedReason`, including a manual move into `blocked`. Moving to
    /// `done` releases the units this one was blocking.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotFound`] if `id` is unknown.
    pub fn set_status(
        &self,
        dataset: &mut WorkUnitDataset,
        id: &str,
        status: Status,
    ) -> Result<Vec<StatusChange>, GraphError> {
        let at = Utc::now();
        let from = dataset.require(id)?.status;
        if !dataset.change_status(id, status, at)? {
            return Ok(Vec::new());
        }
        dataset.require_mut(id)?.blocked_reason = None;
        info!(unit = id, %from, to = %status, "status changed");

        let mut changes = vec![StatusChange {
            id: id.to_string(),
            from,
            to: status,
            cause: TransitionCause::Manual,
        }];
        if status.is_done() {
            changes.extend(self.release_blocked(dataset, id, at)?);
        }
        Ok(changes)
    }

    /// React to a new `blocker → target` edge.
    ///
    /// Moves `target` to `blocked` unless `blocker` is done or `target` is
    /// already blocked. An existing reason is kept; a manually blocked unit
    /// without one gets this blocker as its reason.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotFound`] if either unit is unknown.
    pub fn on_blocked_by_added(
        &self,
        dataset: &mut WorkUnitDataset,
        target: &str,
        blocker: &str,
    ) -> Result<Option<StatusChange>, GraphError> {
        self.block(dataset, target, blocker, Utc::now())
    }

    pub(crate) fn block(
        &self,
        dataset: &mut WorkUnitDataset,
        target: &str,
        blocker: &str,
        at: Timestamp,
    ) -> Result<Option<StatusChange>, GraphError> {
        if dataset.require(blocker)?.is_done() {
            return Ok(None);
        }
        let from = dataset.require(target)?.status;
        if !dataset.change_status(target, Status::Blocked, at)? {
            // Already blocked: fill in a reason only when none is recorded.
            let unit = dataset.require_mut(target)?;
            if unit.blocked_reason.is_none() {
                unit.blocked_reason = Some(format!("Blocked by {blocker}"));
                debug!(unit = target, blocker, "reason recorded on blocked unit");
            }
            return Ok(None);
        }
        dataset.require_mut(target)?.blocked_reason = Some(format!("Blocked by {blocker}"));
        debug!(unit = target, blocker, %from, "unit blocked");

        Ok(Some(StatusChange {
            id: target.to_string(),
            from,
            to: Status::Blocked,
            cause: TransitionCause::BlockerAdded {
                blocker: blocker.to_string(),
            },
        }))
    }

    /// React to `id` becoming done: release the units it was blocking.
    ///
    /// Only units currently `blocked` are considered; a unit manually moved
    /// elsewhere is never regressed to `backlog`.
    ///
    /// # Errors
    ///
    /// [`GraphError::NotFound`] if `id` is unknown.
    pub fn on_completed(
        &self,
        dataset: &mut WorkUnitDataset,
        id: &str,
    ) -> Result<Vec<StatusChange>, GraphError> {
        dataset.require(id)?;
        self.release_blocked(dataset, id, Utc::now())
    }

    fn release_blocked(
        &self,
        dataset: &mut WorkUnitDataset,
        completed: &str,
        at: Timestamp,
    ) -> Result<Vec<StatusChange>, GraphError> {
        let candidates: Vec<String> = dataset
            .units()
            .filter(|unit| unit.is_blocked())
            .filter(|unit| unit.relationships.blocked_by.iter().any(|b| b == completed))
            .filter(|unit| self.may_release(dataset, &unit.relationships.blocked_by))
            .map(|unit| unit.id.clone())
            .collect();

        let mut changes = Vec::with_capacity(candidates.len());
        for id in candidates {
            if dataset.change_status(&id, Status::Backlog, at)? {
                dataset.require_mut(&id)?.blocked_reason = None;
                debug!(unit = %id, blocker = completed, "unit unblocked");
                changes.push(StatusChange {
                    id,
                    from: Status::Blocked,
                    to: Status::Backlog,
                    cause: TransitionCause::BlockerCompleted {
                        blocker: completed.to_string(),
                    },
                });
            }
        }
        Ok(changes)
    }

    /// Blockers missing from the dataset do not hold a unit back.
    fn may_release(&self, dataset: &WorkUnitDataset, blockers: &[String]) -> bool {
        match self.policy {
            UnblockPolicy::AnyBlockerDone => true,
            UnblockPolicy::AllBlockersDone => blockers
                .iter()
                .filter_map(|b| dataset.get(b))
                .all(|b| b.is_done()),
        }
    }
}
