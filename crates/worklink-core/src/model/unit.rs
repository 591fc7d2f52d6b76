use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{Relationships, Status, Timestamp};

/// One entry of a unit's append-only status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateHistoryEntry {
    pub state: Status,
    pub timestamp: Timestamp,
}

/// A single tracked unit of work.
///
/// Relationship lists are flattened into the unit object on the wire, so a
/// persisted unit reads `{"id": "A", "blocks": ["B"], ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkUnit {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(flatten)]
    pub relationships: Relationships,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimate: Option<f64>,
    #[serde(default)]
    pub state_history: Vec<StateHistoryEntry>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl WorkUnit {
    /// Fresh unit in `backlog` with no relationships, stamped now.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new_at(id, title, Utc::now())
    }

    /// Fresh unit stamped with an explicit creation time.
    #[must_use]
    pub fn new_at(id: impl Into<String>, title: impl Into<String>, at: Timestamp) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            status: Status::Backlog,
            relationships: Relationships::default(),
            blocked_reason: None,
            estimate: None,
            state_history: vec![StateHistoryEntry {
                state: Status::Backlog,
                timestamp: at,
            }],
            created_at: at,
            updated_at: at,
        }
    }

    #[must_use]
    pub fn with_estimate(mut self, estimate: f64) -> Self {
        self.estimate = Some(estimate);
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub const fn is_blocked(&self) -> bool {
        matches!(self.status, Status::Blocked)
    }

    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.status.is_done()
    }

    /// Estimate used by path weighting; missing or negative estimates count as zero.
    #[must_use]
    pub fn weight(&self) -> f64 {
        self.estimate.filter(|e| e.is_finite() && *e > 0.0).unwrap_or(0.0)
    }

    /// Record a status change. Returns `false` when `status` is already current.
    ///
    /// Does not touch `blocked_reason` or the states index; callers own both.
    pub(crate) fn record_status(&mut self, status: Status, at: Timestamp) -> bool {
        if self.status == status {
            return false;
        }
        self.status = status;
        self.state_history.push(StateHistoryEntry {
            state: status,
            timestamp: at,
        });
        self.updated_at = at;
        true
    }

    pub(crate) const fn touch(&mut self, at: Timestamp) {
        self.updated_at = at;
    }
}
