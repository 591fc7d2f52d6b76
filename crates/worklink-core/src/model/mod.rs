//! Work-unit data model: lifecycle status, relationship kinds and the
//! persisted unit record.

pub mod relationship;
pub mod status;
pub mod unit;

pub use relationship::{BlockingEdge, RelationshipKind, Relationships};
pub use status::{ParseEnumError, Status};
pub use unit::{StateHistoryEntry, WorkUnit};

/// Timestamp type used for history entries and audit fields.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

pub(crate) fn normalize(input: &str) -> String {
    input
        .trim()
        .chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}
