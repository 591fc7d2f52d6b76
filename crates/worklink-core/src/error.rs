use std::fmt;

use crate::model::RelationshipKind;
use crate::store::StoreError;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    UnitNotFound,
    SelfReference,
    RelationshipExists,
    CycleDetected,
    BlocksOtherWork,
    DuplicateUnit,
    InvalidEnumValue,
    StoreReadFailed,
    StoreWriteFailed,
    LockContention,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1002",
            Self::UnitNotFound => "E2001",
            Self::SelfReference => "E2002",
            Self::CycleDetected => "E2003",
            Self::RelationshipExists => "E2004",
            Self::InvalidEnumValue => "E2005",
            Self::BlocksOtherWork => "E2006",
            Self::DuplicateUnit => "E2007",
            Self::StoreReadFailed => "E3001",
            Self::StoreWriteFailed => "E5001",
            Self::LockContention => "E5002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::UnitNotFound => "Work unit not found",
            Self::SelfReference => "Work unit cannot reference itself",
            Self::RelationshipExists => "Relationship already exists",
            Self::CycleDetected => "Cycle would be created",
            Self::BlocksOtherWork => "Work unit blocks other work",
            Self::DuplicateUnit => "Work unit id already in use",
            Self::InvalidEnumValue => "Invalid status/relationship value",
            Self::StoreReadFailed => "Work-unit document could not be read",
            Self::StoreWriteFailed => "Work-unit document write failed",
            Self::LockContention => "Lock contention",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .worklink/config.toml and retry."),
            Self::UnitNotFound | Self::DuplicateUnit => None,
            Self::SelfReference => Some("Pick a different target work unit."),
            Self::RelationshipExists => Some("The link is already recorded; nothing to do."),
            Self::CycleDetected => {
                Some("Remove/adjust blocking links to keep the graph acyclic.")
            }
            Self::BlocksOtherWork => Some(
                "Retry with cascade enabled, or remove the blocking links first.",
            ),
            Self::InvalidEnumValue => {
                Some("Use one of the documented status or relationship values.")
            }
            Self::StoreReadFailed => {
                Some("Check that the work-unit document is valid JSON.")
            }
            Self::StoreWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => {
                Some("Retry after the other process releases its lock.")
            }
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Domain errors raised by graph mutations, transitions and deletion.
///
/// Every variant is raised before the dataset is touched, so a failed
/// operation leaves the snapshot exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("work unit '{id}' not found")]
    NotFound { id: String },

    #[error("work unit '{id}' cannot have a relationship with itself")]
    SelfReference { id: String },

    #[error("work unit '{unit}' already has relationship '{kind}' to '{target}'")]
    AlreadyExists {
        unit: String,
        kind: RelationshipKind,
        target: String,
    },

    #[error("cycle detected: {}", .path.join(" → "))]
    CycleDetected { path: Vec<String> },

    #[error(
        "work unit '{id}' blocks other work ({}); delete with cascade or remove the blocking links first",
        .blocked_ids.join(", ")
    )]
    BlocksOtherWork { id: String, blocked_ids: Vec<String> },

    #[error("work unit '{id}' already exists")]
    DuplicateUnit { id: String },
}

impl GraphError {
    pub(crate) fn not_found(id: &str) -> Self {
        Self::NotFound { id: id.to_string() }
    }

    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::UnitNotFound,
            Self::SelfReference { .. } => ErrorCode::SelfReference,
            Self::AlreadyExists { .. } => ErrorCode::RelationshipExists,
            Self::CycleDetected { .. } => ErrorCode::CycleDetected,
            Self::BlocksOtherWork { .. } => ErrorCode::BlocksOtherWork,
            Self::DuplicateUnit { .. } => ErrorCode::DuplicateUnit,
        }
    }

    /// Optional remediation hint for operators and agents.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

/// Failure of a load → mutate → save cycle.
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl OperationError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Graph(err) => err.code(),
            Self::Store(err) => err.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorCode, GraphError};
    use crate::model::RelationshipKind;
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::ConfigParseError,
            ErrorCode::UnitNotFound,
            ErrorCode::SelfReference,
            ErrorCode::RelationshipExists,
            ErrorCode::CycleDetected,
            ErrorCode::BlocksOtherWork,
            ErrorCode::DuplicateUnit,
            ErrorCode::InvalidEnumValue,
            ErrorCode::StoreReadFailed,
            ErrorCode::StoreWriteFailed,
            ErrorCode::LockContention,
            ErrorCode::InternalUnexpected,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::CycleDetected.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn cycle_error_renders_arrow_path() {
        let err = GraphError::CycleDetected {
            path: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(err.to_string(), "cycle detected: A → B → A");
        assert_eq!(err.code(), ErrorCode::CycleDetected);
    }

    #[test]
    fn blocks_other_work_mentions_phrase_and_ids() {
        let err = GraphError::BlocksOtherWork {
            id: "AUTH".into(),
            blocked_ids: vec!["API".into(), "UI".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("blocks other work"), "msg: {msg}");
        assert!(msg.contains("API, UI"), "msg: {msg}");
        assert!(err.hint().is_some());
    }

    #[test]
    fn already_exists_names_kind() {
        let err = GraphError::AlreadyExists {
            unit: "A".into(),
            kind: RelationshipKind::BlockedBy,
            target: "B".into(),
        };
        assert!(err.to_string().contains("'blockedBy'"));
    }
}
