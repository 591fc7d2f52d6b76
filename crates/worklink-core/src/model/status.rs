use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::normalize;

/// The seven lifecycle states a work unit can be in.
///
/// The order is the usual forward flow of the workflow, with `blocked` last.
/// It is not enforced: any explicit transition between declared states is
/// allowed.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Backlog,
    Specifying,
    Testing,
    Implementing,
    Validating,
    Done,
    Blocked,
}

impl Status {
    /// Every declared state, in workflow order.
    pub const ALL: [Self; 7] = [
        Self::Backlog,
        Self::Specifying,
        Self::Testing,
        Self::Implementing,
        Self::Validating,
        Self::Done,
        Self::Blocked,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::Specifying => "specifying",
            Self::Testing => "testing",
            Self::Implementing => "implementing",
            Self::Validating => "validating",
            Self::Done => "done",
            Self::Blocked => "blocked",
        }
    }

    #[must_use]
    pub const fn is_done(self) -> bool {
        matches!(self, Self::Done)
    }
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ParseEnumError {
                expected: "status",
                got: s.to_string(),
            })
    }
}
