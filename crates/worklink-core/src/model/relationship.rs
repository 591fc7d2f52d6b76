//! Relationship kinds and the per-unit relationship lists.
//!
//! # Edge Direction
//!
//! A blocking edge `A → B` means "A **blocks** B": B cannot proceed until A
//! is done. It is recorded twice, as `B ∈ A.blocks` and `A ∈ B.blockedBy`.
//! Declaring either side names the same directed edge; [`BlockingEdge`] is the
//! canonical form both declarations normalize to.
//!
//! `dependsOn` and `relatesTo` are advisory and recorded only on the
//! declaring unit.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::normalize;
use super::status::ParseEnumError;

/// The four relationship kinds a work unit can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationshipKind {
    Blocks,
    BlockedBy,
    DependsOn,
    RelatesTo,
}

impl RelationshipKind {
    pub const ALL: [Self; 4] = [Self::Blocks, Self::BlockedBy, Self::DependsOn, Self::RelatesTo];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blocks => "blocks",
            Self::BlockedBy => "blockedBy",
            Self::DependsOn => "dependsOn",
            Self::RelatesTo => "relatesTo",
        }
    }

    /// `true` for the two kinds that describe a blocking edge.
    #[must_use]
    pub const fn is_blocking(self) -> bool {
        matches!(self, Self::Blocks | Self::BlockedBy)
    }

    /// The kind recorded on the counterpart unit, if this kind is mirrored.
    #[must_use]
    pub const fn mirror(self) -> Option<Self> {
        match self {
            Self::Blocks => Some(Self::BlockedBy),
            Self::BlockedBy => Some(Self::Blocks),
            Self::DependsOn | Self::RelatesTo => None,
        }
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "blocks" => Ok(Self::Blocks),
            "blockedby" => Ok(Self::BlockedBy),
            "dependson" => Ok(Self::DependsOn),
            "relatesto" => Ok(Self::RelatesTo),
            _ => Err(ParseEnumError {
                expected: "relationship kind",
                got: s.to_string(),
            }),
        }
    }
}

/// Canonical form of a blocking relationship: `blocker → blocked`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockingEdge {
    pub blocker: String,
    pub blocked: String,
}

impl BlockingEdge {
    #[must_use]
    pub fn new(blocker: impl Into<String>, blocked: impl Into<String>) -> Self {
        Self {
            blocker: blocker.into(),
            blocked: blocked.into(),
        }
    }

    /// Normalize `unit <kind> target` to the canonical edge.
    ///
    /// Returns `None` for non-blocking kinds.
    #[must_use]
    pub fn from_declaration(unit: &str, kind: RelationshipKind, target: &str) -> Option<Self> {
        match kind {
            RelationshipKind::Blocks => Some(Self::new(unit, target)),
            RelationshipKind::BlockedBy => Some(Self::new(target, unit)),
            RelationshipKind::DependsOn | RelationshipKind::RelatesTo => None,
        }
    }
}

impl fmt::Display for BlockingEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} blocks {}", self.blocker, self.blocked)
    }
}

/// Relationship lists held by one work unit.
///
/// Each list is duplicate-free and keeps insertion order; the first entry of
/// `blocks` is what chain analysis follows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationships {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocked_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relates_to: Vec<String>,
}

impl Relationships {
    #[must_use]
    pub fn get(&self, kind: RelationshipKind) -> &[String] {
        match kind {
            RelationshipKind::Blocks => &self.blocks,
            RelationshipKind::BlockedBy => &self.blocked_by,
            RelationshipKind::DependsOn => &self.depends_on,
            RelationshipKind::RelatesTo => &self.relates_to,
        }
    }

    fn get_mut(&mut self, kind: RelationshipKind) -> &mut Vec<String> {
        match kind {
            RelationshipKind::Blocks => &mut self.blocks,
            RelationshipKind::BlockedBy => &mut self.blocked_by,
            RelationshipKind::DependsOn => &mut self.depends_on,
            RelationshipKind::RelatesTo => &mut self.relates_to,
        }
    }

    #[must_use]
    pub fn contains(&self, kind: RelationshipKind, id: &str) -> bool {
        self.get(kind).iter().any(|existing| existing == id)
    }

    /// Append `id` to the `kind` list. Returns `false` if it was already there.
    pub fn insert(&mut self, kind: RelationshipKind, id: &str) -> bool {
        if self.contains(kind, id) {
            return false;
        }
        self.get_mut(kind).push(id.to_string());
        true
    }

    /// Remove `id` from the `kind` list. Returns `false` if it was absent.
    pub fn remove(&mut self, kind: RelationshipKind, id: &str) -> bool {
        let list = self.get_mut(kind);
        let before = list.len();
        list.retain(|existing| existing != id);
        list.len() != before
    }

    /// Remove `id` from every list, returning how many entries were dropped.
    pub fn remove_everywhere(&mut self, id: &str) -> usize {
        RelationshipKind::ALL
            .into_iter()
            .filter(|&kind| self.remove(kind, id))
            .count()
    }

    /// Empty all four lists, returning the entries that were removed.
    pub fn take_all(&mut self) -> Vec<(RelationshipKind, String)> {
        let mut removed = Vec::new();
        for kind in RelationshipKind::ALL {
            removed.extend(self.get_mut(kind).drain(..).map(|id| (kind, id)));
        }
        removed
    }

    /// Iterate over every `(kind, target)` pair in kind order.
    pub fn iter(&self) -> impl Iterator<Item = (RelationshipKind, &str)> {
        RelationshipKind::ALL
            .into_iter()
            .flat_map(move |kind| self.get(kind).iter().map(move |id| (kind, id.as_str())))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        RelationshipKind::ALL
            .into_iter()
            .all(|kind| self.get(kind).is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_json_uses_camel_case() {
        assert_eq!(
            serde_json::to_string(&RelationshipKind::BlockedBy).expect("serialize"),
            "\"blockedBy\""
        );
        assert_eq!(
            serde_json::from_str::<RelationshipKind>("\"relatesTo\"").expect("deserialize"),
            RelationshipKind::RelatesTo
        );
    }

    #[test]
    fn kind_parse_accepts_cli_spellings() {
        for raw in ["blockedBy", "blocked-by", "blocked_by", "BLOCKEDBY"] {
            assert_eq!(raw.parse::<RelationshipKind>(), Ok(RelationshipKind::BlockedBy));
        }
        assert!("parent".parse::<RelationshipKind>().is_err());
    }

    #[test]
    fn only_blocking_kinds_are_mirrored() {
        assert_eq!(RelationshipKind::Blocks.mirror(), Some(RelationshipKind::BlockedBy));
        assert_eq!(RelationshipKind::BlockedBy.mirror(), Some(RelationshipKind::Blocks));
        assert_eq!(RelationshipKind::DependsOn.mirror(), None);
        assert_eq!(RelationshipKind::RelatesTo.mirror(), None);
    }

    #[test]
    fn both_declarations_normalize_to_same_edge() {
        let forward = BlockingEdge::from_declaration("A", RelationshipKind::Blocks, "B");
        let mirrored = BlockingEdge::from_declaration("B", RelationshipKind::BlockedBy, "A");
        assert_eq!(forward, mirrored);
        assert_eq!(forward, Some(BlockingEdge::new("A", "B")));
        assert!(BlockingEdge::from_declaration("A", RelationshipKind::DependsOn, "B").is_none());
    }

    #[test]
    fn insert_is_duplicate_free_and_ordered() {
        let mut rel = Relationships::default();
        assert!(rel.insert(RelationshipKind::Blocks, "B"));
        assert!(rel.insert(RelationshipKind::Blocks, "C"));
        assert!(!rel.insert(RelationshipKind::Blocks, "B"));
        assert_eq!(rel.blocks, vec!["B".to_string(), "C".to_string()]);
    }

    #[test]
    fn remove_reports_presence() {
        let mut rel = Relationships::default();
        rel.insert(RelationshipKind::DependsOn, "X");
        assert!(rel.remove(RelationshipKind::DependsOn, "X"));
        assert!(!rel.remove(RelationshipKind::DependsOn, "X"));
        assert!(rel.is_empty());
    }

    #[test]
    fn remove_everywhere_counts_each_list() {
        let mut rel = Relationships::default();
        rel.insert(RelationshipKind::Blocks, "X");
        rel.insert(RelationshipKind::RelatesTo, "X");
        rel.insert(RelationshipKind::RelatesTo, "Y");
        assert_eq!(rel.remove_everywhere("X"), 2);
        assert_eq!(rel.relates_to, vec!["Y".to_string()]);
    }

    #[test]
    fn take_all_drains_every_kind() {
        let mut rel = Relationships::default();
        rel.insert(RelationshipKind::Blocks, "B");
        rel.insert(RelationshipKind::DependsOn, "D");
        let removed = rel.take_all();
        assert_eq!(
            removed,
            vec![
                (RelationshipKind::Blocks, "B".to_string()),
                (RelationshipKind::DependsOn, "D".to_string()),
            ]
        );
        assert!(rel.is_empty());
    }

    #[test]
    fn empty_lists_are_omitted_from_json() {
        let mut rel = Relationships::default();
        rel.insert(RelationshipKind::BlockedBy, "A");
        let json = serde_json::to_value(&rel).expect("serialize");
        assert_eq!(json, serde_json::json!({ "blockedBy": ["A"] }));

        let parsed: Relationships = serde_json::from_str("{}").expect("deserialize");
        assert!(parsed.is_empty());
    }
}
