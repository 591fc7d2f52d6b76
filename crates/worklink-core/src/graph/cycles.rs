//! Cycle guard for the blocking graph.
//!
//! # Overview
//!
//! The blocking graph must stay acyclic: a unit inside a loop would wait on
//! itself forever. [`can_add_blocking_edge`] is consulted before any blocking
//! edge is written and rejects the edge when it would close a loop.
//!
//! # Design
//!
//! - **BFS from the target**: adding `source → target` closes a cycle iff
//!   `target` already reaches `source`. The search explores successors in
//!   ascending id order, so the reported path is a shortest one and, among
//!   those, the first found in id order.
//! - **Reject, don't warn**: a rejected edge is never written.
//! - **O(V+E)**: each node and edge is visited at most once.
//!
//! [`find_cycle`], [`find_all_cycles`] and [`has_cycles`] inspect an existing
//! graph, which can only be cyclic when the document was edited by hand or
//! drifted.

#![allow(
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::missing_const_for_fn,
    clippy::doc_markdown
)]

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt;

use super::index::GraphIndex;
use crate::error::GraphError;

// ---------------------------------------------------------------------------
// CyclePath
// ---------------------------------------------------------------------------

/// An ordered loop of unit ids, first id repeated at the end.
///
/// For a rejected edge `source → target` the path runs from `target` along
/// existing edges to `source`, then back to `target`: adding `D blocks A` on
/// top of `A → B → C → D` yields `["A", "B", "C", "D", "A"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CyclePath {
    pub path: Vec<String>,
}

impl CyclePath {
    /// Number of distinct units in the loop.
    pub fn cycle_len(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    pub fn is_self_loop(&self) -> bool {
        self.cycle_len() == 1
    }

    /// Two units blocking each other.
    pub fn is_mutual_block(&self) -> bool {
        self.cycle_len() == 2
    }

    pub fn members(&self) -> &[String] {
        let end = self.path.len().saturating_sub(1);
        &self.path[..end]
    }
}

impl fmt::Display for CyclePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path.join(" → "))
    }
}

impl From<CyclePath> for GraphError {
    fn from(cycle: CyclePath) -> Self {
        Self::CycleDetected { path: cycle.path }
    }
}

// ---------------------------------------------------------------------------
// Guard
// ---------------------------------------------------------------------------

/// Decide whether `source blocks target` can be added without closing a loop.
///
/// Returns the loop the edge would close on rejection. Both `blocks` and
/// `blockedBy` declarations are checked here after normalization to the
/// canonical `blocker → blocked` direction.
///
/// # Errors
///
/// Returns the [`CyclePath`] `target → … → source → target` when `target`
/// already reaches `source`, or `[source, source]` for a self-loop.
pub fn can_add_blocking_edge(
    index: &GraphIndex,
    source: &str,
    target: &str,
) -> Result<(), CyclePath> {
    if source == target {
        return Err(CyclePath {
            path: vec![source.to_string(), source.to_string()],
        });
    }

    match shortest_path(index, target, source) {
        Some(mut path) => {
            path.push(target.to_string());
            Err(CyclePath { path })
        }
        None => Ok(()),
    }
}

/// BFS shortest path `from → … → to` over blocking edges.
pub fn shortest_path(index: &GraphIndex, from: &str, to: &str) -> Option<Vec<String>> {
    let mut parent: HashMap<&str, &str> = HashMap::new();
    let mut visited: HashSet<&str> = HashSet::from([from]);
    let mut queue: VecDeque<&str> = VecDeque::from([from]);

    while let Some(current) = queue.pop_front() {
        if current == to {
            let mut path = vec![current.to_string()];
            let mut cursor = current;
            while let Some(&prev) = parent.get(cursor) {
                path.push(prev.to_string());
                cursor = prev;
            }
            path.reverse();
            return Some(path);
        }

        for next in index.successors(current) {
            if visited.insert(next) {
                parent.insert(next, current);
                queue.push_back(next);
            }
        }
    }

    None
}

// ---------------------------------------------------------------------------
// Whole-graph inspection
// ---------------------------------------------------------------------------

/// DFS colors for cycle detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Not yet visited.
    White,
    /// On the DFS stack.
    Gray,
    /// Fully processed.
    Black,
}

/// First cycle found by a DFS in ascending id order, if any.
pub fn find_cycle(index: &GraphIndex) -> Option<CyclePath> {
    let mut found = Vec::new();
    walk(index, &mut found, true);
    found.into_iter().next()
}

/// One cycle per back edge found by a DFS in ascending id order.
///
/// Every cyclic strongly connected region contributes at least one entry;
/// overlapping loops may be reported once each.
pub fn find_all_cycles(index: &GraphIndex) -> Vec<CyclePath> {
    let mut found = Vec::new();
    walk(index, &mut found, false);
    found
}

pub fn has_cycles(index: &GraphIndex) -> bool {
    find_cycle(index).is_some()
}

fn walk(index: &GraphIndex, found: &mut Vec<CyclePath>, stop_at_first: bool) {
    let mut color: BTreeMap<&str, Color> = index.nodes().map(|n| (n, Color::White)).collect();
    let mut parent: HashMap<&str, &str> = HashMap::new();

    for start in index.nodes() {
        if color.get(start) == Some(&Color::White) {
            dfs(index, start, &mut color, &mut parent, found, stop_at_first);
            if stop_at_first && !found.is_empty() {
                return;
            }
        }
    }
}

fn dfs<'a>(
    index: &'a GraphIndex,
    node: &'a str,
    color: &mut BTreeMap<&'a str, Color>,
    parent: &mut HashMap<&'a str, &'a str>,
    found: &mut Vec<CyclePath>,
    stop_at_first: bool,
) {
    color.insert(node, Color::Gray);

    for next in index.successors(node) {
        match color.get(next) {
            Some(Color::White) => {
                parent.insert(next, node);
                dfs(index, next, color, parent, found, stop_at_first);
            }
            Some(Color::Gray) => {
                // Back edge node → next: next is on the stack, walk parents
                // from node back up to it.
                let mut path = vec![node.to_string()];
                let mut cursor = node;
                while cursor != next {
                    match parent.get(cursor) {
                        Some(&prev) => {
                            cursor = prev;
                            path.push(cursor.to_string());
                        }
                        None => break,
                    }
                }
                path.reverse();
                path.push(next.to_string());
                found.push(CyclePath { path });
            }
            _ => {}
        }
        if stop_at_first && !found.is_empty() {
            return;
        }
    }

    color.insert(node, Color::Black);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
