//! Graph-level views over the work-unit dataset.
//!
//! ## Submodules
//!
//! - [`index`]: read-only adjacency view of the blocking graph.
//! - [`cycles`]: cycle guard for new blocking edges and whole-graph cycle
//!   inspection.

pub mod cycles;
pub mod index;

pub use cycles::{CyclePath, can_add_blocking_edge, find_all_cycles, find_cycle, has_cycles};
pub use index::GraphIndex;
