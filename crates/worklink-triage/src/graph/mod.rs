//! Blocking-graph analytics.
//!
//! ## Pipeline
//!
//! ```text
//! WorkUnitDataset
//!        ↓  worklink_core::graph::GraphIndex::from_dataset()
//! GraphIndex (sorted adjacency, dangling ids dropped)
//!        ↓  build::BlockingDag::from_index()      (refuses cycles)
//! BlockingDag (petgraph DiGraph + topological order)
//!        ↓  critical_path::critical_path()
//! CriticalPath { path, total }
//! ```
//!
//! [`stats::GraphStats`] reads the dataset and index directly and works on
//! drifted documents too.
//!
//! ## Typical Usage
//!
//! ```rust,ignore
//! use worklink_triage::graph::{critical_path, stats};
//!
//! let cp = critical_path(&dataset, "AUTH", "DEPLOY")?;
//! let s = stats(&dataset);
//! println!("units={} edges={} density={:.3}", s.total_units, s.blocking_edges, s.density);
//! ```

pub mod build;
pub mod critical_path;
pub mod stats;

pub use build::BlockingDag;
pub use critical_path::{CriticalPath, critical_path};
pub use stats::{GraphStats, stats};
