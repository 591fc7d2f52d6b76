#![forbid(unsafe_code)]
//! worklink-triage library.
//!
//! Read-only analytics over a [`worklink_core::WorkUnitDataset`]: impact of
//! completing a unit, ready work, blocking chains, the critical path between
//! two units, aggregate statistics, and diagram export.
//!
//! # Conventions
//!
//! - **Errors**: lookups return `worklink_core::error::GraphError`; graph
//!   builds and file export use `anyhow::Result` (downcast to `GraphError`
//!   for domain failures).
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod chain;
pub mod export;
pub mod graph;
pub mod impact;

pub use chain::{ChainReport, chain};
pub use export::{DiagramFormat, export_diagram, render_diagram};
pub use graph::{BlockingDag, CriticalPath, GraphStats, critical_path, stats};
pub use impact::{ImpactReport, impact, ready_work};
