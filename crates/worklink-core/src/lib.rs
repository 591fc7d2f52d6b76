#![forbid(unsafe_code)]
//! worklink-core library.
//!
//! Work units, the blocking graph between them, and the invariants kept on
//! that graph: mirrored blocking edges, acyclicity, automatic block/unblock
//! transitions, and consistency repair. Every operation is a pure transform
//! over one [`WorkUnitDataset`] snapshot; persistence goes through a
//! [`Store`].
//!
//! # Conventions
//!
//! - **Errors**: domain failures are [`GraphError`] with a stable
//!   [`ErrorCode`]; config loading uses `anyhow::Result`.
//! - **Logging**: use `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod config;
pub mod consistency;
pub mod dataset;
pub mod deletion;
pub mod error;
pub mod graph;
pub mod lock;
pub mod model;
pub mod relationships;
pub mod store;
pub mod telemetry;
pub mod transitions;

pub use dataset::WorkUnitDataset;
pub use deletion::{DeleteOptions, delete_work_unit};
pub use error::{ErrorCode, GraphError, OperationError};
pub use model::{RelationshipKind, Status, WorkUnit};
pub use relationships::{add_relationship, add_relationships, clear_relationships, remove_relationship};
pub use store::{JsonFileStore, MemoryStore, Store, StoreError};
pub use transitions::{StatusChange, TransitionEngine, UnblockPolicy};
