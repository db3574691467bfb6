//! Core types for the exploration controller.
//!
//! - [`id`]: Identifier types (`ProcessId`, `NodeId`, `StateId`, `LockId`)

pub mod id;

pub use id::{LockId, NodeId, ProcessId, StateId};
