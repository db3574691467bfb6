//! Source-DPOR: a dynamic partial-order reduction controller for proof-graph
//! search.
//!
//! # Overview
//!
//! A model checker that builds a proof graph of concurrent program states
//! explores far fewer interleavings when it only executes actions that can
//! lead to genuinely new behavior. This crate provides the component that
//! decides which single action to execute from each state. It tracks
//! reversible races along the current path, maintains backtrack and sleep
//! sets per state, and cooperates with covering (subsumption) of nodes and
//! with abstraction refinement across rounds.
//!
//! # Core Guarantees
//!
//! - **One action at a time**: every node gets at most one successor per
//!   [`next_action`](explore::Explorer::next_action) call
//! - **Race completeness**: every reversible race on the stack leaves a
//!   representative of its reversal in a backtrack set
//! - **Covering safety**: races hidden behind a covering edge are found by
//!   replaying the covering subtree
//! - **Coverage**: without covering, and with every lock and atomic block
//!   released before a thread ends, every reachable terminal state is
//!   reached. A lock still held at the end of a path only forces backtracks
//!   at the frame below its acquisition, so outcomes that need an earlier
//!   independent step reordered can be missed
//! - **Deterministic replay**: all arbitrary choices come from a seeded
//!   choice source, and all sets iterate in a fixed order
//!
//! # Module Structure
//!
//! - [`types`]: Identifier types (processes, nodes, states, locks)
//! - [`action`]: The [`Action`] trait and identity-keyed [`ActionSet`]
//! - [`oracle`]: The [`TransitionOracle`] collaborator (enabledness, dependency)
//! - [`graph`]: The [`ProofGraph`] collaborator (tree structure, covering)
//! - [`explore`]: The [`Explorer`] controller
//! - [`config`]: Explorer and lab configuration
//! - [`stats`]: Exploration counters
//! - [`lab`]: Deterministic lab programs, oracle, graph and search loop
//! - [`util`]: Deterministic RNG and entropy sources
//! - [`error`](mod@error): Error types
//!
//! # Example
//!
//! ```
//! use source_dpor::config::LabConfig;
//! use source_dpor::lab::{Instr, LabRunner, Program};
//!
//! let program = Program::new()
//!     .thread([Instr::write("x", 1), Instr::read("y")])
//!     .thread([Instr::write("y", 1), Instr::read("x")]);
//! let mut runner = LabRunner::new(program.clone(), LabConfig::new(7));
//! let report = runner.run_round().expect("lab oracles never fail");
//! assert_eq!(report.terminal_states, program.terminal_states());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

pub mod action;
pub mod config;
pub mod error;
pub mod explore;
pub mod graph;
pub mod lab;
pub mod oracle;
pub mod stats;
mod tracing_compat;
pub mod types;
pub mod util;

pub use action::{Action, ActionKey, ActionSet};
pub use config::{ExplorerConfig, LabConfig};
pub use error::{ExploreError, ExploreResult};
pub use explore::Explorer;
pub use graph::ProofGraph;
pub use oracle::TransitionOracle;
pub use stats::ExplorationStats;
pub use types::{LockId, NodeId, ProcessId, StateId};
