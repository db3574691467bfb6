//! Deterministic lab for exercising the explorer.
//!
//! The lab provides a reference set of collaborators:
//!
//! - [`Program`]: straight-line threads over shared variables, mutexes and
//!   atomic blocks, with brute-force enumeration of terminal states
//! - [`LabOracle`]: enabledness, dependency and reversibility for programs
//! - [`LabGraph`]: an arena proof graph with covering and pruning
//! - [`LabRunner`]: the search loop, round by round
//!
//! # Quick Start
//!
//! ```
//! use source_dpor::config::LabConfig;
//! use source_dpor::lab::{Instr, LabRunner, Program};
//!
//! let program = Program::new()
//!     .thread([Instr::write("x", 1)])
//!     .thread([Instr::read("x")]);
//! let mut runner = LabRunner::new(program.clone(), LabConfig::new(42));
//! let report = runner.run_round().expect("lab oracles never fail");
//! assert_eq!(report.terminal_states, program.terminal_states());
//! ```

pub mod graph;
pub mod oracle;
pub mod program;
pub mod runner;

pub use graph::LabGraph;
pub use oracle::LabOracle;
pub use program::{Instr, LabAction, LabState, Program};
pub use runner::{LabRunner, RoundReport};
