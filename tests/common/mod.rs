//! Shared helpers for integration tests.

#![allow(dead_code)]

use source_dpor::config::LabConfig;
use source_dpor::lab::{Instr, LabRunner, LabState, Program};
use std::collections::BTreeSet;
use std::sync::Once;

static INIT_LOGGING: Once = Once::new();

/// Installs a test subscriber once. `RUST_LOG` overrides the default filter.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("source_dpor=info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Logs the start of a test.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        tracing::info!(test = %$name, "=== test start ===");
    };
}

/// Logs a named section within a test.
#[macro_export]
macro_rules! test_section {
    ($name:expr) => {
        tracing::info!(section = %$name, "--- section ---");
    };
}

/// Logs the end of a test.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        tracing::info!(test = %$name, "=== test complete ===");
    };
}

/// Two threads that each write one variable and read the other.
pub fn store_buffer() -> Program {
    Program::new()
        .thread([Instr::write("x", 1), Instr::read("y")])
        .thread([Instr::write("y", 1), Instr::read("x")])
}

/// Runs a single round over `program` and returns the terminal states found.
pub fn explore_once(program: &Program, config: LabConfig) -> BTreeSet<LabState> {
    let mut runner = LabRunner::new(program.clone(), config);
    runner
        .run_round()
        .expect("lab oracles never fail")
        .terminal_states
}
