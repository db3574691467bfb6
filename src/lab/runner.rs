//! The pull loop of a search engine, driving an [`Explorer`] over a lab
//! program.
//!
//! Each round clears the explorer, adds the root, and then repeatedly asks
//! whether work is left, takes the current node, optionally covers it by an
//! earlier node with the same state, and otherwise executes the single
//! action the explorer offers. Nodes created in earlier rounds are reused,
//! so a later round replays them lazily instead of re-executing them.

use super::graph::LabGraph;
use super::oracle::LabOracle;
use super::program::{LabAction, LabState, Program};
use crate::config::LabConfig;
use crate::error::ExploreResult;
use crate::explore::Explorer;
use crate::graph::ProofGraph;
use crate::oracle::TransitionOracle;
use crate::stats::ExplorationStats;
use crate::tracing_compat::{debug, info, warn};
use crate::types::NodeId;
use serde::Serialize;
use std::collections::BTreeSet;
use std::convert::Infallible;

/// Outcome of one exploration round.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RoundReport {
    /// Round number, starting at 1.
    pub round: u64,
    /// Nodes expanded by executing an offered action or finding none.
    pub expansions: usize,
    /// Nodes created this round.
    pub new_nodes: usize,
    /// Nodes covered by an earlier node this round.
    pub covered: usize,
    /// Non-terminal nodes left with nothing offerable.
    pub sleep_blocked: usize,
    /// True if the round stopped at the expansion bound.
    pub truncated: bool,
    /// Terminal states present in the live graph after the round.
    pub terminal_states: BTreeSet<LabState>,
    /// Explorer counters after the round.
    pub stats: ExplorationStats,
}

/// Drives exploration of a lab program, round by round.
#[derive(Debug)]
pub struct LabRunner {
    explorer: Explorer<LabOracle>,
    graph: LabGraph,
    config: LabConfig,
    executed: Vec<LabAction>,
}

impl LabRunner {
    /// Runner over `program` with a graph holding only the initial state.
    #[must_use]
    pub fn new(program: Program, config: LabConfig) -> Self {
        let graph = LabGraph::new(program.initial_state());
        Self {
            explorer: Explorer::new(LabOracle::new(program), config.explorer),
            graph,
            config,
            executed: Vec::new(),
        }
    }

    /// The explorer.
    #[must_use]
    pub const fn explorer(&self) -> &Explorer<LabOracle> {
        &self.explorer
    }

    /// The proof graph.
    #[must_use]
    pub const fn graph(&self) -> &LabGraph {
        &self.graph
    }

    /// Every action executed so far, in order. Lazy replays are not
    /// executions and do not appear.
    #[must_use]
    pub fn executed(&self) -> &[LabAction] {
        &self.executed
    }

    /// Refines (or coarsens) the variable precision for later rounds.
    pub fn set_precision(&mut self, vars: Option<BTreeSet<String>>) {
        self.explorer.oracle_mut().set_precision(vars);
    }

    /// Detaches the subtree at `node`, as abstraction refinement would.
    pub fn prune(&mut self, node: NodeId) {
        self.graph.prune(node);
    }

    /// Runs one exploration round to completion or to the expansion bound.
    pub fn run_round(&mut self) -> ExploreResult<RoundReport, Infallible> {
        let mut report = RoundReport::default();
        self.explorer.clear();
        self.explorer.add(&self.graph, self.graph.root())?;

        while !self.explorer.is_empty(&self.graph)? {
            if report.expansions >= self.config.max_expansions {
                warn!(
                    max_expansions = self.config.max_expansions,
                    "expansion bound reached, round truncated"
                );
                report.truncated = true;
                break;
            }
            let node = self.explorer.remove(&self.graph)?;
            if self.config.covering && self.try_cover(node) {
                report.covered += 1;
                continue;
            }
            report.expansions += 1;
            self.expand(node, &mut report)?;
        }

        report.round = self.explorer.stats().rounds;
        report.terminal_states = self.terminal_states();
        report.stats = *self.explorer.stats();
        info!(
            round = report.round,
            expansions = report.expansions,
            new_nodes = report.new_nodes,
            terminals = report.terminal_states.len(),
            "exploration round finished"
        );
        Ok(report)
    }

    /// Terminal states of the live graph.
    #[must_use]
    pub fn terminal_states(&self) -> BTreeSet<LabState> {
        let program = self.explorer.oracle().program();
        self.graph
            .leaves()
            .map(|leaf| self.graph.state(leaf))
            .filter(|state| program.enabled(state).is_empty())
            .cloned()
            .collect()
    }

    fn expand(&mut self, node: NodeId, report: &mut RoundReport) -> ExploreResult<(), Infallible> {
        let state_id = self.graph.state_id(node);
        let Some(action) = self.explorer.next_action(&self.graph, state_id)? else {
            self.graph.mark_expanded(node);
            if !self.explorer.oracle().enabled_actions(self.graph.state(node))?.is_empty() {
                report.sleep_blocked += 1;
            }
            return Ok(());
        };

        let child = if let Some(child) = self.graph.child_with_action(node, &action) {
            child
        } else {
            let next = self
                .explorer
                .oracle()
                .program()
                .step(self.graph.state(node), &action);
            report.new_nodes += 1;
            self.graph.add_child(node, action.clone(), next)
        };
        debug!(node = %node, child = %child, action = %action, "executed action");
        self.graph.mark_expanded(node);
        self.executed.push(action);
        self.explorer.add(&self.graph, child)?;
        Ok(())
    }

    /// Covers a fresh leaf by an earlier expanded node with the same state,
    /// when the explorer's sleep sets allow it.
    fn try_cover(&mut self, node: NodeId) -> bool {
        let graph = &self.graph;
        if graph.is_expanded(node) || graph.is_covered(node) || !graph.children(node).is_empty() {
            return false;
        }
        let state = graph.state(node);
        let candidate = graph.state_id(node);
        let covering = graph.live_nodes().find(|&other| {
            other < node
                && graph.is_expanded(other)
                && !graph.is_covered(other)
                && graph.state(other) == state
                && self
                    .explorer
                    .sleep_permits_cover(candidate, graph.state_id(other))
        });
        let Some(covering) = covering else {
            return false;
        };
        debug!(node = %node, covering = %covering, "covering node");
        self.graph.cover(node, covering);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lab::program::Instr;

    #[test]
    fn single_thread_runs_straight_through() {
        let program = Program::new().thread([Instr::write("x", 1), Instr::read("x")]);
        let mut runner = LabRunner::new(program.clone(), LabConfig::new(1));
        let report = runner.run_round().expect("round");
        assert_eq!(report.round, 1);
        assert_eq!(report.terminal_states, program.terminal_states());
        assert_eq!(runner.executed().len(), 2);
        assert_eq!(report.new_nodes, 2);
        assert!(!report.truncated);
        assert_eq!(runner.explorer().size(), 0);
    }

    #[test]
    fn expansion_bound_truncates() {
        let program = Program::new()
            .thread([Instr::write("x", 1), Instr::write("x", 2)])
            .thread([Instr::write("x", 3), Instr::write("x", 4)]);
        let mut runner = LabRunner::new(program, LabConfig::new(1).with_max_expansions(2));
        let report = runner.run_round().expect("round");
        assert!(report.truncated);
        assert_eq!(report.expansions, 2);
    }
}
