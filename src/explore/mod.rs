//! Source-DPOR exploration controller.
//!
//! The [`Explorer`] is driven by a surrounding search engine through a
//! work-queue interface: the engine [`add`](Explorer::add)s each node it
//! creates, asks [`is_empty`](Explorer::is_empty) whether anything is left,
//! takes the current target with [`remove`](Explorer::remove), and asks
//! [`next_action`](Explorer::next_action) which single action to execute
//! from it. Internally the explorer keeps a DFS stack mirroring the path to
//! the target and, on every push, looks for reversible races between the new
//! action and the actions on the stack.
//!
//! # Sets
//!
//! Each state carries three sets, keyed by action identity:
//!
//! - **backtrack**: actions that must still be explored from the state
//! - **sleep**: actions whose exploration from the state would be redundant
//! - **explored**: actions taken from the state in the current visit
//!
//! `backtrack \ sleep` is what [`next_action`](Explorer::next_action) may
//! offer. A fresh state starts with a single representative action; race
//! detection grows backtrack sets only where a race demands it.
//!
//! # Covering and rounds
//!
//! When the engine covers a node by another, the covering node's subtree is
//! replayed on a transient stack extension ("virtual exploration") so that
//! races hidden behind the covering are still seen. Across abstraction
//! refinement rounds, edges kept in the proof graph are replayed lazily
//! before new backtracking is allowed.
//!
//! # References
//!
//! - Abdulla, Aronis, Jonsson, Sagonas, "Source Sets: A Foundation for
//!   Optimal Dynamic Partial Order Reduction" (JACM 2017)
//! - Flanagan & Godefroid, "Dynamic partial-order reduction" (POPL 2005)

mod decoration;
mod locks;
mod race;
mod replay;
mod stack;

pub use decoration::{DecorationTable, StateDecoration};
pub use stack::{DependentIndex, SearchStack, StackFrame};

use crate::action::{Action, ActionSet};
use crate::config::ExplorerConfig;
use crate::error::{ExploreError, ExploreResult};
use crate::graph::ProofGraph;
use crate::oracle::TransitionOracle;
use crate::stats::ExplorationStats;
use crate::tracing_compat::{info, trace};
use crate::types::{NodeId, StateId};
use crate::util::{ChoiceSource, DetChoice, OsEntropy};
use core::fmt;

/// Source-DPOR exploration controller over a transition oracle `O`.
pub struct Explorer<O: TransitionOracle> {
    oracle: O,
    config: ExplorerConfig,
    seed: Option<u64>,
    choice: Box<dyn ChoiceSource>,
    stack: SearchStack<O::Action>,
    table: DecorationTable<O::Action>,
    stats: ExplorationStats,
}

impl<O: TransitionOracle> Explorer<O> {
    /// Creates an explorer. An unseeded configuration draws its seed from
    /// the OS; the seed is logged and available from [`seed`](Self::seed).
    pub fn new(oracle: O, config: ExplorerConfig) -> Self {
        let seed = config.seed.unwrap_or_else(|| {
            let seed = OsEntropy::seed();
            info!(seed, "drew exploration seed from OS entropy");
            seed
        });
        let mut explorer = Self::with_choice_source(oracle, config, Box::new(DetChoice::new(seed)));
        explorer.seed = Some(seed);
        explorer
    }

    /// Creates an explorer that draws every arbitrary choice from `choice`.
    /// The configured seed is ignored.
    pub fn with_choice_source(
        oracle: O,
        config: ExplorerConfig,
        choice: Box<dyn ChoiceSource>,
    ) -> Self {
        Self {
            oracle,
            config,
            seed: None,
            choice,
            stack: SearchStack::default(),
            table: DecorationTable::default(),
            stats: ExplorationStats::default(),
        }
    }

    /// Seed of the deterministic choice source, if the explorer owns one.
    #[must_use]
    pub const fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// The transition oracle.
    #[must_use]
    pub const fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Mutable access to the oracle, e.g. to refine its precision between
    /// rounds.
    pub fn oracle_mut(&mut self) -> &mut O {
        &mut self.oracle
    }

    /// The configuration.
    #[must_use]
    pub const fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    /// Counters accumulated so far.
    #[must_use]
    pub const fn stats(&self) -> &ExplorationStats {
        &self.stats
    }

    /// Decoration of `state`, if the state has been seen.
    #[must_use]
    pub fn decoration(&self, state: StateId) -> Option<&StateDecoration<O::Action>> {
        self.table.get(state)
    }

    /// Round marker of `state`: `Some(true)` once visited this round.
    #[must_use]
    pub fn re_explored(&self, state: StateId) -> Option<bool> {
        self.table.re_explored(state)
    }

    /// Number of frames on the search stack.
    #[must_use]
    pub fn size(&self) -> usize {
        self.stack.len()
    }

    /// Nodes on the search stack, root first.
    #[must_use]
    pub fn stack_nodes(&self) -> Vec<NodeId> {
        self.stack.nodes().collect()
    }

    /// Empties the stack and clears the round markers. Backtrack, sleep and
    /// explored sets are kept for the next round.
    pub fn clear(&mut self) {
        trace!(frames = self.stack.len(), "clearing exploration stack");
        self.stack.clear();
        self.table.clear_round();
    }

    /// Whether the state `candidate` may be covered by the state `covering`
    /// without losing behavior hidden by sleep sets.
    ///
    /// `covering` must have been visited in the current round, and every
    /// action it slept on without exploring must also be asleep at
    /// `candidate`. Callers conjoin this with their own state order.
    #[must_use]
    pub fn sleep_permits_cover(&self, candidate: StateId, covering: StateId) -> bool {
        if !self.table.is_re_explored(covering) {
            return false;
        }
        let Some(cover) = self.table.get(covering) else {
            return true;
        };
        let needed = cover.sleep.difference(&cover.explored);
        needed.is_subset(&self.table.sleep(candidate))
    }

    /// Adds a newly produced node.
    ///
    /// With an empty stack the node's ancestors are walked up to the root,
    /// which is pushed instead and starts a new round; kept subtrees are then
    /// replayed lazily. Otherwise `node` must be a child of the top node.
    /// Returns false if the push was refused because `node` is already on the
    /// stack.
    pub fn add<G>(&mut self, graph: &G, node: NodeId) -> ExploreResult<bool, O::Error>
    where
        G: ProofGraph<State = O::State, Action = O::Action>,
    {
        let mut node = node;
        if let Some(top) = self.stack.top_node() {
            if graph.parent(node) != Some(top) {
                return Err(ExploreError::NotChildOfTop { node, top });
            }
        } else {
            while let Some(parent) = graph.parent(node) {
                node = parent;
            }
            self.stats.rounds += 1;
            info!(round = self.stats.rounds, root = %node, "starting exploration round");
        }
        self.table.mark_re_explored(graph.state_id(node));
        let limit = self.stack.len();
        self.push(graph, node, limit)
    }

    /// Adds at most one node.
    pub fn add_all<G, I>(&mut self, graph: &G, nodes: I) -> ExploreResult<(), O::Error>
    where
        G: ProofGraph<State = O::State, Action = O::Action>,
        I: IntoIterator<Item = NodeId>,
    {
        let nodes: Vec<NodeId> = nodes.into_iter().collect();
        match nodes.as_slice() {
            [] => Ok(()),
            [node] => self.add(graph, *node).map(|_| ()),
            _ => Err(ExploreError::BatchTooLarge { count: nodes.len() }),
        }
    }

    /// True if the current path is exhausted and nothing is left to explore.
    ///
    /// A covered top node triggers virtual exploration of its covering
    /// subtree; otherwise kept edges are replayed lazily. Frames are then
    /// popped while the top is subsumed, or expanded with nothing offerable.
    pub fn is_empty<G>(&mut self, graph: &G) -> ExploreResult<bool, O::Error>
    where
        G: ProofGraph<State = O::State, Action = O::Action>,
    {
        let Some(top) = self.stack.top_node() else {
            return Ok(true);
        };
        if graph.is_covered(top) && graph.is_feasible(top) {
            if let Some(covering) = graph
                .covering_node(top)
                .filter(|_| self.config.virtual_exploration)
            {
                let real = self.stack.len();
                self.virtual_exploration(graph, covering, real)?;
            }
        } else {
            self.explore_lazily(graph)?;
        }

        while let Some(top) = self.stack.top_node() {
            let exhausted = graph.is_subsumed(top)
                || (graph.is_expanded(top) && self.offerable(graph, top).is_empty());
            if !exhausted {
                break;
            }
            self.pop_frame(graph)?;
            self.explore_lazily(graph)?;
        }
        Ok(self.stack.is_empty())
    }

    /// The current exploration target.
    pub fn remove<G>(&mut self, graph: &G) -> ExploreResult<NodeId, O::Error>
    where
        G: ProofGraph<State = O::State, Action = O::Action>,
    {
        if self.is_empty(graph)? {
            return Err(ExploreError::EmptyStack);
        }
        self.stack.top_node().ok_or(ExploreError::EmptyStack)
    }

    /// The single action to execute next from `state`, which must be the
    /// state of the top frame. `None` when nothing is offerable.
    ///
    /// The returned action is moved into the sleep and explored sets, and
    /// every enabled action of its process joins the backtrack set.
    pub fn next_action<G>(
        &mut self,
        graph: &G,
        state: StateId,
    ) -> ExploreResult<Option<O::Action>, O::Error>
    where
        G: ProofGraph<State = O::State, Action = O::Action>,
    {
        let top = self.stack.top_node().ok_or(ExploreError::EmptyStack)?;
        let top_state = graph.state_id(top);
        if top_state != state {
            return Err(ExploreError::NotTopState {
                requested: state,
                top: top_state,
            });
        }
        let offerable = self.offerable(graph, top);
        let Some(action) = offerable.choose(self.choice.as_mut()).cloned() else {
            return Ok(None);
        };
        let enabled = self.enabled(graph, top)?;
        self.record_taken(state, &enabled, &action);
        trace!(state = %state, action = ?action, "offering action");
        Ok(Some(action))
    }

    fn enabled<G>(&self, graph: &G, node: NodeId) -> ExploreResult<ActionSet<O::Action>, O::Error>
    where
        G: ProofGraph<State = O::State, Action = O::Action>,
    {
        Ok(self
            .oracle
            .enabled_actions(graph.state(node))?
            .into_iter()
            .collect())
    }

    fn offerable<G>(&self, graph: &G, node: NodeId) -> ActionSet<O::Action>
    where
        G: ProofGraph<State = O::State, Action = O::Action>,
    {
        self.table
            .get(graph.state_id(node))
            .map(StateDecoration::offerable)
            .unwrap_or_default()
    }

    /// Bookkeeping shared by [`next_action`](Self::next_action) and lazy
    /// replay when `action` is taken from `state`.
    fn record_taken(
        &mut self,
        state: StateId,
        enabled: &ActionSet<O::Action>,
        action: &O::Action,
    ) {
        let process = action.process();
        let decoration = self.table.entry(state);
        decoration
            .backtrack
            .extend(enabled.iter().filter(|a| a.process() == process).cloned());
        decoration.backtrack.insert(action.clone());
        decoration.take(action);
        debug_assert!(decoration.explored.is_subset(&decoration.backtrack));
    }
}

impl<O: TransitionOracle> fmt::Debug for Explorer<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Explorer")
            .field("config", &self.config)
            .field("seed", &self.seed)
            .field("choice", &self.choice.source_id())
            .field("stack", &self.stack.len())
            .field("states", &self.table.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
