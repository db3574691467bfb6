//! Lock bookkeeping and forced backtracking on pop.
//!
//! While a lock is held, the actions it blocks are not enabled, so race
//! detection never sees them and never puts them in a backtrack set. When
//! the frame that acquired a lock is popped with the lock still held, that
//! exclusion no longer holds for the state below it: every action there
//! that the lock blocks is forced into its backtrack set.

use super::Explorer;
use crate::error::ExploreResult;
use crate::graph::ProofGraph;
use crate::oracle::TransitionOracle;
use crate::tracing_compat::{debug, trace};
use crate::types::LockId;
use std::collections::BTreeSet;

/// Locks acquired and released between two consecutive states.
pub(super) fn lock_delta(
    before: &BTreeSet<LockId>,
    after: &BTreeSet<LockId>,
) -> (Vec<LockId>, Vec<LockId>) {
    let locked = after.difference(before).cloned().collect();
    let released = before.difference(after).cloned().collect();
    (locked, released)
}

impl<O: TransitionOracle> Explorer<O> {
    /// Pops the top frame of the real stack, forcing backtracks for locks
    /// it acquired and never released.
    pub(super) fn pop_frame<G>(&mut self, graph: &G) -> ExploreResult<(), O::Error>
    where
        G: ProofGraph<State = O::State, Action = O::Action>,
    {
        let size = self.stack.len();
        if size >= 2 {
            let held: Vec<LockId> = self.stack[size - 1]
                .locks_acquired_at(size - 1)
                .cloned()
                .collect();
            if !held.is_empty() {
                let below = self.stack[size - 2].node;
                let below_state = graph.state_id(below);
                let enabled = self.enabled(graph, below)?;
                let backtrack = &mut self.table.entry(below_state).backtrack;
                for lock in &held {
                    for action in enabled
                        .iter()
                        .filter(|a| lock.is_atomic() || self.oracle.is_blocked_by(a, lock))
                    {
                        if backtrack.insert(action.clone()) {
                            self.stats.forced_lock_backtracks += 1;
                            debug!(
                                state = %below_state,
                                lock = %lock,
                                action = ?action,
                                "lock left held on pop: forcing backtrack"
                            );
                        }
                    }
                }
            }
        }
        if let Some(frame) = self.stack.pop() {
            self.stats.pops += 1;
            trace!(node = %frame.node, depth = size - 1, "popped frame");
        }
        Ok(())
    }
}
