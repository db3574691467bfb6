//! Push with reversible-race detection.
//!
//! Pushing the frame for action `a` of process `p` scans the stack from the
//! top down. For every other process `q` the scan stops at the latest action
//! `b` of `q` that is dependent with `a` and can be reordered with it. Such a
//! pair is a reversible race: some action that lets `a`'s behavior run
//! before `b` must be in the backtrack set of the state preceding `b`.
//! Processes already ordered before `a` by a dependency chain are skipped
//! using the `last_dependents` indices.

use super::decoration::StateDecoration;
use super::locks::lock_delta;
use super::stack::{merge_max, StackFrame};
use super::Explorer;
use crate::action::{Action, ActionSet};
use crate::error::{ExploreError, ExploreResult};
use crate::graph::ProofGraph;
use crate::oracle::TransitionOracle;
use crate::tracing_compat::{debug, trace};
use crate::types::{NodeId, ProcessId};
use std::collections::BTreeSet;

impl<O: TransitionOracle> Explorer<O> {
    /// Pushes a frame for `node`. Frames at or above `virtual_limit` belong
    /// to a virtual extension: backtrack sets there are never grown.
    ///
    /// Returns false, after forcing full exploration at the earlier
    /// occurrence, if `node` is already on the stack.
    pub(super) fn push<G>(
        &mut self,
        graph: &G,
        node: NodeId,
        virtual_limit: usize,
    ) -> ExploreResult<bool, O::Error>
    where
        G: ProofGraph<State = O::State, Action = O::Action>,
    {
        let Some(action) = graph.in_action(node).cloned() else {
            let enabled = self.enabled(graph, node)?;
            self.table
                .reset(graph.state_id(node), StateDecoration::new(enabled, ActionSet::new()));
            self.stack.push(StackFrame::root(node));
            self.stats.pushes += 1;
            trace!(node = %node, "pushed root frame");
            return Ok(true);
        };

        let size = self.stack.len();
        let last = self.stack.top().ok_or(ExploreError::EmptyStack)?;
        let last_node = last.node;
        let process = action.process();

        let mut process_last_action = last.process_last_action.clone();
        process_last_action.insert(process, size);
        let mut new_last_dependents = last
            .last_dependents
            .get(&process)
            .cloned()
            .unwrap_or_default();
        new_last_dependents.insert(process, size);
        let mut relevant: BTreeSet<ProcessId> = process_last_action
            .keys()
            .copied()
            .filter(|&q| q != process)
            .collect();

        for index in (1..size).rev() {
            if relevant.is_empty() {
                break;
            }
            let frame = &self.stack[index];
            let Some(earlier) = frame.action.clone() else {
                continue;
            };
            let q = earlier.process();
            if !relevant.contains(&q) {
                continue;
            }
            if new_last_dependents.get(&q).is_some_and(|&at| index <= at) {
                // q's action already happens before `action` through a chain.
                relevant.remove(&q);
                continue;
            }
            if !self.oracle.dependent(&earlier, &action)? {
                continue;
            }
            let Some(source) = graph.parent(frame.node) else {
                continue;
            };
            if !self
                .oracle
                .reversible(graph.state(source), &earlier, &action)?
            {
                self.stats.irreversible_pairs += 1;
                continue;
            }
            self.stats.reversible_races += 1;

            let v = self.notdep(graph, index, &action)?;
            let iv = self.initials(graph, index - 1, &v)?;
            if iv.is_empty() {
                // Nothing enabled before `earlier` can start `v`, e.g. a lock
                // or atomic block excludes it.
                self.stats.empty_initials += 1;
                debug!(index, earlier = ?earlier, later = ?action, "race with empty initials");
                continue;
            }

            if index < virtual_limit {
                let target = graph.state_id(self.stack[index - 1].node);
                let backtrack = &mut self.table.entry(target).backtrack;
                if iv.intersects(backtrack) {
                    trace!(state = %target, index, "race already covered by backtrack set");
                } else if let Some(initial) = iv.choose(self.choice.as_mut()) {
                    debug!(
                        state = %target,
                        index,
                        initial = ?initial,
                        earlier = ?earlier,
                        later = ?action,
                        "reversible race: extending backtrack set"
                    );
                    backtrack.insert(initial.clone());
                    self.stats.backtrack_insertions += 1;
                }
            }

            new_last_dependents.insert(q, index);
            if let Some(recorded) = self.stack[index].last_dependents.get(&q) {
                merge_max(&mut new_last_dependents, recorded);
            }
            relevant.remove(&q);
        }

        let state = graph.state(node);
        let last_state = graph.state(last_node);
        let state_id = graph.state_id(node);
        let last_state_id = graph.state_id(last_node);

        let is_virtual = virtual_limit < size || graph.parent(node) != Some(last_node);
        let (backtrack, sleep) = if is_virtual {
            let stored = self.table.get(state_id).cloned().unwrap_or_default();
            (stored.backtrack, stored.sleep)
        } else {
            let mut sleep = ActionSet::new();
            for slept in &self.table.sleep(last_state_id) {
                if !self.oracle.dependent(slept, &action)? {
                    sleep.insert(slept.clone());
                }
            }
            let offerable = self.enabled(graph, node)?.difference(&sleep);
            let kept: ActionSet<O::Action> = if self.config.lazy_reexploration {
                graph
                    .children(node)
                    .into_iter()
                    .filter_map(|child| graph.in_action(child).cloned())
                    .collect()
            } else {
                ActionSet::new()
            };
            let mut backtrack = ActionSet::new();
            let representative = if kept.is_empty() || kept.is_subset(&sleep) {
                offerable.choose(self.choice.as_mut()).cloned()
            } else {
                None
            };
            backtrack.extend(kept);
            backtrack.extend(representative);
            (backtrack, sleep)
        };

        if let Some(at) = self.stack.position_of(node) {
            if at < virtual_limit {
                let enabled = self.enabled(graph, node)?;
                self.table.entry(state_id).backtrack = enabled;
            }
            self.stats.cycles += 1;
            debug!(node = %node, position = at, "cycle on stack: forcing full exploration");
            return Ok(false);
        }

        let new_processes: Vec<ProcessId> = self
            .oracle
            .processes(state)
            .difference(&self.oracle.processes(last_state))
            .copied()
            .collect();
        let (locked, released) = lock_delta(
            &self.oracle.held_locks(last_state),
            &self.oracle.held_locks(state),
        );
        if !self.oracle.is_bottom(state) {
            for lock in &released {
                let acquired_at = self.stack.top().and_then(|f| f.mutex_locks.get(lock).copied());
                if let Some(frame) = acquired_at.and_then(|at| self.stack.get_mut(at)) {
                    frame.mutex_locks.remove(lock);
                }
            }
        }

        let last = self.stack.top().ok_or(ExploreError::EmptyStack)?;
        let mut last_dependents = last.last_dependents.clone();
        for spawned in &new_processes {
            merge_max(last_dependents.entry(*spawned).or_default(), &new_last_dependents);
        }
        last_dependents.insert(process, new_last_dependents);
        let mut mutex_locks = last.mutex_locks.clone();
        for lock in locked {
            mutex_locks.insert(lock, size);
        }
        for lock in &released {
            mutex_locks.remove(lock);
        }

        self.table
            .reset(state_id, StateDecoration::new(backtrack, sleep));
        self.stack.push(StackFrame {
            node,
            action: Some(action),
            process_last_action,
            last_dependents,
            mutex_locks,
        });
        if is_virtual {
            self.stats.virtual_pushes += 1;
        } else {
            self.stats.pushes += 1;
        }
        trace!(node = %node, depth = size, is_virtual, "pushed frame");
        Ok(true)
    }

    /// `notdep(start, a)`: the actions after `start` on an unbroken parent
    /// chain that are independent of the action at `start`, followed by `a`.
    fn notdep<G>(
        &self,
        graph: &G,
        start: usize,
        action: &O::Action,
    ) -> ExploreResult<Vec<O::Action>, O::Error>
    where
        G: ProofGraph<State = O::State, Action = O::Action>,
    {
        let mut sequence = Vec::new();
        let Some(e) = self.stack[start].action.as_ref() else {
            sequence.push(action.clone());
            return Ok(sequence);
        };
        for index in start + 1..self.stack.len() {
            let frame = &self.stack[index];
            if graph.parent(frame.node) != Some(self.stack[index - 1].node) {
                continue;
            }
            let Some(b) = frame.action.as_ref() else {
                continue;
            };
            if !self.oracle.dependent(e, b)? {
                sequence.push(b.clone());
            }
        }
        sequence.push(action.clone());
        Ok(sequence)
    }

    /// `initials(start, v)`: actions enabled at the state of frame `start`,
    /// not asleep there without having been explored, that occur in `v`
    /// before any action they depend on.
    fn initials<G>(
        &self,
        graph: &G,
        start: usize,
        sequence: &[O::Action],
    ) -> ExploreResult<ActionSet<O::Action>, O::Error>
    where
        G: ProofGraph<State = O::State, Action = O::Action>,
    {
        let node = self.stack[start].node;
        let asleep = self
            .table
            .get(graph.state_id(node))
            .map(|d| d.sleep.difference(&d.explored))
            .unwrap_or_default();
        let candidates = self.enabled(graph, node)?.difference(&asleep);

        let mut initials = ActionSet::new();
        'candidates: for candidate in &candidates {
            let key = candidate.key();
            for step in sequence {
                if step.key() == key {
                    initials.insert(candidate.clone());
                    continue 'candidates;
                }
                if self.oracle.dependent(candidate, step)? {
                    continue 'candidates;
                }
            }
        }
        Ok(initials)
    }
}
