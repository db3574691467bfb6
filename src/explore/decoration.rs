//! Per-state exploration decorations.
//!
//! Backtrack, sleep and explored sets are keyed by [`StateId`] and survive
//! stack clears, so a later round can reuse what an earlier round learned.
//! Only the `re_explored` markers are round-scoped.

use crate::action::{Action, ActionSet};
use crate::types::StateId;
use std::collections::BTreeMap;

/// Decoration of one explored state.
#[derive(Debug, Clone)]
pub struct StateDecoration<A: Action> {
    /// Actions still required from this state.
    pub backtrack: ActionSet<A>,
    /// Actions known redundant from this state in the current visit.
    pub sleep: ActionSet<A>,
    /// Actions already taken from this state in the current visit.
    pub explored: ActionSet<A>,
}

impl<A: Action> Default for StateDecoration<A> {
    fn default() -> Self {
        Self {
            backtrack: ActionSet::new(),
            sleep: ActionSet::new(),
            explored: ActionSet::new(),
        }
    }
}

impl<A: Action> StateDecoration<A> {
    /// Fresh decoration with the given backtrack and sleep sets.
    #[must_use]
    pub fn new(backtrack: ActionSet<A>, sleep: ActionSet<A>) -> Self {
        Self {
            backtrack,
            sleep,
            explored: ActionSet::new(),
        }
    }

    /// `backtrack \ sleep`: the actions that may still be offered.
    #[must_use]
    pub fn offerable(&self) -> ActionSet<A> {
        self.backtrack.difference(&self.sleep)
    }

    /// Records that `action` is being taken from this state.
    pub fn take(&mut self, action: &A) {
        self.sleep.insert(action.clone());
        self.explored.insert(action.clone());
    }
}

/// Side table from state identity to decoration.
#[derive(Debug, Clone)]
pub struct DecorationTable<A: Action> {
    states: BTreeMap<StateId, StateDecoration<A>>,
    re_explored: BTreeMap<StateId, bool>,
}

impl<A: Action> Default for DecorationTable<A> {
    fn default() -> Self {
        Self {
            states: BTreeMap::new(),
            re_explored: BTreeMap::new(),
        }
    }
}

impl<A: Action> DecorationTable<A> {
    /// Decoration of `state`, if it has been seen.
    #[must_use]
    pub fn get(&self, state: StateId) -> Option<&StateDecoration<A>> {
        self.states.get(&state)
    }

    /// Decoration of `state`, created empty on first access.
    pub fn entry(&mut self, state: StateId) -> &mut StateDecoration<A> {
        self.states.entry(state).or_default()
    }

    /// Replaces the decoration of `state`.
    pub fn reset(&mut self, state: StateId, decoration: StateDecoration<A>) {
        self.states.insert(state, decoration);
    }

    /// Copy of the sleep set of `state`, empty if unseen.
    #[must_use]
    pub fn sleep(&self, state: StateId) -> ActionSet<A> {
        self.states
            .get(&state)
            .map(|d| d.sleep.clone())
            .unwrap_or_default()
    }

    /// Marks `state` as visited in the current round.
    pub fn mark_re_explored(&mut self, state: StateId) {
        self.re_explored.insert(state, true);
    }

    /// Round marker of `state`: `None` while unset.
    #[must_use]
    pub fn re_explored(&self, state: StateId) -> Option<bool> {
        self.re_explored.get(&state).copied()
    }

    /// True if `state` was visited in the current round.
    #[must_use]
    pub fn is_re_explored(&self, state: StateId) -> bool {
        self.re_explored(state) == Some(true)
    }

    /// Clears the round markers. Persistent sets are kept.
    pub fn clear_round(&mut self) {
        self.re_explored.clear();
    }

    /// Number of decorated states.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// True if no state has been decorated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProcessId;

    #[derive(Debug, Clone)]
    struct Step(u32, u8);

    impl Action for Step {
        type Operation = u8;

        fn process(&self) -> ProcessId {
            ProcessId::new(self.0)
        }

        fn operation(&self) -> &u8 {
            &self.1
        }
    }

    #[test]
    fn take_keeps_explored_within_sleep() {
        let mut dec = StateDecoration::new(
            [Step(0, 0), Step(1, 0)].into_iter().collect(),
            ActionSet::new(),
        );
        assert_eq!(dec.offerable().len(), 2);
        dec.take(&Step(0, 0));
        assert_eq!(dec.offerable().len(), 1);
        assert!(dec.explored.is_subset(&dec.backtrack));
        assert!(dec.explored.is_subset(&dec.sleep));
    }

    #[test]
    fn clear_round_keeps_persistent_sets() {
        let mut table: DecorationTable<Step> = DecorationTable::default();
        let s = StateId::new(1);
        table.entry(s).backtrack.insert(Step(0, 1));
        table.mark_re_explored(s);
        assert_eq!(table.re_explored(s), Some(true));
        assert_eq!(table.re_explored(StateId::new(2)), None);

        table.clear_round();
        assert_eq!(table.re_explored(s), None);
        assert_eq!(table.get(s).map(|d| d.backtrack.len()), Some(1));
        assert_eq!(table.len(), 1);
    }
}
