//! Collaborator contract for the modeled transition system.
//!
//! The explorer never evaluates the program itself. It asks a
//! [`TransitionOracle`] which actions are enabled in a state and whether two
//! actions conflict. Implementations may consult an abstraction precision or
//! a constraint solver; any failure is surfaced through the associated error
//! type and propagated unchanged to the caller.

use crate::action::Action;
use crate::types::{LockId, ProcessId};
use std::collections::BTreeSet;

/// Semantic queries over states and actions of the modeled program.
pub trait TransitionOracle {
    /// Program state.
    type State;
    /// Atomic action.
    type Action: Action;
    /// Failure of an oracle query.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Actions enabled in `state`. Must be deterministic given `state`.
    fn enabled_actions(&self, state: &Self::State) -> Result<Vec<Self::Action>, Self::Error>;

    /// True if `a` and `b` do not commute: same process, or a conflicting
    /// access (at least one write) to shared memory. Intended to be symmetric.
    fn dependent(&self, a: &Self::Action, b: &Self::Action) -> Result<bool, Self::Error>;

    /// True if `later` could be moved before `earlier`, where
    /// `before_earlier` is the state in which `earlier` was executed.
    ///
    /// False only when a concurrency primitive held across `earlier` prevents
    /// the reordering.
    fn reversible(
        &self,
        before_earlier: &Self::State,
        earlier: &Self::Action,
        later: &Self::Action,
    ) -> Result<bool, Self::Error>;

    /// Processes that exist in `state`.
    fn processes(&self, state: &Self::State) -> BTreeSet<ProcessId>;

    /// Locks held by any process in `state`.
    fn held_locks(&self, state: &Self::State) -> BTreeSet<LockId>;

    /// True if `action` cannot execute while `lock` is held by another
    /// process. The atomic lock blocks everything; implementations need only
    /// answer for named locks.
    fn is_blocked_by(&self, action: &Self::Action, lock: &LockId) -> bool;

    /// True for the bottom (infeasible) state. Lock releases into a bottom
    /// state are not recorded.
    fn is_bottom(&self, _state: &Self::State) -> bool {
        false
    }
}
