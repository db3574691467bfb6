//! Transition oracle for lab programs.
//!
//! Dependency is syntactic: two steps conflict when they belong to the same
//! thread, touch the same variable with at least one write, operate on the
//! same mutex, involve an atomic-block boundary, or when one spawns the
//! other's thread. An optional variable precision coarsens the variable
//! conflicts to the tracked variables, as an abstraction would.

use super::program::{Instr, LabAction, LabState, Program};
use crate::oracle::TransitionOracle;
use crate::types::{LockId, ProcessId};
use std::collections::BTreeSet;
use std::convert::Infallible;

/// [`TransitionOracle`] over a lab [`Program`].
#[derive(Debug, Clone)]
pub struct LabOracle {
    program: Program,
    precision: Option<BTreeSet<String>>,
}

impl LabOracle {
    /// Oracle with exact (full precision) dependency.
    #[must_use]
    pub const fn new(program: Program) -> Self {
        Self {
            program,
            precision: None,
        }
    }

    /// The program.
    #[must_use]
    pub const fn program(&self) -> &Program {
        &self.program
    }

    /// Restricts variable conflicts to `vars`; `None` tracks everything.
    pub fn set_precision(&mut self, vars: Option<BTreeSet<String>>) {
        self.precision = vars;
    }

    /// The current precision.
    #[must_use]
    pub const fn precision(&self) -> Option<&BTreeSet<String>> {
        self.precision.as_ref()
    }

    fn tracked(&self, var: &str) -> bool {
        self.precision.as_ref().is_none_or(|vars| vars.contains(var))
    }

    fn spawns(a: &LabAction, b: &LabAction) -> bool {
        matches!(a.instr, Instr::Spawn(q) if q == b.process)
    }
}

impl TransitionOracle for LabOracle {
    type State = LabState;
    type Action = LabAction;
    type Error = Infallible;

    fn enabled_actions(&self, state: &LabState) -> Result<Vec<LabAction>, Infallible> {
        Ok(self.program.enabled(state))
    }

    fn dependent(&self, a: &LabAction, b: &LabAction) -> Result<bool, Infallible> {
        if a.process == b.process {
            return Ok(true);
        }
        if a.instr.is_atomic_boundary() || b.instr.is_atomic_boundary() {
            return Ok(true);
        }
        if Self::spawns(a, b) || Self::spawns(b, a) {
            return Ok(true);
        }
        if matches!((a.instr.mutex(), b.instr.mutex()), (Some(m), Some(n)) if m == n) {
            return Ok(true);
        }
        if let (Some((x, wa)), Some((y, wb))) = (a.instr.access(), b.instr.access()) {
            return Ok(x == y && (wa || wb) && self.tracked(x));
        }
        Ok(false)
    }

    fn reversible(
        &self,
        before_earlier: &LabState,
        earlier: &LabAction,
        later: &LabAction,
    ) -> Result<bool, Infallible> {
        Ok(later
            .instr
            .blocking_locks()
            .iter()
            .all(|lock| before_earlier.holder(lock) != Some(earlier.process)))
    }

    fn processes(&self, state: &LabState) -> BTreeSet<ProcessId> {
        state.active.clone()
    }

    fn held_locks(&self, state: &LabState) -> BTreeSet<LockId> {
        state.locks.keys().cloned().collect()
    }

    fn is_blocked_by(&self, action: &LabAction, lock: &LockId) -> bool {
        action.instr.blocking_locks().contains(lock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(process: u32, pc: usize, instr: Instr) -> LabAction {
        LabAction {
            process: ProcessId::new(process),
            pc,
            instr,
        }
    }

    fn oracle() -> LabOracle {
        LabOracle::new(Program::new())
    }

    #[test]
    fn variable_conflicts_need_a_write() {
        let o = oracle();
        let w0 = step(0, 0, Instr::write("x", 1));
        let r1 = step(1, 0, Instr::read("x"));
        let r2 = step(2, 0, Instr::read("x"));
        let wy = step(1, 0, Instr::write("y", 1));
        assert_eq!(o.dependent(&w0, &r1), Ok(true));
        assert_eq!(o.dependent(&r1, &w0), Ok(true));
        assert_eq!(o.dependent(&r1, &r2), Ok(false));
        assert_eq!(o.dependent(&w0, &wy), Ok(false));
    }

    #[test]
    fn same_thread_and_same_mutex_conflict() {
        let o = oracle();
        assert_eq!(
            o.dependent(&step(0, 0, Instr::Local), &step(0, 1, Instr::Local)),
            Ok(true)
        );
        assert_eq!(
            o.dependent(&step(0, 0, Instr::unlock("m")), &step(1, 0, Instr::lock("m"))),
            Ok(true)
        );
        assert_eq!(
            o.dependent(&step(0, 0, Instr::lock("m")), &step(1, 0, Instr::lock("n"))),
            Ok(false)
        );
    }

    #[test]
    fn spawn_conflicts_with_spawned_thread() {
        let o = oracle();
        let spawn = step(0, 0, Instr::spawn(1));
        assert_eq!(o.dependent(&spawn, &step(1, 0, Instr::Local)), Ok(true));
        assert_eq!(o.dependent(&spawn, &step(2, 0, Instr::Local)), Ok(false));
    }

    #[test]
    fn precision_hides_untracked_variables() {
        let mut o = oracle();
        let w = step(0, 0, Instr::write("x", 1));
        let r = step(1, 0, Instr::read("x"));
        o.set_precision(Some(BTreeSet::new()));
        assert_eq!(o.dependent(&w, &r), Ok(false));
        o.set_precision(Some(["x".to_owned()].into_iter().collect()));
        assert_eq!(o.dependent(&w, &r), Ok(true));
        assert!(o.precision().is_some());
    }

    #[test]
    fn held_lock_makes_lock_irreversible() {
        let program = Program::new()
            .thread([Instr::lock("m"), Instr::unlock("m")])
            .thread([Instr::lock("m")]);
        let o = LabOracle::new(program.clone());
        let init = program.initial_state();
        let lock0 = step(0, 0, Instr::lock("m"));
        let held = program.step(&init, &lock0);
        let unlock0 = step(0, 1, Instr::unlock("m"));
        let lock1 = step(1, 0, Instr::lock("m"));

        assert_eq!(o.reversible(&init, &lock0, &lock1), Ok(true));
        assert_eq!(o.reversible(&held, &unlock0, &lock1), Ok(false));
        assert!(o.is_blocked_by(&lock1, &LockId::named("m")));
        assert!(!o.is_blocked_by(&unlock0, &LockId::named("m")));
        assert_eq!(o.held_locks(&held).len(), 1);
    }
}
