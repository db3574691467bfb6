//! A tiny concurrent program model.
//!
//! Programs are straight-line threads over shared integer variables, named
//! mutexes and atomic blocks. Threads may start dormant and be spawned by
//! another thread. The model is small enough to enumerate every
//! interleaving, which makes it a reference for checking reductions.

use crate::action::Action;
use crate::types::{LockId, ProcessId};
use core::fmt;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One instruction of a lab thread.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instr {
    /// Read a shared variable and record the observed value.
    Read(String),
    /// Write a constant to a shared variable.
    Write(String, i64),
    /// Acquire a named mutex. Disabled while another thread holds it.
    Lock(String),
    /// Release a named mutex. Disabled unless the thread holds it.
    Unlock(String),
    /// Enter an atomic block. Other threads are disabled until it ends.
    AtomicBegin,
    /// Leave an atomic block.
    AtomicEnd,
    /// Make a dormant thread runnable.
    Spawn(ProcessId),
    /// A thread-local step with no shared effect.
    Local,
}

impl Instr {
    /// `Read(var)`.
    #[must_use]
    pub fn read(var: &str) -> Self {
        Self::Read(var.to_owned())
    }

    /// `Write(var, value)`.
    #[must_use]
    pub fn write(var: &str, value: i64) -> Self {
        Self::Write(var.to_owned(), value)
    }

    /// `Lock(mutex)`.
    #[must_use]
    pub fn lock(mutex: &str) -> Self {
        Self::Lock(mutex.to_owned())
    }

    /// `Unlock(mutex)`.
    #[must_use]
    pub fn unlock(mutex: &str) -> Self {
        Self::Unlock(mutex.to_owned())
    }

    /// `Spawn(thread)`.
    #[must_use]
    pub const fn spawn(thread: u32) -> Self {
        Self::Spawn(ProcessId::new(thread))
    }

    /// The shared variable accessed, and whether the access writes.
    #[must_use]
    pub fn access(&self) -> Option<(&str, bool)> {
        match self {
            Self::Read(var) => Some((var.as_str(), false)),
            Self::Write(var, _) => Some((var.as_str(), true)),
            _ => None,
        }
    }

    /// The named mutex operated on.
    #[must_use]
    pub fn mutex(&self) -> Option<&str> {
        match self {
            Self::Lock(m) | Self::Unlock(m) => Some(m.as_str()),
            _ => None,
        }
    }

    /// Locks whose holder prevents this instruction from running.
    #[must_use]
    pub fn blocking_locks(&self) -> Vec<LockId> {
        match self {
            Self::Lock(m) => vec![LockId::named(m.as_str())],
            Self::AtomicBegin => vec![LockId::Atomic],
            _ => Vec::new(),
        }
    }

    /// True for atomic-block boundaries.
    #[must_use]
    pub const fn is_atomic_boundary(&self) -> bool {
        matches!(self, Self::AtomicBegin | Self::AtomicEnd)
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(var) => write!(f, "r {var}"),
            Self::Write(var, value) => write!(f, "w {var}={value}"),
            Self::Lock(m) => write!(f, "lock {m}"),
            Self::Unlock(m) => write!(f, "unlock {m}"),
            Self::AtomicBegin => f.write_str("atomic {"),
            Self::AtomicEnd => f.write_str("}"),
            Self::Spawn(p) => write!(f, "spawn {p}"),
            Self::Local => f.write_str("local"),
        }
    }
}

/// A step of a lab thread: the instruction at `pc` of `process`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LabAction {
    /// Executing thread.
    pub process: ProcessId,
    /// Instruction index within the thread.
    pub pc: usize,
    /// The instruction.
    pub instr: Instr,
}

impl Action for LabAction {
    type Operation = usize;

    fn process(&self) -> ProcessId {
        self.process
    }

    fn operation(&self) -> &usize {
        &self.pc
    }
}

impl fmt::Display for LabAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}: {}", self.process, self.pc, self.instr)
    }
}

/// Global state of a lab program.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LabState {
    /// Program counter of each thread.
    pub pcs: Vec<usize>,
    /// Threads that have been started.
    pub active: BTreeSet<ProcessId>,
    /// Shared variables; unwritten variables read as zero.
    pub vars: BTreeMap<String, i64>,
    /// Values observed by each thread's reads, in order.
    pub observed: Vec<Vec<i64>>,
    /// Current holder of each held lock.
    pub locks: BTreeMap<LockId, ProcessId>,
}

impl LabState {
    /// Value of `var`, zero if never written.
    #[must_use]
    pub fn var(&self, var: &str) -> i64 {
        self.vars.get(var).copied().unwrap_or(0)
    }

    /// Holder of `lock`, if held.
    #[must_use]
    pub fn holder(&self, lock: &LockId) -> Option<ProcessId> {
        self.locks.get(lock).copied()
    }
}

/// A lab program: one instruction list per thread.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    threads: Vec<Vec<Instr>>,
    initially_active: BTreeSet<ProcessId>,
}

impl Program {
    /// An empty program.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a thread that is runnable from the start.
    #[must_use]
    pub fn thread(mut self, instrs: impl IntoIterator<Item = Instr>) -> Self {
        let id = self.next_id();
        self.threads.push(instrs.into_iter().collect());
        self.initially_active.insert(id);
        self
    }

    /// Adds a thread that only runs once spawned.
    #[must_use]
    pub fn dormant_thread(mut self, instrs: impl IntoIterator<Item = Instr>) -> Self {
        self.threads.push(instrs.into_iter().collect());
        self
    }

    #[allow(clippy::cast_possible_truncation)] // thread ids are u32
    fn next_id(&self) -> ProcessId {
        ProcessId::new(self.threads.len() as u32)
    }

    /// Number of threads.
    #[must_use]
    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    /// The initial state.
    #[must_use]
    pub fn initial_state(&self) -> LabState {
        LabState {
            pcs: vec![0; self.threads.len()],
            active: self.initially_active.clone(),
            vars: BTreeMap::new(),
            observed: vec![Vec::new(); self.threads.len()],
            locks: BTreeMap::new(),
        }
    }

    /// The next step of `process`, if it has one and it can run now.
    #[must_use]
    pub fn step_of(&self, state: &LabState, process: ProcessId) -> Option<LabAction> {
        if !state.active.contains(&process) {
            return None;
        }
        let pc = *state.pcs.get(process.as_usize())?;
        let instr = self.threads.get(process.as_usize())?.get(pc)?;
        if state
            .holder(&LockId::Atomic)
            .is_some_and(|holder| holder != process)
        {
            return None;
        }
        let runnable = match instr {
            Instr::Lock(m) => state.holder(&LockId::named(m.as_str())).is_none(),
            Instr::Unlock(m) => state.holder(&LockId::named(m.as_str())) == Some(process),
            Instr::AtomicBegin => state.holder(&LockId::Atomic).is_none(),
            Instr::AtomicEnd => state.holder(&LockId::Atomic) == Some(process),
            Instr::Read(_) | Instr::Write(..) | Instr::Spawn(_) | Instr::Local => true,
        };
        runnable.then(|| LabAction {
            process,
            pc,
            instr: instr.clone(),
        })
    }

    /// Every step that can run in `state`, in thread order.
    #[must_use]
    pub fn enabled(&self, state: &LabState) -> Vec<LabAction> {
        state
            .active
            .iter()
            .filter_map(|&process| self.step_of(state, process))
            .collect()
    }

    /// The state after executing `action` in `state`.
    #[must_use]
    pub fn step(&self, state: &LabState, action: &LabAction) -> LabState {
        let mut next = state.clone();
        let p = action.process;
        if let Some(pc) = next.pcs.get_mut(p.as_usize()) {
            *pc += 1;
        }
        match &action.instr {
            Instr::Read(var) => {
                let value = state.var(var);
                if let Some(seen) = next.observed.get_mut(p.as_usize()) {
                    seen.push(value);
                }
            }
            Instr::Write(var, value) => {
                next.vars.insert(var.clone(), *value);
            }
            Instr::Lock(m) => {
                next.locks.insert(LockId::named(m.as_str()), p);
            }
            Instr::Unlock(m) => {
                next.locks.remove(&LockId::named(m.as_str()));
            }
            Instr::AtomicBegin => {
                next.locks.insert(LockId::Atomic, p);
            }
            Instr::AtomicEnd => {
                next.locks.remove(&LockId::Atomic);
            }
            Instr::Spawn(q) => {
                next.active.insert(*q);
            }
            Instr::Local => {}
        }
        next
    }

    /// Every state without enabled steps reachable from the initial state,
    /// found by enumerating all interleavings.
    #[must_use]
    pub fn terminal_states(&self) -> BTreeSet<LabState> {
        let mut terminals = BTreeSet::new();
        let mut seen = BTreeSet::new();
        let mut work = vec![self.initial_state()];
        while let Some(state) = work.pop() {
            if !seen.insert(state.clone()) {
                continue;
            }
            let enabled = self.enabled(&state);
            if enabled.is_empty() {
                terminals.insert(state);
                continue;
            }
            work.extend(enabled.iter().map(|a| self.step(&state, a)));
        }
        terminals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(i: u32) -> ProcessId {
        ProcessId::new(i)
    }

    #[test]
    fn dormant_threads_wait_for_spawn() {
        let program = Program::new()
            .thread([Instr::spawn(1)])
            .dormant_thread([Instr::Local]);
        let init = program.initial_state();
        let enabled = program.enabled(&init);
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].process, p(0));

        let after = program.step(&init, &enabled[0]);
        assert_eq!(program.enabled(&after)[0].process, p(1));
    }

    #[test]
    fn locks_disable_contenders() {
        let program = Program::new()
            .thread([Instr::lock("m"), Instr::unlock("m")])
            .thread([Instr::lock("m")]);
        let init = program.initial_state();
        let lock0 = program.step_of(&init, p(0)).expect("P0 can lock");
        let held = program.step(&init, &lock0);
        assert_eq!(held.holder(&LockId::named("m")), Some(p(0)));
        assert!(program.step_of(&held, p(1)).is_none());
        assert!(program.step_of(&held, p(0)).is_some());
    }

    #[test]
    fn atomic_blocks_exclude_other_threads() {
        let program = Program::new()
            .thread([Instr::AtomicBegin, Instr::write("x", 1), Instr::AtomicEnd])
            .thread([Instr::write("x", 2)]);
        let init = program.initial_state();
        let begin = program.step_of(&init, p(0)).expect("begin");
        let inside = program.step(&init, &begin);
        assert_eq!(program.enabled(&inside).len(), 1);
        assert!(program.step_of(&inside, p(1)).is_none());
    }

    #[test]
    fn reads_record_observations() {
        let program = Program::new()
            .thread([Instr::write("x", 7)])
            .thread([Instr::read("x")]);
        let terminals = program.terminal_states();
        let seen: BTreeSet<Vec<i64>> = terminals.iter().map(|s| s.observed[1].clone()).collect();
        assert_eq!(seen, [vec![0], vec![7]].into_iter().collect());
    }

    #[test]
    fn store_buffer_has_three_outcomes() {
        let program = Program::new()
            .thread([Instr::write("x", 1), Instr::read("y")])
            .thread([Instr::write("y", 1), Instr::read("x")]);
        let observed: BTreeSet<(i64, i64)> = program
            .terminal_states()
            .iter()
            .map(|s| (s.observed[0][0], s.observed[1][0]))
            .collect();
        assert_eq!(observed, [(0, 1), (1, 0), (1, 1)].into_iter().collect());
    }

    #[test]
    fn deadlocks_are_terminal() {
        let program = Program::new()
            .thread([Instr::lock("a"), Instr::lock("b")])
            .thread([Instr::lock("b"), Instr::lock("a")]);
        let stuck = program
            .terminal_states()
            .into_iter()
            .filter(|s| s.locks.len() == 2 && s.pcs == vec![1, 1])
            .count();
        assert_eq!(stuck, 1);
    }
}
