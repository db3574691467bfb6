//! Identifier types for exploration entities.
//!
//! These types provide type-safe identifiers for the entities the exploration
//! controller reasons about: modeled processes, proof-graph nodes, explored
//! states, and locks. Node and state identifiers are handed out by the proof
//! graph, which guarantees their uniqueness; the controller never mints them.

use core::fmt;
use serde::{Deserialize, Serialize};

/// Identifier of a process (thread) of the modeled program.
///
/// This is not an execution thread of the controller: exploration is
/// single-threaded and only models concurrency.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(u32);

impl ProcessId {
    /// Creates a process ID from its raw index.
    #[inline]
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Returns the raw index as a `usize`, for indexing per-process tables.
    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ProcessId {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProcessId({})", self.0)
    }
}

impl fmt::Display for ProcessId {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Identifier of a node in the proof graph (search tree).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Creates a node ID from its raw index.
    #[inline]
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Returns the raw index as a `usize`, for arena lookups.
    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Stable identity of an explored state.
///
/// Exploration decorations (backtrack, sleep and explored sets) are keyed by
/// this identifier and outlive the search stack, so the proof graph must never
/// reuse a `StateId` for a different state.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(u64);

impl StateId {
    /// Creates a state ID from its raw value.
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for StateId {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StateId({})", self.0)
    }
}

impl fmt::Display for StateId {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Identity of a lock held by a process of the modeled program.
///
/// [`LockId::Atomic`] is the process-wide lock taken by atomic blocks: while
/// it is held, every action of every other process is blocked.
///
/// Serialized as its display string, so lock identities can key JSON maps.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum LockId {
    /// A named mutex.
    Named(String),
    /// The lock held for the duration of an atomic block.
    Atomic,
}

impl LockId {
    /// Creates a named mutex identity.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Returns true for the atomic-block lock.
    #[inline]
    #[must_use]
    pub const fn is_atomic(&self) -> bool {
        matches!(self, Self::Atomic)
    }
}

const ATOMIC_LOCK_NAME: &str = "<atomic>";

impl From<LockId> for String {
    fn from(lock: LockId) -> Self {
        match lock {
            LockId::Named(name) => name,
            LockId::Atomic => ATOMIC_LOCK_NAME.to_owned(),
        }
    }
}

impl From<String> for LockId {
    fn from(name: String) -> Self {
        if name == ATOMIC_LOCK_NAME {
            Self::Atomic
        } else {
            Self::Named(name)
        }
    }
}

impl fmt::Debug for LockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "LockId({name})"),
            Self::Atomic => f.write_str("LockId(<atomic>)"),
        }
    }
}

impl fmt::Display for LockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Atomic => f.write_str(ATOMIC_LOCK_NAME),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_forms_are_compact() {
        assert_eq!(ProcessId::new(3).to_string(), "P3");
        assert_eq!(NodeId::new(7).to_string(), "n7");
        assert_eq!(StateId::new(9).to_string(), "s9");
        assert_eq!(LockId::named("m").to_string(), "m");
        assert_eq!(LockId::Atomic.to_string(), "<atomic>");
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&ProcessId::new(2)).expect("serialize");
        assert_eq!(json, "2");
        let back: NodeId = serde_json::from_str("11").expect("deserialize");
        assert_eq!(back, NodeId::new(11));
    }

    #[test]
    fn atomic_lock_is_distinguished() {
        assert!(LockId::Atomic.is_atomic());
        assert!(!LockId::named("atomic").is_atomic());
        assert_ne!(LockId::Atomic, LockId::named("<atomic>"));
    }

    #[test]
    fn locks_serialize_as_strings() {
        let held: std::collections::BTreeMap<LockId, ProcessId> =
            [(LockId::named("m"), ProcessId::new(0)), (LockId::Atomic, ProcessId::new(1))]
                .into_iter()
                .collect();
        let json = serde_json::to_string(&held).expect("serialize");
        let back: std::collections::BTreeMap<LockId, ProcessId> =
            serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, held);
    }
}
