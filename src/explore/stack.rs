//! The DFS search stack.
//!
//! Each frame is tied to one proof-graph node and carries the happens-before
//! bookkeeping race detection needs. Decorations (backtrack, sleep, explored)
//! are not stored here: they belong to states and outlive the stack, see
//! [`DecorationTable`](super::decoration::DecorationTable).

use crate::types::{LockId, NodeId, ProcessId};
use std::collections::BTreeMap;
use std::ops::Index;

/// Latest stack index per process known to happen before some action.
pub type DependentIndex = BTreeMap<ProcessId, usize>;

/// One element of the search stack.
#[derive(Debug, Clone)]
pub struct StackFrame<A> {
    /// The proof-graph node of this frame.
    pub node: NodeId,
    /// The action that produced this frame; `None` only for the root.
    pub action: Option<A>,
    /// Most recent stack index of each process that has acted.
    pub process_last_action: BTreeMap<ProcessId, usize>,
    /// For each process, the latest index of every process ordered before
    /// its last action by a dependency chain.
    pub last_dependents: BTreeMap<ProcessId, DependentIndex>,
    /// Stack index at which each currently held lock was acquired.
    pub mutex_locks: BTreeMap<LockId, usize>,
}

impl<A> StackFrame<A> {
    /// Frame for the root node: no action, no history.
    #[must_use]
    pub fn root(node: NodeId) -> Self {
        Self {
            node,
            action: None,
            process_last_action: BTreeMap::new(),
            last_dependents: BTreeMap::new(),
            mutex_locks: BTreeMap::new(),
        }
    }

    /// Locks acquired exactly at `index` and still held at this frame.
    pub fn locks_acquired_at(&self, index: usize) -> impl Iterator<Item = &LockId> {
        self.mutex_locks
            .iter()
            .filter(move |&(_, &at)| at == index)
            .map(|(lock, _)| lock)
    }
}

/// Ordered frames from the root (index 0) to the current DFS position.
#[derive(Debug, Clone)]
pub struct SearchStack<A> {
    frames: Vec<StackFrame<A>>,
}

impl<A> Default for SearchStack<A> {
    fn default() -> Self {
        Self { frames: Vec::new() }
    }
}

impl<A> SearchStack<A> {
    /// Number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True if there are no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The top frame.
    #[must_use]
    pub fn top(&self) -> Option<&StackFrame<A>> {
        self.frames.last()
    }

    /// Node of the top frame.
    #[must_use]
    pub fn top_node(&self) -> Option<NodeId> {
        self.frames.last().map(|f| f.node)
    }

    /// Mutable access to the frame at `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut StackFrame<A>> {
        self.frames.get_mut(index)
    }

    /// Index of `node` on the stack, if present.
    #[must_use]
    pub fn position_of(&self, node: NodeId) -> Option<usize> {
        self.frames.iter().position(|f| f.node == node)
    }

    /// Appends a frame.
    pub fn push(&mut self, frame: StackFrame<A>) {
        self.frames.push(frame);
    }

    /// Removes and returns the top frame.
    pub fn pop(&mut self) -> Option<StackFrame<A>> {
        self.frames.pop()
    }

    /// Drops frames above `len`.
    pub fn truncate(&mut self, len: usize) {
        self.frames.truncate(len);
    }

    /// Removes every frame.
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Nodes from the root to the top.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.frames.iter().map(|f| f.node)
    }
}

impl<A> Index<usize> for SearchStack<A> {
    type Output = StackFrame<A>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.frames[index]
    }
}

/// Pointwise maximum of two dependency indices, over the union of keys.
pub fn merge_max(into: &mut DependentIndex, other: &DependentIndex) {
    for (&process, &index) in other {
        into.entry(process)
            .and_modify(|current| *current = (*current).max(index))
            .or_insert(index);
    }
}
