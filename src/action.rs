//! Action identity and key-deduplicated action sets.
//!
//! An action of the modeled program may carry arbitrary runtime payload
//! (evaluated labels, source locations, solver handles). The controller only
//! ever compares actions by their [`ActionKey`]: the issuing process plus an
//! opaque operation handle. Two actions with equal keys are one entity in
//! every set operation, whatever their payload.

use crate::types::ProcessId;
use crate::util::ChoiceSource;
use core::fmt;
use core::hash::Hash;
use std::collections::BTreeMap;

/// An atomic action of the modeled program.
pub trait Action: Clone + fmt::Debug {
    /// Opaque, comparable handle of the underlying operation.
    type Operation: Clone + Eq + Ord + Hash + fmt::Debug;

    /// The process that executes this action.
    fn process(&self) -> ProcessId;

    /// The operation this action performs.
    fn operation(&self) -> &Self::Operation;

    /// The reduced-equality identity of this action.
    fn key(&self) -> ActionKey<Self::Operation> {
        ActionKey::new(self.process(), self.operation().clone())
    }
}

/// Reduced-equality view of an action: `(process, operation)`.
///
/// Ordering is by process first, which keeps iteration over action sets
/// stable and grouped per process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionKey<Op> {
    /// Issuing process.
    pub process: ProcessId,
    /// Operation handle.
    pub operation: Op,
}

impl<Op> ActionKey<Op> {
    /// Creates a key.
    #[must_use]
    pub const fn new(process: ProcessId, operation: Op) -> Self {
        Self { process, operation }
    }
}

impl<Op: fmt::Debug> fmt::Display for ActionKey<Op> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:?}", self.process, self.operation)
    }
}

/// An ordered set of actions deduplicated by [`ActionKey`].
///
/// The first payload inserted for a key is the one kept.
#[derive(Clone)]
pub struct ActionSet<A: Action> {
    entries: BTreeMap<ActionKey<A::Operation>, A>,
}

impl<A: Action> Default for ActionSet<A> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<A: Action> ActionSet<A> {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `action`. Returns false if an action with the same key was
    /// already present; the existing payload is kept.
    pub fn insert(&mut self, action: A) -> bool {
        use std::collections::btree_map::Entry;
        match self.entries.entry(action.key()) {
            Entry::Vacant(slot) => {
                slot.insert(action);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// True if an action with the same key is in the set.
    #[must_use]
    pub fn contains(&self, action: &A) -> bool {
        self.entries.contains_key(&action.key())
    }

    /// True if `key` is in the set.
    #[must_use]
    pub fn contains_key(&self, key: &ActionKey<A::Operation>) -> bool {
        self.entries.contains_key(key)
    }

    /// Removes the action with the same key. Returns true if one was present.
    pub fn remove(&mut self, action: &A) -> bool {
        self.entries.remove(&action.key()).is_some()
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the actions in key order.
    pub fn iter(&self) -> impl Iterator<Item = &A> {
        self.entries.values()
    }

    /// Iterates over the keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &ActionKey<A::Operation>> {
        self.entries.keys()
    }

    /// Actions of `self` whose key is not in `other`.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        self.entries
            .iter()
            .filter(|(k, _)| !other.entries.contains_key(k))
            .map(|(_, a)| a.clone())
            .collect()
    }

    /// True if every key of `self` is in `other`.
    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.entries.keys().all(|k| other.entries.contains_key(k))
    }

    /// True if the two sets share at least one key.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.entries.keys().any(|k| large.entries.contains_key(k))
    }

    /// Keeps only the actions for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&A) -> bool) {
        self.entries.retain(|_, a| keep(a));
    }

    /// Picks one action using `choice`, or `None` if the set is empty.
    pub fn choose(&self, choice: &mut dyn ChoiceSource) -> Option<&A> {
        if self.entries.is_empty() {
            return None;
        }
        let index = choice.pick(self.entries.len());
        self.entries.values().nth(index)
    }
}

impl<A: Action> Extend<A> for ActionSet<A> {
    fn extend<I: IntoIterator<Item = A>>(&mut self, iter: I) {
        for action in iter {
            self.insert(action);
        }
    }
}

impl<A: Action> FromIterator<A> for ActionSet<A> {
    fn from_iter<I: IntoIterator<Item = A>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<A: Action> IntoIterator for ActionSet<A> {
    type Item = A;
    type IntoIter = std::collections::btree_map::IntoValues<ActionKey<A::Operation>, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_values()
    }
}

impl<'a, A: Action> IntoIterator for &'a ActionSet<A>
where
    A::Operation: 'a,
{
    type Item = &'a A;
    type IntoIter = std::collections::btree_map::Values<'a, ActionKey<A::Operation>, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}

impl<A: Action> PartialEq for ActionSet<A> {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len() && self.is_subset(other)
    }
}

impl<A: Action> Eq for ActionSet<A> {}

impl<A: Action> fmt::Debug for ActionSet<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.values()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::DetChoice;

    #[derive(Debug, Clone)]
    struct Op {
        process: ProcessId,
        op: u8,
        payload: &'static str,
    }

    impl Action for Op {
        type Operation = u8;

        fn process(&self) -> ProcessId {
            self.process
        }

        fn operation(&self) -> &u8 {
            &self.op
        }
    }

    fn op(p: u32, op: u8, payload: &'static str) -> Op {
        Op {
            process: ProcessId::new(p),
            op,
            payload,
        }
    }

    #[test]
    fn equal_keys_are_one_entity() {
        let mut set = ActionSet::new();
        assert!(set.insert(op(0, 1, "first")));
        assert!(!set.insert(op(0, 1, "second")));
        assert_eq!(set.len(), 1);
        assert_eq!(set.iter().next().map(|a| a.payload), Some("first"));
        assert!(set.contains(&op(0, 1, "other payload")));
        assert!(set.remove(&op(0, 1, "yet another")));
        assert!(set.is_empty());
    }

    #[test]
    fn same_operation_different_process_is_distinct() {
        let set: ActionSet<Op> = [op(0, 1, ""), op(1, 1, "")].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn set_algebra_uses_keys() {
        let a: ActionSet<Op> = [op(0, 1, "a"), op(0, 2, "a"), op(1, 1, "a")]
            .into_iter()
            .collect();
        let b: ActionSet<Op> = [op(0, 2, "b"), op(1, 1, "b")].into_iter().collect();

        let diff = a.difference(&b);
        assert_eq!(diff.len(), 1);
        assert!(diff.contains(&op(0, 1, "")));
        assert!(b.is_subset(&a));
        assert!(!a.is_subset(&b));
        assert!(a.intersects(&b));
        assert!(!diff.intersects(&b));
        assert_eq!(b, [op(1, 1, "x"), op(0, 2, "y")].into_iter().collect());
    }

    #[test]
    fn choose_is_seed_deterministic() {
        let set: ActionSet<Op> = (0..10).map(|i| op(0, i, "")).collect();
        let mut c1 = DetChoice::new(3);
        let mut c2 = DetChoice::new(3);
        for _ in 0..20 {
            let x = set.choose(&mut c1).map(|a| a.op);
            let y = set.choose(&mut c2).map(|a| a.op);
            assert_eq!(x, y);
            assert!(x.is_some());
        }
        assert!(ActionSet::<Op>::new().choose(&mut c1).is_none());
    }

    #[test]
    fn owned_set_extends_another() {
        let kept: ActionSet<Op> = [op(0, 1, "kept"), op(1, 2, "kept")].into_iter().collect();
        let mut backtrack: ActionSet<Op> = [op(0, 1, "old")].into_iter().collect();
        backtrack.extend(kept);
        assert_eq!(backtrack.len(), 2);
        // The earlier member wins on a key collision.
        assert!(backtrack.iter().any(|a| a.op == 1 && a.payload == "old"));
        assert!(backtrack.contains(&op(1, 2, "")));
    }
}
