//! Exploration counters.

use core::fmt;
use serde::{Deserialize, Serialize};

/// Counters accumulated by an explorer across rounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorationStats {
    /// Frames pushed onto the real stack.
    pub pushes: u64,
    /// Frames pushed during virtual exploration.
    pub virtual_pushes: u64,
    /// Frames popped from the real stack.
    pub pops: u64,
    /// Pushes refused because the node was already on the stack.
    pub cycles: u64,
    /// Dependent, reversible pairs found by race detection.
    pub reversible_races: u64,
    /// Dependent pairs that could not be reordered.
    pub irreversible_pairs: u64,
    /// Races whose initials set was empty.
    pub empty_initials: u64,
    /// Actions newly inserted into a backtrack set by race detection.
    pub backtrack_insertions: u64,
    /// Actions forced into a backtrack set by a lock left held on pop.
    pub forced_lock_backtracks: u64,
    /// Child edges replayed by lazy re-exploration.
    pub lazy_replays: u64,
    /// Virtual explorations stopped by the influence cutoff.
    pub virtual_cutoffs: u64,
    /// Exploration rounds started.
    pub rounds: u64,
}

impl ExplorationStats {
    /// Serializes the counters as a JSON object.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for ExplorationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rounds={} pushes={} virtual={} pops={} races={} irreversible={} \
             empty_initials={} backtracks={} forced={} lazy={} cutoffs={} cycles={}",
            self.rounds,
            self.pushes,
            self.virtual_pushes,
            self.pops,
            self.reversible_races,
            self.irreversible_pairs,
            self.empty_initials,
            self.backtrack_insertions,
            self.forced_lock_backtracks,
            self.lazy_replays,
            self.virtual_cutoffs,
            self.cycles,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_contains_counters() {
        let stats = ExplorationStats {
            pushes: 3,
            cycles: 1,
            ..ExplorationStats::default()
        };
        let json = stats.to_json().expect("serialize");
        let value: serde_json::Value = serde_json::from_str(&json).expect("parse");
        assert_eq!(value["pushes"], 3);
        assert_eq!(value["cycles"], 1);
        assert_eq!(value["pops"], 0);
    }

    #[test]
    fn display_is_single_line() {
        let line = ExplorationStats::default().to_string();
        assert!(!line.contains('\n'));
        assert!(line.starts_with("rounds=0"));
    }
}
