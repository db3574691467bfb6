//! Error types for the exploration controller.
//!
//! Only caller-contract violations and collaborator failures surface here.
//! Cycles in the search tree are a soundness condition the explorer resolves
//! itself; they are counted in [`ExplorationStats`](crate::stats::ExplorationStats),
//! never reported as errors.

use crate::types::{NodeId, StateId};
use thiserror::Error;

/// Error returned by [`Explorer`](crate::explore::Explorer) operations.
///
/// `E` is the error type of the transition oracle.
#[derive(Debug, Error)]
pub enum ExploreError<E: std::error::Error + 'static> {
    /// An operation that needs a current frame was called on an empty stack.
    #[error("exploration stack is empty")]
    EmptyStack,

    /// `next_action` was asked about a state that is not on top of the stack.
    #[error("state {requested} is not the top state {top}")]
    NotTopState {
        /// State passed by the caller.
        requested: StateId,
        /// State of the current top frame.
        top: StateId,
    },

    /// A node was added whose parent is not the current top node.
    #[error("node {node} is not a child of the top node {top}")]
    NotChildOfTop {
        /// Node passed by the caller.
        node: NodeId,
        /// Current top node.
        top: NodeId,
    },

    /// `add_all` was given more than one node.
    #[error("at most one node can be added at a time, got {count}")]
    BatchTooLarge {
        /// Number of nodes passed.
        count: usize,
    },

    /// A transition-oracle query failed.
    #[error("transition oracle failed: {0}")]
    Oracle(#[from] E),
}

impl<E: std::error::Error + 'static> ExploreError<E> {
    /// True for caller-contract violations, as opposed to oracle failures.
    #[must_use]
    pub const fn is_contract_violation(&self) -> bool {
        !matches!(self, Self::Oracle(_))
    }
}

/// Result alias for explorer operations.
pub type ExploreResult<T, E> = Result<T, ExploreError<E>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("solver timed out")]
    struct SolverTimeout;

    #[test]
    fn oracle_errors_convert_with_question_mark() {
        fn query() -> Result<(), SolverTimeout> {
            Err(SolverTimeout)
        }
        fn explore() -> ExploreResult<(), SolverTimeout> {
            query()?;
            Ok(())
        }
        let err = explore().unwrap_err();
        assert!(matches!(err, ExploreError::Oracle(SolverTimeout)));
        assert!(!err.is_contract_violation());
        assert_eq!(err.to_string(), "transition oracle failed: solver timed out");
    }

    #[test]
    fn contract_violations_render_ids() {
        let err: ExploreError<SolverTimeout> = ExploreError::NotChildOfTop {
            node: NodeId::new(4),
            top: NodeId::new(1),
        };
        assert!(err.is_contract_violation());
        assert_eq!(err.to_string(), "node n4 is not a child of the top node n1");

        let err: ExploreError<SolverTimeout> = ExploreError::NotTopState {
            requested: StateId::new(2),
            top: StateId::new(3),
        };
        assert_eq!(err.to_string(), "state s2 is not the top state s3");
    }
}
