//! Read-only view of the surrounding proof graph (search tree).
//!
//! The graph owns nodes, edges and covering; the explorer only navigates it.

use crate::types::{NodeId, StateId};

/// Proof-graph navigation used by the explorer.
pub trait ProofGraph {
    /// Program state stored at a node.
    type State;
    /// Edge label.
    type Action;

    /// Parent of `node`, or `None` for the root.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Action on the edge from the parent to `node`, or `None` for the root.
    fn in_action(&self, node: NodeId) -> Option<&Self::Action>;

    /// State at `node`.
    fn state(&self, node: NodeId) -> &Self::State;

    /// Stable identity of the state at `node`.
    fn state_id(&self, node: NodeId) -> StateId;

    /// Children of `node`, in edge order.
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// The node covering `node`, if any.
    fn covering_node(&self, node: NodeId) -> Option<NodeId>;

    /// True if `node` is covered by another node.
    fn is_covered(&self, node: NodeId) -> bool {
        self.covering_node(node).is_some()
    }

    /// True if `node` is reachable under the current abstraction.
    fn is_feasible(&self, node: NodeId) -> bool;

    /// True once all successors of `node` have been computed.
    fn is_expanded(&self, node: NodeId) -> bool;

    /// True if `node` needs no further exploration of its own.
    fn is_subsumed(&self, node: NodeId) -> bool {
        self.is_covered(node) || !self.is_feasible(node)
    }
}
