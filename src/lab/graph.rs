//! Arena-backed proof graph for lab runs.

use super::program::{LabAction, LabState};
use crate::action::Action;
use crate::graph::ProofGraph;
use crate::types::{NodeId, StateId};

#[derive(Debug, Clone)]
struct LabNode {
    parent: Option<NodeId>,
    action: Option<LabAction>,
    state: LabState,
    state_id: StateId,
    children: Vec<NodeId>,
    covering: Option<NodeId>,
    expanded: bool,
    pruned: bool,
}

/// A search tree of lab states.
///
/// Nodes are never freed; pruning detaches a subtree and marks it dead.
/// Every node gets a fresh [`StateId`], so decorations of pruned states are
/// never confused with live ones.
#[derive(Debug, Clone)]
pub struct LabGraph {
    nodes: Vec<LabNode>,
}

impl LabGraph {
    /// A graph holding only the root.
    #[must_use]
    pub fn new(root: LabState) -> Self {
        Self {
            nodes: vec![LabNode {
                parent: None,
                action: None,
                state: root,
                state_id: StateId::new(0),
                children: Vec::new(),
                covering: None,
                expanded: false,
                pruned: false,
            }],
        }
    }

    /// The root node.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId::new(0)
    }

    /// Total number of nodes ever created, pruned ones included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes that have not been pruned.
    #[allow(clippy::cast_possible_truncation)] // node ids are u32 by construction
    pub fn live_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| !n.pruned)
            .map(|(i, _)| NodeId::new(i as u32))
    }

    fn node(&self, id: NodeId) -> &LabNode {
        &self.nodes[id.as_usize()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut LabNode {
        &mut self.nodes[id.as_usize()]
    }

    /// Creates a child of `parent` reached by `action`.
    #[allow(clippy::cast_possible_truncation)] // fewer than u32::MAX nodes
    pub fn add_child(&mut self, parent: NodeId, action: LabAction, state: LabState) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(LabNode {
            parent: Some(parent),
            action: Some(action),
            state,
            state_id: StateId::new(u64::from(id.index())),
            children: Vec::new(),
            covering: None,
            expanded: false,
            pruned: false,
        });
        self.node_mut(parent).children.push(id);
        id
    }

    /// The existing child of `parent` reached by an action with the same
    /// identity as `action`.
    #[must_use]
    pub fn child_with_action(&self, parent: NodeId, action: &LabAction) -> Option<NodeId> {
        let key = action.key();
        self.node(parent).children.iter().copied().find(|&child| {
            self.node(child)
                .action
                .as_ref()
                .is_some_and(|a| a.key() == key)
        })
    }

    /// Marks `node` as expanded.
    pub fn mark_expanded(&mut self, node: NodeId) {
        self.node_mut(node).expanded = true;
    }

    /// Covers `node` by `covering`.
    pub fn cover(&mut self, node: NodeId, covering: NodeId) {
        self.node_mut(node).covering = Some(covering);
    }

    /// Detaches the subtree rooted at `node`. Pruning the root keeps the
    /// root itself and drops everything below it. Nodes covered by a pruned
    /// node are uncovered. The parent becomes unexpanded.
    pub fn prune(&mut self, node: NodeId) {
        let mut dead = Vec::new();
        let mut work = if node == self.root() {
            let root = self.node_mut(node);
            root.expanded = false;
            root.covering = None;
            std::mem::take(&mut root.children)
        } else {
            if let Some(parent) = self.node(node).parent {
                let parent = self.node_mut(parent);
                parent.children.retain(|&c| c != node);
                parent.expanded = false;
            }
            vec![node]
        };
        while let Some(id) = work.pop() {
            let n = self.node_mut(id);
            n.pruned = true;
            dead.push(id);
            work.extend(n.children.iter().copied());
        }
        for n in &mut self.nodes {
            if n.covering.is_some_and(|c| dead.contains(&c)) {
                n.covering = None;
            }
        }
    }

    /// True if `node` has been pruned.
    #[must_use]
    pub fn is_pruned(&self, node: NodeId) -> bool {
        self.node(node).pruned
    }

    /// Uncovered leaves of the live tree.
    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.live_nodes()
            .filter(|&id| self.node(id).children.is_empty() && self.node(id).covering.is_none())
    }

    /// Path of actions from the root to `node`.
    #[must_use]
    pub fn trace_to(&self, node: NodeId) -> Vec<LabAction> {
        let mut path = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            let n = self.node(id);
            if let Some(action) = &n.action {
                path.push(action.clone());
            }
            current = n.parent;
        }
        path.reverse();
        path
    }
}

impl ProofGraph for LabGraph {
    type State = LabState;
    type Action = LabAction;

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    fn in_action(&self, node: NodeId) -> Option<&LabAction> {
        self.node(node).action.as_ref()
    }

    fn state(&self, node: NodeId) -> &LabState {
        &self.node(node).state
    }

    fn state_id(&self, node: NodeId) -> StateId {
        self.node(node).state_id
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node).children.clone()
    }

    fn covering_node(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).covering
    }

    fn is_feasible(&self, _node: NodeId) -> bool {
        true
    }

    fn is_expanded(&self, node: NodeId) -> bool {
        self.node(node).expanded
    }
}
