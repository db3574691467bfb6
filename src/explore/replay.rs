//! Replays of existing proof-graph structure.
//!
//! Two kinds of replay feed race detection without producing new states:
//!
//! - Virtual exploration walks the subtree of a covering node on a transient
//!   stack extension, so that races between the real stack and behavior
//!   only present below the covering node are still found.
//! - Lazy re-exploration pushes child edges kept from an earlier round as if
//!   they had just been chosen, reconciling old and new behavior.

use super::Explorer;
use crate::action::Action;
use crate::error::ExploreResult;
use crate::graph::ProofGraph;
use crate::oracle::TransitionOracle;
use crate::tracing_compat::trace;
use crate::types::NodeId;

/// One (possibly nested) walk of a covering subtree.
#[derive(Debug)]
struct Walk {
    /// The covering node whose subtree is walked. It is not itself pushed.
    root: NodeId,
    /// Stack size when the walk started; frames above it are transient.
    start: usize,
    pending: Vec<NodeId>,
}

impl<O: TransitionOracle> Explorer<O> {
    /// Walks the subtree of `covering` on top of the stack, following
    /// further covering edges, and restores the stack size afterwards.
    /// `real_size` is the size of the non-virtual part of the stack.
    pub(super) fn virtual_exploration<G>(
        &mut self,
        graph: &G,
        covering: NodeId,
        real_size: usize,
    ) -> ExploreResult<(), O::Error>
    where
        G: ProofGraph<State = O::State, Action = O::Action>,
    {
        let mut walks = vec![Walk {
            root: covering,
            start: self.stack.len(),
            pending: vec![covering],
        }];

        while let Some(walk) = walks.last_mut() {
            let Some(visiting) = walk.pending.pop() else {
                self.stack.truncate(walk.start);
                walks.pop();
                continue;
            };
            let (root, start) = (walk.root, walk.start);

            let parent = graph.parent(visiting);
            while self.stack.len() > start && self.stack.top_node() != parent {
                self.stack.pop();
            }

            if visiting != root {
                if !self.push(graph, visiting, start)? {
                    continue;
                }
                if self.no_influence_on_real(real_size) {
                    self.stats.virtual_cutoffs += 1;
                    trace!(node = %visiting, real_size, "virtual exploration cut off");
                    continue;
                }
            }

            match graph.covering_node(visiting) {
                Some(next) if walks.iter().any(|w| w.root == next) => {}
                Some(next) => walks.push(Walk {
                    root: next,
                    start: self.stack.len(),
                    pending: vec![next],
                }),
                None => {
                    if let Some(walk) = walks.last_mut() {
                        walk.pending.extend(graph.children(visiting));
                    }
                }
            }
        }
        Ok(())
    }

    /// Replays kept child edges of the top frame that have not been visited
    /// this round and are not asleep, descending into each.
    pub(super) fn explore_lazily<G>(&mut self, graph: &G) -> ExploreResult<(), O::Error>
    where
        G: ProofGraph<State = O::State, Action = O::Action>,
    {
        if !self.config.lazy_reexploration {
            return Ok(());
        }
        while let Some(top) = self.stack.top_node() {
            let state = graph.state_id(top);
            let sleep = self.table.sleep(state);
            let replayable: Vec<(NodeId, O::Action)> = graph
                .children(top)
                .into_iter()
                .filter(|&child| !self.table.is_re_explored(graph.state_id(child)))
                .filter_map(|child| graph.in_action(child).map(|a| (child, a.clone())))
                .filter(|(_, action)| !sleep.contains(action))
                .collect();
            if replayable.is_empty() {
                return Ok(());
            }

            let (child, action) = replayable[self.choice.pick(replayable.len())].clone();
            let enabled = self.enabled(graph, top)?;
            self.record_taken(state, &enabled, &action);
            self.stats.lazy_replays += 1;
            trace!(
                node = %child,
                process = %action.process(),
                "replaying kept edge"
            );
            self.add(graph, child)?;
        }
        Ok(())
    }

    /// True once no process on the top frame can still depend on an index
    /// in the real part of the stack, so a virtual walk cannot find further
    /// races that matter to real exploration.
    fn no_influence_on_real(&self, real_size: usize) -> bool {
        let Some(top) = self.stack.top() else {
            return true;
        };
        top.process_last_action.keys().all(|process| {
            top.last_dependents
                .get(process)
                .is_some_and(|deps| deps.values().all(|&index| index >= real_size))
        })
    }
}
