//! StateGraph
//!
//! A tree of "what pipeline state is currently active", built during a scene
//! traversal and used during drawing to emit the smallest ordered set of
//! StateSet pops and pushes between two consecutive leaves.
//!
//! Children are keyed by StateSet *identity*, so every drawable sharing the
//! same chain of StateSets lands on the same node.
//!
//! # Arena
//!
//! Nodes live in a [`SlotMap`]. [`StateGraph::clean`] removes every node but
//! the root; the slot map keeps the freed slots and reuses them on the next
//! traversal. Ids issued before a clean are stale afterwards, and indexing the
//! graph with a stale id (or an id from another graph) panics.
//!
//! # Transitions
//!
//! ```text
//!        root                 from = B, to = E
//!       /    \
//!    A(S1)   D(S4)            pop S2, pop S1, push S4, push S5
//!     |       |
//!    B(S2)   E(S5)
//! ```

use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;

use rustc_hash::FxHashMap;

use super::state_set::{StateSetKey, StateSetRef};
use crate::render::RenderLeaf;

new_key_type! {
    pub struct StateGraphId;
}

#[derive(Debug, Default)]
pub struct StateGraphNode {
    pub parent: Option<StateGraphId>,
    pub stateset: Option<StateSetRef>,
    pub depth: u32,
    pub children: FxHashMap<StateSetKey, StateGraphId>,
    pub leaves: Vec<RenderLeaf>,
}

/// Receiver of StateSet transitions.
pub trait StateStack {
    fn push_state_set(&mut self, stateset: &StateSetRef);
    fn pop_state_set(&mut self, stateset: &StateSetRef);
}

/// A recorded transition.
#[derive(Debug, Clone)]
pub enum StateTransition {
    Push(StateSetRef),
    Pop(StateSetRef),
}

impl StateTransition {
    #[must_use]
    pub fn state_set(&self) -> &StateSetRef {
        match self {
            Self::Push(ss) | Self::Pop(ss) => ss,
        }
    }

    #[must_use]
    pub fn is_push(&self) -> bool {
        matches!(self, Self::Push(_))
    }
}

impl StateStack for Vec<StateTransition> {
    fn push_state_set(&mut self, stateset: &StateSetRef) {
        self.push(StateTransition::Push(stateset.clone()));
    }

    fn pop_state_set(&mut self, stateset: &StateSetRef) {
        self.push(StateTransition::Pop(stateset.clone()));
    }
}

/// Adapts a pair of closures to [`StateStack`].
struct CallbackStack<P, Q> {
    push: P,
    pop: Q,
}

impl<P, Q> StateStack for CallbackStack<P, Q>
where
    P: FnMut(&StateSetRef),
    Q: FnMut(&StateSetRef),
{
    #[inline]
    fn push_state_set(&mut self, stateset: &StateSetRef) {
        (self.push)(stateset);
    }

    #[inline]
    fn pop_state_set(&mut self, stateset: &StateSetRef) {
        (self.pop)(stateset);
    }
}

pub struct StateGraph {
    nodes: SlotMap<StateGraphId, StateGraphNode>,
    root: StateGraphId,
}

impl Default for StateGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl StateGraph {
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(StateGraphNode::default());
        Self { nodes, root }
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> StateGraphId {
        self.root
    }

    /// Live node count, root included.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    #[must_use]
    pub fn node(&self, id: StateGraphId) -> &StateGraphNode {
        &self.nodes[id]
    }

    #[inline]
    #[must_use]
    pub fn parent(&self, id: StateGraphId) -> Option<StateGraphId> {
        self.nodes[id].parent
    }

    #[inline]
    #[must_use]
    pub fn depth(&self, id: StateGraphId) -> u32 {
        self.nodes[id].depth
    }

    #[inline]
    #[must_use]
    pub fn state_set(&self, id: StateGraphId) -> Option<&StateSetRef> {
        self.nodes[id].stateset.as_ref()
    }

    #[must_use]
    pub fn children_count(&self, id: StateGraphId) -> usize {
        self.nodes[id].children.len()
    }

    #[must_use]
    pub fn contains(&self, id: StateGraphId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Child of `parent` keyed by the identity of `stateset`, created on first
    /// request.
    pub fn find_or_insert(&mut self, parent: StateGraphId, stateset: &StateSetRef) -> StateGraphId {
        let key = StateSetKey::of(stateset);
        if let Some(&child) = self.nodes[parent].children.get(&key) {
            return child;
        }

        let depth = self.nodes[parent].depth + 1;
        let child = self.nodes.insert(StateGraphNode {
            parent: Some(parent),
            stateset: Some(stateset.clone()),
            depth,
            ..StateGraphNode::default()
        });
        self.nodes[parent].children.insert(key, child);
        child
    }

    /// Child of `parent` carrying no StateSet. Such nodes are never shared.
    pub fn insert_group(&mut self, parent: StateGraphId) -> StateGraphId {
        let depth = self.nodes[parent].depth + 1;
        let child = self.nodes.insert(StateGraphNode {
            parent: Some(parent),
            depth,
            ..StateGraphNode::default()
        });
        let key = StateSetKey::group(child);
        self.nodes[parent].children.insert(key, child);
        child
    }

    pub fn add_leaf(&mut self, id: StateGraphId, leaf: RenderLeaf) {
        self.nodes[id].leaves.push(leaf);
    }

    #[must_use]
    pub fn leaves(&self, id: StateGraphId) -> &[RenderLeaf] {
        &self.nodes[id].leaves
    }

    /// Emit the pops and pushes that turn the applied path `root..from` into
    /// `root..to`.
    ///
    /// With `from == None` nothing is applied yet and the whole path to `to`
    /// is pushed. Both nodes must belong to this graph.
    pub fn move_state_graph(
        &self,
        stack: &mut impl StateStack,
        from: Option<StateGraphId>,
        to: StateGraphId,
    ) {
        let Some(mut from) = from else {
            self.push_path(stack, to);
            return;
        };

        if from == to {
            return;
        }

        let from_node = &self.nodes[from];
        let to_node = &self.nodes[to];

        // Siblings: the common case between consecutive leaves.
        if from_node.parent.is_some() && from_node.parent == to_node.parent {
            if let Some(ss) = &from_node.stateset {
                stack.pop_state_set(ss);
            }
            if let Some(ss) = &to_node.stateset {
                stack.push_state_set(ss);
            }
            return;
        }

        let mut to = to;
        let mut from_depth = from_node.depth;
        let mut to_depth = to_node.depth;

        while from_depth > to_depth {
            let node = &self.nodes[from];
            if let Some(ss) = &node.stateset {
                stack.pop_state_set(ss);
            }
            let Some(parent) = node.parent else { break };
            from = parent;
            from_depth -= 1;
        }

        let mut pending: SmallVec<[&StateSetRef; 16]> = SmallVec::new();

        while to_depth > from_depth {
            let node = &self.nodes[to];
            if let Some(ss) = &node.stateset {
                pending.push(ss);
            }
            let Some(parent) = node.parent else { break };
            to = parent;
            to_depth -= 1;
        }

        while from != to {
            let from_node = &self.nodes[from];
            if let Some(ss) = &from_node.stateset {
                stack.pop_state_set(ss);
            }
            let to_node = &self.nodes[to];
            if let Some(ss) = &to_node.stateset {
                pending.push(ss);
            }
            match (from_node.parent, to_node.parent) {
                (Some(f), Some(t)) => {
                    from = f;
                    to = t;
                }
                _ => break,
            }
        }

        for ss in pending.into_iter().rev() {
            stack.push_state_set(ss);
        }
    }

    /// Closure form of [`move_state_graph`](Self::move_state_graph).
    pub fn move_state_graph_with<P, Q>(
        &self,
        push: P,
        pop: Q,
        from: Option<StateGraphId>,
        to: StateGraphId,
    ) where
        P: FnMut(&StateSetRef),
        Q: FnMut(&StateSetRef),
    {
        let mut stack = CallbackStack { push, pop };
        self.move_state_graph(&mut stack, from, to);
    }

    /// Pop every StateSet on the path `root..from`, deepest first.
    pub fn pop_to_root(&self, stack: &mut impl StateStack, from: StateGraphId) {
        let mut current = Some(from);
        while let Some(id) = current {
            let node = &self.nodes[id];
            if let Some(ss) = &node.stateset {
                stack.pop_state_set(ss);
            }
            current = node.parent;
        }
    }

    fn push_path(&self, stack: &mut impl StateStack, to: StateGraphId) {
        let mut path: SmallVec<[&StateSetRef; 16]> = SmallVec::new();
        let mut current = Some(to);
        while let Some(id) = current {
            let node = &self.nodes[id];
            if let Some(ss) = &node.stateset {
                path.push(ss);
            }
            current = node.parent;
        }
        for ss in path.into_iter().rev() {
            stack.push_state_set(ss);
        }
    }

    /// Drop every node but the root and reset the root. Freed slots are
    /// reused by later inserts.
    pub fn clean(&mut self) {
        let root = self.root;
        let before = self.nodes.len();
        self.nodes.retain(|id, _| id == root);

        let root_node = &mut self.nodes[root];
        root_node.children.clear();
        root_node.leaves.clear();

        log::debug!("StateGraph cleaned: {} nodes recycled", before - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StateSet;

    #[test]
    fn root_has_depth_zero_and_no_stateset() {
        let graph = StateGraph::new();
        assert_eq!(graph.depth(graph.root()), 0);
        assert!(graph.state_set(graph.root()).is_none());
        assert!(graph.is_empty());
    }

    #[test]
    fn same_node_is_a_no_op() {
        let mut graph = StateGraph::new();
        let s1 = StateSet::new().into_ref();
        let a = graph.find_or_insert(graph.root(), &s1);

        let mut log: Vec<StateTransition> = Vec::new();
        graph.move_state_graph(&mut log, Some(a), a);
        assert!(log.is_empty());
    }

    #[test]
    fn groups_are_not_shared() {
        let mut graph = StateGraph::new();
        let root = graph.root();
        let g1 = graph.insert_group(root);
        let g2 = graph.insert_group(root);
        assert_ne!(g1, g2);
        assert_eq!(graph.children_count(root), 2);
    }
}
