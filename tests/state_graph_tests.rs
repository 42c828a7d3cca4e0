//! StateGraph tests
//!
//! Tests for:
//! - Depth invariant and idempotent find-or-insert
//! - Sibling fast path, general walk and empty-origin transitions
//! - Applied path after arbitrary moves
//! - Callback form, pop to root and clean

use std::rc::Rc;

use stratum::state::{StateGraph, StateGraphId, StateSet, StateSetRef, StateStack, StateTransition};

// ============================================================================
// Helper
// ============================================================================

fn named(name: &str) -> StateSetRef {
    StateSet::with_name(name).into_ref()
}

fn transitions(log: &[StateTransition]) -> Vec<String> {
    log.iter()
        .map(|t| {
            let name = t.state_set().name.clone().unwrap_or_default();
            if t.is_push() { format!("push {name}") } else { format!("pop {name}") }
        })
        .collect()
}

/// Applied StateSet stack, as a renderer would keep it.
#[derive(Default)]
struct Applied(Vec<StateSetRef>);

impl StateStack for Applied {
    fn push_state_set(&mut self, stateset: &StateSetRef) {
        self.0.push(stateset.clone());
    }

    fn pop_state_set(&mut self, stateset: &StateSetRef) {
        let top = self.0.pop();
        assert!(top.is_some_and(|top| Rc::ptr_eq(&top, stateset)), "unbalanced pop");
    }
}

fn path(graph: &StateGraph, id: StateGraphId) -> Vec<StateSetRef> {
    let mut path = Vec::new();
    let mut current = Some(id);
    while let Some(node) = current {
        if let Some(ss) = graph.state_set(node) {
            path.push(ss.clone());
        }
        current = graph.parent(node);
    }
    path.reverse();
    path
}

// ============================================================================
// Structure
// ============================================================================

#[test]
fn child_depth_is_parent_depth_plus_one() {
    let mut graph = StateGraph::new();
    let s1 = named("S1");
    let s2 = named("S2");
    let a = graph.find_or_insert(graph.root(), &s1);
    let b = graph.find_or_insert(a, &s2);
    let g = graph.insert_group(b);

    for id in [a, b, g] {
        let parent = graph.parent(id).unwrap();
        assert_eq!(graph.depth(id), graph.depth(parent) + 1);
    }
}

#[test]
fn find_or_insert_is_idempotent_by_identity() {
    let mut graph = StateGraph::new();
    let s1 = named("S1");
    let a = graph.find_or_insert(graph.root(), &s1);
    assert_eq!(graph.find_or_insert(graph.root(), &s1), a);
    assert_eq!(graph.children_count(graph.root()), 1);

    // Equal content, different identity.
    let twin = named("S1");
    assert_ne!(graph.find_or_insert(graph.root(), &twin), a);
    assert_eq!(graph.children_count(graph.root()), 2);
}

// ============================================================================
// Transitions
// ============================================================================

#[test]
fn siblings_take_the_fast_path() {
    let mut graph = StateGraph::new();
    let (s1, s2, s3) = (named("S1"), named("S2"), named("S3"));
    let a = graph.find_or_insert(graph.root(), &s1);
    let b = graph.find_or_insert(a, &s2);
    let c = graph.find_or_insert(a, &s3);

    let mut log = Vec::new();
    graph.move_state_graph(&mut log, Some(b), c);
    assert_eq!(transitions(&log), ["pop S2", "push S3"]);
}

#[test]
fn general_path_pops_then_pushes_in_order() {
    let mut graph = StateGraph::new();
    let (s1, s2, s4, s5) = (named("S1"), named("S2"), named("S4"), named("S5"));
    let a = graph.find_or_insert(graph.root(), &s1);
    let b = graph.find_or_insert(a, &s2);
    let d = graph.find_or_insert(graph.root(), &s4);
    let e = graph.find_or_insert(d, &s5);

    let mut log = Vec::new();
    graph.move_state_graph(&mut log, Some(b), e);
    assert_eq!(transitions(&log), ["pop S2", "pop S1", "push S4", "push S5"]);
}

#[test]
fn null_origin_pushes_path_skipping_empty_nodes() {
    let mut graph = StateGraph::new();
    let (s1, s3) = (named("S1"), named("S3"));
    let a = graph.find_or_insert(graph.root(), &s1);
    let group = graph.insert_group(a);
    let leaf = graph.find_or_insert(group, &s3);

    let mut log = Vec::new();
    graph.move_state_graph(&mut log, None, leaf);
    assert_eq!(transitions(&log), ["push S1", "push S3"]);
}

#[test]
fn uneven_depths_meet_at_common_ancestor() {
    let mut graph = StateGraph::new();
    let (s1, s2, s3, s4) = (named("S1"), named("S2"), named("S3"), named("S4"));
    let a = graph.find_or_insert(graph.root(), &s1);
    let b = graph.find_or_insert(a, &s2);
    let c = graph.find_or_insert(b, &s3);
    let d = graph.find_or_insert(a, &s4);

    let mut log = Vec::new();
    graph.move_state_graph(&mut log, Some(c), d);
    assert_eq!(transitions(&log), ["pop S3", "pop S2", "push S4"]);

    log.clear();
    graph.move_state_graph(&mut log, Some(d), c);
    assert_eq!(transitions(&log), ["pop S4", "push S2", "push S3"]);
}

#[test]
fn applied_stack_always_matches_target_path() {
    let mut graph = StateGraph::new();
    let sets: Vec<_> = (0..6).map(|i| named(&format!("S{i}"))).collect();
    let a = graph.find_or_insert(graph.root(), &sets[0]);
    let b = graph.find_or_insert(a, &sets[1]);
    let g = graph.insert_group(b);
    let c = graph.find_or_insert(g, &sets[2]);
    let d = graph.find_or_insert(graph.root(), &sets[3]);
    let e = graph.find_or_insert(d, &sets[4]);
    let f = graph.find_or_insert(a, &sets[5]);

    let order = [c, e, f, b, c, a, e, g, d, f];
    let mut applied = Applied::default();
    let mut previous = None;
    for &to in &order {
        graph.move_state_graph(&mut applied, previous, to);
        let expected = path(&graph, to);
        assert_eq!(applied.0.len(), expected.len());
        assert!(applied.0.iter().zip(&expected).all(|(x, y)| Rc::ptr_eq(x, y)));
        previous = Some(to);
    }

    graph.pop_to_root(&mut applied, f);
    assert!(applied.0.is_empty());
}

#[test]
fn callback_form_matches_recorded_form() {
    let mut graph = StateGraph::new();
    let (s1, s2, s4) = (named("S1"), named("S2"), named("S4"));
    let a = graph.find_or_insert(graph.root(), &s1);
    let b = graph.find_or_insert(a, &s2);
    let d = graph.find_or_insert(graph.root(), &s4);

    let mut events = Vec::new();
    {
        let events = std::cell::RefCell::new(&mut events);
        graph.move_state_graph_with(
            |ss| events.borrow_mut().push(format!("push {}", ss.name.as_deref().unwrap_or(""))),
            |ss| events.borrow_mut().push(format!("pop {}", ss.name.as_deref().unwrap_or(""))),
            Some(b),
            d,
        );
    }
    assert_eq!(events, ["pop S2", "pop S1", "push S4"]);
}

#[test]
fn same_node_emits_nothing() {
    let mut graph = StateGraph::new();
    let s1 = named("S1");
    let a = graph.find_or_insert(graph.root(), &s1);
    let mut log = Vec::new();
    graph.move_state_graph(&mut log, Some(a), a);
    assert!(log.is_empty());
}

// ============================================================================
// Clean
// ============================================================================

#[test]
fn clean_keeps_only_the_root() {
    let mut graph = StateGraph::new();
    let s1 = named("S1");
    let a = graph.find_or_insert(graph.root(), &s1);
    graph.find_or_insert(a, &named("S2"));
    assert_eq!(graph.len(), 3);

    graph.clean();
    assert_eq!(graph.len(), 1);
    assert_eq!(graph.children_count(graph.root()), 0);
    assert!(!graph.contains(a));

    let again = graph.find_or_insert(graph.root(), &s1);
    assert_eq!(graph.depth(again), 1);
}
