pub mod attributes;
#[allow(clippy::module_inception)]
pub mod state;
pub mod state_graph;
pub mod state_set;
pub mod uniform;

pub use attributes::{AttributeKey, AttributeKind, StateAttribute, StateMode};
pub use state::State;
pub use state_graph::{StateGraph, StateGraphId, StateGraphNode, StateStack, StateTransition};
pub use state_set::{AttributePair, StateSet, StateSetKey, StateSetRef, UniformPair};
pub use uniform::{UniformType, UniformValue};
