//! StateSet
//!
//! A bundle of attributes, per-unit texture attributes, uniforms and an
//! optional material graph description. StateSets are shared through
//! [`StateSetRef`] and are immutable once shared; the StateGraph keys its
//! nodes by the identity of that shared allocation, never by content.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::attributes::{AttributeKey, AttributeKind, StateAttribute, StateMode};
use super::state_graph::StateGraphId;
use super::uniform::UniformValue;
use crate::shader::description::GraphDescription;

/// Shared handle to an immutable StateSet.
pub type StateSetRef = Rc<StateSet>;

/// Identity of a StateGraph child: the address of a shared StateSet's `Rc`
/// allocation, or the node id of a group without a StateSet.
///
/// A `Shared` key is only meaningful while a clone of the `Rc` is alive;
/// StateGraph nodes hold one for exactly that reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateSetKey {
    Shared(usize),
    Group(StateGraphId),
}

impl StateSetKey {
    #[inline]
    #[must_use]
    pub fn of(state_set: &StateSetRef) -> Self {
        Self::Shared(Rc::as_ptr(state_set) as usize)
    }

    /// Key of a StateGraph node without a StateSet.
    #[inline]
    pub(crate) fn group(id: StateGraphId) -> Self {
        Self::Group(id)
    }
}

/// An attribute together with its inheritance mode.
#[derive(Debug, Clone)]
pub struct AttributePair {
    pub attribute: Rc<StateAttribute>,
    pub mode: StateMode,
}

#[derive(Debug, Clone)]
pub struct UniformPair {
    pub value: UniformValue,
    pub mode: StateMode,
}

#[derive(Debug, Clone, Default)]
pub struct StateSet {
    pub name: Option<String>,
    attributes: FxHashMap<AttributeKey, AttributePair>,
    texture_attributes: Vec<FxHashMap<AttributeKind, AttributePair>>,
    uniforms: FxHashMap<String, UniformPair>,
    shader_graph: Option<Rc<GraphDescription>>,
}

impl StateSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Freeze into a shared handle.
    #[must_use]
    pub fn into_ref(self) -> StateSetRef {
        Rc::new(self)
    }

    pub fn set_attribute(&mut self, attribute: impl Into<StateAttribute>) {
        self.set_attribute_and_mode(attribute, StateMode::ON);
    }

    /// Texture attributes passed here are routed to unit 0.
    pub fn set_attribute_and_mode(&mut self, attribute: impl Into<StateAttribute>, mode: StateMode) {
        let attribute = attribute.into();
        if attribute.kind().is_texture_attribute() {
            self.set_texture_attribute_and_mode(0, attribute, mode);
            return;
        }
        self.attributes.insert(
            attribute.key(),
            AttributePair {
                attribute: Rc::new(attribute),
                mode,
            },
        );
    }

    pub fn set_texture_attribute(&mut self, unit: usize, attribute: impl Into<StateAttribute>) {
        self.set_texture_attribute_and_mode(unit, attribute, StateMode::ON);
    }

    pub fn set_texture_attribute_and_mode(
        &mut self,
        unit: usize,
        attribute: impl Into<StateAttribute>,
        mode: StateMode,
    ) {
        let attribute = attribute.into();
        if self.texture_attributes.len() <= unit {
            self.texture_attributes.resize_with(unit + 1, FxHashMap::default);
        }
        self.texture_attributes[unit].insert(
            attribute.kind(),
            AttributePair {
                attribute: Rc::new(attribute),
                mode,
            },
        );
    }

    pub fn remove_attribute(&mut self, key: AttributeKey) -> Option<AttributePair> {
        self.attributes.remove(&key)
    }

    #[must_use]
    pub fn attribute(&self, kind: AttributeKind, member: u32) -> Option<&AttributePair> {
        self.attributes.get(&AttributeKey { kind, member })
    }

    #[must_use]
    pub fn texture_attribute(&self, unit: usize, kind: AttributeKind) -> Option<&AttributePair> {
        self.texture_attributes.get(unit)?.get(&kind)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&AttributeKey, &AttributePair)> {
        self.attributes.iter()
    }

    /// Per-unit texture attribute maps, indexed by unit.
    #[must_use]
    pub fn texture_units(&self) -> &[FxHashMap<AttributeKind, AttributePair>] {
        &self.texture_attributes
    }

    pub fn add_uniform(&mut self, name: impl Into<String>, value: impl Into<UniformValue>) {
        self.add_uniform_with_mode(name, value, StateMode::ON);
    }

    pub fn add_uniform_with_mode(
        &mut self,
        name: impl Into<String>,
        value: impl Into<UniformValue>,
        mode: StateMode,
    ) {
        self.uniforms.insert(
            name.into(),
            UniformPair {
                value: value.into(),
                mode,
            },
        );
    }

    #[must_use]
    pub fn uniform(&self, name: &str) -> Option<&UniformPair> {
        self.uniforms.get(name)
    }

    pub fn uniforms(&self) -> impl Iterator<Item = (&String, &UniformPair)> {
        self.uniforms.iter()
    }

    /// Attach a material graph. Subtrees drawn under this StateSet use it in
    /// place of the built-in material programs.
    pub fn set_shader_graph(&mut self, description: Rc<GraphDescription>) {
        self.shader_graph = Some(description);
    }

    #[must_use]
    pub fn shader_graph(&self) -> Option<&Rc<GraphDescription>> {
        self.shader_graph.as_ref()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
            && self.texture_attributes.iter().all(FxHashMap::is_empty)
            && self.uniforms.is_empty()
            && self.shader_graph.is_none()
    }
}
