//! State
//!
//! CPU-side mirror of the pipeline state applied to the graphics context.
//!
//! Every attribute key, texture unit slot and uniform name owns a stack. A
//! StateSet push adds one entry to each stack it touches, a pop removes it
//! again. When the current top carries [`StateMode::OVERRIDE`], a pushed
//! value that is not [`StateMode::PROTECTED`] is discarded and the top is
//! duplicated instead, so the parent value keeps winning while the pop stays
//! symmetric.
//!
//! [`State::apply`] hands changed attributes, the program and the uniforms to
//! a [`GraphicsContext`].
//!
//! Every stack also keeps a global default. An attribute stack takes the
//! [`StateAttribute::clone_type`] of the first attribute pushed on it, a
//! uniform stack the first value pushed. Once a stack empties, its default is
//! what gets applied, so nothing set for one drawable outlives its StateSet.
//! `uArrayColorEnabled` is seeded with `0.0`.

use std::collections::hash_map::Entry;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::attributes::{AttributeKey, AttributeKind, StateAttribute, StateMode};
use super::state_graph::StateStack;
use super::state_set::{AttributePair, StateSetRef, UniformPair};
use super::uniform::UniformValue;
use crate::render::GraphicsContext;
use crate::shader::description::GraphDescription;
use crate::shader::generator::{ShaderGenerator, ShaderProgram};

#[derive(Debug, Clone)]
struct ModeStack<T> {
    entries: Vec<(T, StateMode)>,
    changed: bool,
}

impl<T> Default for ModeStack<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            changed: false,
        }
    }
}

impl<T: Clone> ModeStack<T> {
    fn push_check_override(&mut self, value: &T, mode: StateMode) {
        let entry = match self.entries.last() {
            Some((top, top_mode))
                if top_mode.contains(StateMode::OVERRIDE) && !mode.contains(StateMode::PROTECTED) =>
            {
                (top.clone(), *top_mode)
            }
            _ => (value.clone(), mode),
        };
        self.entries.push(entry);
        self.changed = true;
    }

    fn pop(&mut self) {
        self.entries.pop();
        self.changed = true;
    }

    fn top(&self) -> Option<&(T, StateMode)> {
        self.entries.last()
    }
}

#[derive(Debug)]
struct AttributeSlot {
    stack: ModeStack<Rc<StateAttribute>>,
    global_default: Rc<StateAttribute>,
    applied: Option<Rc<StateAttribute>>,
}

impl AttributeSlot {
    fn new(global_default: Rc<StateAttribute>) -> Self {
        Self {
            stack: ModeStack::default(),
            global_default,
            applied: None,
        }
    }

    fn for_pair(pair: &AttributePair) -> Self {
        Self::new(Rc::new(pair.attribute.clone_type()))
    }

    /// Active value: the top, unless it is switched off.
    fn active(&self) -> Option<&Rc<StateAttribute>> {
        match self.stack.top() {
            Some((attribute, mode)) if !mode.is_empty() => Some(attribute),
            _ => None,
        }
    }

    /// What the context should hold: the active value or the default.
    fn effective(&self) -> &Rc<StateAttribute> {
        self.active().unwrap_or(&self.global_default)
    }
}

#[derive(Debug)]
struct UniformSlot {
    stack: ModeStack<UniformPair>,
    global_default: UniformValue,
}

impl UniformSlot {
    fn new(global_default: UniformValue) -> Self {
        Self {
            stack: ModeStack::default(),
            global_default,
        }
    }

    fn effective(&self) -> &UniformValue {
        self.stack
            .top()
            .map_or(&self.global_default, |(pair, _)| &pair.value)
    }
}

/// Currently applied pipeline state.
pub struct State {
    state_sets: Vec<StateSetRef>,
    attributes: FxHashMap<AttributeKey, AttributeSlot>,
    texture_attributes: Vec<FxHashMap<AttributeKind, AttributeSlot>>,
    uniforms: FxHashMap<String, UniformSlot>,
    program: Option<Rc<ShaderProgram>>,
}

impl Default for State {
    fn default() -> Self {
        let mut state = Self {
            state_sets: Vec::new(),
            attributes: FxHashMap::default(),
            texture_attributes: Vec::new(),
            uniforms: FxHashMap::default(),
            program: None,
        };
        state.set_global_default_uniform("uArrayColorEnabled", 0.0_f32);
        state
    }
}

impl State {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value applied for `attribute`'s key whenever no StateSet sets one.
    pub fn set_global_default_attribute(&mut self, attribute: impl Into<StateAttribute>) {
        let attribute = attribute.into();
        if attribute.kind().is_texture_attribute() {
            self.set_global_default_texture_attribute(0, attribute);
            return;
        }
        Self::set_slot_default(self.attributes.entry(attribute.key()), Rc::new(attribute));
    }

    pub fn set_global_default_texture_attribute(&mut self, unit: usize, attribute: impl Into<StateAttribute>) {
        let attribute = attribute.into();
        if self.texture_attributes.len() <= unit {
            self.texture_attributes.resize_with(unit + 1, FxHashMap::default);
        }
        let kind = attribute.kind();
        Self::set_slot_default(self.texture_attributes[unit].entry(kind), Rc::new(attribute));
    }

    fn set_slot_default<K>(entry: Entry<'_, K, AttributeSlot>, attribute: Rc<StateAttribute>) {
        match entry {
            Entry::Occupied(mut slot) => {
                let slot = slot.get_mut();
                slot.global_default = attribute;
                slot.stack.changed = true;
            }
            Entry::Vacant(slot) => {
                let mut created = AttributeSlot::new(attribute);
                created.stack.changed = true;
                slot.insert(created);
            }
        }
    }

    #[must_use]
    pub fn global_default_attribute(&self, key: AttributeKey) -> Option<&Rc<StateAttribute>> {
        self.attributes.get(&key).map(|slot| &slot.global_default)
    }

    /// Value uploaded for `name` whenever no StateSet sets one.
    pub fn set_global_default_uniform(&mut self, name: impl Into<String>, value: impl Into<UniformValue>) {
        let value = value.into();
        match self.uniforms.entry(name.into()) {
            Entry::Occupied(mut slot) => slot.get_mut().global_default = value,
            Entry::Vacant(slot) => {
                slot.insert(UniformSlot::new(value));
            }
        }
    }

    #[must_use]
    pub fn global_default_uniform(&self, name: &str) -> Option<&UniformValue> {
        self.uniforms.get(name).map(|slot| &slot.global_default)
    }

    /// StateSets pushed so far, outermost first.
    #[must_use]
    pub fn state_set_stack(&self) -> &[StateSetRef] {
        &self.state_sets
    }

    #[must_use]
    pub fn state_set_stack_size(&self) -> usize {
        self.state_sets.len()
    }

    /// Active attribute for `key`, after override resolution.
    #[must_use]
    pub fn attribute(&self, key: AttributeKey) -> Option<&Rc<StateAttribute>> {
        self.attributes.get(&key)?.active()
    }

    #[must_use]
    pub fn texture_attribute(&self, unit: usize, kind: AttributeKind) -> Option<&Rc<StateAttribute>> {
        self.texture_attributes.get(unit)?.get(&kind)?.active()
    }

    /// Active non-texture attributes, ordered by key.
    #[must_use]
    pub fn active_attributes(&self) -> Vec<Rc<StateAttribute>> {
        let mut active: Vec<(AttributeKey, Rc<StateAttribute>)> = self
            .attributes
            .iter()
            .filter_map(|(key, slot)| slot.active().map(|a| (*key, a.clone())))
            .collect();
        active.sort_by_key(|(key, _)| *key);
        active.into_iter().map(|(_, a)| a).collect()
    }

    /// Active texture attributes per unit, each unit ordered by kind.
    #[must_use]
    pub fn active_texture_attributes(&self) -> Vec<Vec<Rc<StateAttribute>>> {
        self.texture_attributes
            .iter()
            .map(|unit| {
                let mut active: Vec<(AttributeKind, Rc<StateAttribute>)> = unit
                    .iter()
                    .filter_map(|(kind, slot)| slot.active().map(|a| (*kind, a.clone())))
                    .collect();
                active.sort_by_key(|(kind, _)| *kind);
                active.into_iter().map(|(_, a)| a).collect()
            })
            .collect()
    }

    /// Innermost material graph description on the StateSet stack.
    #[must_use]
    pub fn shader_graph(&self) -> Option<&Rc<GraphDescription>> {
        self.state_sets.iter().rev().find_map(|ss| ss.shader_graph())
    }

    /// Top of the uniform stack for `name`, ignoring the global default.
    #[must_use]
    pub fn uniform(&self, name: &str) -> Option<&UniformPair> {
        self.uniforms.get(name)?.stack.top().map(|(pair, _)| pair)
    }

    /// Value uploaded for `name`: the stack top, or its global default.
    #[must_use]
    pub fn uniform_value(&self, name: &str) -> Option<&UniformValue> {
        self.uniforms.get(name).map(UniformSlot::effective)
    }

    #[must_use]
    pub fn current_program(&self) -> Option<&Rc<ShaderProgram>> {
        self.program.as_ref()
    }

    fn push_attribute(slot: &mut AttributeSlot, pair: &AttributePair) {
        slot.stack.push_check_override(&pair.attribute, pair.mode);
    }

    /// Flush pending changes to `ctx`.
    ///
    /// Attributes are applied only when their effective value changed since
    /// the last apply; an emptied stack applies its global default. The
    /// program is bound only when it differs from the bound one. Uniforms are
    /// uploaded every time.
    pub fn apply(&mut self, ctx: &mut impl GraphicsContext, generator: &mut ShaderGenerator) {
        for slot in self.attributes.values_mut() {
            Self::apply_slot(slot, ctx, None);
        }
        for (unit, slots) in self.texture_attributes.iter_mut().enumerate() {
            for slot in slots.values_mut() {
                Self::apply_slot(slot, ctx, Some(unit as u32));
            }
        }

        let program = generator.get_or_create_program(self);
        let rebind = self
            .program
            .as_ref()
            .is_none_or(|bound| !Rc::ptr_eq(bound, &program));
        if rebind {
            ctx.use_program(&program);
            self.program = Some(program);
        }

        self.apply_uniforms(ctx);
    }

    fn apply_slot(slot: &mut AttributeSlot, ctx: &mut impl GraphicsContext, unit: Option<u32>) {
        if !slot.stack.changed {
            return;
        }
        slot.stack.changed = false;

        let effective = slot.effective().clone();
        if slot
            .applied
            .as_ref()
            .is_some_and(|applied| Rc::ptr_eq(applied, &effective))
        {
            return;
        }
        ctx.apply_attribute(&effective, unit);
        slot.applied = Some(effective);
    }

    fn apply_uniforms(&self, ctx: &mut impl GraphicsContext) {
        for attribute in self.active_attributes() {
            for (name, value) in attribute.uniform_values(0) {
                ctx.set_uniform(&name, &value);
            }
        }
        for (unit, attributes) in self.active_texture_attributes().iter().enumerate() {
            for attribute in attributes {
                for (name, value) in attribute.uniform_values(unit as u32) {
                    ctx.set_uniform(&name, &value);
                }
            }
        }
        for (name, slot) in &self.uniforms {
            ctx.set_uniform(name, slot.effective());
        }
    }

    /// Drop all stacks, user-set global defaults and the bound program.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl StateStack for State {
    fn push_state_set(&mut self, stateset: &StateSetRef) {
        self.state_sets.push(stateset.clone());

        for (key, pair) in stateset.attributes() {
            let slot = self
                .attributes
                .entry(*key)
                .or_insert_with(|| AttributeSlot::for_pair(pair));
            Self::push_attribute(slot, pair);
        }

        let units = stateset.texture_units();
        if self.texture_attributes.len() < units.len() {
            self.texture_attributes.resize_with(units.len(), FxHashMap::default);
        }
        for (unit, attributes) in units.iter().enumerate() {
            for (kind, pair) in attributes {
                let slot = self.texture_attributes[unit]
                    .entry(*kind)
                    .or_insert_with(|| AttributeSlot::for_pair(pair));
                Self::push_attribute(slot, pair);
            }
        }

        for (name, pair) in stateset.uniforms() {
            self.uniforms
                .entry(name.clone())
                .or_insert_with(|| UniformSlot::new(pair.value.clone()))
                .stack
                .push_check_override(pair, pair.mode);
        }
    }

    fn pop_state_set(&mut self, stateset: &StateSetRef) {
        self.state_sets.pop();

        for (key, _) in stateset.attributes() {
            if let Some(slot) = self.attributes.get_mut(key) {
                slot.stack.pop();
            }
        }
        for (unit, attributes) in stateset.texture_units().iter().enumerate() {
            for kind in attributes.keys() {
                if let Some(slot) = self
                    .texture_attributes
                    .get_mut(unit)
                    .and_then(|slots| slots.get_mut(kind))
                {
                    slot.stack.pop();
                }
            }
        }
        for name in stateset.uniforms().map(|(name, _)| name) {
            if let Some(slot) = self.uniforms.get_mut(name) {
                slot.stack.pop();
            }
        }
    }
}
