//! Shader Generator
//!
//! Resolves the program for an effective [`State`]: filters the active
//! attributes, derives a [`ProgramKey`] from their structural hashes and
//! compiles on a cache miss. Programs differing only in uniform values share
//! one key, and therefore one [`ShaderProgram`].
//!
//! While an enabled shadow cast attribute is active, the attributes are
//! narrowed to the kinds the depth pass reads, texture units are dropped and
//! any material graph description is ignored.

use std::hash::Hasher;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHasher};

use super::compiler::{CompiledShader, compile};
use super::context::CompilerContext;
use super::description::GraphDescription;
use super::diagnostic::Diagnostic;
use super::graph::{ShaderGraph, ShaderStage};
use super::program::{ActiveAttributes, ProgramCompiler};
use crate::state::State;
use crate::state::attributes::{AttributeKind, StateAttribute};
use crate::utils::hash::fx_hash_key;

/// Structural identity of a generated program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramKey(pub u64);

/// Both stages of a generated program.
#[derive(Debug)]
pub struct ShaderProgram {
    pub key: ProgramKey,
    pub vertex: CompiledShader,
    pub fragment: CompiledShader,
}

impl ShaderProgram {
    /// True when neither stage reported an error.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.vertex.is_valid() && self.fragment.is_valid()
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.vertex.diagnostics.iter().chain(&self.fragment.diagnostics)
    }
}

pub struct ShaderGenerator {
    ctx: CompilerContext,
    cache: FxHashMap<ProgramKey, Rc<ShaderProgram>>,
}

impl Default for ShaderGenerator {
    fn default() -> Self {
        Self::new(CompilerContext::default())
    }
}

impl ShaderGenerator {
    #[must_use]
    pub fn new(ctx: CompilerContext) -> Self {
        Self {
            ctx,
            cache: FxHashMap::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn context(&self) -> &CompilerContext {
        &self.ctx
    }

    /// Mutable access to the context. Cached programs were built with the
    /// old settings and library, so the cache is dropped.
    pub fn context_mut(&mut self) -> &mut CompilerContext {
        self.cache.clear();
        &mut self.ctx
    }

    #[inline]
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Program for the effective attributes and material graph of `state`.
    pub fn get_or_create_program(&mut self, state: &State) -> Rc<ShaderProgram> {
        let attributes = state.active_attributes();
        let texture_units = state.active_texture_attributes();
        self.program_for(&attributes, &texture_units, state.shader_graph().map(|d| &**d))
    }

    /// Program for explicit attribute lists. `texture_units[u]` holds the
    /// attributes bound to unit `u`.
    pub fn program_for(
        &mut self,
        attributes: &[Rc<StateAttribute>],
        texture_units: &[Vec<Rc<StateAttribute>>],
        description: Option<&GraphDescription>,
    ) -> Rc<ShaderProgram> {
        let mut attributes = self.filter(attributes);
        let mut texture_units: Vec<_> = texture_units.iter().map(|unit| self.filter(unit)).collect();
        let mut description = description;
        if attributes.iter().any(|a| a.kind() == AttributeKind::ShadowCast) {
            attributes.retain(|a| a.kind().casts_shadow());
            texture_units.clear();
            description = None;
        }
        let key = self.program_key(&attributes, &texture_units, description);

        if let Some(program) = self.cache.get(&key) {
            return program.clone();
        }

        log::debug!(
            "Generating program {:016x} from {} attributes, {} texture units{}",
            key.0,
            attributes.len(),
            texture_units.len(),
            if description.is_some() { ", custom graph" } else { "" },
        );
        let active = ActiveAttributes::collect(&attributes, &texture_units);
        let compiler = ProgramCompiler::new(active, &self.ctx);
        let (vertex, fragment) = match description {
            Some(description) => self.compile_description(&compiler, description),
            None => compiler.compile(),
        };

        let program = Rc::new(ShaderProgram { key, vertex, fragment });
        if !program.is_valid() {
            log::warn!("Program {:016x} compiled with errors", key.0);
        }
        self.cache.insert(key, program.clone());
        program
    }

    /// Accepted and enabled attributes only.
    fn filter(&self, attributes: &[Rc<StateAttribute>]) -> Vec<Rc<StateAttribute>> {
        let settings = self.ctx.settings();
        attributes
            .iter()
            .filter(|attribute| settings.accepts(attribute.kind()) && attribute.is_enabled())
            .cloned()
            .collect()
    }

    fn program_key(
        &self,
        attributes: &[Rc<StateAttribute>],
        texture_units: &[Vec<Rc<StateAttribute>>],
        description: Option<&GraphDescription>,
    ) -> ProgramKey {
        let limits = self.ctx.bone_limits();
        let mut hasher = FxHasher::default();
        for attribute in attributes {
            hasher.write_u64(attribute.structural_hash(limits));
        }
        for (unit, attributes) in texture_units.iter().enumerate() {
            for attribute in attributes {
                hasher.write_usize(unit);
                hasher.write_u64(attribute.structural_hash(limits));
            }
        }
        if let Some(description) = description {
            hasher.write_u64(fx_hash_key(description));
        }
        ProgramKey(hasher.finish())
    }

    /// Fragment stage from `description`; the vertex stage still comes from
    /// the attributes and feeds the varyings the description reads.
    fn compile_description(
        &self,
        compiler: &ProgramCompiler<'_>,
        description: &GraphDescription,
    ) -> (CompiledShader, CompiledShader) {
        let mut fragment = ShaderGraph::new(ShaderStage::Fragment);
        let fragment_roots = description.build(&mut fragment, self.ctx.factory());
        let (vertex, vertex_roots) = compiler.vertex_graph(&fragment);
        (
            compile(&vertex, &vertex_roots, &self.ctx),
            compile(&fragment, &fragment_roots, &self.ctx),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::attributes::{CullFace, Light, Material};

    fn attributes(shininess: f32) -> Vec<Rc<StateAttribute>> {
        vec![
            Rc::new(
                Material {
                    shininess,
                    ..Material::default()
                }
                .into(),
            ),
            Rc::new(Light::new(0).into()),
        ]
    }

    #[test]
    fn uniform_values_share_a_program() {
        let mut generator = ShaderGenerator::default();
        let a = generator.program_for(&attributes(10.0), &[], None);
        let b = generator.program_for(&attributes(80.0), &[], None);
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(generator.cache_len(), 1);
    }

    #[test]
    fn rejected_kinds_do_not_change_the_key() {
        let mut generator = ShaderGenerator::default();
        let plain = generator.program_for(&attributes(10.0), &[], None);

        let mut culled = attributes(10.0);
        culled.push(Rc::new(CullFace::default().into()));
        let with_cull = generator.program_for(&culled, &[], None);
        assert_eq!(plain.key, with_cull.key);
    }

    #[test]
    fn disabled_light_is_filtered() {
        let mut generator = ShaderGenerator::default();
        let mut light = Light::new(0);
        light.enabled = false;
        let material: Rc<StateAttribute> = Rc::new(Material::default().into());

        let lit_off = generator.program_for(&[material.clone(), Rc::new(light.into())], &[], None);
        let unlit = generator.program_for(&[material], &[], None);
        assert_eq!(lit_off.key, unlit.key);
        assert!(unlit.is_valid());
    }
}
