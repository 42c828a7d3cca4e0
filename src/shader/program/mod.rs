//! Program Compiler
//!
//! Builds the default material program from the active state attributes:
//! a fragment graph first, then the vertex graph that feeds every varying
//! the fragment graph asked for.
//!
//! An active [`ShadowCastAttribute`] switches the fragment stage to the
//! shadow-map depth pass. Only the kinds accepted by
//! [`AttributeKind::casts_shadow`](crate::state::attributes::AttributeKind::casts_shadow) reach
//! that pass, so every caster with the same deformation shares a program.
//!
//! Attribute routing happens once, in [`ActiveAttributes::collect`]; the
//! graph builders in [`fragment`] and [`vertex`] only read the sorted view.

mod fragment;
mod shadow_cast;
mod vertex;

use std::rc::Rc;

use super::compiler::{CompiledShader, compile};
use super::context::CompilerContext;
use super::graph::ShaderGraph;
use super::node::NodeId;
use crate::state::attributes::{
    Light, Material, MorphAttribute, ShadowCastAttribute, ShadowReceiveAttribute, ShadowTexture,
    SkinningAttribute, StateAttribute, Texture,
};

/// `SHADER_NAME` of programs built with and without a material.
pub const MATERIAL_PROGRAM: &str = "MaterialProgram";
pub const NO_MATERIAL_PROGRAM: &str = "NoMaterialProgram";
pub const SHADOW_CAST_PROGRAM: &str = "ShadowCast";

/// The attributes a program is generated from, sorted by role.
#[derive(Debug, Default, Clone)]
pub struct ActiveAttributes<'a> {
    pub material: Option<&'a Material>,
    pub lights: Vec<&'a Light>,
    pub shadow_receives: Vec<&'a ShadowReceiveAttribute>,
    pub shadow_cast: Option<&'a ShadowCastAttribute>,
    pub skinning: Option<&'a SkinningAttribute>,
    pub morph: Option<&'a MorphAttribute>,
    pub billboard: bool,
    /// `(unit, texture)` in unit order.
    pub textures: Vec<(u32, &'a Texture)>,
    pub shadow_textures: Vec<(u32, &'a ShadowTexture)>,
}

impl<'a> ActiveAttributes<'a> {
    /// Route attributes and per-unit texture attributes by kind. Later
    /// entries of a single-valued kind replace earlier ones.
    #[must_use]
    pub fn collect(attributes: &'a [Rc<StateAttribute>], texture_units: &'a [Vec<Rc<StateAttribute>>]) -> Self {
        let mut active = Self::default();

        for attribute in attributes {
            match &**attribute {
                StateAttribute::Material(material) => active.material = Some(material),
                StateAttribute::Light(light) => active.lights.push(light),
                StateAttribute::ShadowReceive(shadow) => active.shadow_receives.push(shadow),
                StateAttribute::ShadowCast(cast) if cast.enabled => active.shadow_cast = Some(cast),
                StateAttribute::Skinning(skinning) => active.skinning = Some(skinning),
                StateAttribute::Morph(morph) => active.morph = Some(morph),
                StateAttribute::Billboard(billboard) => active.billboard = billboard.enabled,
                _ => {}
            }
        }

        for (unit, attributes) in texture_units.iter().enumerate() {
            let unit = unit as u32;
            for attribute in attributes {
                match &**attribute {
                    StateAttribute::Texture(texture) => active.textures.push((unit, texture)),
                    StateAttribute::ShadowTexture(shadow) => active.shadow_textures.push((unit, shadow)),
                    _ => {}
                }
            }
        }

        active
    }

    /// Name emitted as the `SHADER_NAME` define of both stages.
    #[must_use]
    pub fn program_name(&self) -> &'static str {
        if self.shadow_cast.is_some() {
            SHADOW_CAST_PROGRAM
        } else if self.material.is_some() {
            MATERIAL_PROGRAM
        } else {
            NO_MATERIAL_PROGRAM
        }
    }

    /// Shadow receiver of `light`, with the shadow maps rendered for it.
    #[must_use]
    pub fn shadow_of(&self, light: &Light) -> Option<(&'a ShadowReceiveAttribute, Vec<(u32, &'a ShadowTexture)>)> {
        let receive = self
            .shadow_receives
            .iter()
            .copied()
            .find(|shadow| shadow.light_number == light.number)?;
        let maps: Vec<_> = self
            .shadow_textures
            .iter()
            .copied()
            .filter(|(_, texture)| texture.light_unit == light.number)
            .collect();
        (!maps.is_empty()).then_some((receive, maps))
    }
}

/// Builds and compiles the two stages of the default material program, or
/// of the depth pass while a shadow cast attribute is active.
pub struct ProgramCompiler<'a> {
    attributes: ActiveAttributes<'a>,
    ctx: &'a CompilerContext,
}

impl<'a> ProgramCompiler<'a> {
    #[must_use]
    pub fn new(attributes: ActiveAttributes<'a>, ctx: &'a CompilerContext) -> Self {
        Self { attributes, ctx }
    }

    #[inline]
    #[must_use]
    pub fn attributes(&self) -> &ActiveAttributes<'a> {
        &self.attributes
    }

    /// Fragment graph and its roots.
    #[must_use]
    pub fn fragment_graph(&self) -> (ShaderGraph, Vec<NodeId>) {
        match self.attributes.shadow_cast {
            Some(cast) => shadow_cast::ShadowCastBuilder::new(&self.attributes, cast).build(),
            None => fragment::FragmentBuilder::new(&self.attributes).build(),
        }
    }

    /// Vertex graph writing the varyings of `fragment`, and its roots.
    #[must_use]
    pub fn vertex_graph(&self, fragment: &ShaderGraph) -> (ShaderGraph, Vec<NodeId>) {
        vertex::VertexBuilder::new(&self.attributes, fragment, self.ctx).build()
    }

    /// Compile both stages, vertex first.
    #[must_use]
    pub fn compile(&self) -> (CompiledShader, CompiledShader) {
        let (fragment, fragment_roots) = self.fragment_graph();
        let (vertex, vertex_roots) = self.vertex_graph(&fragment);
        (
            compile(&vertex, &vertex_roots, self.ctx),
            compile(&fragment, &fragment_roots, self.ctx),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::attributes::{AttributeKind, Billboard, LightType};

    #[test]
    fn collect_routes_by_kind() {
        let attributes: Vec<Rc<StateAttribute>> = vec![
            Rc::new(Material::default().into()),
            Rc::new(Light::new(0).into()),
            Rc::new(Light::new(1).with_type(LightType::Spot).into()),
            Rc::new(Billboard { enabled: true }.into()),
        ];
        let units = vec![
            vec![Rc::new(Texture::new("albedo").into())],
            vec![Rc::new(ShadowTexture::new(1).into())],
        ];

        let active = ActiveAttributes::collect(&attributes, &units);
        assert!(active.material.is_some());
        assert_eq!(active.lights.len(), 2);
        assert!(active.billboard);
        assert_eq!(active.textures.len(), 1);
        assert_eq!(active.shadow_textures[0].0, 1);
        assert_eq!(active.program_name(), MATERIAL_PROGRAM);
    }

    #[test]
    fn cast_attribute_names_the_program() {
        let attributes: Vec<Rc<StateAttribute>> = vec![
            Rc::new(Material::default().into()),
            Rc::new(ShadowCastAttribute::new(Default::default()).into()),
        ];
        let active = ActiveAttributes::collect(&attributes, &[]);
        assert!(active.shadow_cast.is_some());
        assert_eq!(active.program_name(), SHADOW_CAST_PROGRAM);

        let disabled: Vec<Rc<StateAttribute>> = vec![Rc::new(ShadowCastAttribute::default().into())];
        assert!(ActiveAttributes::collect(&disabled, &[]).shadow_cast.is_none());
        assert!(AttributeKind::Skinning.casts_shadow());
        assert!(!AttributeKind::Material.casts_shadow());
    }

    #[test]
    fn shadow_needs_receiver_and_map() {
        let light = Light::new(1);
        let receive: Rc<StateAttribute> = Rc::new(ShadowReceiveAttribute::new(1).into());
        let map: Rc<StateAttribute> = Rc::new(ShadowTexture::new(1).into());

        let attributes = vec![receive.clone()];
        let without_map = ActiveAttributes::collect(&attributes, &[]);
        assert!(without_map.shadow_of(&light).is_none());

        let units = vec![vec![], vec![], vec![map]];
        let with_map = ActiveAttributes::collect(&attributes, &units);
        let (shadow, maps) = with_map.shadow_of(&light).unwrap();
        assert_eq!(shadow.light_number, 1);
        assert_eq!(maps[0].0, 2);
    }
}
