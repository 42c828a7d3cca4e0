//! State Attributes
//!
//! A closed set of pipeline attributes that a [`StateSet`](super::StateSet)
//! can carry. Each attribute is identified by an [`AttributeKey`]: its
//! [`AttributeKind`] plus a *member* index (the light number for lights and
//! shadow receivers, zero otherwise). Texture attributes live in per-unit
//! maps, so their member index is always zero and the unit is implied by
//! position.
//!
//! # Structural hashing
//!
//! [`StateAttribute::hash_structure`] folds in only the parameters that change
//! generated shader code:
//!
//! | Attribute | Hashed |
//! |-----------|--------|
//! | Light | light number, light type, enabled |
//! | Material | kind only |
//! | Skinning | resolved bone uniform size, enabled |
//! | Morph | target names, target count, enabled |
//! | ShadowReceive | light number, algorithm, PCF kernel, fake PCF, rotate offset, precision, enabled |
//! | ShadowCast | algorithm, PCF kernel, fake PCF, rotate offset, precision, enabled |
//! | ShadowTexture | light unit |
//! | Texture | target |
//! | Billboard | enabled |
//!
//! Colors, positions, weights and bone palettes are never hashed.
//!
//! # Global defaults
//!
//! [`StateAttribute::clone_type`] gives the value the [`State`](super::State)
//! falls back to once every StateSet carrying a kind has been popped.
//! Attributes with an enable switch come back switched off.

mod animation;
mod light;
mod material;
mod modes;
mod shadow;
mod texture;

use std::hash::{Hash, Hasher};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

pub use animation::{BoneLimits, MorphAttribute, SkinningAttribute};
pub use light::{Light, LightType};
pub use material::Material;
pub use modes::{Billboard, BlendFactor, BlendFunc, CullFace, CullMode, Depth, DepthFunc};
pub use shadow::{
    PcfKernel, ShadowAlgorithm, ShadowCastAttribute, ShadowConfig, ShadowPrecision,
    ShadowReceiveAttribute, ShadowTexture,
};
pub use texture::{Texture, TextureTarget};

use super::uniform::UniformValue;

/// Kind of a state attribute.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum AttributeKind {
    CullFace,
    BlendFunc,
    Depth,
    Material,
    Light,
    Skinning,
    Morph,
    ShadowReceive,
    ShadowCast,
    Billboard,
    Texture,
    ShadowTexture,
}

impl AttributeKind {
    /// Attribute kinds the shader generator considers by default.
    pub const SHADER_DEFAULTS: [AttributeKind; 9] = [
        AttributeKind::ShadowReceive,
        AttributeKind::ShadowCast,
        AttributeKind::Skinning,
        AttributeKind::Morph,
        AttributeKind::ShadowTexture,
        AttributeKind::Texture,
        AttributeKind::Light,
        AttributeKind::Material,
        AttributeKind::Billboard,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CullFace => "CullFace",
            Self::BlendFunc => "BlendFunc",
            Self::Depth => "Depth",
            Self::Material => "Material",
            Self::Light => "Light",
            Self::Skinning => "Skinning",
            Self::Morph => "Morph",
            Self::ShadowReceive => "ShadowReceive",
            Self::ShadowCast => "ShadowCast",
            Self::Billboard => "Billboard",
            Self::Texture => "Texture",
            Self::ShadowTexture => "ShadowTexture",
        }
    }

    /// Whether this kind is bound per texture unit.
    #[inline]
    #[must_use]
    pub const fn is_texture_attribute(self) -> bool {
        matches!(self, Self::Texture | Self::ShadowTexture)
    }

    /// Kinds the shadow-map depth pass is built from.
    #[inline]
    #[must_use]
    pub const fn casts_shadow(self) -> bool {
        matches!(self, Self::ShadowCast | Self::Skinning | Self::Morph | Self::Billboard)
    }
}

/// Map key of an attribute inside a StateSet or the State stacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeKey {
    pub kind: AttributeKind,
    pub member: u32,
}

bitflags! {
    /// How an attribute or uniform pair takes part in state inheritance.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StateMode: u8 {
        const ON = 1;
        /// Children cannot replace this value unless they are `PROTECTED`.
        const OVERRIDE = 2;
        /// Ignores a parent's `OVERRIDE`.
        const PROTECTED = 4;
    }
}

impl StateMode {
    pub const OFF: Self = Self::empty();
}

/// A pipeline attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum StateAttribute {
    CullFace(CullFace),
    BlendFunc(BlendFunc),
    Depth(Depth),
    Material(Material),
    Light(Light),
    Skinning(SkinningAttribute),
    Morph(MorphAttribute),
    ShadowReceive(ShadowReceiveAttribute),
    ShadowCast(ShadowCastAttribute),
    Billboard(Billboard),
    Texture(Texture),
    ShadowTexture(ShadowTexture),
}

impl StateAttribute {
    #[must_use]
    pub fn kind(&self) -> AttributeKind {
        match self {
            Self::CullFace(_) => AttributeKind::CullFace,
            Self::BlendFunc(_) => AttributeKind::BlendFunc,
            Self::Depth(_) => AttributeKind::Depth,
            Self::Material(_) => AttributeKind::Material,
            Self::Light(_) => AttributeKind::Light,
            Self::Skinning(_) => AttributeKind::Skinning,
            Self::Morph(_) => AttributeKind::Morph,
            Self::ShadowReceive(_) => AttributeKind::ShadowReceive,
            Self::ShadowCast(_) => AttributeKind::ShadowCast,
            Self::Billboard(_) => AttributeKind::Billboard,
            Self::Texture(_) => AttributeKind::Texture,
            Self::ShadowTexture(_) => AttributeKind::ShadowTexture,
        }
    }

    /// Member index: the light number for lights and shadow receivers.
    #[must_use]
    pub fn member(&self) -> u32 {
        match self {
            Self::Light(light) => light.number,
            Self::ShadowReceive(shadow) => shadow.light_number,
            _ => 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn key(&self) -> AttributeKey {
        AttributeKey {
            kind: self.kind(),
            member: self.member(),
        }
    }

    /// Attributes without an enable switch always report `true`.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::Light(light) => light.enabled,
            Self::Skinning(skinning) => skinning.enabled,
            Self::Morph(morph) => morph.enabled,
            Self::ShadowReceive(shadow) => shadow.enabled,
            Self::ShadowCast(cast) => cast.enabled,
            Self::Billboard(billboard) => billboard.enabled,
            _ => true,
        }
    }

    /// Feed the code-affecting parameters of this attribute into `state`.
    pub fn hash_structure<H: Hasher>(&self, state: &mut H, limits: &BoneLimits) {
        self.key().hash(state);
        match self {
            Self::Light(light) => {
                light.light_type.hash(state);
                light.enabled.hash(state);
            }
            Self::Skinning(skinning) => {
                skinning.bone_uniform_size(limits).hash(state);
                skinning.enabled.hash(state);
            }
            Self::Morph(morph) => {
                morph.target_names.hash(state);
                morph.target_count.hash(state);
                morph.enabled.hash(state);
            }
            Self::ShadowReceive(shadow) => {
                shadow.config.hash(state);
                shadow.enabled.hash(state);
            }
            Self::ShadowCast(cast) => {
                cast.config.hash(state);
                cast.enabled.hash(state);
            }
            Self::ShadowTexture(shadow_texture) => shadow_texture.light_unit.hash(state),
            Self::Texture(texture) => texture.target.hash(state),
            Self::Billboard(billboard) => billboard.enabled.hash(state),
            Self::Material(_) | Self::CullFace(_) | Self::BlendFunc(_) | Self::Depth(_) => {}
        }
    }

    /// Fresh attribute of the same kind and member with default parameters.
    #[must_use]
    pub fn clone_type(&self) -> StateAttribute {
        match self {
            Self::CullFace(_) => Self::CullFace(CullFace::default()),
            Self::BlendFunc(_) => Self::BlendFunc(BlendFunc::default()),
            Self::Depth(_) => Self::Depth(Depth::default()),
            Self::Material(_) => Self::Material(Material::default()),
            Self::Light(light) => Self::Light(Light {
                enabled: false,
                ..Light::new(light.number)
            }),
            Self::Skinning(_) => Self::Skinning(SkinningAttribute::default()),
            Self::Morph(_) => Self::Morph(MorphAttribute::default()),
            Self::ShadowReceive(shadow) => Self::ShadowReceive(ShadowReceiveAttribute {
                enabled: false,
                ..ShadowReceiveAttribute::new(shadow.light_number)
            }),
            Self::ShadowCast(_) => Self::ShadowCast(ShadowCastAttribute::default()),
            Self::Billboard(_) => Self::Billboard(Billboard { enabled: false }),
            Self::Texture(_) => Self::Texture(Texture::default()),
            Self::ShadowTexture(shadow_texture) => {
                Self::ShadowTexture(ShadowTexture::new(shadow_texture.light_unit))
            }
        }
    }

    /// Standalone structural hash.
    #[must_use]
    pub fn structural_hash(&self, limits: &BoneLimits) -> u64 {
        let mut hasher = rustc_hash::FxHasher::default();
        self.hash_structure(&mut hasher, limits);
        hasher.finish()
    }

    /// Uniform values this attribute uploads when applied.
    ///
    /// `unit` is the texture unit for per-unit attributes.
    #[must_use]
    pub fn uniform_values(&self, unit: u32) -> Vec<(String, UniformValue)> {
        match self {
            Self::Material(material) => material.uniform_values(),
            Self::Light(light) => light.uniform_values(),
            Self::Skinning(skinning) => skinning.uniform_values(),
            Self::Morph(morph) => morph.uniform_values(),
            Self::ShadowReceive(shadow) => shadow.uniform_values(),
            Self::ShadowTexture(shadow_texture) => shadow_texture.uniform_values(unit),
            Self::Texture(_) => vec![(format!("Texture{unit}"), UniformValue::Int(unit as i32))],
            Self::CullFace(_)
            | Self::BlendFunc(_)
            | Self::Depth(_)
            | Self::Billboard(_)
            | Self::ShadowCast(_) => Vec::new(),
        }
    }
}

macro_rules! impl_from_attribute {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for StateAttribute {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

impl_from_attribute!(
    CullFace(CullFace),
    BlendFunc(BlendFunc),
    Depth(Depth),
    Material(Material),
    Light(Light),
    Skinning(SkinningAttribute),
    Morph(MorphAttribute),
    ShadowReceive(ShadowReceiveAttribute),
    ShadowCast(ShadowCastAttribute),
    Billboard(Billboard),
    Texture(Texture),
    ShadowTexture(ShadowTexture),
);

#[cfg(test)]
mod tests {
    use glam::Vec4;

    use super::*;

    #[test]
    fn material_values_do_not_change_structural_hash() {
        let limits = BoneLimits::default();
        let red = StateAttribute::Material(Material {
            diffuse: Vec4::new(1.0, 0.0, 0.0, 1.0),
            ..Material::default()
        });
        let blue = StateAttribute::Material(Material {
            diffuse: Vec4::new(0.0, 0.0, 1.0, 1.0),
            ..Material::default()
        });
        assert_eq!(red.structural_hash(&limits), blue.structural_hash(&limits));
    }

    #[test]
    fn light_type_changes_structural_hash() {
        let limits = BoneLimits::default();
        let point = StateAttribute::Light(Light::new(0).with_type(LightType::Point));
        let sun = StateAttribute::Light(Light::new(0).with_type(LightType::Directional));
        assert_ne!(point.structural_hash(&limits), sun.structural_hash(&limits));
    }

    #[test]
    fn cast_hash_follows_shadow_config() {
        let limits = BoneLimits::default();
        let esm = StateAttribute::ShadowCast(ShadowCastAttribute::new(ShadowConfig {
            algorithm: ShadowAlgorithm::Esm,
            ..ShadowConfig::default()
        }));
        let vsm = StateAttribute::ShadowCast(ShadowCastAttribute::new(ShadowConfig {
            algorithm: ShadowAlgorithm::Vsm,
            ..ShadowConfig::default()
        }));
        assert_ne!(esm.structural_hash(&limits), vsm.structural_hash(&limits));
        assert!(!esm.clone_type().is_enabled());
    }

    #[test]
    fn clone_type_keeps_key_and_switches_off() {
        let light = StateAttribute::Light(Light::new(3).with_type(LightType::Spot));
        let default = light.clone_type();
        assert_eq!(default.key(), light.key());
        assert!(!default.is_enabled());

        let cull = StateAttribute::CullFace(CullFace {
            mode: CullMode::Front,
        });
        assert_eq!(cull.clone_type(), StateAttribute::CullFace(CullFace::default()));
    }

    #[test]
    fn off_mode_is_empty() {
        assert!(StateMode::OFF.is_empty());
        assert!(!StateMode::ON.contains(StateMode::OVERRIDE));
    }
}
