use std::cell::Cell;

use glam::Vec4;

use crate::state::uniform::UniformValue;

/// Bone uniform sizing shared by every skinning attribute of one compiler
/// context.
///
/// Skinning attributes without an explicit size declare `uBones` with the
/// largest palette observed so far, capped by `max_allowed` (usually the
/// device uniform limit).
#[derive(Debug, Clone)]
pub struct BoneLimits {
    max_size: Cell<u32>,
    max_allowed: Option<u32>,
}

impl Default for BoneLimits {
    fn default() -> Self {
        Self::new(None)
    }
}

impl BoneLimits {
    #[must_use]
    pub fn new(max_allowed: Option<u32>) -> Self {
        Self {
            max_size: Cell::new(1),
            max_allowed,
        }
    }

    /// Largest observed palette size, in vec4 units.
    #[inline]
    #[must_use]
    pub fn max_bone_uniform_size(&self) -> u32 {
        self.max_size.get()
    }

    #[inline]
    #[must_use]
    pub fn max_allowed(&self) -> Option<u32> {
        self.max_allowed
    }

    /// Record a palette of `size` vec4s.
    pub fn observe(&self, size: u32) {
        let mut grown = self.max_size.get().max(size);
        if let Some(cap) = self.max_allowed {
            grown = grown.min(cap);
        }
        self.max_size.set(grown);
    }
}

/// Skeletal animation state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SkinningAttribute {
    pub enabled: bool,
    /// Number of vec4 in `uBones`. Falls back to [`BoneLimits`] when unset.
    pub bone_uniform_size: Option<u32>,
    matrix_palette: Vec<Vec4>,
}

impl SkinningAttribute {
    #[must_use]
    pub fn new(bone_uniform_size: Option<u32>) -> Self {
        Self {
            enabled: true,
            bone_uniform_size,
            matrix_palette: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn bone_uniform_size(&self, limits: &BoneLimits) -> u32 {
        self.bone_uniform_size
            .unwrap_or_else(|| limits.max_bone_uniform_size())
    }

    /// Replace the palette. Three vec4 rows per bone.
    pub fn set_matrix_palette(&mut self, palette: Vec<Vec4>, limits: &BoneLimits) {
        if self.bone_uniform_size.is_none() {
            limits.observe(palette.len() as u32);
        }
        self.matrix_palette = palette;
    }

    #[must_use]
    pub fn matrix_palette(&self) -> &[Vec4] {
        &self.matrix_palette
    }

    #[must_use]
    pub fn uniform_values(&self) -> Vec<(String, UniformValue)> {
        if !self.enabled {
            return Vec::new();
        }
        vec![(
            "uBones".to_string(),
            UniformValue::Vec4Array(self.matrix_palette.clone()),
        )]
    }
}

/// Morph target blending state. Supports up to four targets.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MorphAttribute {
    pub enabled: bool,
    pub target_count: u32,
    /// Morphed vertex attributes, e.g. `Vertex` or `Normal`. Target `i` of
    /// `Vertex` reads the attribute `Vertex_i`.
    pub target_names: Vec<String>,
    pub weights: Vec4,
}

impl MorphAttribute {
    #[must_use]
    pub fn new(target_count: u32) -> Self {
        Self {
            enabled: true,
            target_count,
            target_names: Vec::new(),
            weights: Vec4::ZERO,
        }
    }

    #[must_use]
    pub fn with_target_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target_names = names.into_iter().map(Into::into).collect();
        self.target_names.sort();
        self
    }

    #[must_use]
    pub fn has_target(&self, name: &str) -> bool {
        self.target_names.iter().any(|t| t == name)
    }

    #[must_use]
    pub fn uniform_values(&self) -> Vec<(String, UniformValue)> {
        if !self.enabled {
            return Vec::new();
        }
        vec![("uTargetWeights".to_string(), self.weights.into())]
    }
}
