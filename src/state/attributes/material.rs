use glam::Vec4;

use crate::state::uniform::UniformValue;

/// Surface material colors.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub ambient: Vec4,
    pub diffuse: Vec4,
    pub specular: Vec4,
    pub emission: Vec4,
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: Vec4::new(0.2, 0.2, 0.2, 1.0),
            diffuse: Vec4::new(0.8, 0.8, 0.8, 1.0),
            specular: Vec4::new(0.0, 0.0, 0.0, 1.0),
            emission: Vec4::new(0.0, 0.0, 0.0, 1.0),
            shininess: 12.5,
        }
    }
}

impl Material {
    pub const AMBIENT: &'static str = "uMaterialAmbient";
    pub const DIFFUSE: &'static str = "uMaterialDiffuse";
    pub const SPECULAR: &'static str = "uMaterialSpecular";
    pub const EMISSION: &'static str = "uMaterialEmission";
    pub const SHININESS: &'static str = "uMaterialShininess";

    #[must_use]
    pub fn uniform_values(&self) -> Vec<(String, UniformValue)> {
        vec![
            (Self::AMBIENT.to_string(), self.ambient.into()),
            (Self::DIFFUSE.to_string(), self.diffuse.into()),
            (Self::SPECULAR.to_string(), self.specular.into()),
            (Self::EMISSION.to_string(), self.emission.into()),
            (Self::SHININESS.to_string(), self.shininess.into()),
        ]
    }
}
