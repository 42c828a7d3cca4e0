use glam::{Mat4, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::state::uniform::UniformValue;

/// Light model. Selects the shading function the fragment program calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LightType {
    #[default]
    Directional,
    Point,
    Spot,
    Hemi,
}

/// A numbered light source.
///
/// `matrix` is the model-view of the node the light is attached to. It is
/// uploaded as `uLight{n}_matrix` together with the inverse transpose of its
/// rotation part.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub number: u32,
    pub light_type: LightType,
    pub enabled: bool,

    pub ambient: Vec4,
    pub diffuse: Vec4,
    pub specular: Vec4,

    pub position: Vec4,
    pub direction: Vec3,
    /// Cone half-angle in degrees.
    pub spot_cutoff: f32,
    pub spot_blend: f32,
    /// Constant, linear and quadratic factors in `xyz`.
    pub attenuation: Vec4,
    pub ground: Vec4,

    pub matrix: Mat4,
}

impl Light {
    #[must_use]
    pub fn new(number: u32) -> Self {
        Self {
            number,
            light_type: LightType::Directional,
            enabled: true,
            ambient: Vec4::new(0.2, 0.2, 0.2, 1.0),
            diffuse: Vec4::new(0.8, 0.8, 0.8, 1.0),
            specular: Vec4::new(0.2, 0.2, 0.2, 1.0),
            position: Vec4::new(0.0, 0.0, 1.0, 0.0),
            direction: Vec3::NEG_Z,
            spot_cutoff: 180.0,
            spot_blend: 0.01,
            attenuation: Vec4::new(1.0, 0.0, 0.0, 0.0),
            ground: Vec4::new(0.2, 0.2, 0.2, -1.0),
            matrix: Mat4::IDENTITY,
        }
    }

    /// Switch light model, resetting position and cone to that model's defaults.
    #[must_use]
    pub fn with_type(mut self, light_type: LightType) -> Self {
        self.set_light_type(light_type);
        self
    }

    pub fn set_light_type(&mut self, light_type: LightType) {
        self.light_type = light_type;
        match light_type {
            LightType::Spot => {
                self.position = Vec4::new(0.0, 0.0, 0.0, 1.0);
                self.direction = Vec3::NEG_Z;
                self.ground.w = -1.0;
                self.spot_cutoff = 90.0;
            }
            LightType::Point => {
                self.position = Vec4::new(0.0, 0.0, 0.0, 1.0);
                self.direction = Vec3::NEG_Z;
                self.ground.w = -1.0;
            }
            LightType::Directional => {
                self.position = Vec4::new(0.0, 0.0, 1.0, 0.0);
                self.spot_cutoff = 180.0;
                self.ground.w = -1.0;
            }
            LightType::Hemi => {
                self.position = Vec4::new(0.0, 0.0, 1.0, 0.0);
                self.spot_cutoff = 180.0;
                self.ground.w = 1.0;
            }
        }
    }

    #[must_use]
    pub fn uniform_name(&self, field: &str) -> String {
        format!("uLight{}_{field}", self.number)
    }

    /// Values uploaded on apply. A disabled light uploads nothing.
    #[must_use]
    pub fn uniform_values(&self) -> Vec<(String, UniformValue)> {
        if !self.enabled {
            return Vec::new();
        }

        let mut values = vec![(self.uniform_name("position"), self.position.into())];

        if self.light_type == LightType::Spot {
            let spot_size = self.spot_cutoff.to_radians().cos();
            values.push((self.uniform_name("spotCutOff"), spot_size.into()));
            values.push((
                self.uniform_name("spotBlend"),
                ((1.0 - spot_size) * self.spot_blend).into(),
            ));
            values.push((self.uniform_name("direction"), self.direction.into()));
        }

        if self.light_type == LightType::Hemi {
            values.push((self.uniform_name("ground"), self.ground.into()));
        }

        values.push((self.uniform_name("attenuation"), self.attenuation.into()));
        values.push((self.uniform_name("diffuse"), self.diffuse.into()));
        values.push((self.uniform_name("specular"), self.specular.into()));
        values.push((self.uniform_name("ambient"), self.ambient.into()));

        let mut rotation = self.matrix;
        rotation.w_axis = Vec4::W;
        values.push((self.uniform_name("matrix"), self.matrix.into()));
        values.push((
            self.uniform_name("invMatrix"),
            rotation.inverse().transpose().into(),
        ));

        values
    }
}
