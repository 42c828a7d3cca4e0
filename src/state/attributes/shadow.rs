use glam::{Mat4, Vec4};
use serde::{Deserialize, Serialize};

use crate::state::uniform::UniformValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ShadowAlgorithm {
    #[default]
    None,
    Pcf,
    Esm,
    Vsm,
    Evsm,
}

impl ShadowAlgorithm {
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "NONE" => Some(Self::None),
            "PCF" => Some(Self::Pcf),
            "ESM" => Some(Self::Esm),
            "VSM" => Some(Self::Vsm),
            "EVSM" => Some(Self::Evsm),
            _ => None,
        }
    }
}

/// PCF filtering kernel. The names match the texture fetch counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PcfKernel {
    #[serde(rename = "4Poisson(16texFetch)")]
    Poisson4,
    #[serde(rename = "8Poisson(32texFetch)")]
    Poisson8,
    #[serde(rename = "16Poisson(64texFetch)")]
    Poisson16,
    #[serde(rename = "25Poisson(100texFetch)")]
    Poisson25,
    #[serde(rename = "32Poisson(128texFetch)")]
    Poisson32,
    #[serde(rename = "1Band(1texFetch)")]
    Band1,
    #[serde(rename = "4Band(4texFetch)")]
    Band4,
    #[serde(rename = "9Band(9texFetch)")]
    Band9,
    #[serde(rename = "16Band(16texFetch)")]
    Band16,
    #[default]
    #[serde(rename = "1Tap(4texFetch)")]
    Tap1,
    #[serde(rename = "4Tap(16texFetch)")]
    Tap4,
    #[serde(rename = "9Tap(36texFetch)")]
    Tap9,
    #[serde(rename = "16Tap(64texFetch)")]
    Tap16,
}

impl PcfKernel {
    /// Unknown names fall back to the 1-tap kernel.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        serde_json::from_value(serde_json::Value::String(name.to_string())).unwrap_or_default()
    }

    const fn macros(self) -> [&'static str; 2] {
        match self {
            Self::Poisson4 => ["_POISSON_PCF", "_PCFx4"],
            Self::Poisson8 => ["_POISSON_PCF", "_PCFx9"],
            Self::Poisson16 => ["_POISSON_PCF", "_PCFx16"],
            Self::Poisson25 => ["_POISSON_PCF", "_PCFx25"],
            Self::Poisson32 => ["_POISSON_PCF", "_PCFx32"],
            Self::Band1 => ["_NONE", "_PCFx1"],
            Self::Band4 => ["_BAND_PCF", "_PCFx4"],
            Self::Band9 => ["_BAND_PCF", "_PCFx9"],
            Self::Band16 => ["_BAND_PCF", "_PCFx16"],
            Self::Tap1 => ["_TAP_PCF", "_PCFx1"],
            Self::Tap4 => ["_TAP_PCF", "_PCFx4"],
            Self::Tap9 => ["_TAP_PCF", "_PCFx9"],
            Self::Tap16 => ["_TAP_PCF", "_PCFx25"],
        }
    }
}

/// Texel format of the shadow map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShadowPrecision {
    #[default]
    UnsignedByte,
    HalfFloat,
    HalfFloatLinear,
    Float,
    FloatLinear,
}

impl ShadowPrecision {
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        serde_json::from_value(serde_json::Value::String(name.to_string())).ok()
    }

    #[inline]
    #[must_use]
    pub const fn is_float(self) -> bool {
        !matches!(self, Self::UnsignedByte)
    }

    #[inline]
    #[must_use]
    pub const fn is_linear_float(self) -> bool {
        matches!(self, Self::HalfFloatLinear | Self::FloatLinear)
    }
}

/// Code-affecting shadow parameters, shared by the receive and cast nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    pub algorithm: ShadowAlgorithm,
    pub kernel: PcfKernel,
    pub fake_pcf: bool,
    pub rotate_offset: bool,
    pub precision: ShadowPrecision,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            algorithm: ShadowAlgorithm::None,
            kernel: PcfKernel::Tap1,
            fake_pcf: true,
            rotate_offset: false,
            precision: ShadowPrecision::UnsignedByte,
        }
    }
}

impl ShadowConfig {
    /// `#define` lines selecting the filtering code paths.
    #[must_use]
    pub fn defines(&self) -> Vec<String> {
        let mut defines = Vec::new();

        match self.algorithm {
            ShadowAlgorithm::Esm => defines.push("#define _ESM".to_string()),
            ShadowAlgorithm::None => defines.push("#define _NONE".to_string()),
            ShadowAlgorithm::Vsm => defines.push("#define _VSM".to_string()),
            ShadowAlgorithm::Evsm => defines.push("#define _EVSM".to_string()),
            ShadowAlgorithm::Pcf => {
                defines.push("#define _PCF".to_string());
                if self.fake_pcf {
                    defines.push("#define _FAKE_PCF 1".to_string());
                }
                defines.extend(self.kernel.macros().map(|m| format!("#define {m}")));
            }
        }

        if self.precision.is_float() {
            defines.push("#define _FLOATTEX".to_string());
        }
        if self.precision.is_linear_float() {
            defines.push("#define _FLOATLINEAR".to_string());
        }
        if self.rotate_offset {
            defines.push("#define _ROTATE_OFFSET".to_string());
        }

        defines
    }

    #[must_use]
    pub fn extensions(&self) -> Vec<String> {
        if self.algorithm == ShadowAlgorithm::Pcf {
            vec!["#extension GL_OES_standard_derivatives : enable".to_string()]
        } else {
            Vec::new()
        }
    }
}

/// Marks geometry as receiving the shadow of light `light_number`.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowReceiveAttribute {
    pub light_number: u32,
    pub enabled: bool,
    pub config: ShadowConfig,
    pub bias: f32,
    pub exponent0: f32,
    pub exponent1: f32,
    pub epsilon_vsm: f32,
}

impl ShadowReceiveAttribute {
    #[must_use]
    pub fn new(light_number: u32) -> Self {
        Self {
            light_number,
            enabled: true,
            config: ShadowConfig::default(),
            bias: 0.001,
            exponent0: 0.001,
            exponent1: 0.001,
            epsilon_vsm: 0.001,
        }
    }

    #[must_use]
    pub fn uniform_name(&self, field: &str) -> String {
        format!("uShadowReceive{}_{field}", self.light_number)
    }

    #[must_use]
    pub fn uniform_values(&self) -> Vec<(String, UniformValue)> {
        if !self.enabled {
            return Vec::new();
        }
        vec![
            (self.uniform_name("bias"), self.bias.into()),
            (self.uniform_name("exponent0"), self.exponent0.into()),
            (self.uniform_name("exponent1"), self.exponent1.into()),
            (self.uniform_name("epsilonVSM"), self.epsilon_vsm.into()),
        ]
    }
}

/// Marks geometry as drawn into a shadow map. While active, programs are
/// built as depth passes encoding the depth for `config`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShadowCastAttribute {
    pub enabled: bool,
    pub config: ShadowConfig,
}

impl ShadowCastAttribute {
    #[must_use]
    pub fn new(config: ShadowConfig) -> Self {
        Self {
            enabled: true,
            config,
        }
    }

    /// Cast pass matching the filtering of `receive`.
    #[must_use]
    pub fn for_receiver(receive: &ShadowReceiveAttribute) -> Self {
        Self::new(receive.config)
    }
}

/// Shadow map bound to a texture unit, produced for light `light_unit`.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowTexture {
    pub light_unit: u32,
    pub view_matrix: Mat4,
    pub projection_matrix: Mat4,
    pub depth_range: Vec4,
    map_size: Vec4,
}

impl ShadowTexture {
    #[must_use]
    pub fn new(light_unit: u32) -> Self {
        Self {
            light_unit,
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            depth_range: Vec4::new(0.0, 1.0, 1.0, 1.0),
            map_size: Vec4::ZERO,
        }
    }

    /// Stores `(w, h, 1/w, 1/h)`.
    pub fn set_texture_size(&mut self, width: u32, height: u32) {
        let (w, h) = (width as f32, height as f32);
        self.map_size = Vec4::new(w, h, 1.0 / w, 1.0 / h);
    }

    #[must_use]
    pub fn map_size(&self) -> Vec4 {
        self.map_size
    }

    #[must_use]
    pub fn uniform_name(unit: u32, field: &str) -> String {
        format!("uShadowTexture{unit}_{field}")
    }

    #[must_use]
    pub fn uniform_values(&self, unit: u32) -> Vec<(String, UniformValue)> {
        vec![
            (Self::uniform_name(unit, "viewMatrix"), self.view_matrix.into()),
            (
                Self::uniform_name(unit, "projectionMatrix"),
                self.projection_matrix.into(),
            ),
            (Self::uniform_name(unit, "depthRange"), self.depth_range.into()),
            (Self::uniform_name(unit, "mapSize"), self.map_size.into()),
            (format!("Texture{unit}"), UniformValue::Int(unit as i32)),
        ]
    }
}
