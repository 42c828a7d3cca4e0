//! Fixed-function attributes. They reach the graphics context directly and
//! never influence generated shader code, except [`Billboard`].

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CullMode {
    Front,
    #[default]
    Back,
    FrontAndBack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CullFace {
    pub mode: CullMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendFunc {
    pub src: BlendFactor,
    pub dst: BlendFactor,
}

impl Default for BlendFunc {
    fn default() -> Self {
        Self {
            src: BlendFactor::One,
            dst: BlendFactor::Zero,
        }
    }
}

impl BlendFunc {
    /// Blending for premultiplied alpha output.
    pub const PREMULTIPLIED: Self = Self {
        src: BlendFactor::One,
        dst: BlendFactor::OneMinusSrcAlpha,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DepthFunc {
    Never,
    #[default]
    Less,
    Equal,
    LessEqual,
    Greater,
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Depth {
    pub func: DepthFunc,
    pub write_mask: bool,
    pub near: f32,
    pub far: f32,
}

impl Default for Depth {
    fn default() -> Self {
        Self {
            func: DepthFunc::Less,
            write_mask: true,
            near: 0.0,
            far: 1.0,
        }
    }
}

/// Screen-facing geometry. Replaces the vertex projection with the
/// billboard transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Billboard {
    pub enabled: bool,
}

impl Default for Billboard {
    fn default() -> Self {
        Self { enabled: true }
    }
}
