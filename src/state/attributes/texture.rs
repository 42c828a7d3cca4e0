use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextureTarget {
    #[default]
    Texture2D,
    CubeMap,
}

/// A texture bound to a unit. Image data lives with the graphics backend;
/// only the target matters to shader generation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Texture {
    pub target: TextureTarget,
    pub name: Option<String>,
}

impl Texture {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            target: TextureTarget::Texture2D,
            name: Some(name.into()),
        }
    }

    #[must_use]
    pub fn cube_map(name: impl Into<String>) -> Self {
        Self {
            target: TextureTarget::CubeMap,
            name: Some(name.into()),
        }
    }
}
