//! Compiler Settings
//!
//! Code-generation options shared by every program a
//! [`CompilerContext`](crate::shader::context::CompilerContext) compiles.
//! Settings deserialize from JSON with defaults for every missing field:
//!
//! ```json
//! { "precision": "High", "debug_shader_nodes": true }
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::state::attributes::AttributeKind;

/// Default float precision emitted ahead of each shader body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FloatPrecision {
    /// `highp` where the fragment stage supports it, `mediump` otherwise.
    #[default]
    Auto,
    High,
    Medium,
    Low,
}

impl FloatPrecision {
    /// The GLSL precision statement.
    #[must_use]
    pub const fn declaration(self) -> &'static str {
        match self {
            Self::Auto => {
                "#ifdef GL_FRAGMENT_PRECISION_HIGH\n precision highp float;\n #else\n precision mediump float;\n#endif"
            }
            Self::High => "precision highp float;",
            Self::Medium => "precision mediump float;",
            Self::Low => "precision lowp float;",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerSettings {
    /// Value of the `#version` directive.
    pub glsl_version: String,
    pub precision: FloatPrecision,
    /// Emit typed `// output` / `// inputs` comments before each call.
    pub debug_shader_nodes: bool,
    /// Declare `invariant gl_Position;` in vertex shaders.
    pub invariant_position: bool,
    /// Attribute kinds that take part in program generation.
    pub accepted_attributes: Vec<AttributeKind>,
    /// Cap on the `uBones` array length, in vec4.
    pub max_bone_uniform_allowed: Option<u32>,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            glsl_version: "100".to_string(),
            precision: FloatPrecision::Auto,
            debug_shader_nodes: false,
            invariant_position: false,
            accepted_attributes: AttributeKind::SHADER_DEFAULTS.to_vec(),
            max_bone_uniform_allowed: None,
        }
    }
}

impl CompilerSettings {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    #[inline]
    #[must_use]
    pub fn accepts(&self, kind: AttributeKind) -> bool {
        self.accepted_attributes.contains(&kind)
    }
}
