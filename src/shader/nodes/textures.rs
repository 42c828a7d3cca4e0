//! Texture fetch nodes backed by `textures.glsl`.

use super::NodeView;
use crate::shader::diagnostic::Diagnostic;
use crate::shader::factory::NodeConstructor;
use crate::shader::node::{NodeKind, TextureFetch};

pub const NODES: &[(&str, NodeConstructor)] = &[
    ("TextureRGBA", |_| Ok(NodeKind::Texture(TextureFetch::Rgba))),
    ("TextureRGB", |_| Ok(NodeKind::Texture(TextureFetch::Rgb))),
    ("TextureAlpha", |_| Ok(NodeKind::Texture(TextureFetch::Alpha))),
    ("TextureIntensity", |_| Ok(NodeKind::Texture(TextureFetch::Intensity))),
];

pub(crate) const INPUTS: &[&str] = &["sampler", "uv"];

/// `out = textureRGBA( sampler, uv.xy );`
pub(crate) fn compute(view: &NodeView<'_>, fetch: TextureFetch) -> Result<String, Diagnostic> {
    let func = match fetch {
        TextureFetch::Rgba => "textureRGBA",
        TextureFetch::Rgb => "textureRGB",
        TextureFetch::Alpha => "textureAlpha",
        TextureFetch::Intensity => "textureIntensity",
    };
    let out = view.output("color")?;
    let sampler = view.input("sampler")?;
    let uv = view.input("uv")?;
    Ok(view.call_function(func, out.name, &[sampler.to_string(), format!("{uv}.xy")]))
}
