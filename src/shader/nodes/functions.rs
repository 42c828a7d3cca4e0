//! Function nodes backed by `functions.glsl`, and the `Define` node.

use super::NodeView;
use crate::shader::diagnostic::Diagnostic;
use crate::shader::factory::{NodeConstructor, optional_string_arg, string_arg};
use crate::shader::node::{ColorFunction, NodeKind};

pub const NODES: &[(&str, NodeConstructor)] = &[
    ("Normalize", |_| Ok(NodeKind::Function(ColorFunction::Normalize))),
    ("sRGBToLinear", |_| Ok(NodeKind::Function(ColorFunction::SrgbToLinear))),
    ("LinearTosRGB", |_| Ok(NodeKind::Function(ColorFunction::LinearToSrgb))),
    ("FrontNormal", |_| Ok(NodeKind::Function(ColorFunction::FrontNormal))),
    ("EncodeRGBM", |_| Ok(NodeKind::Function(ColorFunction::EncodeRgbm))),
    ("DecodeRGBM", |_| Ok(NodeKind::Function(ColorFunction::DecodeRgbm))),
    ("Define", |args| {
        Ok(NodeKind::Define {
            name: string_arg("Define", args, 0)?.to_string(),
            value: optional_string_arg(args, 1).unwrap_or_default().to_string(),
        })
    }),
];

pub(crate) fn required_inputs(f: ColorFunction) -> &'static [&'static str] {
    match f {
        ColorFunction::Normalize => &["vec"],
        ColorFunction::SrgbToLinear | ColorFunction::LinearToSrgb => &["color"],
        ColorFunction::FrontNormal => &["normal"],
        ColorFunction::EncodeRgbm | ColorFunction::DecodeRgbm => &["color", "range"],
    }
}

pub(crate) fn required_outputs(f: ColorFunction) -> &'static [&'static str] {
    match f {
        ColorFunction::Normalize => &["vec"],
        ColorFunction::FrontNormal => &["normal"],
        _ => &["color"],
    }
}

/// `#define NAME VALUE`, without a trailing blank for empty values.
pub(crate) fn define_line(name: &str, value: &str) -> String {
    if value.is_empty() {
        format!("#define {name}")
    } else {
        format!("#define {name} {value}")
    }
}

pub(crate) fn compute(view: &NodeView<'_>, f: ColorFunction) -> Result<String, Diagnostic> {
    match f {
        ColorFunction::Normalize => {
            let out = view.output("vec")?;
            let vec = view.input("vec")?;
            Ok(view.call_function("normalize", out.name, &[vec.to_string()]))
        }
        ColorFunction::SrgbToLinear => conversion(view, "sRGBToLinear"),
        ColorFunction::LinearToSrgb => conversion(view, "linearTosRGB"),
        ColorFunction::FrontNormal => {
            let out = view.output("normal")?;
            let normal = view.input("normal")?;
            Ok(format!("{out} = gl_FrontFacing ? {normal} : -{normal} ;"))
        }
        ColorFunction::EncodeRgbm => {
            let out = view.output("color")?;
            let color = view.input("color")?;
            let range = view.input("range")?;
            Ok(view.call_function("encodeRGBM", out.name, &[color.vec3(), range.to_string()]))
        }
        ColorFunction::DecodeRgbm => {
            let out = view.output("color")?;
            let color = view.input("color")?;
            let range = view.input("range")?;
            Ok(view.call_function("decodeRGBM", out.name, &[color.to_string(), range.to_string()]))
        }
    }
}

/// Color space conversion; mixed vec3/vec4 ports convert `.rgb` only.
fn conversion(view: &NodeView<'_>, func: &str) -> Result<String, Diagnostic> {
    let out = view.output("color")?;
    let color = view.input("color")?;
    let rgb = if out.ty == color.ty { "" } else { ".rgb" };
    Ok(view.call_function(func, &format!("{out}{rgb}"), &[format!("{color}{rgb}")]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::graph::{ShaderGraph, ShaderStage};
    use crate::shader::nodes::compute_shader;

    #[test]
    fn srgb_conversion_swizzles_mixed_types() {
        let mut g = ShaderGraph::new(ShaderStage::Fragment);
        let color = g.create_variable("vec4", Some("color"));
        let out = g.create_variable("vec3", Some("srgb"));
        let id = g
            .node(NodeKind::Function(ColorFunction::LinearToSrgb))
            .inputs([("color", color)])
            .outputs([("color", out)])
            .id();
        let view = NodeView::new(&g, g.get(id), false);
        assert_eq!(
            compute_shader(&view).ok().flatten().as_deref(),
            Some("srgb.rgb = linearTosRGB( color.rgb );\n")
        );
    }

    #[test]
    fn front_normal_flips_back_faces() {
        let mut g = ShaderGraph::new(ShaderStage::Fragment);
        let n = g.get_or_create_varying("vec3", "vViewNormal");
        let out = g.create_variable("vec3", Some("frontNormal"));
        let id = g
            .node(NodeKind::Function(ColorFunction::FrontNormal))
            .inputs([("normal", n)])
            .outputs([("normal", out)])
            .id();
        let view = NodeView::new(&g, g.get(id), false);
        assert_eq!(
            compute_shader(&view).ok().flatten().as_deref(),
            Some("frontNormal = gl_FrontFacing ? vViewNormal : -vViewNormal ;")
        );
    }

    #[test]
    fn empty_define_has_no_trailing_space() {
        assert_eq!(define_line("_PCF", ""), "#define _PCF");
        assert_eq!(define_line("SHADER_NAME", "Material"), "#define SHADER_NAME Material");
    }
}
