//! Operator nodes: arithmetic, matrix products, alpha handling and inline
//! GLSL snippets.

use super::NodeView;
use crate::shader::diagnostic::Diagnostic;
use crate::shader::factory::{NodeArg, NodeConstructor, optional_string_arg};
use crate::shader::node::{MatrixMult, MatrixMultMode, NodeKind};

pub const NODES: &[(&str, NodeConstructor)] = &[
    ("Add", |_| Ok(NodeKind::Add)),
    ("Mult", |_| Ok(NodeKind::Mult)),
    ("SetFromNode", |_| Ok(NodeKind::SetFromNode)),
    ("MatrixMultPosition", |args| Ok(NodeKind::MatrixMult(matrix_flags(MatrixMult::position(), args)))),
    ("MatrixMultDirection", |args| Ok(NodeKind::MatrixMult(matrix_flags(MatrixMult::direction(), args)))),
    ("InlineCode", |args| {
        Ok(NodeKind::InlineCode {
            code: optional_string_arg(args, 0).unwrap_or_default().to_string(),
        })
    }),
    ("SetAlpha", |_| Ok(NodeKind::SetAlpha)),
    ("PreMultAlpha", |_| Ok(NodeKind::PreMultAlpha)),
];

/// Optional flags in order: inverse, overwrite_w, force_complement.
fn matrix_flags(mut m: MatrixMult, args: &[NodeArg]) -> MatrixMult {
    if let Some(inverse) = args.first().and_then(NodeArg::as_bool) {
        m.inverse = inverse;
    }
    if let Some(overwrite) = args.get(1).and_then(NodeArg::as_bool) {
        m.overwrite_w = overwrite;
    }
    if let Some(force) = args.get(2).and_then(NodeArg::as_bool) {
        m.force_complement = force;
    }
    m
}

/// `out = in0<sw> op in1<sw> ...;` with the swizzle taken from the output
/// type. Floats and literals are never swizzled.
pub(crate) fn binary(view: &NodeView<'_>, operator: &str) -> Result<String, Diagnostic> {
    let out = view.first_output()?;
    let inputs = view.inputs()?;
    let Some((first, rest)) = inputs.split_first() else {
        return Err(Diagnostic::MissingInput {
            node_type: view.node().type_name(),
            port: "0".to_string(),
        });
    };

    let swizzle = match out.ty {
        Some("vec4") => ".rgba",
        Some("vec3") => ".rgb",
        Some("vec2") => ".rg",
        _ => "",
    };
    let swizzled = |op: &super::Operand<'_>| match op.ty {
        None | Some("float") => op.name.to_string(),
        Some(_) => format!("{}{swizzle}", op.name),
    };

    let mut code = format!("{} = {}", out.name, swizzled(first));
    for input in rest {
        code.push_str(operator);
        code.push_str(&swizzled(input));
    }
    code.push(';');
    Ok(code)
}

pub(crate) fn matrix_mult(view: &NodeView<'_>, m: &MatrixMult) -> Result<String, Diagnostic> {
    let vec_in = view.input("vec")?;
    let matrix = view.input("matrix")?;
    let vec_out = view.output("vec")?;

    let complement = match m.mode {
        MatrixMultMode::Position => "1.",
        MatrixMultMode::Direction => "0.",
    };
    let input_is_vec4 = vec_in.is("vec4");
    let output_ty = vec_out.ty.unwrap_or("vec4");

    let casted = if m.force_complement || !input_is_vec4 {
        format!("vec4({}.xyz, {complement})", vec_in.name)
    } else {
        vec_in.name.to_string()
    };
    let product = if m.inverse {
        format!("{casted}*{matrix}")
    } else {
        format!("{matrix}*{casted}")
    };

    let mut code = if output_ty == "vec4" {
        format!("{vec_out} = {product};")
    } else {
        format!("{vec_out} = {output_ty}({product});")
    };
    if !m.overwrite_w && input_is_vec4 {
        code.push_str(&format!("\n{vec_out}.a = {vec_in}.a;"));
    }
    Ok(code)
}

/// Replace each `%name` token with the variable bound to port `name`.
pub(crate) fn inline_code(view: &NodeView<'_>, code: &str) -> Result<String, Diagnostic> {
    let mut result = String::with_capacity(code.len());
    let mut rest = code;

    while let Some(start) = rest.find('%') {
        result.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        if len == 0 {
            result.push('%');
            rest = after;
            continue;
        }

        let name = &after[..len];
        let operand = view.port(name).ok_or_else(|| {
            log::error!("Inline code input {name} not provided:\n{code}");
            Diagnostic::MissingInput {
                node_type: view.node().type_name(),
                port: name.to_string(),
            }
        })?;
        result.push_str(operand.name);
        rest = &after[len..];
    }
    result.push_str(rest);
    Ok(result)
}

/// `out = vec4( color.rgb, alpha );`
pub(crate) fn set_alpha(view: &NodeView<'_>) -> Result<String, Diagnostic> {
    let out = view.output("color")?;
    let color = view.input("color")?;
    let alpha = view.input("alpha")?;
    Ok(format!("{out} = vec4( {color}.rgb, {} );", alpha.alpha()))
}

/// `out.rgb = color.rgb * alpha;`, alpha read from `color` when absent.
pub(crate) fn pre_mult_alpha(view: &NodeView<'_>) -> Result<String, Diagnostic> {
    let out = view.output("color")?;
    let color = view.input("color")?;
    let source = view.opt_input("alpha")?.unwrap_or(color);
    Ok(format!("{out}.rgb = {color}.rgb * {};", source.alpha()))
}

#[cfg(test)]
mod tests {
    use crate::shader::graph::{ShaderGraph, ShaderStage};
    use crate::shader::node::{MatrixMult, NodeKind};
    use crate::shader::nodes::{NodeView, compute_shader};

    fn statement(graph: &ShaderGraph, id: crate::shader::node::NodeId) -> String {
        let view = NodeView::new(graph, graph.get(id), false);
        compute_shader(&view).ok().flatten().unwrap_or_default()
    }

    #[test]
    fn add_swizzles_by_output_type() {
        let mut g = ShaderGraph::new(ShaderStage::Fragment);
        let a = g.create_variable("vec4", Some("a"));
        let b = g.create_variable("vec4", Some("b"));
        let f = g.create_variable("float", Some("f"));
        let out = g.create_variable("vec3", Some("out"));
        let add = g.node(NodeKind::Add).inputs([a, b, f]).outputs(out).id();
        assert_eq!(statement(&g, add), "out = a.rgb+b.rgb+f;");
    }

    #[test]
    fn matrix_mult_position_casts_vec3() {
        let mut g = ShaderGraph::new(ShaderStage::Vertex);
        let m = g.get_or_create_uniform("mat4", "uModelViewMatrix");
        let v = g.get_or_create_attribute("vec3", "Vertex");
        let out = g.create_variable("vec4", Some("viewVertex"));
        let id = g
            .node(NodeKind::MatrixMult(MatrixMult::position()))
            .inputs([("matrix", m), ("vec", v)])
            .outputs([("vec", out)])
            .id();
        assert_eq!(statement(&g, id), "viewVertex = uModelViewMatrix*vec4(Vertex.xyz, 1.);");
    }

    #[test]
    fn matrix_mult_direction_keeps_w_when_asked() {
        let mut g = ShaderGraph::new(ShaderStage::Vertex);
        let m = g.get_or_create_uniform("mat4", "uModelMatrix");
        let t = g.get_or_create_attribute("vec4", "Tangent");
        let out = g.create_variable("vec4", Some("modelTangent"));
        let id = g
            .node(NodeKind::MatrixMult(MatrixMult::direction()))
            .overwrite_w(false)
            .inputs([("matrix", m), ("vec", t)])
            .outputs([("vec", out)])
            .id();
        assert_eq!(
            statement(&g, id),
            "modelTangent = uModelMatrix*vec4(Tangent.xyz, 0.);\nmodelTangent.a = Tangent.a;"
        );
    }

    #[test]
    fn inline_code_replaces_every_occurrence() {
        let mut g = ShaderGraph::new(ShaderStage::Fragment);
        let alpha = g.create_variable("float", Some("alpha"));
        let color = g.get_or_create_uniform("vec4", "uMaterialDiffuse");
        let id = g
            .node(NodeKind::InlineCode { code: String::new() })
            .code("%alpha = %color.a;if ( %alpha == 0.0) discard;")
            .inputs([("color", color)])
            .outputs([("alpha", alpha)])
            .id();
        assert_eq!(
            statement(&g, id),
            "alpha = uMaterialDiffuse.a;if ( alpha == 0.0) discard;"
        );
    }

    #[test]
    fn set_alpha_reads_alpha_channel_of_vectors() {
        let mut g = ShaderGraph::new(ShaderStage::Vertex);
        let n = g.create_variable("vec3", Some("n"));
        let t = g.get_or_create_attribute("vec4", "Tangent");
        let out = g.create_variable("vec4", Some("localTangent"));
        let id = g
            .node(NodeKind::SetAlpha)
            .inputs([("color", n), ("alpha", t)])
            .outputs([("color", out)])
            .id();
        assert_eq!(statement(&g, id), "localTangent = vec4( n.rgb, Tangent.a );");
    }
}
