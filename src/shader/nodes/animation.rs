//! Vertex animation nodes: morph targets, skinning and billboards.

use super::NodeView;
use crate::shader::diagnostic::Diagnostic;
use crate::shader::factory::NodeConstructor;
use crate::shader::node::{NodeKind, ShaderNode};

pub const NODES: &[(&str, NodeConstructor)] = &[
    ("Morph", |_| Ok(NodeKind::Morph)),
    ("Skinning", |_| Ok(NodeKind::Skinning)),
    ("Billboard", |_| Ok(NodeKind::Billboard)),
];

pub(crate) const MORPH_INPUTS: &[&str] = &["weights", "vertex", "target0"];
pub(crate) const SKINNING_INPUTS: &[&str] = &["weights", "bonesIndex", "matrixPalette"];
pub(crate) const BILLBOARD_INPUTS: &[&str] = &["Vertex", "ModelViewMatrix", "ProjectionMatrix"];

/// Up to four targets fit in the `vec4` weights.
const MAX_TARGETS: usize = 4;

fn target_count(node: &ShaderNode) -> usize {
    (0..MAX_TARGETS)
        .take_while(|i| node.input(&format!("target{i}")).is_some())
        .count()
}

/// `morphTransform` specialised for the node's target count.
pub(crate) fn morph_function(node: &ShaderNode) -> String {
    let targets = target_count(node).max(1);

    let mut code =
        String::from("vec3 morphTransform( const in vec4 weights,  const in vec3 vertex, const in vec3 target0");
    for i in 1..targets {
        code.push_str(&format!(", const in vec3 target{i}"));
    }
    code.push_str(" ) { \n");

    if targets == 1 {
        code.push_str("return mix(vertex, target0, weights[0])");
    } else {
        code.push_str("\tvec3 vecOut = vertex * (1.0 - ( weights[0]");
        for i in 1..targets {
            code.push_str(&format!(" + weights[{i}]"));
        }
        code.push_str("));\n");
        for i in 0..targets {
            code.push_str(&format!("\tvecOut += target{i} * weights[{i}];\n"));
        }
        code.push_str("\treturn vecOut");
    }

    code.push_str(";\n}\n");
    code
}

pub(crate) fn morph(view: &NodeView<'_>) -> Result<String, Diagnostic> {
    let out = view.output("out")?;
    let mut args = vec![view.input("weights")?.to_string(), view.input("vertex")?.vec3()];
    for i in 0..target_count(view.node()) {
        args.push(view.input(&format!("target{i}"))?.vec3());
    }
    Ok(view.call_function("morphTransform", out.name, &args))
}

/// `out = skeletalTransform( weights, bonesIndex );`. The palette is wired
/// only to get `uBones` declared.
pub(crate) fn skinning(view: &NodeView<'_>) -> Result<String, Diagnostic> {
    let out = view.output("mat4")?;
    let weights = view.input("weights")?;
    let bones = view.input("bonesIndex")?;
    view.input("matrixPalette")?;
    Ok(view.call_function("skeletalTransform", out.name, &[weights.to_string(), bones.to_string()]))
}

pub(crate) fn billboard(view: &NodeView<'_>) -> Result<String, Diagnostic> {
    let out = view.output("vec")?;
    let args = BILLBOARD_INPUTS
        .iter()
        .map(|port| view.input(port).map(|op| op.to_string()))
        .collect::<Result<Vec<_>, Diagnostic>>()?;
    Ok(view.call_function("billboard", out.name, &args))
}
