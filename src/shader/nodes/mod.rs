//! Built-in node library.
//!
//! Each themed module exposes a `NODES` table of `(type name, constructor)`
//! pairs for [`NodeFactory::register_nodes`](super::factory::NodeFactory::register_nodes)
//! and the code generation of its node kinds. This module dispatches on
//! [`NodeKind`] once per node and per compile pass.

pub mod animation;
pub mod data;
pub mod functions;
pub mod lights;
pub mod operations;
pub mod shadows;
pub mod textures;

use std::fmt;

use super::diagnostic::Diagnostic;
use super::graph::ShaderGraph;
use super::node::{Input, NodeId, NodeKind, ShaderNode};

/// A resolved port: a variable name and its GLSL type, or a literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operand<'a> {
    pub name: &'a str,
    /// `None` for literals.
    pub ty: Option<&'a str>,
}

impl Operand<'_> {
    #[inline]
    #[must_use]
    pub fn is(&self, ty: &str) -> bool {
        self.ty == Some(ty)
    }

    /// `.rgb` of a vec4, the operand itself otherwise.
    #[must_use]
    pub fn vec3(&self) -> String {
        if self.is("vec4") {
            format!("{}.rgb", self.name)
        } else {
            self.name.to_string()
        }
    }

    /// Scalar alpha: floats and literals as is, `.a` otherwise.
    #[must_use]
    pub fn alpha(&self) -> String {
        match self.ty {
            None | Some("float") => self.name.to_string(),
            Some(_) => format!("{}.a", self.name),
        }
    }
}

impl fmt::Display for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Read access to one node and the variables wired to it.
pub struct NodeView<'a> {
    graph: &'a ShaderGraph,
    node: &'a ShaderNode,
    debug: bool,
}

impl<'a> NodeView<'a> {
    #[must_use]
    pub fn new(graph: &'a ShaderGraph, node: &'a ShaderNode, debug: bool) -> Self {
        Self { graph, node, debug }
    }

    #[inline]
    #[must_use]
    pub fn node(&self) -> &'a ShaderNode {
        self.node
    }

    #[inline]
    fn type_name(&self) -> &'static str {
        self.node.type_name()
    }

    fn variable(&self, id: NodeId, port: &str) -> Result<Operand<'a>, Diagnostic> {
        let not_a_variable = || Diagnostic::NotAVariable {
            node_type: self.type_name(),
            port: port.to_string(),
        };
        match &self.graph.try_get(id).ok_or_else(not_a_variable)?.kind {
            NodeKind::Variable(v) => Ok(Operand {
                name: &v.name,
                ty: Some(&v.ty),
            }),
            NodeKind::Output(o) => Ok(Operand {
                name: o.variable(),
                ty: Some(o.glsl_type()),
            }),
            _ => Err(not_a_variable()),
        }
    }

    fn resolve(&self, input: &'a Input, port: &str) -> Result<Operand<'a>, Diagnostic> {
        match input {
            Input::Literal(value) => Ok(Operand {
                name: value,
                ty: None,
            }),
            Input::Node(id) => self.variable(*id, port),
        }
    }

    pub fn input(&self, port: &str) -> Result<Operand<'a>, Diagnostic> {
        self.opt_input(port)?.ok_or_else(|| Diagnostic::MissingInput {
            node_type: self.type_name(),
            port: port.to_string(),
        })
    }

    pub fn opt_input(&self, port: &str) -> Result<Option<Operand<'a>>, Diagnostic> {
        self.node
            .input(port)
            .map(|input| self.resolve(input, port))
            .transpose()
    }

    /// Every input in wiring order.
    pub fn inputs(&self) -> Result<Vec<Operand<'a>>, Diagnostic> {
        self.node
            .inputs
            .iter()
            .enumerate()
            .map(|(i, (name, input))| match name {
                Some(name) => self.resolve(input, name),
                None => self.resolve(input, &i.to_string()),
            })
            .collect()
    }

    pub fn output(&self, port: &str) -> Result<Operand<'a>, Diagnostic> {
        let id = self.node.outputs.get(port).ok_or_else(|| Diagnostic::MissingOutput {
            node_type: self.type_name(),
            port: port.to_string(),
        })?;
        self.variable(id, port)
    }

    /// The single output of operator nodes.
    pub fn first_output(&self) -> Result<Operand<'a>, Diagnostic> {
        let id = self.node.outputs.first().ok_or_else(|| Diagnostic::MissingOutput {
            node_type: self.type_name(),
            port: "out".to_string(),
        })?;
        self.variable(id, "out")
    }

    /// Operand bound to `name` among outputs, then inputs.
    pub fn port(&self, name: &str) -> Option<Operand<'a>> {
        if let Some((_, id)) = self.node.outputs.named().find(|(port, _)| *port == name) {
            return self.variable(id, name).ok();
        }
        self.opt_input(name).ok().flatten()
    }

    /// `output = func( a, b );\n`, with typed port comments in debug mode.
    #[must_use]
    pub fn call_function(&self, func: &str, output: &str, args: &[String]) -> String {
        let call = format!("{output} = {func}( {} );\n", args.join(", "));
        if !self.debug {
            return call;
        }

        let describe = |op: Option<Operand<'_>>| match op {
            Some(Operand { name, ty: Some(ty) }) => format!("// {ty} {name}"),
            Some(Operand { name, ty: None }) => format!("// {name}"),
            None => "// undefined".to_string(),
        };

        let mut debug = vec!["\n// output".to_string()];
        for id in self.node.outputs.targets() {
            debug.push(describe(self.variable(id, "out").ok()));
        }
        if !args.is_empty() {
            debug.push("// inputs".to_string());
            for (i, (name, input)) in self.node.inputs.iter().enumerate() {
                let port = name.clone().unwrap_or_else(|| i.to_string());
                debug.push(describe(self.resolve(input, &port).ok()));
            }
        }
        format!("{}\n{call}", debug.join("\n"))
    }
}

// ============================================================================
// Port requirements
// ============================================================================

/// Named inputs a node must carry before it generates code.
#[must_use]
pub fn required_inputs(kind: &NodeKind) -> Vec<&'static str> {
    match kind {
        NodeKind::MatrixMult(_) => vec!["vec", "matrix"],
        NodeKind::SetAlpha => vec!["color", "alpha"],
        NodeKind::PreMultAlpha => vec!["color"],
        NodeKind::Function(f) => functions::required_inputs(*f).to_vec(),
        NodeKind::Texture(_) => textures::INPUTS.to_vec(),
        NodeKind::Light(model) => lights::required_inputs(*model),
        NodeKind::Morph => animation::MORPH_INPUTS.to_vec(),
        NodeKind::Skinning => animation::SKINNING_INPUTS.to_vec(),
        NodeKind::Billboard => animation::BILLBOARD_INPUTS.to_vec(),
        NodeKind::ShadowReceive(config) => shadows::receive_inputs(config),
        NodeKind::ShadowCast(_) => shadows::CAST_INPUTS.to_vec(),
        _ => Vec::new(),
    }
}

#[must_use]
pub fn required_outputs(kind: &NodeKind) -> &'static [&'static str] {
    match kind {
        NodeKind::MatrixMult(_) | NodeKind::Billboard => &["vec"],
        NodeKind::SetAlpha | NodeKind::PreMultAlpha | NodeKind::Texture(_) | NodeKind::Light(_) => {
            &["color"]
        }
        NodeKind::Function(f) => functions::required_outputs(*f),
        NodeKind::Morph => &["out"],
        NodeKind::Skinning => &["mat4"],
        NodeKind::ShadowReceive(_) => &["float"],
        NodeKind::ShadowCast(_) => &["color"],
        _ => &[],
    }
}

/// Check that every required port of the node is wired.
pub fn validate(node: &ShaderNode) -> Result<(), Diagnostic> {
    let node_type = node.type_name();
    if let Some(port) = required_inputs(&node.kind)
        .into_iter()
        .find(|port| node.input(port).is_none())
    {
        return Err(Diagnostic::MissingInput {
            node_type,
            port: port.to_string(),
        });
    }
    if let Some(port) = required_outputs(&node.kind)
        .iter()
        .find(|port| node.outputs.get(port).is_none())
    {
        return Err(Diagnostic::MissingOutput {
            node_type,
            port: (*port).to_string(),
        });
    }
    Ok(())
}

// ============================================================================
// Code generation
// ============================================================================

/// Statement of the node in `main`, if it has one.
pub fn compute_shader(view: &NodeView<'_>) -> Result<Option<String>, Diagnostic> {
    let code = match &view.node().kind {
        NodeKind::Variable(_) | NodeKind::Output(_) | NodeKind::Define { .. } => return Ok(None),
        NodeKind::Add | NodeKind::SetFromNode => operations::binary(view, "+")?,
        NodeKind::Mult => operations::binary(view, "*")?,
        NodeKind::MatrixMult(m) => operations::matrix_mult(view, m)?,
        NodeKind::InlineCode { code } => operations::inline_code(view, code)?,
        NodeKind::SetAlpha => operations::set_alpha(view)?,
        NodeKind::PreMultAlpha => operations::pre_mult_alpha(view)?,
        NodeKind::Function(f) => functions::compute(view, *f)?,
        NodeKind::Texture(fetch) => textures::compute(view, *fetch)?,
        NodeKind::Light(model) => lights::compute(view, *model)?,
        NodeKind::Morph => animation::morph(view)?,
        NodeKind::Skinning => animation::skinning(view)?,
        NodeKind::Billboard => animation::billboard(view)?,
        NodeKind::ShadowReceive(config) => shadows::receive(view, config)?,
        NodeKind::ShadowCast(config) => shadows::cast(view, config)?,
    };
    Ok(Some(code))
}

/// File-scope variable declaration.
#[must_use]
pub fn global_declaration(node: &ShaderNode) -> Option<String> {
    node.kind.as_variable()?.global_declaration()
}

/// File-scope function code or include marker, shared by all nodes of a type.
#[must_use]
pub fn global_function_declaration(node: &ShaderNode) -> Option<String> {
    let include = |file: &str| Some(format!("#pragma include \"{file}\""));
    match &node.kind {
        NodeKind::Function(_) => include("functions.glsl"),
        NodeKind::Texture(_) => include("textures.glsl"),
        NodeKind::Light(_) => include("lights.glsl"),
        NodeKind::Skinning => include("skinning.glsl"),
        NodeKind::Billboard => include("billboard.glsl"),
        NodeKind::ShadowReceive(_) => include("shadowsReceive.glsl"),
        NodeKind::ShadowCast(_) => include("shadowsCastFrag.glsl"),
        NodeKind::Morph => Some(animation::morph_function(node)),
        _ => None,
    }
}

#[must_use]
pub fn defines(node: &ShaderNode) -> Vec<String> {
    match &node.kind {
        NodeKind::Define { name, value } => vec![functions::define_line(name, value)],
        NodeKind::ShadowReceive(config) | NodeKind::ShadowCast(config) => config.defines(),
        _ => Vec::new(),
    }
}

#[must_use]
pub fn extensions(node: &ShaderNode) -> Vec<String> {
    match &node.kind {
        NodeKind::ShadowReceive(config) => config.extensions(),
        _ => Vec::new(),
    }
}
