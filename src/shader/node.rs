//! Shader Node Model
//!
//! A node is one typed operation in a shader graph. Nodes are wired by
//! *inputs* (named ports or a positional list) and *outputs*. Declaring the
//! outputs of a node is what creates edges: every output node receives the
//! producer as an extra positional input, so traversing inputs from the roots
//! reaches the producers.
//!
//! ```text
//!   uMaterialDiffuse ─┐
//!                     ├─> Mult ──outputs──> tmp_3
//!   vVertexColor ─────┘      ^                │
//!                            └──── input ─────┘
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::state::attributes::ShadowConfig;

/// Index of a node inside its [`ShaderGraph`](super::graph::ShaderGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What an input port is connected to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Input {
    Node(NodeId),
    /// Inlined verbatim into generated code, e.g. `-1.0`.
    Literal(String),
}

impl Input {
    #[inline]
    #[must_use]
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Self::Node(id) => Some(*id),
            Self::Literal(_) => None,
        }
    }
}

impl From<NodeId> for Input {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

impl From<&str> for Input {
    fn from(literal: &str) -> Self {
        Self::Literal(literal.to_string())
    }
}

impl From<String> for Input {
    fn from(literal: String) -> Self {
        Self::Literal(literal)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Outputs {
    #[default]
    None,
    Single(NodeId),
    Named(Vec<(String, NodeId)>),
}

impl Outputs {
    /// Node bound to `port`. A single output answers every port name.
    #[must_use]
    pub fn get(&self, port: &str) -> Option<NodeId> {
        match self {
            Self::None => None,
            Self::Single(id) => Some(*id),
            Self::Named(ports) => ports.iter().find(|(name, _)| name == port).map(|(_, id)| *id),
        }
    }

    /// The only output, or the first named one.
    #[must_use]
    pub fn first(&self) -> Option<NodeId> {
        match self {
            Self::None => None,
            Self::Single(id) => Some(*id),
            Self::Named(ports) => ports.first().map(|(_, id)| *id),
        }
    }

    #[must_use]
    pub fn targets(&self) -> Vec<NodeId> {
        match self {
            Self::None => Vec::new(),
            Self::Single(id) => vec![*id],
            Self::Named(ports) => ports.iter().map(|(_, id)| *id).collect(),
        }
    }

    pub fn named(&self) -> impl Iterator<Item = (&str, NodeId)> {
        let ports: &[(String, NodeId)] = match self {
            Self::Named(ports) => ports,
            _ => &[],
        };
        ports.iter().map(|(name, id)| (name.as_str(), *id))
    }
}

impl From<NodeId> for Outputs {
    fn from(id: NodeId) -> Self {
        Self::Single(id)
    }
}

impl<const N: usize> From<[(&str, NodeId); N]> for Outputs {
    fn from(ports: [(&str, NodeId); N]) -> Self {
        Self::Named(ports.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }
}

impl From<Vec<(String, NodeId)>> for Outputs {
    fn from(ports: Vec<(String, NodeId)>) -> Self {
        Self::Named(ports)
    }
}

/// Argument of [`NodeBuilder::inputs`](super::graph::NodeBuilder::inputs).
///
/// A positional set is appended to the node's inputs; a named set replaces
/// them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSet {
    Positional(Vec<Input>),
    Named(Vec<(String, Input)>),
}

impl From<NodeId> for InputSet {
    fn from(id: NodeId) -> Self {
        Self::Positional(vec![Input::Node(id)])
    }
}

impl From<Input> for InputSet {
    fn from(input: Input) -> Self {
        Self::Positional(vec![input])
    }
}

impl<const N: usize> From<[NodeId; N]> for InputSet {
    fn from(ids: [NodeId; N]) -> Self {
        Self::Positional(ids.into_iter().map(Input::Node).collect())
    }
}

impl From<&[NodeId]> for InputSet {
    fn from(ids: &[NodeId]) -> Self {
        Self::Positional(ids.iter().copied().map(Input::Node).collect())
    }
}

impl From<Vec<NodeId>> for InputSet {
    fn from(ids: Vec<NodeId>) -> Self {
        Self::Positional(ids.into_iter().map(Input::Node).collect())
    }
}

impl From<Vec<Input>> for InputSet {
    fn from(inputs: Vec<Input>) -> Self {
        Self::Positional(inputs)
    }
}

impl<const N: usize> From<[(&str, NodeId); N]> for InputSet {
    fn from(ports: [(&str, NodeId); N]) -> Self {
        Self::Named(
            ports
                .into_iter()
                .map(|(k, v)| (k.to_string(), Input::Node(v)))
                .collect(),
        )
    }
}

impl From<Vec<(String, NodeId)>> for InputSet {
    fn from(ports: Vec<(String, NodeId)>) -> Self {
        Self::Named(ports.into_iter().map(|(k, v)| (k, Input::Node(v))).collect())
    }
}

impl From<Vec<(String, Input)>> for InputSet {
    fn from(ports: Vec<(String, Input)>) -> Self {
        Self::Named(ports)
    }
}

/// Storage class of a variable node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableClass {
    /// Local of `main`.
    Variable,
    /// `const` local of `main`.
    Constant,
    Uniform,
    Attribute,
    Varying,
    Sampler,
}

impl VariableClass {
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Variable => "Variable",
            Self::Constant => "Constant",
            Self::Uniform => "Uniform",
            Self::Attribute => "Attribute",
            Self::Varying => "Varying",
            Self::Sampler => "Sampler",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableNode {
    pub class: VariableClass,
    pub ty: String,
    pub name: String,
    pub value: Option<String>,
    /// Array length, uniforms only.
    pub size: Option<u32>,
}

impl VariableNode {
    #[must_use]
    pub fn new(class: VariableClass, ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            class,
            ty: ty.into(),
            name: name.into(),
            value: None,
            size: None,
        }
    }

    /// Declaration inside `main`, for locals and constants.
    #[must_use]
    pub fn declare(&self) -> Option<String> {
        match (self.class, &self.value) {
            (VariableClass::Variable, Some(value)) => Some(format!("{} {} = {};", self.ty, self.name, value)),
            (VariableClass::Variable, None) => Some(format!("{} {};", self.ty, self.name)),
            (VariableClass::Constant, Some(value)) => {
                Some(format!("const {} {} = {};", self.ty, self.name, value))
            }
            (VariableClass::Constant, None) => Some(format!("const {} {};", self.ty, self.name)),
            _ => None,
        }
    }

    /// Declaration at file scope.
    #[must_use]
    pub fn global_declaration(&self) -> Option<String> {
        match self.class {
            VariableClass::Uniform => Some(match self.size {
                Some(size) => format!("uniform {} {}[{}];", self.ty, self.name, size),
                None => format!("uniform {} {};", self.ty, self.name),
            }),
            VariableClass::Sampler => Some(format!("uniform {} {};", self.ty, self.name)),
            VariableClass::Attribute => Some(format!("attribute {} {};", self.ty, self.name)),
            VariableClass::Varying => Some(format!("varying {} {};", self.ty, self.name)),
            VariableClass::Variable | VariableClass::Constant => None,
        }
    }
}

/// GLSL built-in outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinOutput {
    FragColor,
    Position,
    PointSize,
}

impl BuiltinOutput {
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::FragColor => "glFragColor",
            Self::Position => "glPosition",
            Self::PointSize => "glPointSize",
        }
    }

    #[must_use]
    pub const fn variable(self) -> &'static str {
        match self {
            Self::FragColor => "gl_FragColor",
            Self::Position => "gl_Position",
            Self::PointSize => "gl_PointSize",
        }
    }

    #[must_use]
    pub const fn glsl_type(self) -> &'static str {
        match self {
            Self::FragColor | Self::Position => "vec4",
            Self::PointSize => "float",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatrixMultMode {
    /// Complement `w = 1.`
    Position,
    /// Complement `w = 0.`
    Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatrixMult {
    pub mode: MatrixMultMode,
    /// Rebuild `w` even when the input already is a `vec4`.
    pub force_complement: bool,
    /// When false, a `vec4` output keeps the input's `w`.
    pub overwrite_w: bool,
    /// Vector on the left: `v * M`.
    pub inverse: bool,
}

impl MatrixMult {
    #[must_use]
    pub const fn position() -> Self {
        Self {
            mode: MatrixMultMode::Position,
            force_complement: false,
            overwrite_w: true,
            inverse: false,
        }
    }

    #[must_use]
    pub const fn direction() -> Self {
        Self {
            mode: MatrixMultMode::Direction,
            force_complement: true,
            overwrite_w: true,
            inverse: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFetch {
    Rgba,
    Rgb,
    Alpha,
    Intensity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightModel {
    Point,
    Spot,
    Sun,
    Hemi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorFunction {
    Normalize,
    SrgbToLinear,
    LinearToSrgb,
    FrontNormal,
    EncodeRgbm,
    DecodeRgbm,
}

/// The operation a node performs.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Variable(VariableNode),
    Output(BuiltinOutput),
    Define { name: String, value: String },

    Add,
    Mult,
    SetFromNode,
    MatrixMult(MatrixMult),
    InlineCode { code: String },
    SetAlpha,
    PreMultAlpha,

    Function(ColorFunction),
    Texture(TextureFetch),
    Light(LightModel),

    Morph,
    Skinning,
    Billboard,

    ShadowReceive(ShadowConfig),
    ShadowCast(ShadowConfig),
}

impl NodeKind {
    /// Type name, unique per kind of generated code.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Variable(v) => v.class.type_name(),
            Self::Output(o) => o.type_name(),
            Self::Define { .. } => "Define",
            Self::Add => "Add",
            Self::Mult => "Mult",
            Self::SetFromNode => "SetFromNode",
            Self::MatrixMult(m) => match m.mode {
                MatrixMultMode::Position => "MatrixMultPosition",
                MatrixMultMode::Direction => "MatrixMultDirection",
            },
            Self::InlineCode { .. } => "InlineCode",
            Self::SetAlpha => "SetAlpha",
            Self::PreMultAlpha => "PreMultAlpha",
            Self::Function(f) => match f {
                ColorFunction::Normalize => "Normalize",
                ColorFunction::SrgbToLinear => "sRGBToLinear",
                ColorFunction::LinearToSrgb => "LinearTosRGB",
                ColorFunction::FrontNormal => "FrontNormal",
                ColorFunction::EncodeRgbm => "EncodeRGBM",
                ColorFunction::DecodeRgbm => "DecodeRGBM",
            },
            Self::Texture(t) => match t {
                TextureFetch::Rgba => "TextureRGBA",
                TextureFetch::Rgb => "TextureRGB",
                TextureFetch::Alpha => "TextureAlpha",
                TextureFetch::Intensity => "TextureIntensity",
            },
            Self::Light(l) => match l {
                LightModel::Point => "PointLight",
                LightModel::Spot => "SpotLight",
                LightModel::Sun => "SunLight",
                LightModel::Hemi => "HemiLight",
            },
            Self::Morph => "Morph",
            Self::Skinning => "Skinning",
            Self::Billboard => "Billboard",
            Self::ShadowReceive(_) => "ShadowReceive",
            Self::ShadowCast(_) => "ShadowCast",
        }
    }

    #[inline]
    #[must_use]
    pub fn as_variable(&self) -> Option<&VariableNode> {
        match self {
            Self::Variable(v) => Some(v),
            _ => None,
        }
    }

    /// Built-in outputs have fixed sinks and never forward.
    #[inline]
    #[must_use]
    pub fn is_builtin_output(&self) -> bool {
        matches!(self, Self::Output(_))
    }
}

#[derive(Debug, Clone)]
pub struct ShaderNode {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Ports in insertion order. Positional inputs have no name.
    pub inputs: Vec<(Option<String>, Input)>,
    pub outputs: Outputs,
    pub comment: Option<String>,
}

impl ShaderNode {
    #[must_use]
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            inputs: Vec::new(),
            outputs: Outputs::None,
            comment: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    #[must_use]
    pub fn input(&self, port: &str) -> Option<&Input> {
        self.inputs
            .iter()
            .find(|(name, _)| name.as_deref() == Some(port))
            .map(|(_, input)| input)
    }

    pub fn input_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.inputs.iter().filter_map(|(_, input)| input.node())
    }

    pub(crate) fn set_inputs(&mut self, set: InputSet) {
        match set {
            InputSet::Positional(inputs) => {
                self.inputs.extend(inputs.into_iter().map(|input| (None, input)));
            }
            InputSet::Named(ports) => {
                self.inputs = ports.into_iter().map(|(name, input)| (Some(name), input)).collect();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_array_declaration() {
        let mut v = VariableNode::new(VariableClass::Uniform, "vec4", "uBones");
        v.size = Some(96);
        assert_eq!(v.global_declaration().as_deref(), Some("uniform vec4 uBones[96];"));
        assert_eq!(v.declare(), None);
    }

    #[test]
    fn local_declarations() {
        let mut v = VariableNode::new(VariableClass::Variable, "vec3", "tmp_0");
        assert_eq!(v.declare().as_deref(), Some("vec3 tmp_0;"));
        v.value = Some("vec3(0.0)".to_string());
        assert_eq!(v.declare().as_deref(), Some("vec3 tmp_0 = vec3(0.0);"));

        let mut c = VariableNode::new(VariableClass::Constant, "float", "floatWhite");
        c.value = Some("float(1.0)".to_string());
        assert_eq!(c.declare().as_deref(), Some("const float floatWhite = float(1.0);"));
        assert_eq!(c.global_declaration(), None);
    }

    #[test]
    fn named_inputs_replace_positional_append() {
        let mut node = ShaderNode::new(NodeId::new(0), NodeKind::Add);
        node.set_inputs(InputSet::from(NodeId::new(1)));
        node.set_inputs(InputSet::from([NodeId::new(2), NodeId::new(3)]));
        assert_eq!(node.input_nodes().count(), 3);

        node.set_inputs(InputSet::from([("vec", NodeId::new(4))]));
        assert_eq!(node.inputs.len(), 1);
        assert_eq!(node.input("vec"), Some(&Input::Node(NodeId::new(4))));
    }
}
