//! Shader Graph
//!
//! Arena of [`ShaderNode`]s for one shader stage, plus the variable registry
//! that gives locals, uniforms, attributes, varyings and samplers their
//! unique names.
//!
//! ```rust,ignore
//! let mut graph = ShaderGraph::new(ShaderStage::Fragment);
//! let color = graph.get_or_create_uniform("vec4", "uMaterialDiffuse");
//! let frag = graph.node(NodeKind::Output(BuiltinOutput::FragColor)).id();
//! graph.node(NodeKind::SetFromNode).inputs(color).outputs(frag);
//! let shader = compile(&graph, &[frag], &ctx);
//! ```

use rustc_hash::FxHashMap;

use super::diagnostic::Diagnostic;
use super::factory::{NodeArg, NodeFactory};
use super::node::{
    InputSet, NodeId, NodeKind, Outputs, ShaderNode, VariableClass, VariableNode,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShaderGraph {
    stage: ShaderStage,
    nodes: Vec<ShaderNode>,
    variables: FxHashMap<String, NodeId>,
    /// Variable names in first registration order.
    variable_order: Vec<String>,
    varyings: Vec<(String, NodeId)>,
    /// Vertex stage only: accept varyings the fragment stage never asked for.
    custom_fragment: bool,
    diagnostics: Vec<Diagnostic>,
}

impl ShaderGraph {
    #[must_use]
    pub fn new(stage: ShaderStage) -> Self {
        Self {
            stage,
            nodes: Vec::new(),
            variables: FxHashMap::default(),
            variable_order: Vec::new(),
            varyings: Vec::new(),
            custom_fragment: false,
            diagnostics: Vec::new(),
        }
    }

    /// Vertex graph writing the varyings `fragment` reads.
    #[must_use]
    pub fn vertex_for(fragment: &ShaderGraph) -> Self {
        let mut graph = Self::new(ShaderStage::Vertex);
        for (name, id) in &fragment.varyings {
            let ty = fragment
                .get(*id)
                .kind
                .as_variable()
                .map_or_else(String::new, |v| v.ty.clone());
            let varying = graph.insert(NodeKind::Variable(VariableNode::new(
                VariableClass::Varying,
                ty,
                name.clone(),
            )));
            graph.register(name, varying);
            graph.varyings.push((name.clone(), varying));
        }
        graph
    }

    #[inline]
    #[must_use]
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// Vertex stage only: the fragment shader is not generated from a graph,
    /// so any varying may be requested.
    pub fn set_custom_fragment(&mut self, custom: bool) {
        self.custom_fragment = custom;
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> &ShaderNode {
        &self.nodes[id.index()]
    }

    #[must_use]
    pub fn try_get(&self, id: NodeId) -> Option<&ShaderNode> {
        self.nodes.get(id.index())
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ShaderNode> {
        self.nodes.iter()
    }

    /// Structural problems noticed while the graph was built.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        log::warn!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    fn insert(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(ShaderNode::new(id, kind));
        id
    }

    /// Start a new node of `kind`.
    pub fn node(&mut self, kind: NodeKind) -> NodeBuilder<'_> {
        let id = self.insert(kind);
        NodeBuilder { graph: self, id }
    }

    /// Reopen an existing node, e.g. to wire it once all nodes exist.
    pub fn edit(&mut self, id: NodeId) -> NodeBuilder<'_> {
        NodeBuilder { graph: self, id }
    }

    /// Instantiate a registered node type by name.
    ///
    /// Variables join the registry: a name already registered resolves to
    /// the existing node, and varyings are recorded for the vertex stage.
    pub fn create_node(
        &mut self,
        factory: &NodeFactory,
        name: &str,
        args: &[NodeArg],
    ) -> Result<NodeId, Diagnostic> {
        let kind = factory.create(name, args)?;
        let Some((class, ty, name)) = kind
            .as_variable()
            .map(|v| (v.class, v.ty.clone(), v.name.clone()))
        else {
            return Ok(self.insert(kind));
        };

        if let Some(existing) = self.variable(&name) {
            self.check_type(existing, &name, &ty);
            return Ok(existing);
        }
        let id = self.insert(kind);
        self.register(&name, id);
        if class == VariableClass::Varying {
            self.varyings.push((name, id));
        }
        Ok(id)
    }

    // ========================================================================
    // Variable registry
    // ========================================================================

    #[must_use]
    pub fn variable(&self, name: &str) -> Option<NodeId> {
        self.variables.get(name).copied()
    }

    /// Registered variables in first registration order.
    pub fn variables(&self) -> impl Iterator<Item = &ShaderNode> {
        self.variable_order
            .iter()
            .filter_map(|name| self.variables.get(name))
            .map(|id| &self.nodes[id.index()])
    }

    /// Varyings in request order.
    #[must_use]
    pub fn varyings(&self) -> &[(String, NodeId)] {
        &self.varyings
    }

    fn register(&mut self, name: &str, id: NodeId) {
        if self.variables.insert(name.to_string(), id).is_none() {
            self.variable_order.push(name.to_string());
        }
    }

    fn variable_node(&self, id: NodeId) -> Option<&VariableNode> {
        self.nodes[id.index()].kind.as_variable()
    }

    fn check_type(&mut self, existing: NodeId, name: &str, ty: &str) -> bool {
        let declared = self.variable_node(existing).map(|v| v.ty.clone());
        match declared {
            Some(declared) if declared != ty => {
                self.push_diagnostic(Diagnostic::TypeMismatch {
                    name: name.to_string(),
                    requested: ty.to_string(),
                    declared,
                });
                false
            }
            _ => true,
        }
    }

    fn new_variable(&mut self, class: VariableClass, ty: &str, name: &str) -> NodeId {
        let id = self.insert(NodeKind::Variable(VariableNode::new(class, ty, name)));
        self.register(name, id);
        id
    }

    /// Local of `main`. Unnamed locals are called `tmp_<n>`; a taken name
    /// gets a numeric suffix.
    pub fn create_variable(&mut self, ty: &str, name: Option<&str>) -> NodeId {
        let name = match name {
            None => format!("tmp_{}", self.variables.len()),
            Some(name) if self.variables.contains_key(name) => {
                let mut deepness = 1;
                while self.variables.contains_key(&format!("{name}{deepness}")) {
                    deepness += 1;
                }
                format!("{name}{deepness}")
            }
            Some(name) => name.to_string(),
        };
        self.new_variable(VariableClass::Variable, ty, &name)
    }

    pub fn create_variable_with_value(&mut self, ty: &str, name: Option<&str>, value: &str) -> NodeId {
        let id = self.create_variable(ty, name);
        self.set_value(id, value);
        id
    }

    /// Initial value of a local or constant, or the value of a Define.
    pub fn set_value(&mut self, id: NodeId, value: &str) {
        match &mut self.nodes[id.index()].kind {
            NodeKind::Variable(variable) => variable.value = Some(value.to_string()),
            NodeKind::Define { value: v, .. } => *v = value.to_string(),
            _ => log::warn!("Node {id} has no value to set"),
        }
    }

    pub fn get_or_create_uniform(&mut self, ty: &str, name: &str) -> NodeId {
        self.uniform_with_size(ty, name, None)
    }

    /// Uniform array `uniform <ty> <name>[size];`.
    pub fn get_or_create_uniform_array(&mut self, ty: &str, name: &str, size: u32) -> NodeId {
        self.uniform_with_size(ty, name, Some(size))
    }

    fn uniform_with_size(&mut self, ty: &str, name: &str, size: Option<u32>) -> NodeId {
        if name.is_empty() {
            log::error!("Cannot create unnamed uniform");
        }
        if let Some(existing) = self.variable(name) {
            if self.check_type(existing, name, ty) {
                return existing;
            }
        }
        let id = self.new_variable(VariableClass::Uniform, ty, name);
        if let NodeKind::Variable(variable) = &mut self.nodes[id.index()].kind {
            variable.size = size;
        }
        id
    }

    pub fn get_or_create_sampler(&mut self, ty: &str, name: &str) -> NodeId {
        if name.is_empty() {
            log::error!("No name given for sampler type: {ty}");
        }
        if let Some(existing) = self.variable(name) {
            return existing;
        }
        self.new_variable(VariableClass::Sampler, ty, name)
    }

    pub fn get_or_create_attribute(&mut self, ty: &str, name: &str) -> NodeId {
        if self.stage == ShaderStage::Fragment {
            log::error!("No vertex attribute in fragment shader: {name}");
        }
        if let Some(existing) = self.variable(name) {
            self.check_type(existing, name, ty);
            return existing;
        }
        self.new_variable(VariableClass::Attribute, ty, name)
    }

    pub fn get_or_create_constant(&mut self, ty: &str, name: &str, value: &str) -> NodeId {
        if let Some(existing) = self.variable(name) {
            self.check_type(existing, name, ty);
            return existing;
        }
        let id = self.new_variable(VariableClass::Constant, ty, name);
        self.set_value(id, value);
        id
    }

    pub fn get_or_create_varying(&mut self, ty: &str, name: &str) -> NodeId {
        if let Some(existing) = self.variable(name) {
            if !self.varyings.iter().any(|(n, _)| n == name) {
                log::error!("Requesting varying {name} that was not created as a varying");
            }
            self.check_type(existing, name, ty);
            return existing;
        }

        if self.stage == ShaderStage::Vertex && !self.custom_fragment {
            log::error!("Requesting a varying not declared in the fragment shader graph: {name} {ty}");
        }

        let id = self.new_variable(VariableClass::Varying, ty, name);
        self.varyings.push((name.to_string(), id));
        id
    }
}

/// Chained configuration of a node.
pub struct NodeBuilder<'g> {
    graph: &'g mut ShaderGraph,
    id: NodeId,
}

impl NodeBuilder<'_> {
    #[inline]
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    fn node_mut(&mut self) -> &mut ShaderNode {
        &mut self.graph.nodes[self.id.index()]
    }

    pub fn inputs(mut self, inputs: impl Into<InputSet>) -> Self {
        self.node_mut().set_inputs(inputs.into());
        self
    }

    /// Store the outputs and add this node as an input of each of them.
    pub fn outputs(mut self, outputs: impl Into<Outputs>) -> Self {
        if self.node_mut().kind.is_builtin_output() {
            return self;
        }
        let outputs = outputs.into();
        let id = self.id;
        for target in outputs.targets() {
            match self.graph.nodes.get_mut(target.index()) {
                Some(node) => node.set_inputs(InputSet::from(id)),
                None => log::warn!("Output {target} of node {id} does not exist"),
            }
        }
        self.node_mut().outputs = outputs;
        self
    }

    pub fn comment(mut self, text: &str) -> Self {
        self.node_mut().comment = Some(format!("//{text}"));
        self
    }

    pub fn value(self, value: &str) -> Self {
        self.graph.set_value(self.id, value);
        self
    }

    pub fn code(mut self, source: &str) -> Self {
        match &mut self.node_mut().kind {
            NodeKind::InlineCode { code } => *code = source.to_string(),
            kind => log::warn!("{} takes no inline code", kind.type_name()),
        }
        self
    }

    pub fn inverse(mut self, inverse: bool) -> Self {
        if let NodeKind::MatrixMult(m) = &mut self.node_mut().kind {
            m.inverse = inverse;
        }
        self
    }

    pub fn overwrite_w(mut self, overwrite: bool) -> Self {
        if let NodeKind::MatrixMult(m) = &mut self.node_mut().kind {
            m.overwrite_w = overwrite;
        }
        self
    }

    pub fn force_complement(mut self, force: bool) -> Self {
        if let NodeKind::MatrixMult(m) = &mut self.node_mut().kind {
            m.force_complement = force;
        }
        self
    }
}
