//! Shader Graph Compiler
//!
//! Turns a [`ShaderGraph`] and its root nodes into GLSL source.
//!
//! The graph is walked once, depth first from the roots in input order,
//! emitting each node after its inputs. That single post-order sequence
//! drives every pass:
//!
//! | Pass | Unique per | Output |
//! |------|------------|--------|
//! | extensions, defines | node type (Define: macro name) | handed to the processor |
//! | global declarations | node | sorted `uniform`/`attribute`/`varying` lines |
//! | function declarations | node type | `#pragma include` markers, generated functions |
//! | main body | node | one statement per node, after its `//comment` |
//!
//! Locals of `main` are declared up front for every registered variable,
//! reached or not. The assembled text then goes through the
//! [`ShaderProcessor`](super::processor::ShaderProcessor), and the final
//! source is hashed with xxh3-128 so identical programs share one module.

use rustc_hash::FxHashSet;

use super::context::CompilerContext;
use super::diagnostic::Diagnostic;
use super::graph::{ShaderGraph, ShaderStage};
use super::node::{NodeId, NodeKind, ShaderNode};
use super::nodes::{self, NodeView};
use crate::utils::hash::source_hash;

/// Result of compiling one stage.
#[derive(Debug, Clone)]
pub struct CompiledShader {
    pub stage: ShaderStage,
    pub source: String,
    /// xxh3-128 of `source`.
    pub hash: u128,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompiledShader {
    /// True when no error-level diagnostic was produced.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Post-order sequence of the nodes reachable from `roots`.
#[must_use]
pub fn traverse(graph: &ShaderGraph, roots: &[NodeId]) -> Vec<NodeId> {
    fn visit(graph: &ShaderGraph, id: NodeId, visited: &mut [bool], order: &mut Vec<NodeId>) {
        let Some(node) = graph.try_get(id) else {
            log::warn!("Skipping unknown node {id}");
            return;
        };
        if visited[id.index()] {
            return;
        }
        visited[id.index()] = true;

        for input in node.input_nodes() {
            if input != id {
                visit(graph, input, visited, order);
            }
        }
        order.push(id);
    }

    let mut visited = vec![false; graph.len()];
    let mut order = Vec::with_capacity(graph.len());
    for &root in roots {
        visit(graph, root, &mut visited, &mut order);
    }

    for node in graph.nodes().filter(|n| !visited[n.id.index()]) {
        log::debug!("Node {} {} requested but never compiled", node.id, node.type_name());
    }

    order
}

fn nodes_in<'g>(graph: &'g ShaderGraph, order: &'g [NodeId]) -> impl Iterator<Item = &'g ShaderNode> {
    order.iter().map(|id| graph.get(*id))
}

/// Extensions and defines, the first node of each type contributing.
fn extensions_and_defines(graph: &ShaderGraph, order: &[NodeId]) -> (Vec<String>, Vec<String>) {
    let mut extension_types = FxHashSet::default();
    let mut define_keys: FxHashSet<&str> = FxHashSet::default();
    let mut extensions = Vec::new();
    let mut defines = Vec::new();

    for node in nodes_in(graph, order) {
        if extension_types.insert(node.type_name()) {
            extensions.extend(nodes::extensions(node));
        }
        let key = match &node.kind {
            NodeKind::Define { name, .. } => name.as_str(),
            _ => node.type_name(),
        };
        if define_keys.insert(key) {
            defines.extend(nodes::defines(node));
        }
    }

    (extensions, defines)
}

fn global_declarations(graph: &ShaderGraph, order: &[NodeId]) -> String {
    let mut declarations: Vec<String> = nodes_in(graph, order)
        .filter_map(nodes::global_declaration)
        .collect();
    if declarations.is_empty() {
        return String::new();
    }
    declarations.sort();

    // The position attribute goes first so it lands on location 0.
    if graph.stage() == ShaderStage::Vertex {
        let position = declarations
            .iter()
            .take_while(|d| d.starts_with('a'))
            .position(|d| d.contains("Vertex"));
        if let Some(index) = position {
            let vertex = declarations.remove(index);
            declarations.insert(0, vertex);
        }
    }

    let mut prefix = declarations[0].chars().next();
    for i in 1..declarations.len() {
        let first = declarations[i].chars().next();
        if first != prefix {
            declarations[i - 1].push('\n');
            prefix = first;
        }
    }

    declarations.join("\n")
}

fn function_declarations(graph: &ShaderGraph, order: &[NodeId]) -> String {
    let mut seen = FxHashSet::default();
    nodes_in(graph, order)
        .filter(|node| seen.insert(node.type_name()))
        .filter_map(nodes::global_function_declaration)
        .collect::<Vec<_>>()
        .join("\n")
}

fn main_body(
    graph: &ShaderGraph,
    order: &[NodeId],
    debug: bool,
    diagnostics: &mut Vec<Diagnostic>,
) -> String {
    let mut lines = Vec::new();

    for node in nodes_in(graph, order) {
        let statement = nodes::validate(node)
            .and_then(|()| nodes::compute_shader(&NodeView::new(graph, node, debug)));
        match statement {
            Ok(Some(code)) if !code.is_empty() => {
                if let Some(comment) = &node.comment {
                    lines.push(comment.clone());
                }
                lines.push(code);
            }
            Ok(_) => {}
            Err(diagnostic) => {
                log::warn!("{diagnostic}");
                diagnostics.push(diagnostic);
            }
        }
    }

    lines.join("\n")
}

fn local_declarations(graph: &ShaderGraph) -> Vec<String> {
    graph
        .variables()
        .filter_map(|node| node.kind.as_variable()?.declare())
        .collect()
}

/// Compile `graph` from `roots` into a complete shader source.
///
/// Structural problems never abort compilation: they end up in
/// [`CompiledShader::diagnostics`] and the offending node emits nothing.
#[must_use]
pub fn compile(graph: &ShaderGraph, roots: &[NodeId], ctx: &CompilerContext) -> CompiledShader {
    let settings = ctx.settings();
    let mut diagnostics: Vec<Diagnostic> = graph.diagnostics().to_vec();

    if roots.is_empty() {
        log::error!("{}", Diagnostic::NoRoots);
        diagnostics.push(Diagnostic::NoRoots);
    }

    let order = traverse(graph, roots);
    let (extensions, defines) = extensions_and_defines(graph, &order);

    let mut parts = vec!["\n".to_string(), global_declarations(graph, &order)];
    if graph.stage() == ShaderStage::Vertex && settings.invariant_position {
        parts.push("\ninvariant gl_Position;".to_string());
    }
    parts.push("\n".to_string());
    parts.push(function_declarations(graph, &order));
    parts.push("void main() {".to_string());

    let locals = local_declarations(graph);
    if !locals.is_empty() {
        parts.push(format!("// vars\n{}\n// end vars\n", locals.join(" ")));
    }
    parts.push(main_body(graph, &order, settings.debug_shader_nodes, &mut diagnostics));
    parts.push("}".to_string());

    let processed = ctx
        .processor()
        .process(&parts.join("\n"), &defines, &extensions, settings);
    diagnostics.extend(processed.diagnostics);

    #[cfg(debug_assertions)]
    log::trace!("{} shader:\n{}", graph.stage().name(), processed.source);

    CompiledShader {
        stage: graph.stage(),
        hash: source_hash(&processed.source),
        source: processed.source,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::node::BuiltinOutput;

    #[test]
    fn post_order_visits_inputs_first_and_once() {
        let mut g = ShaderGraph::new(ShaderStage::Fragment);
        let a = g.create_variable("vec4", Some("a"));
        let b = g.create_variable("vec4", Some("b"));
        let sum = g.create_variable("vec4", Some("sum"));
        let add = g.node(NodeKind::Add).inputs([a, b, a]).outputs(sum).id();
        let frag = g.node(NodeKind::Output(BuiltinOutput::FragColor)).id();
        let set = g.node(NodeKind::SetFromNode).inputs(sum).outputs(frag).id();

        assert_eq!(traverse(&g, &[frag]), vec![a, b, add, sum, set, frag]);
    }

    #[test]
    fn self_loops_and_unreached_nodes_are_skipped() {
        let mut g = ShaderGraph::new(ShaderStage::Fragment);
        let a = g.create_variable("float", Some("a"));
        let builder = g.node(NodeKind::Add);
        let looped = builder.id();
        builder.inputs([a]).outputs(looped);
        g.node(NodeKind::Mult).inputs([looped]);

        assert_eq!(traverse(&g, &[looped]), vec![a, looped]);
    }

    #[test]
    fn vertex_attribute_leads_globals() {
        let mut g = ShaderGraph::new(ShaderStage::Vertex);
        let normal = g.get_or_create_attribute("vec3", "Normal");
        let vertex = g.get_or_create_attribute("vec3", "Vertex");
        let mv = g.get_or_create_uniform("mat4", "uModelViewMatrix");
        let out = g.create_variable("vec4", Some("viewVertex"));
        let mult = g
            .node(NodeKind::MatrixMult(crate::shader::node::MatrixMult::position()))
            .inputs([("matrix", mv), ("vec", vertex)])
            .outputs([("vec", out)])
            .id();
        let sum = g.create_variable("vec3", Some("n"));
        g.node(NodeKind::SetFromNode).inputs(normal).outputs(sum);

        let globals = global_declarations(&g, &traverse(&g, &[out, sum, mult]));
        assert_eq!(
            globals,
            "attribute vec3 Vertex;\nattribute vec3 Normal;\n\nuniform mat4 uModelViewMatrix;"
        );
    }
}
