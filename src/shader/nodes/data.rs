//! Variable and built-in output nodes.
//!
//! Constructor arguments: `[type, name]`, plus the initial value for
//! `Variable` and `Constant`, or the array length for `Uniform`.
//!
//! Nodes built through the factory bypass the graph's variable registry
//! lookups, so two `Uniform` nodes of the same name are two declarations.
//! Graph code should prefer the `get_or_create_*` helpers of
//! [`ShaderGraph`](crate::shader::graph::ShaderGraph).

use crate::shader::diagnostic::Diagnostic;
use crate::shader::factory::{NodeArg, NodeConstructor, optional_string_arg, string_arg};
use crate::shader::node::{BuiltinOutput, NodeKind, VariableClass, VariableNode};

pub const NODES: &[(&str, NodeConstructor)] = &[
    ("Variable", |args| variable(VariableClass::Variable, args)),
    ("Constant", |args| variable(VariableClass::Constant, args)),
    ("Uniform", |args| variable(VariableClass::Uniform, args)),
    ("Attribute", |args| variable(VariableClass::Attribute, args)),
    ("Varying", |args| variable(VariableClass::Varying, args)),
    ("Sampler", |args| variable(VariableClass::Sampler, args)),
    ("glFragColor", |_| Ok(NodeKind::Output(BuiltinOutput::FragColor))),
    ("glPosition", |_| Ok(NodeKind::Output(BuiltinOutput::Position))),
    ("glPointSize", |_| Ok(NodeKind::Output(BuiltinOutput::PointSize))),
];

fn variable(class: VariableClass, args: &[NodeArg]) -> Result<NodeKind, Diagnostic> {
    let node = class.type_name();
    let ty = string_arg(node, args, 0)?;
    let name = string_arg(node, args, 1)?;

    let mut variable = VariableNode::new(class, ty, name);
    match class {
        VariableClass::Uniform => variable.size = args.get(2).and_then(NodeArg::as_u32),
        VariableClass::Variable | VariableClass::Constant => {
            variable.value = optional_string_arg(args, 2).map(str::to_string);
        }
        _ => {}
    }
    Ok(NodeKind::Variable(variable))
}
