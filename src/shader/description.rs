//! Graph Description
//!
//! A material node graph in JSON, instantiated through the
//! [`NodeFactory`]. A StateSet carrying a description replaces the built-in
//! fragment graph of every program drawn under it.
//!
//! ```json
//! {
//!   "nodes": [
//!     { "id": "diffuse", "type": "Uniform", "args": ["vec4", "uDiffuse"] },
//!     { "id": "tint", "type": "Variable", "args": ["vec4", "tint"] },
//!     { "id": "mult", "type": "Mult", "inputs": ["diffuse", "=vec4(0.5)"], "outputs": "tint" },
//!     { "id": "out", "type": "glFragColor" },
//!     { "id": "set", "type": "SetFromNode", "inputs": ["tint"], "outputs": "out" }
//!   ],
//!   "roots": ["out"]
//! }
//! ```
//!
//! Inputs and outputs name other nodes by `id`, positionally or by port.
//! An input starting with `=` is a GLSL literal inlined as is.

use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use super::diagnostic::Diagnostic;
use super::factory::{NodeArg, NodeFactory};
use super::graph::ShaderGraph;
use super::node::{Input, InputSet, NodeId, Outputs};
use crate::errors::{Result, StratumError};

/// Marks an input as a literal rather than a node reference.
const LITERAL_PREFIX: char = '=';

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortsDescription {
    Single(String),
    Positional(Vec<String>),
    Named(BTreeMap<String, String>),
}

impl PortsDescription {
    /// References in declaration order, literals included.
    fn references(&self) -> Vec<&str> {
        match self {
            Self::Single(reference) => vec![reference.as_str()],
            Self::Positional(references) => references.iter().map(String::as_str).collect(),
            Self::Named(ports) => ports.values().map(String::as_str).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeDescription {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<NodeArg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<PortsDescription>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<PortsDescription>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GraphDescription {
    pub nodes: Vec<NodeDescription>,
    pub roots: Vec<String>,
}

impl GraphDescription {
    /// Parse and [`validate`](Self::validate) a JSON description.
    pub fn from_json(text: &str) -> Result<Self> {
        let description: Self = serde_json::from_str(text)?;
        description.validate()?;
        Ok(description)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check ids are unique and every reference resolves. Node types are
    /// only known to a factory and are checked by [`build`](Self::build).
    pub fn validate(&self) -> Result<()> {
        if self.roots.is_empty() {
            return Err(StratumError::InvalidDescription("no roots".to_string()));
        }

        let mut ids = FxHashSet::default();
        for node in &self.nodes {
            if !ids.insert(node.id.as_str()) {
                return Err(StratumError::InvalidDescription(format!(
                    "duplicate node id '{}'",
                    node.id
                )));
            }
        }

        for node in &self.nodes {
            let references = node
                .inputs
                .iter()
                .chain(&node.outputs)
                .flat_map(PortsDescription::references);
            for reference in references {
                if !reference.starts_with(LITERAL_PREFIX) && !ids.contains(reference) {
                    return Err(Diagnostic::UnknownReference {
                        node: node.id.clone(),
                        reference: reference.to_string(),
                    }
                    .into());
                }
            }
        }

        if let Some(root) = self.roots.iter().find(|root| !ids.contains(root.as_str())) {
            return Err(StratumError::InvalidDescription(format!("unknown root '{root}'")));
        }
        Ok(())
    }

    /// Instantiate the nodes into `graph` and return its roots.
    ///
    /// Nodes the factory cannot create and references that do not resolve
    /// are recorded as graph diagnostics and left out; the rest of the graph
    /// is still built.
    pub fn build(&self, graph: &mut ShaderGraph, factory: &NodeFactory) -> Vec<NodeId> {
        let mut ids: FxHashMap<&str, NodeId> = FxHashMap::default();
        for node in &self.nodes {
            match graph.create_node(factory, &node.node_type, &node.args) {
                Ok(id) => {
                    ids.insert(node.id.as_str(), id);
                }
                Err(diagnostic) => graph.push_diagnostic(diagnostic),
            }
        }

        for node in &self.nodes {
            let Some(&id) = ids.get(node.id.as_str()) else {
                continue;
            };
            let inputs = node
                .inputs
                .as_ref()
                .and_then(|inputs| Self::resolve_inputs(graph, &ids, &node.id, inputs));
            let outputs = node
                .outputs
                .as_ref()
                .and_then(|outputs| Self::resolve_outputs(graph, &ids, &node.id, outputs));

            let mut builder = graph.edit(id);
            if let Some(inputs) = inputs {
                builder = builder.inputs(inputs);
            }
            if let Some(outputs) = outputs {
                builder = builder.outputs(outputs);
            }
            if let Some(comment) = &node.comment {
                builder.comment(comment);
            }
        }

        self.roots
            .iter()
            .filter_map(|root| {
                let id = ids.get(root.as_str()).copied();
                if id.is_none() {
                    graph.push_diagnostic(Diagnostic::UnknownReference {
                        node: "roots".to_string(),
                        reference: root.clone(),
                    });
                }
                id
            })
            .collect()
    }

    fn resolve(graph: &mut ShaderGraph, ids: &FxHashMap<&str, NodeId>, node: &str, reference: &str) -> Option<Input> {
        if let Some(literal) = reference.strip_prefix(LITERAL_PREFIX) {
            return Some(Input::Literal(literal.to_string()));
        }
        let id = ids.get(reference).copied();
        if id.is_none() {
            graph.push_diagnostic(Diagnostic::UnknownReference {
                node: node.to_string(),
                reference: reference.to_string(),
            });
        }
        id.map(Input::Node)
    }

    fn resolve_inputs(
        graph: &mut ShaderGraph,
        ids: &FxHashMap<&str, NodeId>,
        node: &str,
        inputs: &PortsDescription,
    ) -> Option<InputSet> {
        Some(match inputs {
            PortsDescription::Single(reference) => InputSet::Positional(vec![Self::resolve(graph, ids, node, reference)?]),
            PortsDescription::Positional(references) => InputSet::Positional(
                references
                    .iter()
                    .filter_map(|reference| Self::resolve(graph, ids, node, reference))
                    .collect(),
            ),
            PortsDescription::Named(ports) => InputSet::Named(
                ports
                    .iter()
                    .filter_map(|(port, reference)| {
                        Self::resolve(graph, ids, node, reference).map(|input| (port.clone(), input))
                    })
                    .collect(),
            ),
        })
    }

    fn resolve_outputs(
        graph: &mut ShaderGraph,
        ids: &FxHashMap<&str, NodeId>,
        node: &str,
        outputs: &PortsDescription,
    ) -> Option<Outputs> {
        let mut node_of = |reference: &str| match Self::resolve(graph, ids, node, reference)? {
            Input::Node(id) => Some(id),
            Input::Literal(_) => {
                graph.push_diagnostic(Diagnostic::NotAVariable {
                    node_type: "Output",
                    port: reference.to_string(),
                });
                None
            }
        };

        match outputs {
            PortsDescription::Single(reference) => node_of(reference).map(Outputs::Single),
            PortsDescription::Positional(references) => {
                let first = references.first()?;
                if references.len() > 1 {
                    log::warn!("Node '{node}' has several positional outputs, only '{first}' is used");
                }
                node_of(first).map(Outputs::Single)
            }
            PortsDescription::Named(ports) => Some(Outputs::Named(
                ports
                    .iter()
                    .filter_map(|(port, reference)| node_of(reference).map(|id| (port.clone(), id)))
                    .collect(),
            )),
        }
    }
}
