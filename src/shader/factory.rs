//! Node Factory
//!
//! Name-to-constructor registry. Graph descriptions and custom compilers
//! instantiate nodes by type name; a renderer extends the library by
//! registering more constructors, or replaces a built-in by registering the
//! same name again.
//!
//! ```rust,ignore
//! let mut factory = NodeFactory::new();
//! factory.register("Toon", |_| Ok(NodeKind::InlineCode { code: TOON.into() }));
//! let kind = factory.create("Toon", &[])?;
//! ```

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::diagnostic::Diagnostic;
use super::node::NodeKind;
use super::nodes::{animation, data, functions, lights, operations, shadows, textures};

/// Constructor argument, as found in graph descriptions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeArg {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl NodeArg {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::Int(i) => u32::try_from(*i).ok(),
            _ => None,
        }
    }
}

impl From<&str> for NodeArg {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<bool> for NodeArg {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for NodeArg {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

pub type NodeConstructor = fn(&[NodeArg]) -> Result<NodeKind, Diagnostic>;

/// Required string argument at `index`.
pub(crate) fn string_arg<'a>(node: &str, args: &'a [NodeArg], index: usize) -> Result<&'a str, Diagnostic> {
    args.get(index)
        .and_then(NodeArg::as_str)
        .ok_or_else(|| Diagnostic::InvalidArguments {
            name: node.to_string(),
            reason: format!("argument {index} must be a string"),
        })
}

pub(crate) fn optional_string_arg(args: &[NodeArg], index: usize) -> Option<&str> {
    args.get(index).and_then(NodeArg::as_str)
}

#[derive(Debug, Clone)]
pub struct NodeFactory {
    nodes: FxHashMap<String, NodeConstructor>,
}

impl Default for NodeFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeFactory {
    /// Factory holding the whole built-in node library.
    #[must_use]
    pub fn new() -> Self {
        let mut factory = Self::empty();
        for module in [
            data::NODES,
            operations::NODES,
            functions::NODES,
            textures::NODES,
            lights::NODES,
            animation::NODES,
            shadows::NODES,
        ] {
            factory.register_nodes(module);
        }
        factory
    }

    #[must_use]
    pub fn empty() -> Self {
        Self {
            nodes: FxHashMap::default(),
        }
    }

    /// Register `ctor` under `name`, returning the constructor it replaces.
    pub fn register(&mut self, name: &str, ctor: NodeConstructor) -> Option<NodeConstructor> {
        let previous = self.nodes.insert(name.to_string(), ctor);
        if previous.is_some() {
            log::warn!("Node {name} already registered, overriding it");
        }
        previous
    }

    /// Register a themed table of constructors.
    pub fn register_nodes(&mut self, nodes: &[(&str, NodeConstructor)]) {
        for (name, ctor) in nodes {
            self.register(name, *ctor);
        }
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn create(&self, name: &str, args: &[NodeArg]) -> Result<NodeKind, Diagnostic> {
        let Some(ctor) = self.nodes.get(name) else {
            log::warn!("Node {name} does not exist");
            return Err(Diagnostic::UnknownNode {
                name: name.to_string(),
            });
        };
        ctor(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_library_is_registered() {
        let factory = NodeFactory::new();
        for name in ["Uniform", "Add", "Normalize", "TextureRGBA", "SunLight", "Morph", "ShadowReceive"] {
            assert!(factory.contains(name), "{name} missing");
        }
    }

    #[test]
    fn node_args_deserialize_untagged() {
        let args: Vec<NodeArg> = serde_json::from_str(r#"["vec4", 3, true]"#).unwrap();
        assert_eq!(
            args,
            vec![NodeArg::from("vec4"), NodeArg::Int(3), NodeArg::Bool(true)]
        );
    }
}
