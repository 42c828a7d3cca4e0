//! Shader graph diagnostics.
//!
//! Structural problems found while building or compiling a node graph. They
//! are collected on the compile result rather than returned as errors, so a
//! renderer can keep drawing with a fallback program.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    #[error("Shader node {node_type} validation error: input '{port}' is missing")]
    MissingInput { node_type: &'static str, port: String },

    #[error("Shader node {node_type} validation error: output '{port}' is missing")]
    MissingOutput { node_type: &'static str, port: String },

    /// A port that must name a variable is wired to an operator node.
    #[error("Shader node {node_type}: port '{port}' is not connected to a variable")]
    NotAVariable { node_type: &'static str, port: String },

    #[error("Node {name} does not exist")]
    UnknownNode { name: String },

    #[error("Invalid arguments for node {name}: {reason}")]
    InvalidArguments { name: String, reason: String },

    /// A graph description refers to a node id it never declares.
    #[error("Node '{node}' references unknown node '{reference}'")]
    UnknownReference { node: String, reference: String },

    /// Same variable name requested twice with different types.
    #[error("Variable '{name}' requested as {requested} but declared as {declared}")]
    TypeMismatch {
        name: String,
        requested: String,
        declared: String,
    },

    #[error("Shader without any final node output (need at least one)")]
    NoRoots,

    #[error("Shader file '{name}' not registered")]
    UnresolvedInclude { name: String },

    #[error("Shader template error: {0}")]
    Template(String),
}

impl Diagnostic {
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::TypeMismatch { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }
}

impl From<minijinja::Error> for Diagnostic {
    fn from(err: minijinja::Error) -> Self {
        Self::Template(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_names_node_and_port() {
        let d = Diagnostic::MissingInput {
            node_type: "SetAlpha",
            port: "alpha".to_string(),
        };
        let msg = d.to_string();
        assert!(msg.contains("SetAlpha"));
        assert!(msg.contains("alpha"));
        assert!(d.is_error());
    }

    #[test]
    fn type_mismatch_is_a_warning() {
        let d = Diagnostic::TypeMismatch {
            name: "uBones".to_string(),
            requested: "vec3".to_string(),
            declared: "vec4".to_string(),
        };
        assert_eq!(d.severity(), Severity::Warning);
    }
}
