//! Shader Module
//!
//! Node-based GLSL generation.
//!
//! - [`graph`] / [`node`]: the node arena of one stage and its wiring
//! - [`nodes`]: code emitted by each node type
//! - [`compiler`]: graph traversal and source assembly
//! - [`processor`]: `#pragma include` resolution and the program skeleton
//! - [`factory`]: name-to-constructor registry
//! - [`program`]: default material graphs built from state attributes
//! - [`generator`]: program cache keyed by structural hashes
//! - [`description`]: JSON material graphs

pub mod compiler;
pub mod context;
pub mod defines;
pub mod description;
pub mod diagnostic;
pub mod factory;
pub mod generator;
pub mod graph;
pub mod node;
pub mod nodes;
pub mod processor;
pub mod program;

pub use compiler::{CompiledShader, compile};
pub use context::CompilerContext;
pub use description::GraphDescription;
pub use diagnostic::{Diagnostic, Severity};
pub use factory::{NodeArg, NodeConstructor, NodeFactory};
pub use generator::{ProgramKey, ShaderGenerator, ShaderProgram};
pub use graph::{NodeBuilder, ShaderGraph, ShaderStage};
pub use node::{Input, InputSet, NodeId, NodeKind, Outputs, ShaderNode};
pub use processor::ShaderProcessor;
pub use program::{ActiveAttributes, ProgramCompiler};
