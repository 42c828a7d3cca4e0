#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod core;
pub mod errors;
pub mod render;
pub mod settings;
pub mod shader;
pub mod state;
pub mod utils;

pub use core::{BoundingBox, BoundingSphere};
pub use errors::{Diagnostic, Result, StratumError};
pub use render::{GraphicsContext, RenderBin, RenderLeaf};
pub use settings::{CompilerSettings, FloatPrecision};
pub use shader::{
    CompiledShader, CompilerContext, GraphDescription, NodeFactory, ShaderGenerator, ShaderGraph,
    ShaderProgram, ShaderStage, compile,
};
pub use state::{State, StateAttribute, StateGraph, StateGraphId, StateMode, StateSet, StateSetRef};
pub use utils::interner;
