//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! Two families of failures exist:
//!
//! - [`Diagnostic`] describes a structural problem in a shader node graph
//!   (missing port, unknown node type, unresolved include). Diagnostics are
//!   *data*: the compiler attaches them to its result instead of aborting, so a
//!   caller can fall back to a default program mid-frame.
//! - [`StratumError`] wraps everything that is a genuine failure of an API
//!   call (malformed JSON description, template errors, missing library file).
//!
//! The state graph has no error channel at all. Passing ids from an unrelated
//! or already cleaned graph is a contract violation.
//!
//! # Usage
//!
//! ```rust,ignore
//! use stratum::errors::{StratumError, Result};
//!
//! fn load_description(text: &str) -> Result<GraphDescription> {
//!     Ok(serde_json::from_str(text)?)
//! }
//! ```

use thiserror::Error;

pub use crate::shader::diagnostic::{Diagnostic, Severity};

/// The main error type of the crate.
#[derive(Error, Debug)]
pub enum StratumError {
    // ========================================================================
    // Shader Graph Errors
    // ========================================================================
    /// A structural shader-graph problem escalated to an error.
    #[error("Shader graph error: {0}")]
    Shader(#[from] Diagnostic),

    /// A GLSL library file was requested but is not registered.
    #[error("Shader library file not found: {0}")]
    ShaderNotFound(String),

    /// The shader skeleton template failed to render.
    #[error("Shader template error: {0}")]
    Template(#[from] minijinja::Error),

    // ========================================================================
    // Format & Parsing Errors
    // ========================================================================
    /// JSON parsing error (settings, graph descriptions).
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A graph description references something that does not exist.
    #[error("Invalid graph description: {0}")]
    InvalidDescription(String),
}

/// Alias for `Result<T, StratumError>`.
pub type Result<T> = std::result::Result<T, StratumError>;
