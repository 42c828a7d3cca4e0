//! Shader Processor
//!
//! Turns a generated shader body into a complete GLSL source:
//!
//! 1. `#pragma include "file.glsl"` lines are replaced by the library file,
//!    recursively. Each file is included at most once per shader.
//!    `#pragma include "file.glsl" "_A" "_B"` only includes the file when one
//!    of the listed macros is among the shader's defines.
//! 2. The `program.glsl` skeleton prepends `#version`, the extensions, a
//!    default float precision (unless the body declares one) and the defines.
//!
//! The library is embedded with `rust-embed`. Debug builds read
//! `src/shader/lib/` of this crate's source tree from disk first so GLSL
//! edits need no rebuild. The working directory never takes part.
//! [`ShaderProcessor::add_shader`] registers extra files or overrides
//! library ones, the skeleton included.

use std::borrow::Cow;
use std::sync::OnceLock;

use minijinja::{Environment, Error, ErrorKind, context, syntax::SyntaxConfig};
use rust_embed::RustEmbed;
use rustc_hash::FxHashMap;

use super::defines::ShaderDefines;
use super::diagnostic::Diagnostic;
use crate::errors::{Result, StratumError};
use crate::settings::CompilerSettings;

const LIBRARY_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/src/shader/lib");
const SKELETON: &str = "program.glsl";
const INCLUDE_PRAGMA: &str = "#pragma include";

#[derive(RustEmbed)]
#[folder = "src/shader/lib"]
struct ShaderLibrary;

static SHADER_ENV: OnceLock<Environment<'static>> = OnceLock::new();

fn get_env() -> &'static Environment<'static> {
    SHADER_ENV.get_or_init(|| {
        let mut env = Environment::new();

        match SyntaxConfig::builder()
            .block_delimiters("{$", "$}")
            .variable_delimiters("{{", "}}")
            .line_statement_prefix("$$")
            .build()
        {
            Ok(syntax) => env.set_syntax(syntax),
            Err(err) => log::error!("Failed to configure shader template syntax: {err}"),
        }

        env.set_trim_blocks(true);
        env.set_undefined_behavior(minijinja::UndefinedBehavior::SemiStrict);
        env.set_loader(library_loader);

        env
    })
}

fn library_loader(name: &str) -> std::result::Result<Option<String>, Error> {
    #[cfg(debug_assertions)]
    {
        let path = std::path::Path::new(LIBRARY_DIR).join(name);
        if path.exists() {
            return match std::fs::read_to_string(&path) {
                Ok(source) => Ok(Some(source)),
                Err(e) => Err(Error::new(
                    ErrorKind::TemplateNotFound,
                    format!("Failed to read file: {e}"),
                )),
            };
        }
    }

    if let Some(file) = ShaderLibrary::get(name)
        && let Ok(source) = std::str::from_utf8(file.data.as_ref())
    {
        return Ok(Some(source.to_string()));
    }

    Ok(None)
}

/// Parsed `#pragma include` line: the file and its guard macros.
fn parse_include(line: &str) -> Option<(&str, Vec<&str>)> {
    let rest = line.trim_start().strip_prefix(INCLUDE_PRAGMA)?;
    // Quoted strings sit at the odd positions of a split on '"'.
    let mut quoted = rest.split('"').skip(1).step_by(2);
    let name = quoted.next()?;
    Some((name, quoted.collect()))
}

/// `precision highp|mediump|lowp float` anywhere in the source.
fn declares_float_precision(source: &str) -> bool {
    let tokens: Vec<&str> = source
        .split(|c: char| c.is_whitespace() || c == ';')
        .filter(|t| !t.is_empty())
        .collect();
    tokens.windows(3).any(|w| {
        w[0] == "precision" && matches!(w[1], "highp" | "mediump" | "lowp") && w[2] == "float"
    })
}

fn sorted_unique(lines: &[String]) -> Vec<String> {
    let mut lines = lines.to_vec();
    lines.sort();
    lines.dedup();
    lines
}

/// A processed shader and the problems met along the way.
#[derive(Debug, Clone, Default)]
pub struct ProcessedShader {
    pub source: String,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Default)]
pub struct ShaderProcessor {
    overrides: FxHashMap<String, String>,
}

impl ShaderProcessor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `text` under `name`, shadowing a library file of that name.
    pub fn add_shader(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.overrides.insert(name.into(), text.into());
    }

    /// Unprocessed text of a registered or library file.
    #[must_use]
    pub fn shader_text(&self, name: &str) -> Option<Cow<'_, str>> {
        if let Some(text) = self.overrides.get(name) {
            return Some(Cow::Borrowed(text));
        }
        library_loader(name).ok().flatten().map(Cow::Owned)
    }

    /// Process the registered file `name` like a generated body.
    pub fn get_shader(
        &self,
        name: &str,
        defines: &[String],
        extensions: &[String],
        settings: &CompilerSettings,
    ) -> Result<ProcessedShader> {
        let text = self
            .shader_text(name)
            .ok_or_else(|| StratumError::ShaderNotFound(name.to_string()))?;
        Ok(self.process(&text, defines, extensions, settings))
    }

    /// Resolve includes, then wrap `body` in the skeleton.
    ///
    /// Defines and extensions are sorted and deduplicated; defines are unique
    /// per macro name. On a template failure the include-resolved body is
    /// returned with a [`Diagnostic::Template`].
    #[must_use]
    pub fn process(
        &self,
        body: &str,
        defines: &[String],
        extensions: &[String],
        settings: &CompilerSettings,
    ) -> ProcessedShader {
        let define_set: ShaderDefines = defines.iter().map(String::as_str).collect();
        let extensions = sorted_unique(extensions);

        let mut diagnostics = Vec::new();
        let mut included = Vec::new();
        let body = self.preprocess(body, &define_set, &mut included, &mut diagnostics);

        let precision = (!declares_float_precision(&body)).then(|| settings.precision.declaration());

        let ctx = context! {
            version => &settings.glsl_version,
            extensions => extensions,
            precision => precision,
            defines => define_set.lines(),
            body => &body,
        };

        match self.render_skeleton(ctx) {
            Ok(source) => ProcessedShader { source, diagnostics },
            Err(err) => {
                log::error!("Shader skeleton failed to render: {err}");
                diagnostics.push(err.into());
                ProcessedShader {
                    source: body,
                    diagnostics,
                }
            }
        }
    }

    fn render_skeleton(&self, ctx: minijinja::Value) -> std::result::Result<String, Error> {
        let env = get_env();
        match self.overrides.get(SKELETON) {
            Some(text) => env.render_str(text, ctx),
            None => env.get_template(SKELETON)?.render(ctx),
        }
    }

    fn preprocess(
        &self,
        content: &str,
        defines: &ShaderDefines,
        included: &mut Vec<String>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> String {
        let mut out = String::with_capacity(content.len());

        for line in content.lines() {
            let Some((name, guards)) = parse_include(line) else {
                out.push_str(line);
                out.push('\n');
                continue;
            };

            if !guards.is_empty() && !guards.iter().any(|g| defines.contains(g)) {
                continue;
            }
            if included.iter().any(|n| n == name) {
                continue;
            }
            included.push(name.to_string());

            match self.shader_text(name) {
                Some(text) => {
                    let expanded = self.preprocess(&text, defines, included, diagnostics);
                    out.push_str(&expanded);
                }
                None => {
                    log::warn!("Shader file '{name}' not registered");
                    diagnostics.push(Diagnostic::UnresolvedInclude {
                        name: name.to_string(),
                    });
                }
            }
        }

        out
    }
}
