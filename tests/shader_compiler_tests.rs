//! Shader compiler tests
//!
//! Tests for:
//! - Structural hashing: equal structure, equal source and hash
//! - Diagnostics for missing ports and empty roots
//! - Declarations, defines and includes in the assembled source
//! - Default material programs built from attributes

use std::rc::Rc;

use stratum::settings::{CompilerSettings, FloatPrecision};
use stratum::shader::node::{BuiltinOutput, MatrixMult, TextureFetch};
use stratum::shader::{
    CompilerContext, Diagnostic, NodeKind, ProgramCompiler, ShaderGraph, ShaderStage, compile,
};
use stratum::shader::program::ActiveAttributes;
use stratum::state::StateAttribute;
use stratum::state::attributes::{Light, LightType, Material, MorphAttribute, SkinningAttribute, Texture};

// ============================================================================
// Helper
// ============================================================================

/// Fragment graph writing `uniform * texture` to gl_FragColor.
fn textured(uniform_name: &str) -> (ShaderGraph, Vec<stratum::shader::NodeId>) {
    let mut g = ShaderGraph::new(ShaderStage::Fragment);
    let tint = g.get_or_create_uniform("vec4", uniform_name);
    let sampler = g.get_or_create_sampler("sampler2D", "Texture0");
    let uv = g.get_or_create_varying("vec2", "vTexCoord0");
    let texel = g.create_variable("vec4", Some("texel"));
    g.node(NodeKind::Texture(TextureFetch::Rgba))
        .inputs([("sampler", sampler), ("uv", uv)])
        .outputs([("color", texel)]);

    let color = g.create_variable("vec4", None);
    g.node(NodeKind::Mult).inputs([tint, texel]).outputs(color);
    let frag = g.node(NodeKind::Output(BuiltinOutput::FragColor)).id();
    g.node(NodeKind::SetFromNode).inputs(color).outputs(frag);
    (g, vec![frag])
}

fn compile_attributes(attributes: &[Rc<StateAttribute>], units: &[Vec<Rc<StateAttribute>>]) -> (String, String) {
    let _ = env_logger::builder().is_test(true).try_init();
    let ctx = CompilerContext::default();
    let active = ActiveAttributes::collect(attributes, units);
    let (vertex, fragment) = ProgramCompiler::new(active, &ctx).compile();
    assert!(vertex.is_valid(), "{:?}", vertex.diagnostics);
    assert!(fragment.is_valid(), "{:?}", fragment.diagnostics);
    (vertex.source, fragment.source)
}

// ============================================================================
// Structural hashing
// ============================================================================

#[test]
fn equal_structure_gives_equal_source_and_hash() {
    let ctx = CompilerContext::default();
    let (a, roots_a) = textured("uTint");
    let (b, roots_b) = textured("uTint");

    let sa = compile(&a, &roots_a, &ctx);
    let sb = compile(&b, &roots_b, &ctx);
    assert_eq!(sa.source, sb.source);
    assert_eq!(sa.hash, sb.hash);
}

#[test]
fn uniform_values_never_reach_the_source() {
    let material_a: Rc<StateAttribute> = Rc::new(Material::default().into());
    let mut red = Material::default();
    red.diffuse = glam::Vec4::new(1.0, 0.0, 0.0, 1.0);
    let material_b: Rc<StateAttribute> = Rc::new(red.into());

    let (va, fa) = compile_attributes(&[material_a], &[]);
    let (vb, fb) = compile_attributes(&[material_b], &[]);
    assert_eq!(va, vb);
    assert_eq!(fa, fb);
}

#[test]
fn different_structure_changes_the_hash() {
    let ctx = CompilerContext::default();
    let (a, roots_a) = textured("uTint");
    let (b, roots_b) = textured("uOther");
    assert_ne!(compile(&a, &roots_a, &ctx).hash, compile(&b, &roots_b, &ctx).hash);
}

// ============================================================================
// Diagnostics
// ============================================================================

#[test]
fn missing_input_names_node_type_and_port() {
    let ctx = CompilerContext::default();
    let mut g = ShaderGraph::new(ShaderStage::Fragment);
    let sampler = g.get_or_create_sampler("sampler2D", "Texture0");
    let texel = g.create_variable("vec4", Some("texel"));
    g.node(NodeKind::Texture(TextureFetch::Rgba))
        .inputs([("sampler", sampler)])
        .outputs([("color", texel)]);
    let frag = g.node(NodeKind::Output(BuiltinOutput::FragColor)).id();
    g.node(NodeKind::SetFromNode).inputs(texel).outputs(frag);

    let shader = compile(&g, &[frag], &ctx);
    assert!(!shader.is_valid());
    assert!(shader.diagnostics.contains(&Diagnostic::MissingInput {
        node_type: "TextureRGBA",
        port: "uv".to_string(),
    }));
    // The rest of the graph still compiles.
    assert!(shader.source.contains("gl_FragColor = texel.rgba;"));
}

#[test]
fn no_roots_is_reported() {
    let ctx = CompilerContext::default();
    let g = ShaderGraph::new(ShaderStage::Fragment);
    let shader = compile(&g, &[], &ctx);
    assert_eq!(shader.diagnostics, [Diagnostic::NoRoots]);
}

#[test]
fn type_clash_is_a_warning() {
    let mut g = ShaderGraph::new(ShaderStage::Fragment);
    let a = g.get_or_create_uniform("vec4", "uColor");
    let b = g.get_or_create_uniform("vec3", "uColor");
    assert_ne!(a, b);
    assert!(g.diagnostics().iter().all(|d| !d.is_error()));
    assert_eq!(g.diagnostics().len(), 1);
}

// ============================================================================
// Source layout
// ============================================================================

#[test]
fn source_starts_with_version_and_precision() {
    let settings = CompilerSettings {
        precision: FloatPrecision::High,
        ..CompilerSettings::default()
    };
    let ctx = CompilerContext::new(settings);
    let (g, roots) = textured("uTint");
    let source = compile(&g, &roots, &ctx).source;

    assert!(source.starts_with("#version 100\n"));
    assert!(source.contains("precision highp float;"));
    assert!(source.contains("uniform sampler2D Texture0;"));
    assert!(source.contains("varying vec2 vTexCoord0;"));
    assert!(source.contains("vec4 texel;"));
}

#[test]
fn vertex_position_with_invariant() {
    let settings = CompilerSettings {
        invariant_position: true,
        ..CompilerSettings::default()
    };
    let ctx = CompilerContext::new(settings);
    let mut g = ShaderGraph::new(ShaderStage::Vertex);
    let vertex = g.get_or_create_attribute("vec3", "Vertex");
    let mvp = g.get_or_create_uniform("mat4", "uModelViewProjection");
    let position = g.node(NodeKind::Output(BuiltinOutput::Position)).id();
    g.node(NodeKind::MatrixMult(MatrixMult::position()))
        .inputs([("matrix", mvp), ("vec", vertex)])
        .outputs([("vec", position)]);

    let shader = compile(&g, &[position], &ctx);
    assert!(shader.is_valid());
    assert!(shader.source.contains("invariant gl_Position;"));
    assert!(shader.source.contains("attribute vec3 Vertex;"));
}

// ============================================================================
// Default programs
// ============================================================================

#[test]
fn program_without_material_is_constant() {
    let (vertex, fragment) = compile_attributes(&[], &[]);
    assert!(fragment.contains("#define SHADER_NAME NoMaterialProgram"));
    assert!(fragment.contains("vec4(1.0, 0.0, 1.0, 0.7)"));
    assert!(vertex.contains("gl_Position"));
    assert!(vertex.contains("gl_PointSize"));
}

#[test]
fn lit_program_declares_light_uniforms() {
    let attributes: Vec<Rc<StateAttribute>> = vec![
        Rc::new(Material::default().into()),
        Rc::new(Light::new(0).with_type(LightType::Point).into()),
    ];
    let (vertex, fragment) = compile_attributes(&attributes, &[]);

    assert!(fragment.contains("#define SHADER_NAME MaterialProgram"));
    assert!(fragment.contains("uniform vec4 uMaterialDiffuse;"));
    assert!(fragment.contains("uLight0_position"));
    assert!(fragment.contains("varying vec3 vViewNormal;"));
    assert!(vertex.contains("varying vec3 vViewNormal;"));
    assert!(vertex.contains("uniform mat4 uModelViewNormalMatrix;"));
}

#[test]
fn textured_program_reads_texcoords() {
    let attributes: Vec<Rc<StateAttribute>> = vec![Rc::new(Material::default().into())];
    let units = vec![vec![Rc::new(Texture::new("albedo").into())]];
    let (vertex, fragment) = compile_attributes(&attributes, &units);

    assert!(fragment.contains("uniform sampler2D Texture0;"));
    assert!(vertex.contains("attribute vec2 TexCoord0;"));
    assert!(vertex.contains("vTexCoord0 = TexCoord0.rg;"));
}

#[test]
fn skinned_morphed_program_declares_animation_inputs() {
    let attributes: Vec<Rc<StateAttribute>> = vec![
        Rc::new(Material::default().into()),
        Rc::new(Light::new(0).into()),
        Rc::new(SkinningAttribute::new(Some(48)).into()),
        Rc::new(MorphAttribute::new(2).with_target_names(["Vertex", "Normal"]).into()),
    ];
    let (vertex, _) = compile_attributes(&attributes, &[]);

    assert!(vertex.contains("uniform vec4 uBones[48];"));
    assert!(vertex.contains("attribute vec4 Weights;"));
    assert!(vertex.contains("attribute vec3 Vertex_1;"));
    assert!(vertex.contains("attribute vec3 Normal_0;"));
    assert!(vertex.contains("uniform vec4 uTargetWeights;"));
    assert!(vertex.contains("morphTransform"));
    assert!(vertex.contains("skeletalTransform"));
}
