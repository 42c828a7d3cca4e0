//! Graph description tests
//!
//! Tests for:
//! - JSON parsing, validation and serialization
//! - Named ports and literal inputs
//! - Varyings declared by a description feeding the vertex stage

use stratum::StratumError;
use stratum::shader::description::PortsDescription;
use stratum::shader::{CompilerContext, Diagnostic, GraphDescription, ShaderGenerator, ShaderGraph, ShaderStage, compile};
use stratum::state::StateAttribute;
use stratum::state::attributes::Material;

// ============================================================================
// Helper
// ============================================================================

const SHADED: &str = r#"{
    "nodes": [
        { "id": "normal", "type": "Varying", "args": ["vec3", "vViewNormal"] },
        { "id": "n", "type": "Variable", "args": ["vec3", "n"] },
        { "id": "normalize", "type": "Normalize",
          "inputs": { "vec": "normal" }, "outputs": { "vec": "n" },
          "comment": "unit normal" },
        { "id": "color", "type": "Variable", "args": ["vec4", "color"] },
        { "id": "alpha", "type": "SetAlpha",
          "inputs": { "color": "n", "alpha": "=1.0" }, "outputs": { "color": "color" } },
        { "id": "out", "type": "glFragColor" },
        { "id": "set", "type": "SetFromNode", "inputs": "color", "outputs": "out" }
    ],
    "roots": ["out"]
}"#;

// ============================================================================
// Parsing
// ============================================================================

#[test]
fn parses_every_port_form() {
    let description = GraphDescription::from_json(SHADED).unwrap();
    assert_eq!(description.nodes.len(), 7);
    assert_eq!(description.roots, ["out"]);

    let normalize = &description.nodes[2];
    assert_eq!(normalize.node_type, "Normalize");
    assert!(matches!(normalize.inputs, Some(PortsDescription::Named(_))));
    assert_eq!(normalize.comment.as_deref(), Some("unit normal"));

    let set = &description.nodes[6];
    assert_eq!(set.inputs, Some(PortsDescription::Single("color".to_string())));
}

#[test]
fn json_survives_a_round_trip() -> anyhow::Result<()> {
    let description = GraphDescription::from_json(SHADED)?;
    let text = description.to_json()?;
    assert_eq!(GraphDescription::from_json(&text)?, description);
    Ok(())
}

#[test]
fn validation_rejects_broken_documents() {
    let duplicate = r#"{ "nodes": [ { "id": "a", "type": "glFragColor" }, { "id": "a", "type": "Add" } ], "roots": ["a"] }"#;
    assert!(matches!(
        GraphDescription::from_json(duplicate),
        Err(StratumError::InvalidDescription(_))
    ));

    let no_roots = r#"{ "nodes": [ { "id": "a", "type": "glFragColor" } ], "roots": [] }"#;
    assert!(matches!(
        GraphDescription::from_json(no_roots),
        Err(StratumError::InvalidDescription(_))
    ));

    let dangling = r#"{ "nodes": [ { "id": "a", "type": "SetFromNode", "inputs": ["ghost"] } ], "roots": ["a"] }"#;
    assert!(matches!(
        GraphDescription::from_json(dangling),
        Err(StratumError::Shader(Diagnostic::UnknownReference { .. }))
    ));

    assert!(matches!(
        GraphDescription::from_json("{ \"nodes\": 3 }"),
        Err(StratumError::Json(_))
    ));
}

// ============================================================================
// Building
// ============================================================================

#[test]
fn builds_named_ports_and_literals() {
    let ctx = CompilerContext::default();
    let description = GraphDescription::from_json(SHADED).unwrap();
    let mut graph = ShaderGraph::new(ShaderStage::Fragment);
    let roots = description.build(&mut graph, ctx.factory());

    let shader = compile(&graph, &roots, &ctx);
    assert!(shader.is_valid(), "{:?}", shader.diagnostics);
    assert!(shader.source.contains("varying vec3 vViewNormal;"));
    assert!(shader.source.contains("//unit normal"));
    assert!(shader.source.contains("color = vec4( n.rgb, 1.0 );"));
    assert!(shader.source.contains("gl_FragColor = color.rgba;"));
    assert_eq!(graph.varyings().len(), 1);
}

#[test]
fn description_varyings_reach_the_vertex_stage() {
    let description = GraphDescription::from_json(SHADED).unwrap();
    let material: std::rc::Rc<StateAttribute> = std::rc::Rc::new(Material::default().into());

    let mut generator = ShaderGenerator::default();
    let program = generator.program_for(&[material], &[], Some(&description));
    assert!(program.is_valid(), "{:?}", program.diagnostics().collect::<Vec<_>>());
    assert!(program.vertex.source.contains("varying vec3 vViewNormal;"));
    assert!(program.vertex.source.contains("uniform mat4 uModelViewNormalMatrix;"));
    assert!(program.vertex.source.contains("attribute vec3 Normal;"));
}
