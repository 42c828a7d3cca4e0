//! Shader generator tests
//!
//! Tests for:
//! - Program cache keyed by structure, not values
//! - Texture units folded into the key
//! - Custom material graphs carried by a StateSet
//! - Context changes dropping cached programs
//! - Shadow cast depth pass selected by its attribute

use std::rc::Rc;

use stratum::shader::{GraphDescription, NodeKind, ShaderGenerator};
use stratum::shader::program::SHADOW_CAST_PROGRAM;
use stratum::state::attributes::{
    Light, LightType, Material, MorphAttribute, ShadowAlgorithm, ShadowCastAttribute, ShadowConfig,
    ShadowReceiveAttribute, ShadowTexture, Texture,
};
use stratum::state::{State, StateAttribute, StateSet, StateStack};

// ============================================================================
// Helper
// ============================================================================

const TINT: &str = r#"{
    "nodes": [
        { "id": "diffuse", "type": "Uniform", "args": ["vec4", "uDiffuse"] },
        { "id": "tint", "type": "Variable", "args": ["vec4", "tint"] },
        { "id": "mult", "type": "Mult", "inputs": ["diffuse", "=vec4(0.5)"], "outputs": "tint" },
        { "id": "out", "type": "glFragColor" },
        { "id": "set", "type": "SetFromNode", "inputs": ["tint"], "outputs": "out" }
    ],
    "roots": ["out"]
}"#;

fn material() -> Rc<StateAttribute> {
    Rc::new(Material::default().into())
}

fn texture(name: &str) -> Rc<StateAttribute> {
    Rc::new(Texture::new(name).into())
}

// ============================================================================
// Cache
// ============================================================================

#[test]
fn light_type_changes_the_program() {
    let mut generator = ShaderGenerator::default();
    let point = Rc::new(Light::new(0).with_type(LightType::Point).into());
    let spot = Rc::new(Light::new(0).with_type(LightType::Spot).into());

    let a = generator.program_for(&[material(), point], &[], None);
    let b = generator.program_for(&[material(), spot], &[], None);
    assert_ne!(a.key, b.key);
    assert_eq!(generator.cache_len(), 2);
    assert!(a.fragment.source.contains("uLight0_position"));
    assert!(b.fragment.source.contains("uLight0_spotCutOff"));
}

#[test]
fn texture_unit_is_part_of_the_key() {
    let mut generator = ShaderGenerator::default();
    let on_zero = generator.program_for(&[material()], &[vec![texture("albedo")]], None);
    let on_one = generator.program_for(&[material()], &[vec![], vec![texture("albedo")]], None);
    assert_ne!(on_zero.key, on_one.key);

    // Texture names are values, the unit is structure.
    let renamed = generator.program_for(&[material()], &[vec![texture("detail")]], None);
    assert!(Rc::ptr_eq(&on_zero, &renamed));
}

#[test]
fn context_changes_drop_the_cache() {
    let mut generator = ShaderGenerator::default();
    let before = generator.program_for(&[material()], &[], None);
    assert_eq!(generator.cache_len(), 1);

    generator
        .context_mut()
        .factory_mut()
        .register("Toon", |_| Ok(NodeKind::Mult));
    assert_eq!(generator.cache_len(), 0);

    let after = generator.program_for(&[material()], &[], None);
    assert!(!Rc::ptr_eq(&before, &after));
    assert_eq!(before.key, after.key);
    assert_eq!(before.fragment.source, after.fragment.source);
}

// ============================================================================
// Custom graphs
// ============================================================================

#[test]
fn stateset_description_replaces_the_fragment() {
    let description = Rc::new(GraphDescription::from_json(TINT).unwrap());
    let mut ss = StateSet::new();
    ss.set_attribute(Material::default());
    ss.set_shader_graph(description);
    let ss = ss.into_ref();

    let mut state = State::new();
    state.push_state_set(&ss);
    let mut generator = ShaderGenerator::default();
    let program = generator.get_or_create_program(&state);

    assert!(program.is_valid(), "{:?}", program.diagnostics().collect::<Vec<_>>());
    assert!(program.fragment.source.contains("uniform vec4 uDiffuse;"));
    assert!(program.fragment.source.contains("tint = uDiffuse.rgba*vec4(0.5);"));
    assert!(!program.fragment.source.contains("uMaterialDiffuse"));
    assert!(program.vertex.source.contains("gl_Position"));

    let plain = generator.program_for(&[material()], &[], None);
    assert_ne!(plain.key, program.key);

    state.pop_state_set(&ss);
    assert!(state.shader_graph().is_none());
}

#[test]
fn broken_description_yields_an_invalid_program() {
    let description: GraphDescription = serde_json::from_str(
        r#"{
            "nodes": [
                { "id": "out", "type": "glFragColor" },
                { "id": "noise", "type": "PerlinNoise" }
            ],
            "roots": ["out"]
        }"#,
    )
    .unwrap();

    let mut generator = ShaderGenerator::default();
    let program = generator.program_for(&[material()], &[], Some(&description));
    assert!(!program.is_valid());
    assert!(program.diagnostics().any(|d| d.to_string().contains("PerlinNoise")));
}

// ============================================================================
// Shadow casting
// ============================================================================

fn esm() -> ShadowConfig {
    ShadowConfig {
        algorithm: ShadowAlgorithm::Esm,
        ..ShadowConfig::default()
    }
}

#[test]
fn cast_and_receive_programs_differ() {
    let mut generator = ShaderGenerator::default();
    let light: Rc<StateAttribute> = Rc::new(Light::new(0).into());

    let mut receive = ShadowReceiveAttribute::new(0);
    receive.config = esm();
    let receive_program = generator.program_for(
        &[material(), light.clone(), Rc::new(receive.clone().into())],
        &[vec![], vec![Rc::new(ShadowTexture::new(0).into())]],
        None,
    );

    let cast: Rc<StateAttribute> = Rc::new(ShadowCastAttribute::for_receiver(&receive).into());
    let cast_program = generator.program_for(&[material(), light, cast], &[], None);

    assert_ne!(receive_program.key, cast_program.key);
    assert!(cast_program.is_valid(), "{:?}", cast_program.diagnostics().collect::<Vec<_>>());
    assert!(cast_program.fragment.source.contains(SHADOW_CAST_PROGRAM));
    assert!(cast_program.fragment.source.contains("computeShadowDepth("));
    assert!(cast_program.fragment.source.contains("#define _ESM"));
    assert!(!cast_program.fragment.source.contains("uMaterialDiffuse"));
    assert!(cast_program.vertex.source.contains("varying vec4 vViewVertex;"));
    assert!(cast_program.vertex.source.contains("uniform mat4 uModelViewMatrix;"));
}

#[test]
fn casters_share_a_program_across_materials() {
    let mut generator = ShaderGenerator::default();
    let cast: Rc<StateAttribute> = Rc::new(ShadowCastAttribute::new(esm()).into());

    let lit = generator.program_for(
        &[material(), Rc::new(Light::new(0).into()), cast.clone()],
        &[vec![texture("albedo")]],
        None,
    );
    let bare = generator.program_for(&[cast.clone()], &[], None);
    assert!(Rc::ptr_eq(&lit, &bare));

    let description = GraphDescription::from_json(TINT).unwrap();
    let described = generator.program_for(&[cast.clone()], &[], Some(&description));
    assert!(Rc::ptr_eq(&bare, &described));

    let morphed = generator.program_for(
        &[cast, Rc::new(MorphAttribute::new(2).with_target_names(["Vertex"]).into())],
        &[],
        None,
    );
    assert_ne!(bare.key, morphed.key);
}

#[test]
fn cast_algorithm_is_part_of_the_key() {
    let mut generator = ShaderGenerator::default();
    let esm_cast = generator.program_for(&[Rc::new(ShadowCastAttribute::new(esm()).into())], &[], None);
    let vsm_cast = generator.program_for(
        &[Rc::new(
            ShadowCastAttribute::new(ShadowConfig {
                algorithm: ShadowAlgorithm::Vsm,
                ..ShadowConfig::default()
            })
            .into(),
        )],
        &[],
        None,
    );
    assert_ne!(esm_cast.key, vsm_cast.key);
    assert!(vsm_cast.fragment.source.contains("#define _VSM"));

    // A switched-off cast attribute falls back to the material program.
    let off = generator.program_for(&[material(), Rc::new(ShadowCastAttribute::default().into())], &[], None);
    let plain = generator.program_for(&[material()], &[], None);
    assert!(Rc::ptr_eq(&off, &plain));
}
