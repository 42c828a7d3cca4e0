//! Fragment graph of the default material program.
//!
//! ```text
//! diffuse * vertex color ─> Σ lights (+ shadow) + ambient ─> + emission
//!     ─> * textures ─> premultiplied alpha ─> gl_FragColor
//! ```

use super::ActiveAttributes;
use crate::shader::graph::{ShaderGraph, ShaderStage};
use crate::shader::node::{BuiltinOutput, ColorFunction, LightModel, NodeId, NodeKind, TextureFetch};
use crate::shader::nodes::lights;
use crate::state::attributes::{
    Light, LightType, Material, ShadowReceiveAttribute, ShadowTexture, TextureTarget,
};

/// Named ports; a later value for the same port replaces the earlier one.
type Ports = Vec<(String, NodeId)>;

fn mix(ports: &mut Ports, name: &str, id: NodeId) {
    match ports.iter_mut().find(|(port, _)| port == name) {
        Some(slot) => slot.1 = id,
        None => ports.push((name.to_string(), id)),
    }
}

/// GLSL type of a light uniform field.
fn light_uniform_type(field: &str) -> &'static str {
    match field {
        "direction" => "vec3",
        "spotCutOff" | "spotBlend" => "float",
        "matrix" | "invMatrix" => "mat4",
        _ => "vec4",
    }
}

/// Shading node of a light type.
pub(super) fn light_model(light_type: LightType) -> LightModel {
    match light_type {
        LightType::Directional => LightModel::Sun,
        LightType::Point => LightModel::Point,
        LightType::Spot => LightModel::Spot,
        LightType::Hemi => LightModel::Hemi,
    }
}

/// Light ports filled by shading variables rather than uniforms.
const LIGHT_OUTPUT_PORTS: &[&str] = &["lightEyePos", "lightEyeDir", "lightNDL", "lighted"];

struct MaterialUniforms {
    ambient: NodeId,
    diffuse: NodeId,
    specular: NodeId,
    emission: NodeId,
    shininess: NodeId,
}

pub(super) struct FragmentBuilder<'s, 'a> {
    attributes: &'s ActiveAttributes<'a>,
    graph: ShaderGraph,
}

impl<'s, 'a> FragmentBuilder<'s, 'a> {
    pub(super) fn new(attributes: &'s ActiveAttributes<'a>) -> Self {
        Self {
            attributes,
            graph: ShaderGraph::new(ShaderStage::Fragment),
        }
    }

    pub(super) fn build(mut self) -> (ShaderGraph, Vec<NodeId>) {
        let mut roots = vec![self.main()];
        let name = self.attributes.program_name();
        let define = self
            .graph
            .node(NodeKind::Define {
                name: "SHADER_NAME".to_string(),
                value: name.to_string(),
            })
            .id();
        roots.push(define);
        (self.graph, roots)
    }

    fn main(&mut self) -> NodeId {
        if self.attributes.material.is_none() {
            return self.no_material();
        }

        let material = self.material_uniforms();
        let diffuse = self.vertex_color(material.diffuse);

        let mut final_color = if self.attributes.lights.is_empty() {
            diffuse
        } else {
            self.lighting(&material, diffuse)
        };

        let with_emission = self.graph.create_variable_with_value("vec3", None, "vec3(0.0)");
        self.graph
            .node(NodeKind::Add)
            .inputs([final_color, material.emission])
            .outputs(with_emission);
        final_color = with_emission;

        let (texture_color, first_texel) = self.diffuse_from_textures();
        if let Some(texture) = texture_color {
            self.graph
                .node(NodeKind::InlineCode {
                    code: "%color.rgb *= %texture.rgb;".to_string(),
                })
                .inputs([("texture", texture)])
                .outputs([("color", final_color)]);
        }

        let alpha = self.alpha(material.diffuse, first_texel);

        let premultiplied = self.graph.create_variable("vec4", None);
        self.graph
            .node(NodeKind::PreMultAlpha)
            .inputs([("color", final_color), ("alpha", alpha)])
            .outputs([("color", premultiplied)]);

        let frag_color = self.graph.node(NodeKind::Output(BuiltinOutput::FragColor)).id();
        self.graph
            .node(NodeKind::SetAlpha)
            .inputs([("color", premultiplied), ("alpha", alpha)])
            .outputs([("color", frag_color)]);
        frag_color
    }

    /// Magenta, so missing materials stand out.
    fn no_material(&mut self) -> NodeId {
        let fofd = self
            .graph
            .get_or_create_constant("vec4", "fofd", "vec4(1.0, 0.0, 1.0, 0.7)");
        let frag_color = self.graph.node(NodeKind::Output(BuiltinOutput::FragColor)).id();
        self.graph.node(NodeKind::SetFromNode).inputs(fofd).outputs(frag_color);
        frag_color
    }

    fn material_uniforms(&mut self) -> MaterialUniforms {
        MaterialUniforms {
            ambient: self.graph.get_or_create_uniform("vec4", Material::AMBIENT),
            diffuse: self.graph.get_or_create_uniform("vec4", Material::DIFFUSE),
            specular: self.graph.get_or_create_uniform("vec4", Material::SPECULAR),
            emission: self.graph.get_or_create_uniform("vec4", Material::EMISSION),
            shininess: self.graph.get_or_create_uniform("float", Material::SHININESS),
        }
    }

    fn vertex_color(&mut self, diffuse: NodeId) -> NodeId {
        let vertex_color = self.graph.get_or_create_varying("vec4", "vVertexColor");
        let enabled = self.graph.get_or_create_uniform("float", "uArrayColorEnabled");
        let color = self.graph.create_variable("vec4", None);

        let code = [
            "",
            "%color = %diffuse;",
            "if ( %hasVertexColor == 1.0)",
            "  %color *= %vertexColor.rgba;",
        ]
        .join("\n");
        self.graph
            .node(NodeKind::InlineCode { code })
            .inputs([
                ("diffuse", diffuse),
                ("hasVertexColor", enabled),
                ("vertexColor", vertex_color),
            ])
            .outputs([("color", color)])
            .comment("diffuse color = diffuse color * vertex color");
        color
    }

    // ========================================================================
    // Lighting
    // ========================================================================

    fn lighting(&mut self, material: &MaterialUniforms, diffuse: NodeId) -> NodeId {
        let attributes = self.attributes;
        let output = self.graph.create_variable("vec3", None);
        let mut terms = Vec::new();

        for (index, light) in attributes.lights.iter().copied().enumerate() {
            let lighted_output = self.graph.create_variable("vec3", None);
            let model = light_model(light.light_type);

            let mut inputs = self.light_uniforms(light, model);
            mix(&mut inputs, "materialambient", material.ambient);
            mix(&mut inputs, "materialspecular", material.specular);
            mix(&mut inputs, "materialemission", material.emission);
            mix(&mut inputs, "materialshininess", material.shininess);
            mix(&mut inputs, "materialdiffuse", diffuse);

            let lighted = self.graph.create_variable("bool", Some(&format!("lighted{index}")));
            let eye_pos = matches!(light.light_type, LightType::Spot | LightType::Point)
                .then(|| self.graph.create_variable("vec3", Some(&format!("lightEyePos{index}"))));
            let eye_dir = self.graph.create_variable("vec3", Some(&format!("lightEyeDir{index}")));
            let ndl = self.graph.create_variable("float", Some(&format!("lightNDL{index}")));

            mix(&mut inputs, "lighted", lighted);
            if let Some(eye_pos) = eye_pos {
                mix(&mut inputs, "lightEyePos", eye_pos);
            }
            mix(&mut inputs, "lightEyeDir", eye_dir);
            mix(&mut inputs, "lightNDL", ndl);

            let normal = self.normalized_normal();
            mix(&mut inputs, "normal", normal);
            let eye_vector = self.normalized_position();
            mix(&mut inputs, "eyeVector", eye_vector);

            let mut outputs = vec![("color".to_string(), lighted_output)];
            if let Some(eye_pos) = eye_pos {
                outputs.push(("lightEyePos".to_string(), eye_pos));
            }
            outputs.push(("lightEyeDir".to_string(), eye_dir));
            outputs.push(("ndl".to_string(), ndl));
            outputs.push(("lighted".to_string(), lighted));

            self.graph
                .node(NodeKind::Light(model))
                .inputs(inputs.clone())
                .outputs(outputs);

            let shadowed = self.shadowing(light, &inputs, lighted_output);
            terms.push(shadowed.unwrap_or(lighted_output));

            let ambient = self.graph.create_variable("vec3", Some("lightMatAmbientOutput"));
            let light_ambient = self
                .graph
                .get_or_create_uniform("vec4", &light.uniform_name("ambient"));
            self.graph
                .node(NodeKind::Mult)
                .inputs([material.ambient, light_ambient])
                .outputs(ambient);
            terms.push(ambient);
        }

        if terms.is_empty() {
            terms.push(self.graph.create_variable_with_value("vec3", None, "vec3(0.0)"));
        }
        self.graph.node(NodeKind::Add).inputs(terms).outputs(output);
        output
    }

    /// Uniforms of the light ports `model` reads, plus its ambient color.
    fn light_uniforms(&mut self, light: &Light, model: LightModel) -> Ports {
        let mut fields: Vec<&str> = lights::required_inputs(model)
            .into_iter()
            .filter(|port| !LIGHT_OUTPUT_PORTS.contains(port))
            .filter_map(|port| port.strip_prefix("light"))
            .filter(|field| !field.is_empty())
            .collect();
        if !fields.contains(&"ambient") {
            fields.insert(0, "ambient");
        }

        fields
            .into_iter()
            .map(|field| {
                let uniform = self
                    .graph
                    .get_or_create_uniform(light_uniform_type(field), &light.uniform_name(field));
                (format!("light{field}"), uniform)
            })
            .collect()
    }

    fn front_normal(&mut self) -> NodeId {
        let front = self.graph.create_variable("vec3", Some("frontNormal"));
        let view_normal = self.graph.get_or_create_varying("vec3", "vViewNormal");
        self.graph
            .node(NodeKind::Function(ColorFunction::FrontNormal))
            .inputs([("normal", view_normal)])
            .outputs([("normal", front)]);
        front
    }

    fn normalized_normal(&mut self) -> NodeId {
        if let Some(normal) = self.graph.variable("normal") {
            return normal;
        }
        let out = self.graph.create_variable("vec3", Some("normal"));
        let front = self.front_normal();
        self.graph
            .node(NodeKind::Function(ColorFunction::Normalize))
            .inputs([("vec", front)])
            .outputs([("vec", out)]);
        out
    }

    /// Unit vector from the fragment towards the eye.
    fn normalized_position(&mut self) -> NodeId {
        if let Some(eye) = self.graph.variable("eyeVector") {
            return eye;
        }
        let normalized = self.graph.create_variable("vec3", None);
        let cast_eye = self.graph.create_variable("vec3", None);
        let view_vertex = self.graph.get_or_create_varying("vec4", "vViewVertex");
        self.graph.node(NodeKind::SetFromNode).inputs(view_vertex).outputs(cast_eye);
        self.graph
            .node(NodeKind::Function(ColorFunction::Normalize))
            .inputs([("vec", cast_eye)])
            .outputs([("vec", normalized)]);

        let out = self.graph.create_variable("vec3", Some("eyeVector"));
        let minus_one = self.graph.create_variable_with_value("float", None, "-1.0");
        self.graph
            .node(NodeKind::Mult)
            .inputs([normalized, minus_one])
            .outputs(out);
        out
    }

    // ========================================================================
    // Shadows
    // ========================================================================

    /// `lighted_output * shadow`, when a receiver and a map exist for `light`.
    fn shadowing(&mut self, light: &Light, light_inputs: &Ports, lighted_output: NodeId) -> Option<NodeId> {
        let (receive, maps) = self.attributes.shadow_of(light)?;

        let vertex_world = self.graph.get_or_create_varying("vec3", "vModelVertex");
        let shadowed = self.graph.create_variable("float", None);

        let mut inputs = light_inputs.clone();
        for (key, uniform) in self.shadow_uniforms(receive) {
            mix(&mut inputs, &key, uniform);
        }
        for (unit, _) in maps {
            self.shadow_texture_inputs(&mut inputs, unit);
        }
        mix(&mut inputs, "vertexWorld", vertex_world);

        self.graph
            .node(NodeKind::ShadowReceive(receive.config))
            .inputs(inputs)
            .outputs([("float", shadowed)]);

        let light_and_shadow = self.graph.create_variable("vec3", Some("lightAndShadowTempOutput"));
        self.graph
            .node(NodeKind::Mult)
            .inputs([lighted_output, shadowed])
            .outputs(light_and_shadow);
        Some(light_and_shadow)
    }

    fn shadow_uniforms(&mut self, receive: &ShadowReceiveAttribute) -> Ports {
        ["bias", "exponent0", "exponent1", "epsilonVSM"]
            .into_iter()
            .map(|field| {
                let uniform = self
                    .graph
                    .get_or_create_uniform("float", &receive.uniform_name(field));
                (format!("shadow{field}"), uniform)
            })
            .collect()
    }

    fn shadow_texture_inputs(&mut self, inputs: &mut Ports, unit: u32) {
        let sampler = self
            .graph
            .get_or_create_sampler("sampler2D", &format!("Texture{unit}"));

        for (field, key, ty) in [
            ("viewMatrix", "shadowTextureViewMatrix", "mat4"),
            ("projectionMatrix", "shadowTextureProjectionMatrix", "mat4"),
            ("depthRange", "shadowTextureDepthRange", "vec4"),
            ("mapSize", "shadowTextureMapSize", "vec4"),
        ] {
            let uniform = self
                .graph
                .get_or_create_uniform(ty, &ShadowTexture::uniform_name(unit, field));
            mix(inputs, key, uniform);
        }
        mix(inputs, "shadowTexture", sampler);
    }

    // ========================================================================
    // Textures and alpha
    // ========================================================================

    /// Product of the diffuse textures, and the first texel for alpha.
    fn diffuse_from_textures(&mut self) -> (Option<NodeId>, Option<NodeId>) {
        let attributes = self.attributes;
        let mut texels = Vec::new();
        for (unit, texture) in attributes.textures.iter().copied() {
            let sampler_type = match texture.target {
                TextureTarget::Texture2D => "sampler2D",
                TextureTarget::CubeMap => "samplerCube",
            };
            let sampler = self
                .graph
                .get_or_create_sampler(sampler_type, &format!("Texture{unit}"));
            let uv = self
                .graph
                .get_or_create_varying("vec2", &format!("vTexCoord{unit}"));

            let texel = self.graph.create_variable("vec4", None);
            self.graph
                .node(NodeKind::Texture(TextureFetch::Rgba))
                .inputs([("sampler", sampler), ("uv", uv)])
                .outputs([("color", texel)]);
            texels.push(texel);
        }

        let first = texels.first().copied();
        let color = match texels.len() {
            0 => None,
            1 => first,
            _ => {
                let accum = self.graph.create_variable("vec3", Some("texDiffuseAccum"));
                self.graph.node(NodeKind::Mult).inputs(texels).outputs(accum);
                Some(accum)
            }
        };
        (color, first)
    }

    fn alpha(&mut self, diffuse: NodeId, first_texel: Option<NodeId>) -> NodeId {
        let alpha = self.graph.create_variable("float", None);

        let mut code = match first_texel {
            Some(_) => "%alpha = %color.a * %texelAlpha.a;".to_string(),
            None => "%alpha = %color.a;".to_string(),
        };
        // Fully transparent billboard fragments would still write depth.
        if self.attributes.billboard {
            code.push_str("if ( %alpha == 0.0) discard;");
        }

        let mut inputs = vec![("color".to_string(), diffuse)];
        if let Some(texel) = first_texel {
            inputs.push(("texelAlpha".to_string(), texel));
        }
        self.graph
            .node(NodeKind::InlineCode { code })
            .inputs(inputs)
            .outputs([("alpha", alpha)]);
        alpha
    }
}
