//! Vertex graph of the default material program.
//!
//! Local-space chains run `attribute -> morph -> skin -> normalize`; every
//! step is skipped when its attribute is absent. Model and view space
//! values are built lazily from the local ones, only for the varyings the
//! fragment graph requested.

use super::ActiveAttributes;
use crate::shader::context::CompilerContext;
use crate::shader::graph::ShaderGraph;
use crate::shader::node::{BuiltinOutput, ColorFunction, MatrixMult, NodeId, NodeKind};

/// Most targets a `vec4` of weights can blend.
const MAX_MORPH_TARGETS: u32 = 4;

pub(super) struct VertexBuilder<'s, 'a> {
    attributes: &'s ActiveAttributes<'a>,
    ctx: &'s CompilerContext,
    graph: ShaderGraph,
}

impl<'s, 'a> VertexBuilder<'s, 'a> {
    pub(super) fn new(attributes: &'s ActiveAttributes<'a>, fragment: &ShaderGraph, ctx: &'s CompilerContext) -> Self {
        Self {
            attributes,
            ctx,
            graph: ShaderGraph::vertex_for(fragment),
        }
    }

    pub(super) fn build(mut self) -> (ShaderGraph, Vec<NodeId>) {
        let point_size = self.graph.node(NodeKind::Output(BuiltinOutput::PointSize)).id();
        let one = self.graph.get_or_create_constant("float", "floatWhite", "float(1.0)");
        self.graph.node(NodeKind::SetFromNode).inputs(one).outputs(point_size);

        // gl_Position is written before any varying.
        let mut roots = vec![point_size, self.position()];
        self.varyings(&mut roots);

        let define = self
            .graph
            .node(NodeKind::Define {
                name: "SHADER_NAME".to_string(),
                value: self.attributes.program_name().to_string(),
            })
            .id();
        roots.push(define);
        (self.graph, roots)
    }

    fn position(&mut self) -> NodeId {
        let position = self.graph.node(NodeKind::Output(BuiltinOutput::Position)).id();
        if self.attributes.billboard {
            let vertex = self.graph.get_or_create_attribute("vec3", "Vertex");
            let model_view = self.graph.get_or_create_uniform("mat4", "uModelViewMatrix");
            let projection = self.graph.get_or_create_uniform("mat4", "uProjectionMatrix");
            self.graph
                .node(NodeKind::Billboard)
                .inputs([
                    ("Vertex", vertex),
                    ("ModelViewMatrix", model_view),
                    ("ProjectionMatrix", projection),
                ])
                .outputs([("vec", position)]);
        } else {
            let projection = self.graph.get_or_create_uniform("mat4", "uProjectionMatrix");
            let view_vertex = self.view_vertex();
            self.graph
                .node(NodeKind::MatrixMult(MatrixMult::position()))
                .inputs([("matrix", projection), ("vec", view_vertex)])
                .outputs([("vec", position)]);
        }
        position
    }

    fn varyings(&mut self, roots: &mut Vec<NodeId>) {
        let varyings = self.graph.varyings().to_vec();

        for (name, varying) in &varyings {
            let source = match name.as_str() {
                "vModelVertex" => Some(self.model_vertex()),
                "vModelNormal" => Some(self.model_normal()),
                "vModelTangent" => Some(self.model_tangent()),
                "vViewVertex" => Some(self.view_vertex()),
                "vViewNormal" => Some(self.view_normal()),
                "vViewTangent" => Some(self.view_tangent()),
                _ => None,
            };
            if let Some(source) = source {
                self.graph.node(NodeKind::SetFromNode).inputs(source).outputs(*varying);
            }

            if name == "vVertexColor" {
                let enabled = self.graph.get_or_create_uniform("float", "uArrayColorEnabled");
                let color = self.graph.get_or_create_attribute("vec4", "Color");
                self.graph
                    .node(NodeKind::InlineCode {
                        code: "%vcolor = %venabled == 1.0 ? %acolor : vec4(1.0, 1.0, 1.0, 1.0);".to_string(),
                    })
                    .inputs([("venabled", enabled), ("acolor", color)])
                    .outputs([("vcolor", *varying)]);
            }
        }

        for (name, varying) in varyings {
            roots.push(varying);
            if name.contains("vTexCoord") {
                let attribute = self.graph.get_or_create_attribute("vec2", &name[1..]);
                self.graph.node(NodeKind::SetFromNode).inputs(attribute).outputs(varying);
            }
        }
    }

    /// `out = matrix * vec` in position or direction mode, cached by name.
    fn transformed(&mut self, name: &str, ty: &str, mode: MatrixMult, matrix: &str, vec: NodeId) -> NodeId {
        let out = self.graph.create_variable(ty, Some(name));
        let matrix = self.graph.get_or_create_uniform("mat4", matrix);
        self.graph
            .node(NodeKind::MatrixMult(mode))
            .inputs([("matrix", matrix), ("vec", vec)])
            .outputs([("vec", out)]);
        out
    }

    // ========================================================================
    // Model and view space
    // ========================================================================

    fn model_vertex(&mut self) -> NodeId {
        if let Some(out) = self.graph.variable("modelVertex") {
            return out;
        }
        let local = self.local_vertex();
        self.transformed("modelVertex", "vec3", MatrixMult::position(), "uModelMatrix", local)
    }

    fn model_normal(&mut self) -> NodeId {
        if let Some(out) = self.graph.variable("modelNormal") {
            return out;
        }
        let local = self.local_normal();
        self.transformed("modelNormal", "vec3", MatrixMult::direction(), "uModelMatrix", local)
    }

    fn model_tangent(&mut self) -> NodeId {
        if let Some(out) = self.graph.variable("modelTangent") {
            return out;
        }
        let local = self.local_tangent();
        let mode = MatrixMult {
            overwrite_w: false,
            ..MatrixMult::direction()
        };
        self.transformed("modelTangent", "vec4", mode, "uModelMatrix", local)
    }

    fn view_vertex(&mut self) -> NodeId {
        if let Some(out) = self.graph.variable("viewVertex") {
            return out;
        }
        let local = self.local_vertex();
        self.transformed("viewVertex", "vec4", MatrixMult::position(), "uModelViewMatrix", local)
    }

    fn view_normal(&mut self) -> NodeId {
        if let Some(out) = self.graph.variable("viewNormal") {
            return out;
        }
        let local = self.local_normal();
        self.transformed("viewNormal", "vec3", MatrixMult::direction(), "uModelViewNormalMatrix", local)
    }

    fn view_tangent(&mut self) -> NodeId {
        if let Some(out) = self.graph.variable("viewTangent") {
            return out;
        }
        let local = self.local_tangent();
        let mode = MatrixMult {
            overwrite_w: false,
            ..MatrixMult::direction()
        };
        self.transformed("viewTangent", "vec4", mode, "uModelViewNormalMatrix", local)
    }

    // ========================================================================
    // Local space
    // ========================================================================

    fn local_vertex(&mut self) -> NodeId {
        self.skin_vertex()
    }

    fn local_normal(&mut self) -> NodeId {
        if let Some(out) = self.graph.variable("localNormal") {
            return out;
        }
        let normal = self.skin_normal();
        if normal == self.graph.get_or_create_attribute("vec3", "Normal") {
            return normal;
        }

        let out = self.graph.create_variable("vec3", Some("localNormal"));
        self.graph
            .node(NodeKind::Function(ColorFunction::Normalize))
            .inputs([("vec", normal)])
            .outputs([("vec", out)]);
        out
    }

    /// Tangents keep the handedness stored in `Tangent.w`.
    fn local_tangent(&mut self) -> NodeId {
        if let Some(out) = self.graph.variable("localTangent") {
            return out;
        }
        let input = self.graph.get_or_create_attribute("vec4", "Tangent");
        let tangent = self.skin_tangent();
        if tangent == input {
            return tangent;
        }

        let normalized = self.graph.create_variable("vec3", None);
        self.graph
            .node(NodeKind::Function(ColorFunction::Normalize))
            .inputs([("vec", tangent)])
            .outputs([("vec", normalized)]);

        let out = self.graph.create_variable("vec4", Some("localTangent"));
        self.graph
            .node(NodeKind::SetAlpha)
            .inputs([("color", normalized), ("alpha", input)])
            .outputs([("color", out)]);
        out
    }

    // ========================================================================
    // Skinning
    // ========================================================================

    /// Shared by the vertex, normal and tangent chains. Bone transforms must
    /// scale uniformly for the normal to stay valid.
    fn bone_matrix(&mut self) -> NodeId {
        if let Some(bone_matrix) = self.graph.variable("boneMatrix") {
            return bone_matrix;
        }
        let bone_matrix = self.graph.create_variable("mat4", Some("boneMatrix"));
        let weights = self.graph.get_or_create_attribute("vec4", "Weights");
        let bones = self.graph.get_or_create_attribute("vec4", "Bones");
        let size = self
            .attributes
            .skinning
            .map_or(1, |skinning| skinning.bone_uniform_size(self.ctx.bone_limits()));
        let palette = self.graph.get_or_create_uniform_array("vec4", "uBones", size);

        self.graph
            .node(NodeKind::Skinning)
            .inputs([("weights", weights), ("bonesIndex", bones), ("matrixPalette", palette)])
            .outputs([("mat4", bone_matrix)]);
        bone_matrix
    }

    fn skin_transform(&mut self, mode: MatrixMult, input: NodeId, name: &str) -> NodeId {
        let bone_matrix = self.bone_matrix();
        let out = self.graph.create_variable("vec3", Some(name));
        self.graph
            .node(NodeKind::MatrixMult(MatrixMult { inverse: true, ..mode }))
            .inputs([("matrix", bone_matrix), ("vec", input)])
            .outputs([("vec", out)]);
        out
    }

    fn skin_vertex(&mut self) -> NodeId {
        if let Some(out) = self.graph.variable("skinVertex") {
            return out;
        }
        let input = self.morph_vertex();
        if self.attributes.skinning.is_none() {
            return input;
        }
        self.skin_transform(MatrixMult::position(), input, "skinVertex")
    }

    fn skin_normal(&mut self) -> NodeId {
        if let Some(out) = self.graph.variable("skinNormal") {
            return out;
        }
        let input = self.morph_normal();
        if self.attributes.skinning.is_none() {
            return input;
        }
        self.skin_transform(MatrixMult::direction(), input, "skinNormal")
    }

    fn skin_tangent(&mut self) -> NodeId {
        if let Some(out) = self.graph.variable("skinTangent") {
            return out;
        }
        let input = self.morph_tangent();
        if self.attributes.skinning.is_none() {
            return input;
        }
        self.skin_transform(MatrixMult::direction(), input, "skinTangent")
    }

    // ========================================================================
    // Morphing
    // ========================================================================

    fn has_morph_target(&self, name: &str) -> bool {
        self.attributes
            .morph
            .is_some_and(|morph| morph.target_count > 0 && morph.has_target(name))
    }

    /// `Tangent_i` targets keep their `w`, the others are `vec3`.
    fn morph_target(&mut self, name: &str, index: u32) -> NodeId {
        let ty = if name.contains("Tangent") { "vec4" } else { "vec3" };
        self.graph.get_or_create_attribute(ty, &format!("{name}_{index}"))
    }

    fn morph_transform(&mut self, attribute: &str, input: NodeId, output: NodeId) -> NodeId {
        let weights = self.graph.get_or_create_uniform("vec4", "uTargetWeights");
        let mut inputs = vec![("vertex".to_string(), input), ("weights".to_string(), weights)];

        let count = self
            .attributes
            .morph
            .map_or(0, |morph| morph.target_count.min(MAX_MORPH_TARGETS));
        for i in 0..count {
            inputs.push((format!("target{i}"), self.morph_target(attribute, i)));
        }

        self.graph
            .node(NodeKind::Morph)
            .inputs(inputs)
            .outputs([("out", output)]);
        output
    }

    fn morph_chain(&mut self, attribute: &str, ty: &str, cache: &str) -> NodeId {
        if let Some(out) = self.graph.variable(cache) {
            return out;
        }
        let input = self.graph.get_or_create_attribute(ty, attribute);
        if !self.has_morph_target(attribute) {
            return input;
        }
        let out = self.graph.create_variable("vec3", Some(cache));
        self.morph_transform(attribute, input, out)
    }

    fn morph_vertex(&mut self) -> NodeId {
        self.morph_chain("Vertex", "vec3", "morphVertex")
    }

    fn morph_normal(&mut self) -> NodeId {
        self.morph_chain("Normal", "vec3", "morphNormal")
    }

    fn morph_tangent(&mut self) -> NodeId {
        self.morph_chain("Tangent", "vec4", "morphTangent")
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::shader::graph::ShaderStage;
    use crate::state::attributes::{MorphAttribute, SkinningAttribute, StateAttribute};

    fn fragment_with(varyings: &[(&str, &str)]) -> ShaderGraph {
        let mut fragment = ShaderGraph::new(ShaderStage::Fragment);
        for (ty, name) in varyings {
            fragment.get_or_create_varying(ty, name);
        }
        fragment
    }

    fn build(attributes: &[Rc<StateAttribute>], fragment: &ShaderGraph) -> (ShaderGraph, Vec<NodeId>) {
        let ctx = CompilerContext::default();
        let active = ActiveAttributes::collect(attributes, &[]);
        VertexBuilder::new(&active, fragment, &ctx).build()
    }

    #[test]
    fn roots_start_with_point_size_and_position() {
        let fragment = fragment_with(&[("vec3", "vViewNormal"), ("vec2", "vTexCoord0")]);
        let (graph, roots) = build(&[], &fragment);

        assert_eq!(graph.get(roots[0]).type_name(), "glPointSize");
        assert_eq!(graph.get(roots[1]).type_name(), "glPosition");
        assert_eq!(roots.len(), 5);
        assert!(graph.variable("TexCoord0").is_some());
        assert!(graph.variable("viewNormal").is_some());
        // Unskinned normals are used as is.
        assert!(graph.variable("localNormal").is_none());
    }

    #[test]
    fn skinning_inserts_bone_matrix() {
        let attributes = vec![Rc::new(SkinningAttribute::new(Some(60)).into())];
        let fragment = fragment_with(&[("vec3", "vViewNormal")]);
        let (graph, _) = build(&attributes, &fragment);

        for name in ["boneMatrix", "skinVertex", "skinNormal", "localNormal", "Weights", "Bones"] {
            assert!(graph.variable(name).is_some(), "{name} missing");
        }
        let palette = graph.variable("uBones").map(|id| graph.get(id));
        assert_eq!(
            palette.and_then(|n| n.kind.as_variable()).and_then(|v| v.size),
            Some(60)
        );
    }

    #[test]
    fn morph_targets_follow_attribute_names() {
        let morph = MorphAttribute::new(2).with_target_names(["Vertex"]);
        let attributes = vec![Rc::new(morph.into())];
        let (graph, _) = build(&attributes, &fragment_with(&[]));

        assert!(graph.variable("morphVertex").is_some());
        assert!(graph.variable("Vertex_1").is_some());
        assert!(graph.variable("Vertex_2").is_none());
    }
}
