//! Fragment graph of the shadow-map depth pass.
//!
//! The depth is taken from the view-space vertex and encoded by
//! `computeShadowDepth` for the algorithm and precision of the cast
//! attribute. Materials, lights and textures play no part.

use super::ActiveAttributes;
use crate::shader::graph::{ShaderGraph, ShaderStage};
use crate::shader::node::{BuiltinOutput, NodeId, NodeKind};
use crate::state::attributes::ShadowCastAttribute;

pub(super) struct ShadowCastBuilder<'s, 'a> {
    attributes: &'s ActiveAttributes<'a>,
    cast: &'a ShadowCastAttribute,
    graph: ShaderGraph,
}

impl<'s, 'a> ShadowCastBuilder<'s, 'a> {
    pub(super) fn new(attributes: &'s ActiveAttributes<'a>, cast: &'a ShadowCastAttribute) -> Self {
        Self {
            attributes,
            cast,
            graph: ShaderGraph::new(ShaderStage::Fragment),
        }
    }

    pub(super) fn build(mut self) -> (ShaderGraph, Vec<NodeId>) {
        let frag_color = self.graph.node(NodeKind::Output(BuiltinOutput::FragColor)).id();
        self.cast_depth(frag_color);

        let define = self
            .graph
            .node(NodeKind::Define {
                name: "SHADER_NAME".to_string(),
                value: self.attributes.program_name().to_string(),
            })
            .id();
        (self.graph, vec![frag_color, define])
    }

    fn cast_depth(&mut self, out: NodeId) {
        let exponent0 = self.graph.get_or_create_uniform("float", "exponent0");
        let exponent1 = self.graph.get_or_create_uniform("float", "exponent1");
        let depth_range = self.graph.get_or_create_uniform("vec4", "uShadowDepthRange");
        let frag_eye = self.graph.get_or_create_varying("vec4", "vViewVertex");

        self.graph
            .node(NodeKind::ShadowCast(self.cast.config))
            .inputs([
                ("exponent0", exponent0),
                ("exponent1", exponent1),
                ("shadowDepthRange", depth_range),
                ("fragEye", frag_eye),
            ])
            .outputs([("color", out)]);
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::shader::compiler::compile;
    use crate::shader::context::CompilerContext;
    use crate::state::attributes::{ShadowAlgorithm, ShadowConfig, StateAttribute};

    #[test]
    fn esm_cast_passes_exponents() {
        let attributes: Vec<Rc<StateAttribute>> = vec![Rc::new(
            ShadowCastAttribute::new(ShadowConfig {
                algorithm: ShadowAlgorithm::Esm,
                ..ShadowConfig::default()
            })
            .into(),
        )];
        let active = ActiveAttributes::collect(&attributes, &[]);
        let Some(cast) = active.shadow_cast else {
            panic!("cast attribute not routed");
        };

        let (graph, roots) = ShadowCastBuilder::new(&active, cast).build();
        assert_eq!(graph.varyings().len(), 1);

        let shader = compile(&graph, &roots, &CompilerContext::default());
        assert!(shader.is_valid(), "{:?}", shader.diagnostics);
        assert!(shader.source.contains("#define _ESM"));
        assert!(shader.source.contains("uniform vec4 uShadowDepthRange;"));
        assert!(shader.source.contains("varying vec4 vViewVertex;"));
        assert!(shader.source.contains("computeShadowDepth( vViewVertex, uShadowDepthRange, exponent0, exponent1 )"));
    }
}
