use std::rc::Rc;

use glam::Mat4;

use crate::core::BoundingSphere;
use crate::shader::generator::ShaderProgram;
use crate::state::attributes::StateAttribute;
use crate::state::uniform::UniformValue;

/// A drawable recorded on a StateGraph node.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderLeaf {
    /// Caller-side handle of the geometry to draw.
    pub drawable: u64,
    pub model_matrix: Mat4,
    /// World-space bounds, used for culling.
    pub bounds: BoundingSphere,
    /// Squared distance to the eye.
    pub distance_sq: f32,
}

impl RenderLeaf {
    #[must_use]
    pub fn new(drawable: u64, model_matrix: Mat4, bounds: BoundingSphere) -> Self {
        Self {
            drawable,
            model_matrix,
            bounds,
            distance_sq: 0.0,
        }
    }
}

/// The graphics API behind [`State::apply`](crate::state::State::apply) and
/// [`RenderBin::draw`](super::RenderBin::draw).
pub trait GraphicsContext {
    /// `unit` is set for per-texture-unit attributes.
    fn apply_attribute(&mut self, attribute: &Rc<StateAttribute>, unit: Option<u32>);

    fn set_uniform(&mut self, name: &str, value: &UniformValue);

    fn use_program(&mut self, program: &Rc<ShaderProgram>);

    fn draw(&mut self, leaf: &RenderLeaf);
}
