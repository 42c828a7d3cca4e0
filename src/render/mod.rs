//! Render Bin
//!
//! Per-frame draw list over the StateGraph. Between two consecutive entries
//! only the StateSets that differ are popped and pushed, then the effective
//! state is applied and the entry's leaves are drawn.

mod context;

pub use context::{GraphicsContext, RenderLeaf};

use crate::core::BoundingSphere;
use crate::shader::generator::ShaderGenerator;
use crate::state::{State, StateGraph, StateGraphId};

/// Whether `bounds` falls outside `view`. Invalid bounds are always culled.
#[must_use]
pub fn cull(bounds: &BoundingSphere, view: &BoundingSphere) -> bool {
    !bounds.is_valid() || !view.intersects(bounds)
}

#[derive(Debug, Default)]
pub struct RenderBin {
    entries: Vec<StateGraphId>,
    view: Option<BoundingSphere>,
}

impl RenderBin {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a StateGraph node holding leaves. Entries are drawn in the
    /// order they were added.
    pub fn add(&mut self, id: StateGraphId) {
        self.entries.push(id);
    }

    /// Cull leaves against `view` while drawing. `None` draws everything.
    pub fn set_view(&mut self, view: Option<BoundingSphere>) {
        self.view = view;
    }

    #[must_use]
    pub fn entries(&self) -> &[StateGraphId] {
        &self.entries
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Draw every entry and return the number of leaves drawn.
    ///
    /// `state` is left as it was found: every StateSet pushed here is
    /// popped again once the last entry is drawn.
    pub fn draw(
        &self,
        graph: &StateGraph,
        state: &mut State,
        ctx: &mut impl GraphicsContext,
        generator: &mut ShaderGenerator,
    ) -> usize {
        let mut previous = None;
        let mut drawn = 0;

        for &id in &self.entries {
            let visible: Vec<_> = graph
                .leaves(id)
                .iter()
                .filter(|leaf| self.view.as_ref().is_none_or(|view| !cull(&leaf.bounds, view)))
                .collect();
            if visible.is_empty() {
                continue;
            }

            graph.move_state_graph(state, previous, id);
            previous = Some(id);
            state.apply(ctx, generator);

            for leaf in visible {
                ctx.draw(leaf);
                drawn += 1;
            }
        }

        if let Some(last) = previous {
            graph.pop_to_root(state, last);
        }
        drawn
    }
}
