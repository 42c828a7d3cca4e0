//! Compiler context: everything one family of compiled programs shares.

use super::factory::NodeFactory;
use super::processor::ShaderProcessor;
use crate::settings::CompilerSettings;
use crate::state::attributes::BoneLimits;

/// Owns the node registry, the GLSL library, the settings and the bone
/// palette limits. Create one per renderer and hand it to every compile.
#[derive(Debug)]
pub struct CompilerContext {
    settings: CompilerSettings,
    factory: NodeFactory,
    processor: ShaderProcessor,
    bone_limits: BoneLimits,
}

impl Default for CompilerContext {
    fn default() -> Self {
        Self::new(CompilerSettings::default())
    }
}

impl CompilerContext {
    #[must_use]
    pub fn new(settings: CompilerSettings) -> Self {
        crate::utils::interner::preload_common_macros();
        let bone_limits = BoneLimits::new(settings.max_bone_uniform_allowed);
        Self {
            settings,
            factory: NodeFactory::new(),
            processor: ShaderProcessor::new(),
            bone_limits,
        }
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &CompilerSettings {
        &self.settings
    }

    #[inline]
    #[must_use]
    pub fn factory(&self) -> &NodeFactory {
        &self.factory
    }

    /// Register custom node types here.
    #[inline]
    pub fn factory_mut(&mut self) -> &mut NodeFactory {
        &mut self.factory
    }

    #[inline]
    #[must_use]
    pub fn processor(&self) -> &ShaderProcessor {
        &self.processor
    }

    #[inline]
    pub fn processor_mut(&mut self) -> &mut ShaderProcessor {
        &mut self.processor
    }

    #[inline]
    #[must_use]
    pub fn bone_limits(&self) -> &BoneLimits {
        &self.bone_limits
    }
}
