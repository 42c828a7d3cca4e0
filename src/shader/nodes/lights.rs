//! Per-light shading nodes backed by `lights.glsl`.
//!
//! Besides the shaded `color`, each call writes the light's eye-space
//! position and direction, `N.L` and a `lighted` flag into the variables
//! wired to the matching input ports, so a shadow node can reuse them.

use super::NodeView;
use crate::shader::diagnostic::Diagnostic;
use crate::shader::factory::NodeConstructor;
use crate::shader::node::{LightModel, NodeKind};

pub const NODES: &[(&str, NodeConstructor)] = &[
    ("PointLight", |_| Ok(NodeKind::Light(LightModel::Point))),
    ("SpotLight", |_| Ok(NodeKind::Light(LightModel::Spot))),
    ("SunLight", |_| Ok(NodeKind::Light(LightModel::Sun))),
    ("HemiLight", |_| Ok(NodeKind::Light(LightModel::Hemi))),
];

/// Port name and whether the argument is reduced to `.rgb`.
type Port = (&'static str, bool);

const POINT: &[Port] = &[
    ("normal", false),
    ("eyeVector", false),
    ("materialambient", true),
    ("materialdiffuse", true),
    ("materialspecular", true),
    ("materialshininess", false),
    ("lightambient", true),
    ("lightdiffuse", true),
    ("lightspecular", true),
    ("lightposition", false),
    ("lightattenuation", false),
    ("lightmatrix", false),
    ("lightEyePos", false),
    ("lightEyeDir", false),
    ("lightNDL", false),
    ("lighted", false),
];

const SPOT: &[Port] = &[
    ("normal", false),
    ("eyeVector", false),
    ("materialambient", true),
    ("materialdiffuse", true),
    ("materialspecular", true),
    ("materialshininess", false),
    ("lightambient", true),
    ("lightdiffuse", true),
    ("lightspecular", true),
    ("lightdirection", false),
    ("lightattenuation", false),
    ("lightposition", false),
    ("lightspotCutOff", false),
    ("lightspotBlend", false),
    ("lightmatrix", false),
    ("lightinvMatrix", false),
    ("lightEyePos", false),
    ("lightEyeDir", false),
    ("lightNDL", false),
    ("lighted", false),
];

const SUN: &[Port] = &[
    ("normal", false),
    ("eyeVector", false),
    ("materialambient", true),
    ("materialdiffuse", true),
    ("materialspecular", true),
    ("materialshininess", false),
    ("lightambient", true),
    ("lightdiffuse", true),
    ("lightspecular", true),
    ("lightposition", false),
    ("lightmatrix", false),
    ("lightEyeDir", false),
    ("lightNDL", false),
    ("lighted", false),
];

const HEMI: &[Port] = &[
    ("normal", false),
    ("eyeVector", false),
    ("materialdiffuse", true),
    ("materialspecular", true),
    ("materialshininess", false),
    ("lightdiffuse", true),
    ("lightground", true),
    ("lightposition", false),
    ("lightmatrix", false),
    ("lightEyeDir", false),
    ("lightNDL", false),
    ("lighted", false),
];

fn ports(model: LightModel) -> &'static [Port] {
    match model {
        LightModel::Point => POINT,
        LightModel::Spot => SPOT,
        LightModel::Sun => SUN,
        LightModel::Hemi => HEMI,
    }
}

pub(crate) fn required_inputs(model: LightModel) -> Vec<&'static str> {
    ports(model).iter().map(|(name, _)| *name).collect()
}

pub(crate) fn compute(view: &NodeView<'_>, model: LightModel) -> Result<String, Diagnostic> {
    let func = match model {
        LightModel::Point => "computePointLightShading",
        LightModel::Spot => "computeSpotLightShading",
        LightModel::Sun => "computeSunLightShading",
        LightModel::Hemi => "computeHemiLightShading",
    };
    let out = view.output("color")?;
    let args = ports(model)
        .iter()
        .map(|(port, rgb)| {
            let operand = view.input(port)?;
            Ok(if *rgb { operand.vec3() } else { operand.to_string() })
        })
        .collect::<Result<Vec<_>, Diagnostic>>()?;
    Ok(view.call_function(func, out.name, &args))
}
