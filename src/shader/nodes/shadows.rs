//! Shadow receiving and casting nodes.
//!
//! Constructor arguments: `[algorithm, kernel, precision, fake_pcf,
//! rotate_offset]`, all optional.

use super::NodeView;
use crate::shader::diagnostic::Diagnostic;
use crate::shader::factory::{NodeArg, NodeConstructor, optional_string_arg};
use crate::shader::node::NodeKind;
use crate::state::attributes::{PcfKernel, ShadowAlgorithm, ShadowConfig, ShadowPrecision};

pub const NODES: &[(&str, NodeConstructor)] = &[
    ("ShadowReceive", |args| Ok(NodeKind::ShadowReceive(config("ShadowReceive", args)?))),
    ("ShadowCast", |args| Ok(NodeKind::ShadowCast(config("ShadowCast", args)?))),
];

fn config(node: &str, args: &[NodeArg]) -> Result<ShadowConfig, Diagnostic> {
    let invalid = |reason: String| Diagnostic::InvalidArguments {
        name: node.to_string(),
        reason,
    };

    let mut config = ShadowConfig::default();
    if let Some(name) = optional_string_arg(args, 0) {
        config.algorithm =
            ShadowAlgorithm::parse(name).ok_or_else(|| invalid(format!("unknown shadow algorithm {name}")))?;
    }
    if let Some(name) = optional_string_arg(args, 1) {
        config.kernel = PcfKernel::parse(name);
    }
    if let Some(name) = optional_string_arg(args, 2) {
        config.precision =
            ShadowPrecision::parse(name).ok_or_else(|| invalid(format!("unknown shadow precision {name}")))?;
    }
    if let Some(fake_pcf) = args.get(3).and_then(NodeArg::as_bool) {
        config.fake_pcf = fake_pcf;
    }
    if let Some(rotate) = args.get(4).and_then(NodeArg::as_bool) {
        config.rotate_offset = rotate;
    }
    Ok(config)
}

const RECEIVE_INPUTS: &[&str] = &[
    "lighted",
    "shadowTexture",
    "shadowTextureMapSize",
    "shadowTextureProjectionMatrix",
    "shadowTextureViewMatrix",
    "shadowTextureDepthRange",
    "lightNDL",
    "vertexWorld",
    "shadowbias",
];

pub(crate) const CAST_INPUTS: &[&str] = &["exponent0", "exponent1", "shadowDepthRange", "fragEye"];

/// Algorithm specific ports, appended to the call in this order.
fn receive_extra_inputs(algorithm: ShadowAlgorithm) -> &'static [&'static str] {
    match algorithm {
        ShadowAlgorithm::Esm => &["shadowexponent0", "shadowexponent1"],
        ShadowAlgorithm::Evsm => &["shadowepsilonVSM", "shadowexponent0", "shadowexponent1"],
        ShadowAlgorithm::Vsm => &["shadowepsilonVSM"],
        ShadowAlgorithm::None | ShadowAlgorithm::Pcf => &[],
    }
}

pub(crate) fn receive_inputs(config: &ShadowConfig) -> Vec<&'static str> {
    RECEIVE_INPUTS
        .iter()
        .chain(receive_extra_inputs(config.algorithm))
        .copied()
        .collect()
}

pub(crate) fn receive(view: &NodeView<'_>, config: &ShadowConfig) -> Result<String, Diagnostic> {
    let out = view.output("float")?;
    let args = receive_inputs(config)
        .into_iter()
        .map(|port| view.input(port).map(|op| op.to_string()))
        .collect::<Result<Vec<_>, Diagnostic>>()?;
    Ok(view.call_function("computeShadow", out.name, &args))
}

pub(crate) fn cast(view: &NodeView<'_>, config: &ShadowConfig) -> Result<String, Diagnostic> {
    let out = view.output("color")?;
    let mut args = vec![
        view.input("fragEye")?.to_string(),
        view.input("shadowDepthRange")?.to_string(),
    ];
    if !matches!(config.algorithm, ShadowAlgorithm::None | ShadowAlgorithm::Pcf) {
        args.push(view.input("exponent0")?.to_string());
        args.push(view.input("exponent1")?.to_string());
    }
    Ok(view.call_function("computeShadowDepth", out.name, &args))
}
