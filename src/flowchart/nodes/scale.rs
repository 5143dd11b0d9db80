//! ScaleNode: multiplies every value of a scalar sequence by a factor.

use crate::flowchart::error::ProcessingError;
use crate::flowchart::node::{Node, ProcessContext};
use crate::flowchart::parameter::{Parameter, ParameterSet};
use crate::flowchart::terminal::TerminalSpec;
use crate::flowchart::value::TerminalType;

/// `out = in * scale`.
#[derive(Debug, Default)]
pub struct ScaleNode;

impl ScaleNode {
    pub const DEFAULT_SCALE: f32 = 2.0;
}

impl Node for ScaleNode {
    fn declare_terminals(&self, spec: &mut TerminalSpec) {
        spec.input("in", TerminalType::ScalarSeq)
            .output("out", TerminalType::ScalarSeq);
    }

    fn declare_parameters(&self, params: &mut ParameterSet) {
        params.add("scale", Parameter::float(Self::DEFAULT_SCALE, "Scale factor"));
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<(), ProcessingError> {
        let scale = ctx.params().float("scale").unwrap_or(Self::DEFAULT_SCALE);
        let scaled: Vec<f32> = ctx.input_scalars("in")?.iter().map(|v| v * scale).collect();
        ctx.set_output("out", scaled)
    }
}
