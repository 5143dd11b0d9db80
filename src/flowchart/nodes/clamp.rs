//! ClampNode: optionally limits a scalar sequence to a range.
//!
//! The `range` parameter is only shown while `enabled` is on; when off the
//! input passes through unchanged.

use crate::flowchart::error::ProcessingError;
use crate::flowchart::node::{Node, ProcessContext};
use crate::flowchart::parameter::{Parameter, ParameterSet};
use crate::flowchart::terminal::TerminalSpec;
use crate::flowchart::value::TerminalType;

#[derive(Debug, Default)]
pub struct ClampNode;

impl Node for ClampNode {
    fn declare_terminals(&self, spec: &mut TerminalSpec) {
        spec.input("in", TerminalType::ScalarSeq)
            .output("out", TerminalType::ScalarSeq);
    }

    fn declare_parameters(&self, params: &mut ParameterSet) {
        params
            .add("enabled", Parameter::boolean(false, "Clamp values"))
            .add(
                "range",
                Parameter::float_range(0.0, 1.0, "Range")
                    .visible_when(|p| p.boolean("enabled") == Some(true)),
            );
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<(), ProcessingError> {
        let values = ctx.input_scalars("in")?;
        let out: Vec<f32> = match (
            ctx.params().boolean("enabled"),
            ctx.params().float_range("range"),
        ) {
            (Some(true), Some((lo, hi))) => values.iter().map(|v| v.clamp(lo, hi)).collect(),
            _ => values.to_vec(),
        };
        ctx.set_output("out", out)
    }

    fn on_change_parameter(&mut self, name: &str, params: &ParameterSet) {
        if name == "enabled" {
            tracing::debug!(
                "Clamp {}",
                if params.boolean("enabled") == Some(true) {
                    "enabled"
                } else {
                    "disabled"
                }
            );
        }
    }
}
