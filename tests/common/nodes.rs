//! Node kinds used by the integration tests

use flowgraph_rs::flowchart::{Reaction, Terminal};
use flowgraph_rs::{
    Node, Parameter, ParameterSet, ProcessContext, ProcessingError, TerminalSpec, TerminalType,
};

pub const SOURCE_VALUES: [f32; 3] = [1.0, 5.5, 10.0];

/// No inputs; emits a fixed scalar sequence.
pub struct SourceNode {
    pub values: Vec<f32>,
    pub runs: usize,
}

impl Default for SourceNode {
    fn default() -> Self {
        Self {
            values: SOURCE_VALUES.to_vec(),
            runs: 0,
        }
    }
}

impl Node for SourceNode {
    fn declare_terminals(&self, spec: &mut TerminalSpec) {
        spec.output("out", TerminalType::ScalarSeq);
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<(), ProcessingError> {
        self.runs += 1;
        ctx.set_output("out", self.values.clone())
    }
}

/// Scales its input by the `scale` parameter.
#[derive(Default)]
pub struct TransformNode {
    pub runs: usize,
    pub param_changes: Vec<String>,
}

impl Node for TransformNode {
    fn declare_terminals(&self, spec: &mut TerminalSpec) {
        spec.input("in", TerminalType::ScalarSeq)
            .output("out", TerminalType::ScalarSeq);
    }

    fn declare_parameters(&self, params: &mut ParameterSet) {
        params
            .add("scale", Parameter::float(2.0, "Scale"))
            .add("limit", Parameter::bounded_float(1.0, 0.0, 10.0, "Limit"));
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<(), ProcessingError> {
        self.runs += 1;
        let scale = ctx.params().float("scale").unwrap_or(1.0);
        let out: Vec<f32> = ctx.input_scalars("in")?.iter().map(|v| v * scale).collect();
        ctx.set_output("out", out)
    }

    fn on_change_parameter(&mut self, name: &str, _params: &ParameterSet) {
        self.param_changes.push(name.to_string());
    }
}

/// Adds two scalar sequences element-wise.
#[derive(Default)]
pub struct MergeNode {
    pub runs: usize,
}

impl Node for MergeNode {
    fn declare_terminals(&self, spec: &mut TerminalSpec) {
        spec.input("a", TerminalType::ScalarSeq)
            .input("b", TerminalType::ScalarSeq)
            .output("out", TerminalType::ScalarSeq);
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<(), ProcessingError> {
        self.runs += 1;
        let a = ctx.input_scalars("a")?;
        let b = ctx.input_scalars("b")?;
        let out: Vec<f32> = a.iter().zip(b).map(|(x, y)| x + y).collect();
        ctx.set_output("out", out)
    }
}

/// Stores the last value it saw, both from pushes and from `process()`.
#[derive(Default)]
pub struct SinkNode {
    pub last: Option<Vec<f32>>,
    pub runs: usize,
    pub pushes: usize,
    pub clears: usize,
}

impl Node for SinkNode {
    fn declare_terminals(&self, spec: &mut TerminalSpec) {
        spec.input("in", TerminalType::ScalarSeq);
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<(), ProcessingError> {
        self.runs += 1;
        self.last = Some(ctx.input_scalars("in")?.to_vec());
        Ok(())
    }

    fn on_push(&mut self, input: &Terminal) -> Reaction {
        self.pushes += 1;
        self.last = input.value().and_then(|v| v.as_scalars()).map(<[f32]>::to_vec);
        Reaction::MarkDirty
    }

    fn on_clear(&mut self, _input: &Terminal) {
        self.clears += 1;
        self.last = None;
    }
}

/// Always fails.
#[derive(Default)]
pub struct FailingNode {
    pub runs: usize,
}

impl Node for FailingNode {
    fn declare_terminals(&self, spec: &mut TerminalSpec) {
        spec.input("in", TerminalType::ScalarSeq)
            .output("out", TerminalType::ScalarSeq);
    }

    fn process(&mut self, _ctx: &mut ProcessContext<'_>) -> Result<(), ProcessingError> {
        self.runs += 1;
        Err(ProcessingError::failed("sensor offline"))
    }
}

/// One input and one output of a single terminal type, used to exercise
/// connection type checks.
pub struct PassNode {
    pub ty: TerminalType,
}

impl Node for PassNode {
    fn declare_terminals(&self, spec: &mut TerminalSpec) {
        spec.input("in", self.ty.clone())
            .output("out", self.ty.clone());
    }

    fn process(&mut self, _ctx: &mut ProcessContext<'_>) -> Result<(), ProcessingError> {
        Ok(())
    }
}
