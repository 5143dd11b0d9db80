//! CollectNode: sink that keeps the last scalar sequence it received.
//!
//! The value is captured reactively in `on_push`, so the sink is up to
//! date as soon as an upstream node propagates, without a re-process.

use crate::flowchart::error::ProcessingError;
use crate::flowchart::node::{Node, ProcessContext, Reaction};
use crate::flowchart::terminal::{Terminal, TerminalSpec};
use crate::flowchart::value::TerminalType;

#[derive(Debug, Default)]
pub struct CollectNode {
    last: Option<Vec<f32>>,
    pushes: usize,
}

impl CollectNode {
    /// Last value seen, `None` before the first push or after a clear.
    pub fn last(&self) -> Option<&[f32]> {
        self.last.as_deref()
    }

    /// Number of values received through `on_push`.
    pub fn pushes(&self) -> usize {
        self.pushes
    }
}

impl Node for CollectNode {
    fn declare_terminals(&self, spec: &mut TerminalSpec) {
        spec.input("in", TerminalType::ScalarSeq);
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<(), ProcessingError> {
        self.last = ctx
            .input_opt("in")?
            .and_then(|v| v.as_scalars())
            .map(<[f32]>::to_vec);
        Ok(())
    }

    fn on_push(&mut self, input: &Terminal) -> Reaction {
        self.last = input.value().and_then(|v| v.as_scalars()).map(<[f32]>::to_vec);
        self.pushes += 1;
        Reaction::Handled
    }

    fn on_clear(&mut self, _input: &Terminal) {
        self.last = None;
    }
}
