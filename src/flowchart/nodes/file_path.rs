//! FilePathNode: exposes its `path` parameter as a `Path` output.

use crate::flowchart::error::ProcessingError;
use crate::flowchart::node::{Node, ProcessContext};
use crate::flowchart::parameter::{Parameter, ParameterSet};
use crate::flowchart::terminal::TerminalSpec;
use crate::flowchart::value::TerminalType;

#[derive(Debug, Default)]
pub struct FilePathNode;

impl Node for FilePathNode {
    fn declare_terminals(&self, spec: &mut TerminalSpec) {
        spec.output("path", TerminalType::Path);
    }

    fn declare_parameters(&self, params: &mut ParameterSet) {
        params.add("path", Parameter::path("", "File"));
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<(), ProcessingError> {
        let path = match ctx.params().path("path") {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => return Err(ProcessingError::failed("no file path set")),
        };
        ctx.set_output("path", path)
    }
}
