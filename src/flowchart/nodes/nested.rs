//! NestedFlowchartNode: loads a flowchart file and runs it as a sub-graph.
//!
//! The child graph is built with the registers of the manager running this
//! node, so plugin node kinds resolve inside it too. The child is loaded
//! once per path and re-run on every process; a change of the `path`
//! parameter forces a reload. A `path` input, when it holds a value, wins
//! over the parameter. Relative paths resolve against the working directory.

use crate::flowchart::error::ProcessingError;
use crate::flowchart::manager::NodeManager;
use crate::flowchart::node::{Node, ProcessContext};
use crate::flowchart::parameter::{Parameter, ParameterSet};
use crate::flowchart::report::RunReport;
use crate::flowchart::terminal::TerminalSpec;
use crate::flowchart::value::TerminalType;
use std::cell::Cell;
use std::path::{Path, PathBuf};

/// Nesting depth past which a chain of nested flowcharts is treated as a loop.
pub const MAX_NESTING_DEPTH: usize = 16;

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Counts one level of nesting on the current thread while alive.
struct DepthGuard;

impl DepthGuard {
    fn enter() -> Option<Self> {
        DEPTH.with(|depth| {
            if depth.get() >= MAX_NESTING_DEPTH {
                return None;
            }
            depth.set(depth.get() + 1);
            Some(DepthGuard)
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

#[derive(Debug, Default)]
pub struct NestedFlowchartNode {
    child: Option<(PathBuf, NodeManager)>,
    last_report: Option<RunReport>,
}

impl NestedFlowchartNode {
    /// The loaded child graph, for reading its nodes' outputs.
    pub fn child(&self) -> Option<&NodeManager> {
        self.child.as_ref().map(|(_, manager)| manager)
    }

    /// Path the child graph was loaded from.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.child.as_ref().map(|(path, _)| path.as_path())
    }

    /// Report of the child's last run.
    pub fn last_report(&self) -> Option<&RunReport> {
        self.last_report.as_ref()
    }

    fn load(path: &Path, ctx: &ProcessContext<'_>) -> Result<NodeManager, ProcessingError> {
        let child = NodeManager::load_json(path, ctx.registers()).map_err(|err| {
            ProcessingError::failed(format!("cannot load {}: {}", path.display(), err))
        })?;
        tracing::debug!(
            "Loaded nested flowchart {} ({} nodes)",
            path.display(),
            child.node_count()
        );
        Ok(child)
    }
}

impl Node for NestedFlowchartNode {
    fn declare_terminals(&self, spec: &mut TerminalSpec) {
        spec.input("path", TerminalType::Path)
            .output("ok", TerminalType::Bool);
    }

    fn declare_parameters(&self, params: &mut ParameterSet) {
        params.add("path", Parameter::path("", "Flowchart"));
    }

    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<(), ProcessingError> {
        let path = match ctx.input_opt("path")?.and_then(|v| v.as_path()) {
            Some(p) => p.to_path_buf(),
            None => ctx
                .params()
                .path("path")
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        };
        if path.as_os_str().is_empty() {
            return Err(ProcessingError::failed("no flowchart path set"));
        }
        let _depth = DepthGuard::enter().ok_or_else(|| {
            ProcessingError::failed(format!(
                "flowcharts nested deeper than {} levels",
                MAX_NESTING_DEPTH
            ))
        })?;

        let manager = match self.child.take() {
            Some((loaded, manager)) if loaded == path => manager,
            _ => {
                self.last_report = None;
                Self::load(&path, ctx)?
            }
        };
        let (path, child) = self.child.insert((path, manager));

        let report = child.run_all().map_err(|err| {
            ProcessingError::failed(format!("nested flowchart {}: {}", path.display(), err))
        })?;
        if !report.is_success() {
            tracing::warn!("Nested flowchart {}: {}", path.display(), report);
        }
        let ok = report.is_success();
        self.last_report = Some(report);
        ctx.set_output("ok", ok)
    }

    fn on_change_parameter(&mut self, name: &str, _params: &ParameterSet) {
        if name == "path" {
            self.child = None;
            self.last_report = None;
        }
    }
}
