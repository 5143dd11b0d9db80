//! Node abstraction for the flowchart engine.
//!
//! A node kind is any type implementing [`Node`]. The manager owns the
//! terminals and parameters a node declares at construction and lends them
//! back through [`ProcessContext`] during `process()`, so a node can only
//! write its own outputs.
//!
//! Built-in and plugin node kinds go through the same trait object; kinds
//! are told apart by the type name they were registered under, not by a
//! shared root type.

use crate::flowchart::error::{GraphError, ProcessingError};
use crate::flowchart::parameter::ParameterSet;
use crate::flowchart::register::NodeRegisterMap;
use crate::flowchart::terminal::{Terminal, TerminalMap, TerminalSpec};
use crate::flowchart::value::{TerminalType, Value};
use std::any::Any;
use std::fmt;

/// Upcast helper so `dyn Node` can be downcast to its concrete kind.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// What a node wants after one of its inputs received a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    /// Schedule the node for the next dirty run.
    MarkDirty,
    /// The node updated its own derived state; no re-process needed.
    Handled,
}

/// Lifecycle state of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeState {
    Created,
    /// Terminals declared, not executed yet.
    Ready,
    Processing,
    /// Outputs valid.
    Done,
    /// `process()` failed; outputs are stale.
    Error(String),
    /// Skipped because an upstream node failed or was skipped.
    Unresolved,
}

impl NodeState {
    /// Whether downstream nodes may consume this node's outputs.
    pub fn is_blocking(&self) -> bool {
        matches!(self, NodeState::Error(_) | NodeState::Unresolved)
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeState::Created => f.write_str("created"),
            NodeState::Ready => f.write_str("ready"),
            NodeState::Processing => f.write_str("processing"),
            NodeState::Done => f.write_str("done"),
            NodeState::Error(msg) => write!(f, "error: {}", msg),
            NodeState::Unresolved => f.write_str("unresolved"),
        }
    }
}

/// View of a node's terminals and parameters handed to `process()`,
/// plus the registers of the manager running it.
pub struct ProcessContext<'a> {
    inputs: &'a TerminalMap,
    outputs: &'a mut TerminalMap,
    params: &'a ParameterSet,
    registers: &'a NodeRegisterMap,
}

impl<'a> ProcessContext<'a> {
    pub fn new(
        inputs: &'a TerminalMap,
        outputs: &'a mut TerminalMap,
        params: &'a ParameterSet,
        registers: &'a NodeRegisterMap,
    ) -> Self {
        Self {
            inputs,
            outputs,
            params,
            registers,
        }
    }

    /// Current value of an input; fails when the input is empty.
    pub fn input(&self, name: &str) -> Result<&Value, ProcessingError> {
        self.input_opt(name)?
            .ok_or_else(|| ProcessingError::MissingInput(name.to_string()))
    }

    /// Current value of an input, `None` while empty.
    pub fn input_opt(&self, name: &str) -> Result<Option<&Value>, ProcessingError> {
        self.inputs
            .get(name)
            .map(Terminal::value)
            .ok_or_else(|| ProcessingError::UnknownTerminal(name.to_string()))
    }

    /// Scalar sequence held by a `ScalarSeq` input.
    pub fn input_scalars(&self, name: &str) -> Result<&[f32], ProcessingError> {
        let value = self.input(name)?;
        value
            .as_scalars()
            .ok_or_else(|| ProcessingError::TypeMismatch {
                terminal: name.to_string(),
                expected: TerminalType::ScalarSeq,
                found: value.terminal_type(),
            })
    }

    /// Write one of this node's outputs.
    pub fn set_output(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ProcessingError> {
        let terminal = self
            .outputs
            .get_mut(name)
            .ok_or_else(|| ProcessingError::UnknownTerminal(name.to_string()))?;
        terminal.set(value.into()).map_err(|err| match err {
            GraphError::TypeMismatch { expected, found } => ProcessingError::TypeMismatch {
                terminal: name.to_string(),
                expected,
                found,
            },
            other => ProcessingError::failed(other.to_string()),
        })
    }

    pub fn params(&self) -> &ParameterSet {
        self.params
    }

    /// Registers of the running manager, for nodes that build sub-graphs.
    pub fn registers(&self) -> &NodeRegisterMap {
        self.registers
    }
}

/// Capability contract of every node kind.
pub trait Node: AsAny + Send {
    /// Declare input and output terminals. Called once at construction.
    fn declare_terminals(&self, spec: &mut TerminalSpec);

    /// Declare parameters with their defaults. Called once at construction.
    fn declare_parameters(&self, _params: &mut ParameterSet) {}

    /// Read inputs, compute, write outputs.
    fn process(&mut self, ctx: &mut ProcessContext<'_>) -> Result<(), ProcessingError>;

    /// An input received a new value.
    fn on_push(&mut self, _input: &Terminal) -> Reaction {
        Reaction::MarkDirty
    }

    /// An input lost its value (disconnect, or upstream produced nothing).
    fn on_clear(&mut self, _input: &Terminal) {}

    /// A parameter changed through `set_parameter` or a global override.
    fn on_change_parameter(&mut self, _name: &str, _params: &ParameterSet) {}

    /// Called once per frame before parameters are drawn.
    fn before_gui(&mut self) {}

    /// Node-specific controls.
    #[cfg(feature = "gui")]
    fn gui(&mut self, _ui: &mut egui::Ui) {}
}

impl<'a> dyn Node + 'a {
    /// Downcast to the concrete node kind.
    pub fn downcast_ref<T: Node>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Node>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}
