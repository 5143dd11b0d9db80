//! Flowchart-specific error types.

use crate::flowchart::id::NodeId;
use crate::flowchart::terminal::Direction;
use crate::flowchart::value::TerminalType;
use thiserror::Error;

/// Structural errors returned synchronously by graph mutations and lookups.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: TerminalType,
        found: TerminalType,
    },

    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("Node {node} has no {direction} terminal '{terminal}'")]
    UnknownTerminal {
        node: NodeId,
        terminal: String,
        direction: Direction,
    },

    #[error("Input {node}.{terminal} is already connected")]
    InputAlreadyConnected { node: NodeId, terminal: String },

    #[error("Input {node}.{terminal} is not connected")]
    NotConnected { node: NodeId, terminal: String },

    #[error("Connecting {from} -> {to} would create a cycle")]
    CycleDetected { from: NodeId, to: NodeId },

    #[error("Node id already in use: {0}")]
    DuplicateNodeId(NodeId),

    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("Node type '{type_name}' is provided by several registers: {}", registers.join(", "))]
    AmbiguousNodeType {
        type_name: String,
        registers: Vec<String>,
    },

    #[error("Node type '{type_name}' registered twice in register '{register}'")]
    DuplicateNodeType { register: String, type_name: String },

    #[error("Node {node} has no parameter '{parameter}'")]
    UnknownParameter { node: NodeId, parameter: String },

    #[error("Parameter {node}.{parameter}: {source}")]
    Parameter {
        node: NodeId,
        parameter: String,
        #[source]
        source: ParameterError,
    },

    #[error("Unknown global parameter: {0}")]
    UnknownGlobal(String),

    #[error("Global parameter already bound: {0}")]
    DuplicateGlobal(String),
}

/// Rejections from setting a parameter. The previous value is always kept.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("cannot parse '{raw}' as {expected}")]
    Parse { raw: String, expected: &'static str },

    #[error("value {value} outside [{min}, {max}]")]
    OutOfRange { value: String, min: String, max: String },

    #[error("range lower bound {lo} exceeds upper bound {hi}")]
    InvalidRange { lo: String, hi: String },

    #[error("expected a {expected} value, found {found}")]
    KindMismatch {
        expected: &'static str,
        found: String,
    },
}

/// Failure of a node's `process()`; recorded per node during a run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessingError {
    #[error("input '{0}' holds no value")]
    MissingInput(String),

    #[error("no terminal named '{0}'")]
    UnknownTerminal(String),

    #[error("terminal '{terminal}' expects {expected}, got {found}")]
    TypeMismatch {
        terminal: String,
        expected: TerminalType,
        found: TerminalType,
    },

    #[error("could not deliver '{output}' to {to_node}.{to_terminal}: {source}")]
    Propagation {
        output: String,
        to_node: NodeId,
        to_terminal: String,
        #[source]
        source: GraphError,
    },

    #[error("{0}")]
    Failed(String),
}

impl ProcessingError {
    pub fn failed(message: impl Into<String>) -> Self {
        ProcessingError::Failed(message.into())
    }
}

/// Errors that abort loading a persisted flowchart.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid flowchart JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Node '{id}': {source}")]
    Node {
        id: NodeId,
        #[source]
        source: GraphError,
    },

    #[error("Connection {from_node}.{from_terminal} -> {to_node}.{to_terminal}: {source}")]
    Connection {
        from_node: NodeId,
        from_terminal: String,
        to_node: NodeId,
        to_terminal: String,
        #[source]
        source: GraphError,
    },

    #[error("Parameter {node}.{parameter}: {source}")]
    Parameter {
        node: NodeId,
        parameter: String,
        #[source]
        source: GraphError,
    },

    #[error("Global '{name}': {source}")]
    Global {
        name: String,
        #[source]
        source: GraphError,
    },
}

pub type GraphResult<T> = std::result::Result<T, GraphError>;
