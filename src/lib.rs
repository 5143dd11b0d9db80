//! # flowgraph-rs: flow-based programming engine
//!
//! Programs are graphs of typed nodes. Each node declares input and output
//! terminals plus user-tunable parameters; connections carry values from an
//! output to an input of the same type. A manager validates the graph,
//! orders it topologically and runs it either fully or incrementally from
//! a changed node.
//!
//! ## Architecture
//!
//! - **Engine** (`flowchart`): values, terminals, parameters, node trait,
//!   registers, connections, scheduling, execution and JSON persistence
//! - **Plugins** (`plugins`): node registers loaded from shared libraries
//!   via libloading
//! - **Config** (`config`): plugin folder lookup and TOML globals files
//! - **GUI hooks** (`gui`, feature `gui`): egui widgets for parameters
//!
//! ## Example
//!
//! ```ignore
//! use flowgraph_rs::{NodeManager, NodeRegisterMap, Value};
//!
//! let mut manager = NodeManager::new(&NodeRegisterMap::with_core());
//! let scale = manager.create_node("Scale")?;
//! let sink = manager.create_node("Collect")?;
//! manager.connect(&scale, "out", &sink, "in")?;
//! manager.set_input(&scale, "in", Value::ScalarSeq(vec![1.0, 2.0]))?;
//! manager.set_parameter(&scale, "scale", "3.0")?;
//!
//! let report = manager.run_all()?;
//! assert!(report.is_success());
//! ```

pub mod config;
pub mod error;
pub mod flowchart;
#[cfg(feature = "gui")]
pub mod gui;
pub mod plugins;

// Re-export commonly used types
pub use error::{FlowError, Result, ResultExt};
pub use flowchart::{
    Connection, GraphError, LoadError, Node, NodeId, NodeManager, NodeRegister, NodeRegisterMap,
    NodeState, Parameter, ParameterSet, ProcessContext, ProcessingError, RunReport, TerminalSpec,
    TerminalType, Value,
};
pub use plugins::{PluginError, PluginManager};
