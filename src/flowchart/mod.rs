//! Flow-based execution engine.
//!
//! Typed nodes exchange values through connections between their
//! terminals. Node kinds come from named registers (the built-in `Core`
//! register plus any loaded plugins); a [`NodeManager`] owns one graph and
//! runs it either fully (batch) or from a changed node (incremental).
//!
//! # Architecture
//!
//! ```text
//! NodeRegisterMap ──► NodeManager ──► NodeSlot { Box<dyn Node>, terminals, parameters }
//!                          │
//!                          ├── Connections (output ──► input, no cycles, fan-in ≤ 1)
//!                          ├── GlobalTable (external name ──► node parameter)
//!                          └── ExecutionPlan (cached topological order)
//! ```
//!
//! # Design
//!
//! - **Closed value model**: `Value` is a sum type over `TerminalType`; no
//!   implicit coercion. Plugins extend it through the tagged `Opaque` variant.
//! - **Synchronous**: every mutation and run happens on the caller's thread.
//! - **Partial failure**: a failing node is reported, its downstream is left
//!   unresolved, the rest of the run continues.
//! - **Plugin lifetime**: nodes hold their register, registers hold their
//!   library, so a plugin stays mapped while anything built from it lives.

pub mod connection;
pub mod error;
pub mod globals;
pub mod id;
pub mod manager;
pub mod node;
pub mod nodes;
pub mod parameter;
pub mod register;
pub mod report;
pub mod schedule;
pub mod schema;
pub mod terminal;
pub mod value;

pub use connection::{Connection, Connections};
pub use error::{GraphError, GraphResult, LoadError, ParameterError, ProcessingError};
pub use globals::{GlobalBinding, GlobalTable};
pub use id::NodeId;
pub use manager::{NodeManager, NodeSlot};
pub use node::{AsAny, Node, NodeState, ProcessContext, Reaction};
pub use parameter::{ParamValue, Parameter, ParameterSet};
pub use register::{NodeRegister, NodeRegisterMap};
pub use report::{NodeFailure, RunReport};
pub use schedule::{ExecutionPlan, PlanStats, Scheduler};
pub use schema::FlowchartFile;
pub use terminal::{Direction, Terminal, TerminalSpec};
pub use value::{ColorMap, ColorStop, OpaqueValue, TerminalType, Value};
