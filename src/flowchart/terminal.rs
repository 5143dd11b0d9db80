//! Terminals: named, typed input/output slots on a node.
//!
//! Each node declares its terminals once through a `TerminalSpec` when it
//! is constructed. After that the set of terminals and their types never
//! change; only the held value does.

use crate::flowchart::error::GraphError;
use crate::flowchart::value::{TerminalType, Value};
use indexmap::IndexMap;
use libloading::Library;
use std::fmt;
use std::sync::Arc;

/// Whether a terminal is an input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Input,
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => f.write_str("input"),
            Direction::Output => f.write_str("output"),
        }
    }
}

/// A terminal and its current value (if any).
#[derive(Debug, Clone)]
pub struct Terminal {
    name: String,
    ty: TerminalType,
    direction: Direction,
    value: Option<Value>,
}

impl Terminal {
    pub fn new(name: impl Into<String>, ty: TerminalType, direction: Direction) -> Self {
        Self {
            name: name.into(),
            ty,
            direction,
            value: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type; reported even while the terminal is empty.
    pub fn terminal_type(&self) -> &TerminalType {
        &self.ty
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// Store a value after checking it against the declared type.
    pub fn set(&mut self, value: Value) -> Result<(), GraphError> {
        self.value = Some(Value::typed(self.ty.clone(), value)?);
        Ok(())
    }

    /// Pin a held opaque payload to the plugin library that produced it.
    pub(crate) fn attach_origin(&mut self, library: &Arc<Library>) {
        if let Some(value) = &mut self.value {
            value.attach_origin(library);
        }
    }

    /// Drop the held value. Returns whether a value was present.
    pub fn clear(&mut self) -> bool {
        self.value.take().is_some()
    }
}

/// Ordered terminal map of one direction.
pub type TerminalMap = IndexMap<String, Terminal>;

/// Collects the terminal declarations of a node under construction.
#[derive(Debug, Default)]
pub struct TerminalSpec {
    inputs: TerminalMap,
    outputs: TerminalMap,
}

impl TerminalSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an input terminal. A later declaration with the same name replaces it.
    pub fn input(&mut self, name: &str, ty: TerminalType) -> &mut Self {
        self.inputs
            .insert(name.to_string(), Terminal::new(name, ty, Direction::Input));
        self
    }

    /// Declare an output terminal. A later declaration with the same name replaces it.
    pub fn output(&mut self, name: &str, ty: TerminalType) -> &mut Self {
        self.outputs
            .insert(name.to_string(), Terminal::new(name, ty, Direction::Output));
        self
    }

    pub fn into_maps(self) -> (TerminalMap, TerminalMap) {
        (self.inputs, self.outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_terminal_reports_type() {
        let t = Terminal::new("values", TerminalType::ScalarSeq, Direction::Input);
        assert!(!t.has_value());
        assert_eq!(t.terminal_type(), &TerminalType::ScalarSeq);
    }

    #[test]
    fn test_set_checks_type_and_keeps_previous_value() {
        let mut t = Terminal::new("flag", TerminalType::Bool, Direction::Output);
        t.set(Value::Bool(true)).unwrap();
        assert!(t.set(Value::ScalarSeq(vec![1.0])).is_err());
        assert_eq!(t.value(), Some(&Value::Bool(true)));
        assert!(t.clear());
        assert!(!t.clear());
    }

    #[test]
    fn test_spec_preserves_declaration_order() {
        let mut spec = TerminalSpec::new();
        spec.output("vertices", TerminalType::Vec3Seq)
            .output("colors", TerminalType::Vec3Seq)
            .output("attr", TerminalType::ScalarSeq);
        let (inputs, outputs) = spec.into_maps();
        assert!(inputs.is_empty());
        let names: Vec<_> = outputs.keys().map(String::as_str).collect();
        assert_eq!(names, ["vertices", "colors", "attr"]);
    }
}
