//! Identity types for the flowchart engine.
//!
//! Node ids are human-readable strings so that persisted flowcharts, CLI
//! error messages and global-parameter bindings can all name a node
//! directly. Ids generated by the manager follow the `<Type>.<n>` pattern.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier of a node within one `NodeManager`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build the automatic id for the `n`-th node of `type_name`.
    pub fn generated(type_name: &str, n: usize) -> Self {
        Self(format!("{}.{}", type_name, n))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
