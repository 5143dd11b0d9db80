//! Global parameter bindings: external names forwarding to one node parameter.
//!
//! Bindings are validated when they are made (node and parameter must
//! exist), so an override naming an unknown global fails before any
//! parameter is touched.

use crate::flowchart::error::{GraphError, GraphResult};
use crate::flowchart::id::NodeId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// `external_name -> node_id.parameter_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalBinding {
    pub external_name: String,
    pub node_id: NodeId,
    pub parameter_name: String,
}

impl GlobalBinding {
    pub fn new(
        external_name: impl Into<String>,
        node_id: impl Into<NodeId>,
        parameter_name: impl Into<String>,
    ) -> Self {
        Self {
            external_name: external_name.into(),
            node_id: node_id.into(),
            parameter_name: parameter_name.into(),
        }
    }
}

/// Ordered table of bindings, keyed by external name.
#[derive(Debug, Clone, Default)]
pub struct GlobalTable {
    bindings: IndexMap<String, GlobalBinding>,
}

impl GlobalTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, binding: GlobalBinding) -> GraphResult<()> {
        if self.bindings.contains_key(&binding.external_name) {
            return Err(GraphError::DuplicateGlobal(binding.external_name));
        }
        self.bindings.insert(binding.external_name.clone(), binding);
        Ok(())
    }

    pub(crate) fn remove(&mut self, external_name: &str) -> Option<GlobalBinding> {
        self.bindings.shift_remove(external_name)
    }

    /// Drop all bindings pointing at `node`; returns the dropped names.
    pub(crate) fn remove_node(&mut self, node: &NodeId) -> Vec<String> {
        let dropped: Vec<String> = self
            .bindings
            .values()
            .filter(|b| &b.node_id == node)
            .map(|b| b.external_name.clone())
            .collect();
        self.bindings.retain(|_, b| &b.node_id != node);
        dropped
    }

    pub fn get(&self, external_name: &str) -> GraphResult<&GlobalBinding> {
        self.bindings
            .get(external_name)
            .ok_or_else(|| GraphError::UnknownGlobal(external_name.to_string()))
    }

    pub fn contains(&self, external_name: &str) -> bool {
        self.bindings.contains_key(external_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GlobalBinding> {
        self.bindings.values()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Fail on the first name in `names` that is not bound.
    pub fn check_names<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> GraphResult<()> {
        for name in names {
            self.get(name)?;
        }
        Ok(())
    }
}

/// Join override tokens with single spaces before type-specific parsing.
pub fn join_tokens<S: AsRef<str>>(tokens: &[S]) -> String {
    tokens
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join(" ")
}
