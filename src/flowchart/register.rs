//! Node registers: named factories mapping type names to constructors.
//!
//! Several registers coexist in a [`NodeRegisterMap`]: the built-in `Core`
//! register and one or more per loaded plugin. Lookups accept either a bare
//! type name (must be unique across registers) or a qualified
//! `Register::Type` name.

use crate::flowchart::error::{GraphError, GraphResult};
use crate::flowchart::node::Node;
use indexmap::IndexMap;
use libloading::Library;
use std::fmt;
use std::sync::Arc;

/// Separator between register and type name in a qualified type.
pub const QUALIFIER: &str = "::";

/// Constructor of one node kind.
pub type NodeConstructor = Box<dyn Fn() -> Box<dyn Node> + Send + Sync>;

/// A named set of node constructors.
pub struct NodeRegister {
    name: String,
    constructors: IndexMap<String, NodeConstructor>,
    // Declared last: plugin constructors must drop before their library.
    library: Option<Arc<Library>>,
}

impl NodeRegister {
    pub fn create(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constructors: IndexMap::new(),
            library: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a node kind constructed through `Default`.
    pub fn register_node<T: Node + Default>(&mut self, type_name: &str) -> GraphResult<&mut Self> {
        self.register_with(type_name, || Box::new(T::default()))
    }

    /// Register a node kind with a custom constructor.
    pub fn register_with<F>(&mut self, type_name: &str, constructor: F) -> GraphResult<&mut Self>
    where
        F: Fn() -> Box<dyn Node> + Send + Sync + 'static,
    {
        if self.constructors.contains_key(type_name) {
            return Err(GraphError::DuplicateNodeType {
                register: self.name.clone(),
                type_name: type_name.to_string(),
            });
        }
        self.constructors
            .insert(type_name.to_string(), Box::new(constructor));
        Ok(self)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.constructors.contains_key(type_name)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// Build a fresh node of `type_name`.
    pub fn construct(&self, type_name: &str) -> GraphResult<Box<dyn Node>> {
        self.constructors
            .get(type_name)
            .map(|ctor| ctor())
            .ok_or_else(|| GraphError::UnknownNodeType(self.qualify(type_name)))
    }

    pub fn qualify(&self, type_name: &str) -> String {
        format!("{}{}{}", self.name, QUALIFIER, type_name)
    }

    /// Tie this register to the library its constructors live in.
    pub(crate) fn attach_library(&mut self, library: Arc<Library>) {
        self.library = Some(library);
    }

    pub(crate) fn library(&self) -> Option<&Arc<Library>> {
        self.library.as_ref()
    }

    /// Whether the register came from a dynamically loaded plugin.
    pub fn is_plugin(&self) -> bool {
        self.library.is_some()
    }
}

impl fmt::Debug for NodeRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRegister")
            .field("name", &self.name)
            .field("types", &self.constructors.keys().collect::<Vec<_>>())
            .field("plugin", &self.is_plugin())
            .finish()
    }
}

/// All active registers, keyed by register name.
#[derive(Debug, Clone, Default)]
pub struct NodeRegisterMap {
    registers: IndexMap<String, Arc<NodeRegister>>,
}

impl NodeRegisterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map holding only the built-in `Core` register.
    pub fn with_core() -> Self {
        let mut map = Self::new();
        map.insert(Arc::new(crate::flowchart::nodes::core_register()));
        map
    }

    /// Add a register. Returns `false` (and leaves the map unchanged) when
    /// a register of the same name is already present.
    pub fn insert(&mut self, register: Arc<NodeRegister>) -> bool {
        if self.registers.contains_key(register.name()) {
            return false;
        }
        self.registers.insert(register.name().to_string(), register);
        true
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<NodeRegister>> {
        self.registers.shift_remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<NodeRegister>> {
        self.registers.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<NodeRegister>> {
        self.registers.values()
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }

    /// Copy every register of `other` that is not already present.
    pub fn extend(&mut self, other: &NodeRegisterMap) {
        for register in other.iter() {
            self.insert(register.clone());
        }
    }

    /// Find the register providing `type_name`.
    ///
    /// A qualified `Register::Type` selects the register directly; a bare
    /// name must be provided by exactly one register.
    pub fn resolve(&self, type_name: &str) -> GraphResult<(Arc<NodeRegister>, String)> {
        if let Some((register, bare)) = type_name.split_once(QUALIFIER) {
            return self.resolve_in(register, bare);
        }

        let mut found = self
            .registers
            .values()
            .filter(|r| r.contains(type_name));
        match (found.next(), found.next()) {
            (Some(register), None) => Ok((register.clone(), type_name.to_string())),
            (None, _) => Err(GraphError::UnknownNodeType(type_name.to_string())),
            (Some(_), Some(_)) => Err(GraphError::AmbiguousNodeType {
                type_name: type_name.to_string(),
                registers: self
                    .registers
                    .values()
                    .filter(|r| r.contains(type_name))
                    .map(|r| r.name().to_string())
                    .collect(),
            }),
        }
    }

    /// Look `type_name` up in one named register.
    pub fn resolve_in(
        &self,
        register: &str,
        type_name: &str,
    ) -> GraphResult<(Arc<NodeRegister>, String)> {
        match self.registers.get(register) {
            Some(r) if r.contains(type_name) => Ok((r.clone(), type_name.to_string())),
            _ => Err(GraphError::UnknownNodeType(format!(
                "{}{}{}",
                register, QUALIFIER, type_name
            ))),
        }
    }
}
