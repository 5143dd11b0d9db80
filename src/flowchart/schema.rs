//! Persisted flowchart schema (JSON).
//!
//! ```json
//! {
//!   "nodes": [{ "id": "Scale.0", "type": "Scale", "register": "Core",
//!               "parameters": { "scale": 2.0 } }],
//!   "connections": [{ "from_node": "Triangle.0", "from_terminal": "attr",
//!                     "to_node": "Scale.0", "to_terminal": "in" }],
//!   "globals": [{ "external_name": "factor", "node_id": "Scale.0",
//!                 "parameter_name": "scale" }]
//! }
//! ```
//!
//! Loading constructs all nodes, then connections, then parameter values,
//! then global bindings. The first failure aborts the load.

use crate::flowchart::connection::Connection;
use crate::flowchart::error::LoadError;
use crate::flowchart::globals::GlobalBinding;
use crate::flowchart::id::NodeId;
use crate::flowchart::manager::NodeManager;
use crate::flowchart::register::NodeRegisterMap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One node entry of a flowchart file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEntry {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub type_name: String,
    /// Register providing the type; resolved across all registers when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub register: Option<String>,
    #[serde(default)]
    pub parameters: IndexMap<String, serde_json::Value>,
}

/// Logical content of a flowchart file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowchartFile {
    #[serde(default)]
    pub nodes: Vec<NodeEntry>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub globals: Vec<GlobalBinding>,
}

impl FlowchartFile {
    /// Snapshot a manager's graph.
    pub fn from_manager(manager: &NodeManager) -> Self {
        let nodes = manager
            .slots()
            .map(|slot| NodeEntry {
                id: slot.id().clone(),
                type_name: slot.type_name().to_string(),
                register: Some(slot.register_name().to_string()),
                parameters: slot
                    .parameters()
                    .iter()
                    .map(|(name, param)| (name.to_string(), param.value().to_json()))
                    .collect(),
            })
            .collect();

        Self {
            nodes,
            connections: manager.connections().iter().cloned().collect(),
            globals: manager.globals().iter().cloned().collect(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Build a fresh manager from this description.
    pub fn build(&self, registers: &NodeRegisterMap) -> Result<NodeManager, LoadError> {
        let mut manager = NodeManager::new(registers);

        for entry in &self.nodes {
            let created = match &entry.register {
                Some(register) => {
                    manager.create_node_in(register, &entry.type_name, entry.id.clone())
                }
                None => manager.create_node_with_id(&entry.type_name, entry.id.clone()),
            };
            created.map_err(|source| LoadError::Node {
                id: entry.id.clone(),
                source,
            })?;
        }

        for c in &self.connections {
            manager
                .connect(&c.from_node, &c.from_terminal, &c.to_node, &c.to_terminal)
                .map_err(|source| LoadError::Connection {
                    from_node: c.from_node.clone(),
                    from_terminal: c.from_terminal.clone(),
                    to_node: c.to_node.clone(),
                    to_terminal: c.to_terminal.clone(),
                    source,
                })?;
        }

        for entry in &self.nodes {
            for (name, value) in &entry.parameters {
                manager
                    .set_parameter_json(&entry.id, name, value)
                    .map_err(|source| LoadError::Parameter {
                        node: entry.id.clone(),
                        parameter: name.clone(),
                        source,
                    })?;
            }
        }

        for g in &self.globals {
            manager
                .bind_global(&g.external_name, &g.node_id, &g.parameter_name)
                .map_err(|source| LoadError::Global {
                    name: g.external_name.clone(),
                    source,
                })?;
        }

        tracing::info!(
            "Loaded flowchart: {} nodes, {} connections, {} globals",
            self.nodes.len(),
            self.connections.len(),
            self.globals.len()
        );
        Ok(manager)
    }
}

impl NodeManager {
    /// Pretty JSON for the current graph.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        FlowchartFile::from_manager(self).to_json_string()
    }

    pub fn from_json_str(json: &str, registers: &NodeRegisterMap) -> Result<Self, LoadError> {
        FlowchartFile::from_json_str(json)?.build(registers)
    }

    pub fn save_json(&self, path: &Path) -> std::io::Result<()> {
        let json = self.to_json_string()?;
        std::fs::write(path, json)?;
        tracing::info!("Saved flowchart to {}", path.display());
        Ok(())
    }

    pub fn load_json(path: &Path, registers: &NodeRegisterMap) -> Result<Self, LoadError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json, registers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flowchart::error::GraphError;

    fn sample() -> NodeManager {
        let mut m = NodeManager::new(&NodeRegisterMap::with_core());
        let tri = m.create_node("Triangle").unwrap();
        let scale = m.create_node("Scale").unwrap();
        let sink = m.create_node("Collect").unwrap();
        m.connect(&tri, "attr", &scale, "in").unwrap();
        m.connect(&scale, "out", &sink, "in").unwrap();
        m.set_parameter(&scale, "scale", "0.1").unwrap();
        m.bind_global("factor", &scale, "scale").unwrap();
        m
    }

    #[test]
    fn test_save_load_save_identical() {
        let registers = NodeRegisterMap::with_core();
        let first = sample().to_json_string().unwrap();
        let loaded = NodeManager::from_json_str(&first, &registers).unwrap();
        assert_eq!(loaded.to_json_string().unwrap(), first);
        assert_eq!(loaded.node_count(), 3);
        assert_eq!(loaded.connections().len(), 2);
        assert_eq!(
            loaded.parameters(&"Scale.0".into()).unwrap().float("scale"),
            Some(0.1)
        );
    }

    #[test]
    fn test_schema_shape() {
        let json = sample().to_json_string().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["nodes"][1]["type"], "Scale");
        assert_eq!(value["nodes"][1]["register"], "Core");
        assert_eq!(value["nodes"][1]["parameters"]["scale"], 0.1);
        assert_eq!(value["connections"][0]["from_terminal"], "attr");
        assert_eq!(value["globals"][0]["external_name"], "factor");
    }

    #[test]
    fn test_unqualified_type_resolves() {
        let json = r#"{ "nodes": [{ "id": "s", "type": "Scale" }] }"#;
        let m = NodeManager::from_json_str(json, &NodeRegisterMap::with_core()).unwrap();
        assert_eq!(m.slot(&"s".into()).unwrap().register_name(), "Core");
    }

    #[test]
    fn test_unknown_type_aborts_with_node_id() {
        let json = r#"{ "nodes": [{ "id": "painter", "type": "Painter" }] }"#;
        let err = NodeManager::from_json_str(json, &NodeRegisterMap::with_core()).unwrap_err();
        match err {
            LoadError::Node { id, source } => {
                assert_eq!(id.as_str(), "painter");
                assert!(matches!(source, GraphError::UnknownNodeType(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bad_parameter_aborts() {
        let json = r#"{ "nodes": [{ "id": "c", "type": "Clamp",
                        "parameters": { "range": [3.0, 1.0] } }] }"#;
        let err = NodeManager::from_json_str(json, &NodeRegisterMap::with_core()).unwrap_err();
        assert!(matches!(err, LoadError::Parameter { ref parameter, .. } if parameter == "range"));
    }

    #[test]
    fn test_invalid_json() {
        let err = NodeManager::from_json_str("{ nodes: ", &NodeRegisterMap::with_core())
            .unwrap_err();
        assert!(matches!(err, LoadError::Json(_)));
    }
}
