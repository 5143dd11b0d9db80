//! Registers and graph builders shared by the integration tests

use super::nodes::{FailingNode, MergeNode, PassNode, SinkNode, SourceNode, TransformNode};
use flowgraph_rs::{NodeId, NodeManager, NodeRegister, NodeRegisterMap, TerminalType};
use std::sync::Arc;

pub const TEST_REGISTER: &str = "Test";

/// Every terminal type a pass-through node is registered for.
pub fn pass_types() -> Vec<TerminalType> {
    vec![
        TerminalType::ScalarSeq,
        TerminalType::Vec3Seq,
        TerminalType::ColorMap,
        TerminalType::Bool,
        TerminalType::Path,
        TerminalType::opaque("mesh"),
    ]
}

/// Type name of the pass-through node carrying `ty`.
pub fn pass_type(ty: &TerminalType) -> String {
    format!("Pass<{}>", ty.name())
}

/// The `Test` register holding every test node kind.
pub fn test_register() -> NodeRegister {
    let mut register = NodeRegister::create(TEST_REGISTER);
    register
        .register_node::<SourceNode>("Source")
        .and_then(|r| r.register_node::<TransformNode>("Transform"))
        .and_then(|r| r.register_node::<MergeNode>("Merge"))
        .and_then(|r| r.register_node::<SinkNode>("Sink"))
        .and_then(|r| r.register_node::<FailingNode>("Failing"))
        .expect("test node types are unique");
    for ty in pass_types() {
        let name = pass_type(&ty);
        register
            .register_with(&name, move || Box::new(PassNode { ty: ty.clone() }))
            .expect("pass-through types are unique");
    }
    register
}

/// Core plus the `Test` register.
pub fn test_registers() -> NodeRegisterMap {
    let mut registers = NodeRegisterMap::with_core();
    registers.insert(Arc::new(test_register()));
    registers
}

pub fn test_manager() -> NodeManager {
    NodeManager::new(&test_registers())
}

/// Builder for linear Source -> Transform* -> Sink chains
pub struct ChainBuilder {
    transforms: usize,
    failing_at: Option<usize>,
}

/// Ids of a built chain.
pub struct Chain {
    pub source: NodeId,
    pub transforms: Vec<NodeId>,
    pub sink: NodeId,
}

impl Chain {
    /// All ids in chain order.
    pub fn ids(&self) -> Vec<NodeId> {
        let mut ids = vec![self.source.clone()];
        ids.extend(self.transforms.iter().cloned());
        ids.push(self.sink.clone());
        ids
    }
}

impl ChainBuilder {
    pub fn new(transforms: usize) -> Self {
        Self {
            transforms,
            failing_at: None,
        }
    }

    /// Replace the transform at `index` with a failing node.
    pub fn failing_at(mut self, index: usize) -> Self {
        self.failing_at = Some(index);
        self
    }

    pub fn build(self, manager: &mut NodeManager) -> Chain {
        let source = manager.create_node("Source").unwrap();
        let mut prev = source.clone();
        let mut transforms = Vec::with_capacity(self.transforms);
        for i in 0..self.transforms {
            let kind = if self.failing_at == Some(i) {
                "Failing"
            } else {
                "Transform"
            };
            let id = manager.create_node(kind).unwrap();
            manager.connect(&prev, "out", &id, "in").unwrap();
            transforms.push(id.clone());
            prev = id;
        }
        let sink = manager.create_node("Sink").unwrap();
        manager.connect(&prev, "out", &sink, "in").unwrap();
        Chain {
            source,
            transforms,
            sink,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_builder() {
        let mut manager = test_manager();
        let chain = ChainBuilder::new(2).build(&mut manager);
        assert_eq!(chain.ids().len(), 4);
        assert_eq!(manager.connections().len(), 3);
    }
}
