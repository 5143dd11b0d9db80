//! NodeManager: owner of the node graph and its two execution disciplines.
//!
//! - **Batch run** (`run_all`): every node once, in topological order.
//! - **Incremental run** (`run_from`, `run_dirty`): only the subgraph
//!   forward-reachable from the changed node(s), in the same order.
//!
//! After each successful `process()` every output value is copied along
//! its connections into the connected inputs, firing `on_push`; an output
//! left empty clears the connected inputs instead, firing `on_clear`.
//! A failing node never aborts the run: it is recorded in the
//! [`RunReport`] and everything downstream of it is marked unresolved.
//!
//! All operations run synchronously on the caller's thread; the manager
//! has no internal locking.

use crate::flowchart::connection::{Connection, Connections};
use crate::flowchart::error::{GraphError, GraphResult, ParameterError, ProcessingError};
use crate::flowchart::globals::{join_tokens, GlobalBinding, GlobalTable};
use crate::flowchart::id::NodeId;
use crate::flowchart::node::{Node, NodeState, ProcessContext, Reaction};
use crate::flowchart::parameter::{Parameter, ParameterSet};
use crate::flowchart::register::{NodeRegister, NodeRegisterMap};
use crate::flowchart::report::{NodeFailure, RunReport};
use crate::flowchart::schedule::{ExecutionPlan, PlanStats, Scheduler};
use crate::flowchart::terminal::{Direction, Terminal, TerminalMap, TerminalSpec};
use crate::flowchart::value::Value;
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// A node together with the terminals and parameters it declared.
pub struct NodeSlot {
    // Field order matters: the node drops before the register that built it.
    pub(crate) node: Box<dyn Node>,
    id: NodeId,
    type_name: String,
    pub(crate) inputs: TerminalMap,
    pub(crate) outputs: TerminalMap,
    pub(crate) params: ParameterSet,
    state: NodeState,
    origin: Arc<NodeRegister>,
}

impl NodeSlot {
    fn new(id: NodeId, type_name: &str, origin: Arc<NodeRegister>) -> GraphResult<Self> {
        let node = origin.construct(type_name)?;
        let mut slot = Self {
            node,
            id,
            type_name: type_name.to_string(),
            inputs: TerminalMap::new(),
            outputs: TerminalMap::new(),
            params: ParameterSet::new(),
            state: NodeState::Created,
            origin,
        };

        let mut spec = TerminalSpec::new();
        slot.node.declare_terminals(&mut spec);
        (slot.inputs, slot.outputs) = spec.into_maps();
        slot.node.declare_parameters(&mut slot.params);
        slot.state = NodeState::Ready;
        Ok(slot)
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Type name within its register.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn register_name(&self) -> &str {
        self.origin.name()
    }

    /// `Register::Type`.
    pub fn qualified_type(&self) -> String {
        self.origin.qualify(&self.type_name)
    }

    pub fn inputs(&self) -> &TerminalMap {
        &self.inputs
    }

    pub fn outputs(&self) -> &TerminalMap {
        &self.outputs
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.params
    }

    pub fn state(&self) -> &NodeState {
        &self.state
    }

    pub fn node(&self) -> &dyn Node {
        self.node.as_ref()
    }

    fn input_mut(&mut self, terminal: &str) -> GraphResult<&mut Terminal> {
        let id = &self.id;
        self.inputs
            .get_mut(terminal)
            .ok_or_else(|| GraphError::UnknownTerminal {
                node: id.clone(),
                terminal: terminal.to_string(),
                direction: Direction::Input,
            })
    }

    fn output(&self, terminal: &str) -> GraphResult<&Terminal> {
        self.outputs
            .get(terminal)
            .ok_or_else(|| GraphError::UnknownTerminal {
                node: self.id.clone(),
                terminal: terminal.to_string(),
                direction: Direction::Output,
            })
    }

    fn input(&self, terminal: &str) -> GraphResult<&Terminal> {
        self.inputs
            .get(terminal)
            .ok_or_else(|| GraphError::UnknownTerminal {
                node: self.id.clone(),
                terminal: terminal.to_string(),
                direction: Direction::Input,
            })
    }
}

impl fmt::Debug for NodeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeSlot")
            .field("id", &self.id)
            .field("type", &self.qualified_type())
            .field("state", &self.state)
            .finish()
    }
}

/// The graph of nodes and connections plus global parameter bindings.
pub struct NodeManager {
    // Declared first so nodes drop before the register handles below.
    nodes: IndexMap<NodeId, NodeSlot>,
    connections: Connections,
    globals: GlobalTable,
    dirty: IndexSet<NodeId>,
    type_counters: HashMap<String, usize>,
    /// Cached topological order. Recompiled lazily on topology change.
    plan: ExecutionPlan,
    graph_generation: u64,
    plan_dirty: bool,
    registers: NodeRegisterMap,
}

impl NodeManager {
    pub fn new(registers: &NodeRegisterMap) -> Self {
        Self {
            nodes: IndexMap::new(),
            connections: Connections::new(),
            globals: GlobalTable::new(),
            dirty: IndexSet::new(),
            type_counters: HashMap::new(),
            plan: ExecutionPlan::new(),
            graph_generation: 0,
            plan_dirty: true,
            registers: registers.clone(),
        }
    }

    pub fn registers(&self) -> &NodeRegisterMap {
        &self.registers
    }

    // ── Nodes ──

    /// Create a node of `type_name` (bare or `Register::Type`) with an
    /// automatic `<Type>.<n>` id.
    pub fn create_node(&mut self, type_name: &str) -> GraphResult<NodeId> {
        let (register, bare) = self.registers.resolve(type_name)?;
        let counter = self.type_counters.entry(bare.clone()).or_insert(0);
        let id = loop {
            let candidate = NodeId::generated(&bare, *counter);
            *counter += 1;
            if !self.nodes.contains_key(&candidate) {
                break candidate;
            }
        };
        self.insert_node(id, register, &bare)
    }

    /// Create a node with a caller-chosen id.
    pub fn create_node_with_id(
        &mut self,
        type_name: &str,
        id: impl Into<NodeId>,
    ) -> GraphResult<NodeId> {
        let id = id.into();
        if self.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateNodeId(id));
        }
        let (register, bare) = self.registers.resolve(type_name)?;
        self.insert_node(id, register, &bare)
    }

    /// Create a node from an explicitly named register.
    pub fn create_node_in(
        &mut self,
        register: &str,
        type_name: &str,
        id: impl Into<NodeId>,
    ) -> GraphResult<NodeId> {
        let id = id.into();
        if self.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateNodeId(id));
        }
        let (register, bare) = self.registers.resolve_in(register, type_name)?;
        self.insert_node(id, register, &bare)
    }

    fn insert_node(
        &mut self,
        id: NodeId,
        register: Arc<NodeRegister>,
        type_name: &str,
    ) -> GraphResult<NodeId> {
        let slot = NodeSlot::new(id.clone(), type_name, register)?;
        tracing::debug!("Created node {} ({})", id, slot.qualified_type());
        self.nodes.insert(id.clone(), slot);
        self.invalidate_plan();
        Ok(id)
    }

    /// Remove a node, its connections and any global bindings to it.
    /// Inputs it was feeding are cleared (firing `on_clear`) and their
    /// nodes marked dirty.
    pub fn remove_node(&mut self, id: &NodeId) -> GraphResult<()> {
        if !self.nodes.contains_key(id) {
            return Err(GraphError::UnknownNode(id.clone()));
        }

        for edge in self.connections.remove_touching(id) {
            if &edge.from_node == id {
                self.clear_input(&edge.to_node, &edge.to_terminal);
                self.dirty.insert(edge.to_node);
            }
        }
        for name in self.globals.remove_node(id) {
            tracing::debug!("Dropped global '{}' bound to removed node {}", name, id);
        }
        self.dirty.shift_remove(id);
        self.nodes.shift_remove(id);
        self.invalidate_plan();
        tracing::debug!("Removed node {}", id);
        Ok(())
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node ids in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    pub fn slots(&self) -> impl Iterator<Item = &NodeSlot> {
        self.nodes.values()
    }

    pub fn slot(&self, id: &NodeId) -> GraphResult<&NodeSlot> {
        self.nodes
            .get(id)
            .ok_or_else(|| GraphError::UnknownNode(id.clone()))
    }

    pub(crate) fn slot_mut(&mut self, id: &NodeId) -> GraphResult<&mut NodeSlot> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| GraphError::UnknownNode(id.clone()))
    }

    /// Downcast a node to its concrete kind.
    pub fn node_as<T: Node>(&self, id: &NodeId) -> Option<&T> {
        self.nodes.get(id)?.node().downcast_ref::<T>()
    }

    pub fn state(&self, id: &NodeId) -> GraphResult<&NodeState> {
        Ok(self.slot(id)?.state())
    }

    pub fn input_value(&self, id: &NodeId, terminal: &str) -> GraphResult<Option<&Value>> {
        Ok(self.slot(id)?.input(terminal)?.value())
    }

    pub fn output_value(&self, id: &NodeId, terminal: &str) -> GraphResult<Option<&Value>> {
        Ok(self.slot(id)?.output(terminal)?.value())
    }

    // ── Connections ──

    pub fn connections(&self) -> &Connections {
        &self.connections
    }

    /// Connect `from_node.from_terminal` (output) to `to_node.to_terminal` (input).
    ///
    /// Checks run in order: terminals exist, types match, the input is free,
    /// no cycle. On success a value already held by the output is pushed
    /// into the input right away.
    pub fn connect(
        &mut self,
        from_node: &NodeId,
        from_terminal: &str,
        to_node: &NodeId,
        to_terminal: &str,
    ) -> GraphResult<()> {
        let source = self.slot(from_node)?.output(from_terminal)?;
        let target = self.slot(to_node)?.input(to_terminal)?;

        if source.terminal_type() != target.terminal_type() {
            return Err(GraphError::TypeMismatch {
                expected: target.terminal_type().clone(),
                found: source.terminal_type().clone(),
            });
        }
        if self.connections.incoming(to_node, to_terminal).is_some() {
            return Err(GraphError::InputAlreadyConnected {
                node: to_node.clone(),
                terminal: to_terminal.to_string(),
            });
        }
        if self.connections.would_create_cycle(from_node, to_node) {
            return Err(GraphError::CycleDetected {
                from: from_node.clone(),
                to: to_node.clone(),
            });
        }

        let pending = source.value().cloned();
        let connection = Connection::new(
            from_node.clone(),
            from_terminal,
            to_node.clone(),
            to_terminal,
        );
        tracing::debug!("Connected {}", connection);
        self.connections.push(connection);
        self.invalidate_plan();

        if let Some(value) = pending {
            self.push_value(to_node, to_terminal, value)?;
        }
        Ok(())
    }

    /// Remove the connection feeding `to_node.to_terminal` and clear that input.
    pub fn disconnect(&mut self, to_node: &NodeId, to_terminal: &str) -> GraphResult<Connection> {
        self.slot(to_node)?.input(to_terminal)?;
        let removed = self
            .connections
            .remove_incoming(to_node, to_terminal)
            .ok_or_else(|| GraphError::NotConnected {
                node: to_node.clone(),
                terminal: to_terminal.to_string(),
            })?;
        self.invalidate_plan();
        if self.clear_input(to_node, to_terminal) {
            self.dirty.insert(to_node.clone());
        }
        tracing::debug!("Disconnected {}", removed);
        Ok(removed)
    }

    /// Supply a value to an unconnected input, as an interactive edit.
    pub fn set_input(&mut self, node: &NodeId, terminal: &str, value: Value) -> GraphResult<()> {
        self.slot(node)?.input(terminal)?;
        if self.connections.incoming(node, terminal).is_some() {
            return Err(GraphError::InputAlreadyConnected {
                node: node.clone(),
                terminal: terminal.to_string(),
            });
        }
        self.push_value(node, terminal, value)
    }

    /// Store `value` in an input and fire `on_push`.
    fn push_value(&mut self, node: &NodeId, terminal: &str, value: Value) -> GraphResult<()> {
        let slot = self.slot_mut(node)?;
        let input = slot.input_mut(terminal)?;
        input.set(value)?;
        let reaction = slot.node.on_push(&slot.inputs[terminal]);
        if reaction == Reaction::MarkDirty {
            self.dirty.insert(node.clone());
        }
        Ok(())
    }

    /// Empty an input and fire `on_clear` if it held a value.
    fn clear_input(&mut self, node: &NodeId, terminal: &str) -> bool {
        let Some(slot) = self.nodes.get_mut(node) else {
            return false;
        };
        let Some(input) = slot.inputs.get_mut(terminal) else {
            return false;
        };
        if !input.clear() {
            return false;
        }
        slot.node.on_clear(&slot.inputs[terminal]);
        true
    }

    // ── Parameters ──

    pub fn parameters(&self, id: &NodeId) -> GraphResult<&ParameterSet> {
        Ok(self.slot(id)?.parameters())
    }

    /// Parse `raw` into the parameter's kind and store it. On rejection the
    /// previous value is kept.
    pub fn set_parameter(&mut self, id: &NodeId, name: &str, raw: &str) -> GraphResult<()> {
        self.update_parameter(id, name, |param| param.set_str(raw))?;
        tracing::info!("Set parameter {}.{} = {}", id, name, raw);
        Ok(())
    }

    /// Store a typed JSON value, as read from a flowchart file.
    pub fn set_parameter_json(
        &mut self,
        id: &NodeId,
        name: &str,
        value: &serde_json::Value,
    ) -> GraphResult<()> {
        self.update_parameter(id, name, |param| param.set_json(value))
    }

    fn update_parameter<F>(&mut self, id: &NodeId, name: &str, apply: F) -> GraphResult<()>
    where
        F: FnOnce(&mut Parameter) -> Result<(), ParameterError>,
    {
        let slot = self.slot_mut(id)?;
        let param = slot
            .params
            .get_mut(name)
            .ok_or_else(|| GraphError::UnknownParameter {
                node: id.clone(),
                parameter: name.to_string(),
            })?;
        apply(param).map_err(|source| GraphError::Parameter {
            node: id.clone(),
            parameter: name.to_string(),
            source,
        })?;
        self.parameter_changed(id, name)
    }

    /// Fire `on_change_parameter` and mark the node dirty. Called after any
    /// parameter write, including ones made directly by a GUI widget.
    pub fn parameter_changed(&mut self, id: &NodeId, name: &str) -> GraphResult<()> {
        let slot = self.slot_mut(id)?;
        slot.node.on_change_parameter(name, &slot.params);
        self.dirty.insert(id.clone());
        Ok(())
    }

    // ── Globals ──

    pub fn globals(&self) -> &GlobalTable {
        &self.globals
    }

    /// Expose `node.parameter` under `external_name`.
    pub fn bind_global(
        &mut self,
        external_name: &str,
        node: &NodeId,
        parameter: &str,
    ) -> GraphResult<()> {
        if !self.slot(node)?.parameters().contains(parameter) {
            return Err(GraphError::UnknownParameter {
                node: node.clone(),
                parameter: parameter.to_string(),
            });
        }
        self.globals
            .insert(GlobalBinding::new(external_name, node.clone(), parameter))
    }

    pub fn unbind_global(&mut self, external_name: &str) -> GraphResult<GlobalBinding> {
        self.globals
            .remove(external_name)
            .ok_or_else(|| GraphError::UnknownGlobal(external_name.to_string()))
    }

    /// Set the parameter behind `external_name`.
    pub fn set_global(&mut self, external_name: &str, raw: &str) -> GraphResult<()> {
        let binding = self.globals.get(external_name)?.clone();
        self.set_parameter(&binding.node_id, &binding.parameter_name, raw)
    }

    /// Apply `name -> tokens` overrides. Every name is checked before any
    /// parameter is set; tokens are joined with single spaces.
    pub fn apply_overrides(&mut self, overrides: &IndexMap<String, Vec<String>>) -> GraphResult<()> {
        self.globals
            .check_names(overrides.keys().map(String::as_str))?;
        for (name, tokens) in overrides {
            self.set_global(name, &join_tokens(tokens))?;
        }
        Ok(())
    }

    // ── Scheduling ──

    fn invalidate_plan(&mut self) {
        self.plan_dirty = true;
        self.graph_generation += 1;
    }

    fn recompile_if_needed(&mut self) -> GraphResult<()> {
        if self.plan_dirty {
            self.plan = Scheduler::compile(
                self.nodes.keys(),
                &self.connections,
                self.graph_generation,
            )?;
            self.plan_dirty = false;
            tracing::debug!(
                "Flowchart recompiled: {} nodes, {} sources, {} sinks (gen {})",
                self.plan.stats.total_nodes,
                self.plan.stats.source_nodes,
                self.plan.stats.sink_nodes,
                self.plan.generation,
            );
        }
        Ok(())
    }

    /// Statistics of the current plan.
    pub fn plan_stats(&mut self) -> GraphResult<PlanStats> {
        self.recompile_if_needed()?;
        Ok(self.plan.stats.clone())
    }

    pub fn is_dirty(&self, id: &NodeId) -> bool {
        self.dirty.contains(id)
    }

    pub fn dirty_nodes(&self) -> impl Iterator<Item = &NodeId> {
        self.dirty.iter()
    }

    // ── Execution ──

    /// Process every node once in topological order.
    pub fn run_all(&mut self) -> GraphResult<RunReport> {
        self.recompile_if_needed()?;
        let order = self.plan.order.clone();
        tracing::info!("Running all {} nodes", order.len());
        Ok(self.execute(&order))
    }

    /// Re-process `id` and everything forward-reachable from it.
    pub fn run_from(&mut self, id: &NodeId) -> GraphResult<RunReport> {
        self.slot(id)?;
        self.run_subgraph(std::slice::from_ref(id))
    }

    /// Re-process the forward-reachable subgraph of all dirty nodes.
    pub fn run_dirty(&mut self) -> GraphResult<RunReport> {
        if self.dirty.is_empty() {
            return Ok(RunReport::new());
        }
        let seeds: Vec<NodeId> = self.dirty.iter().cloned().collect();
        self.run_subgraph(&seeds)
    }

    fn run_subgraph(&mut self, seeds: &[NodeId]) -> GraphResult<RunReport> {
        self.recompile_if_needed()?;
        let reachable = Scheduler::forward_reachable(seeds, &self.connections);
        let order = self.plan.restricted_to(&reachable);
        tracing::debug!(
            "Incremental run from {} seed(s): {} of {} nodes",
            seeds.len(),
            order.len(),
            self.nodes.len()
        );
        Ok(self.execute(&order))
    }

    fn execute(&mut self, order: &[NodeId]) -> RunReport {
        let start = Instant::now();
        let mut report = RunReport::new();

        for id in order {
            self.dirty.shift_remove(id);

            if self.has_blocked_upstream(id) {
                if let Some(slot) = self.nodes.get_mut(id) {
                    slot.state = NodeState::Unresolved;
                }
                tracing::debug!("Node {} unresolved: upstream failed", id);
                report.unresolved.push(id.clone());
                continue;
            }

            let Some(slot) = self.nodes.get_mut(id) else {
                continue;
            };
            report.processed.push(id.clone());
            slot.state = NodeState::Processing;
            for output in slot.outputs.values_mut() {
                output.clear();
            }

            let result = {
                let NodeSlot {
                    node,
                    inputs,
                    outputs,
                    params,
                    ..
                } = &mut *slot;
                let mut ctx = ProcessContext::new(inputs, outputs, params, &self.registers);
                node.process(&mut ctx)
            };

            match result {
                Ok(()) => {
                    if let Some(library) = slot.origin.library() {
                        for output in slot.outputs.values_mut() {
                            output.attach_origin(library);
                        }
                    }
                    slot.state = NodeState::Done;
                    tracing::trace!("Processed node {}", id);
                    if let Err(error) = self.propagate_outputs(id) {
                        self.fail_node(id, error, &mut report);
                    }
                }
                Err(error) => self.fail_node(id, error, &mut report),
            }
        }

        report.elapsed = start.elapsed();
        if report.is_success() {
            tracing::info!("Run finished: {}", report);
        } else {
            tracing::warn!("Run finished with problems: {}", report);
        }
        report
    }

    fn fail_node(&mut self, id: &NodeId, error: ProcessingError, report: &mut RunReport) {
        tracing::warn!("Node {} failed: {}", id, error);
        if let Some(slot) = self.nodes.get_mut(id) {
            slot.state = NodeState::Error(error.to_string());
        }
        report.failures.push(NodeFailure {
            node: id.clone(),
            error,
        });
    }

    fn has_blocked_upstream(&self, id: &NodeId) -> bool {
        self.connections.upstream(id).any(|edge| {
            self.nodes
                .get(&edge.from_node)
                .is_some_and(|upstream| upstream.state.is_blocking())
        })
    }

    /// Copy each output of `id` into the inputs connected to it. Every
    /// delivery is attempted; the first failed one is returned.
    fn propagate_outputs(&mut self, id: &NodeId) -> Result<(), ProcessingError> {
        let Some(slot) = self.nodes.get(id) else {
            return Ok(());
        };
        let deliveries: Vec<(Connection, Option<Value>)> = self
            .connections
            .outgoing(id)
            .map(|edge| {
                let value = slot
                    .outputs
                    .get(&edge.from_terminal)
                    .and_then(|t| t.value().cloned());
                (edge.clone(), value)
            })
            .collect();

        let mut first_error = None;
        for (edge, value) in deliveries {
            let Some(value) = value else {
                self.clear_input(&edge.to_node, &edge.to_terminal);
                continue;
            };
            if let Err(source) = self.push_value(&edge.to_node, &edge.to_terminal, value) {
                tracing::error!("Propagation {} failed: {}", edge, source);
                if first_error.is_none() {
                    first_error = Some(ProcessingError::Propagation {
                        output: edge.from_terminal,
                        to_node: edge.to_node,
                        to_terminal: edge.to_terminal,
                        source,
                    });
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl fmt::Debug for NodeManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeManager")
            .field("nodes", &self.nodes.len())
            .field("connections", &self.connections.len())
            .field("globals", &self.globals.len())
            .field("dirty", &self.dirty.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flowchart::nodes::{CollectNode, ScaleNode};
    use crate::flowchart::value::TerminalType;

    fn manager() -> NodeManager {
        NodeManager::new(&NodeRegisterMap::with_core())
    }

    #[test]
    fn test_auto_ids_follow_type_name() {
        let mut m = manager();
        let a = m.create_node("Scale").unwrap();
        let b = m.create_node("Core::Scale").unwrap();
        assert_eq!(a.as_str(), "Scale.0");
        assert_eq!(b.as_str(), "Scale.1");
        assert_eq!(m.state(&a).unwrap(), &NodeState::Ready);
        assert_eq!(m.slot(&a).unwrap().qualified_type(), "Core::Scale");
    }

    #[test]
    fn test_auto_id_skips_taken_ids() {
        let mut m = manager();
        m.create_node_with_id("Scale", "Scale.0").unwrap();
        let id = m.create_node("Scale").unwrap();
        assert_eq!(id.as_str(), "Scale.1");
        assert!(matches!(
            m.create_node_with_id("Scale", "Scale.1"),
            Err(GraphError::DuplicateNodeId(_))
        ));
    }

    #[test]
    fn test_unknown_type() {
        let mut m = manager();
        assert!(matches!(
            m.create_node("Painter"),
            Err(GraphError::UnknownNodeType(_))
        ));
        assert!(m.is_empty());
    }

    #[test]
    fn test_connect_propagates_existing_value() {
        let mut m = manager();
        let scale = m.create_node("Scale").unwrap();
        let sink = m.create_node("Collect").unwrap();
        m.set_input(&scale, "in", Value::ScalarSeq(vec![1.0])).unwrap();
        m.run_all().unwrap();

        m.connect(&scale, "out", &sink, "in").unwrap();
        assert_eq!(
            m.node_as::<CollectNode>(&sink).unwrap().last(),
            Some(&[2.0][..])
        );
    }

    #[test]
    fn test_connect_errors_leave_graph_unchanged() {
        let mut m = manager();
        let tri = m.create_node("Triangle").unwrap();
        let scale = m.create_node("Scale").unwrap();

        let err = m.connect(&tri, "vertices", &scale, "in").unwrap_err();
        assert_eq!(
            err,
            GraphError::TypeMismatch {
                expected: TerminalType::ScalarSeq,
                found: TerminalType::Vec3Seq
            }
        );
        assert!(matches!(
            m.connect(&tri, "nope", &scale, "in"),
            Err(GraphError::UnknownTerminal {
                direction: Direction::Output,
                ..
            })
        ));
        assert!(matches!(
            m.connect(&scale, "out", &scale, "in"),
            Err(GraphError::CycleDetected { .. })
        ));
        assert!(m.connections().is_empty());
    }

    #[test]
    fn test_disconnect_clears_input() {
        let mut m = manager();
        let tri = m.create_node("Triangle").unwrap();
        let scale = m.create_node("Scale").unwrap();
        m.connect(&tri, "attr", &scale, "in").unwrap();
        m.run_all().unwrap();
        assert!(m.input_value(&scale, "in").unwrap().is_some());

        m.disconnect(&scale, "in").unwrap();
        assert!(m.input_value(&scale, "in").unwrap().is_none());
        assert!(matches!(
            m.disconnect(&scale, "in"),
            Err(GraphError::NotConnected { .. })
        ));
    }

    #[test]
    fn test_set_input_rejects_connected_input() {
        let mut m = manager();
        let tri = m.create_node("Triangle").unwrap();
        let scale = m.create_node("Scale").unwrap();
        m.connect(&tri, "attr", &scale, "in").unwrap();
        assert!(matches!(
            m.set_input(&scale, "in", Value::ScalarSeq(vec![])),
            Err(GraphError::InputAlreadyConnected { .. })
        ));
        assert!(matches!(
            m.set_input(&tri, "missing", Value::Bool(true)),
            Err(GraphError::UnknownTerminal { .. })
        ));
    }

    #[test]
    fn test_set_parameter_marks_dirty_and_keeps_value_on_error() {
        let mut m = manager();
        let scale = m.create_node("Scale").unwrap();
        m.set_parameter(&scale, "scale", "3.0").unwrap();
        assert!(m.is_dirty(&scale));
        assert_eq!(m.parameters(&scale).unwrap().float("scale"), Some(3.0));

        let err = m.set_parameter(&scale, "scale", "three").unwrap_err();
        assert!(matches!(err, GraphError::Parameter { .. }));
        assert_eq!(m.parameters(&scale).unwrap().float("scale"), Some(3.0));

        assert!(matches!(
            m.set_parameter(&scale, "nope", "1"),
            Err(GraphError::UnknownParameter { .. })
        ));
    }

    #[test]
    fn test_remove_node_clears_downstream_and_globals() {
        let mut m = manager();
        let tri = m.create_node("Triangle").unwrap();
        let scale = m.create_node("Scale").unwrap();
        m.connect(&tri, "attr", &scale, "in").unwrap();
        m.bind_global("factor", &scale, "scale").unwrap();
        m.run_all().unwrap();

        m.remove_node(&tri).unwrap();
        assert!(m.connections().is_empty());
        assert!(m.input_value(&scale, "in").unwrap().is_none());

        m.remove_node(&scale).unwrap();
        assert!(m.globals().is_empty());
        assert!(matches!(
            m.remove_node(&scale),
            Err(GraphError::UnknownNode(_))
        ));
    }

    #[test]
    fn test_globals_forward_to_parameter() {
        let mut m = manager();
        let clamp = m.create_node("Clamp").unwrap();
        m.bind_global("range", &clamp, "range").unwrap();
        assert!(matches!(
            m.bind_global("range", &clamp, "enabled"),
            Err(GraphError::DuplicateGlobal(_))
        ));
        assert!(matches!(
            m.bind_global("x", &clamp, "missing"),
            Err(GraphError::UnknownParameter { .. })
        ));

        let mut overrides = IndexMap::new();
        overrides.insert("range".to_string(), vec!["0.5".to_string(), "2".to_string()]);
        m.apply_overrides(&overrides).unwrap();
        assert_eq!(
            m.parameters(&clamp).unwrap().float_range("range"),
            Some((0.5, 2.0))
        );

        overrides.insert("unknown".to_string(), vec!["1".to_string()]);
        overrides.insert("range".to_string(), vec!["1".to_string(), "3".to_string()]);
        assert!(matches!(
            m.apply_overrides(&overrides),
            Err(GraphError::UnknownGlobal(_))
        ));
        // Nothing applied when a name is unknown.
        assert_eq!(
            m.parameters(&clamp).unwrap().float_range("range"),
            Some((0.5, 2.0))
        );
    }

    #[test]
    fn test_failed_node_blocks_downstream() {
        let mut m = manager();
        let scale = m.create_node("Scale").unwrap();
        let sink = m.create_node("Collect").unwrap();
        m.connect(&scale, "out", &sink, "in").unwrap();

        // Scale has no input value, so it fails.
        let report = m.run_all().unwrap();
        assert!(report.failure(&scale).is_some());
        assert!(report.is_unresolved(&sink));
        assert_eq!(m.state(&sink).unwrap(), &NodeState::Unresolved);
        assert!(matches!(m.state(&scale).unwrap(), NodeState::Error(_)));
    }

    #[test]
    fn test_remove_node_marks_downstream_dirty() {
        let mut m = manager();
        let tri = m.create_node("Triangle").unwrap();
        let scale = m.create_node("Scale").unwrap();
        let sink = m.create_node("Collect").unwrap();
        m.connect(&tri, "attr", &scale, "in").unwrap();
        m.connect(&scale, "out", &sink, "in").unwrap();
        m.run_all().unwrap();
        assert_eq!(m.dirty_nodes().count(), 0);

        m.remove_node(&tri).unwrap();
        assert!(m.is_dirty(&scale));
        assert!(!m.is_dirty(&sink));

        let report = m.run_dirty().unwrap();
        assert_eq!(
            report.failure(&scale),
            Some(&ProcessingError::MissingInput("in".into()))
        );
        assert!(report.is_unresolved(&sink));
    }

    #[test]
    fn test_failed_delivery_fails_the_producer() {
        let mut m = manager();
        let tri = m.create_node("Triangle").unwrap();
        let sink = m.create_node("Collect").unwrap();
        m.connect(&tri, "attr", &sink, "in").unwrap();
        // Edge to an input the target never declared
        m.connections
            .push(Connection::new(tri.clone(), "attr", sink.clone(), "ghost"));
        m.invalidate_plan();

        let report = m.run_all().unwrap();
        match report.failure(&tri) {
            Some(ProcessingError::Propagation {
                output,
                to_terminal,
                source: GraphError::UnknownTerminal { .. },
                ..
            }) => {
                assert_eq!(output, "attr");
                assert_eq!(to_terminal, "ghost");
            }
            other => panic!("unexpected failure: {:?}", other),
        }
        assert!(matches!(m.state(&tri).unwrap(), NodeState::Error(_)));
        assert!(m.input_value(&sink, "in").unwrap().is_some());
        assert!(report.is_unresolved(&sink));
        assert!(!report.is_success());
    }

    #[test]
    fn test_node_as_wrong_kind() {
        let mut m = manager();
        let scale = m.create_node("Scale").unwrap();
        assert!(m.node_as::<ScaleNode>(&scale).is_some());
        assert!(m.node_as::<CollectNode>(&scale).is_none());
    }
}
