//! Scheduling: topological ordering and reachability over the connection graph.
//!
//! `Scheduler::compile` turns the node list and connections into an
//! [`ExecutionPlan`] holding every node in dependency order. The manager
//! caches the plan and recompiles it lazily when the topology changes;
//! incremental runs filter the cached order by forward reachability.

use crate::flowchart::connection::Connections;
use crate::flowchart::error::{GraphError, GraphResult};
use crate::flowchart::id::NodeId;
use indexmap::IndexSet;
use std::collections::{HashSet, VecDeque};
use std::time::Instant;

/// Node order for a batch run, plus bookkeeping about the graph.
#[derive(Debug, Clone, Default)]
pub struct ExecutionPlan {
    /// All nodes in topological order; ties keep insertion order.
    pub order: Vec<NodeId>,

    /// Topology generation this plan was compiled for.
    pub generation: u64,

    pub stats: PlanStats,
}

/// Statistics about a compiled plan
#[derive(Debug, Clone, Default)]
pub struct PlanStats {
    pub total_nodes: usize,

    /// Nodes without incoming connections
    pub source_nodes: usize,

    /// Nodes without outgoing connections
    pub sink_nodes: usize,

    /// Isolated nodes (no connections at all)
    pub disconnected_nodes: usize,

    pub compile_time_us: u64,
}

impl ExecutionPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The part of the order contained in `subset`, order preserved.
    pub fn restricted_to(&self, subset: &HashSet<NodeId>) -> Vec<NodeId> {
        self.order
            .iter()
            .filter(|id| subset.contains(*id))
            .cloned()
            .collect()
    }
}

/// Compiles node lists and connections into execution plans.
pub struct Scheduler;

impl Scheduler {
    /// Order `nodes` by connection dependency (Kahn's algorithm).
    ///
    /// Fails with `CycleDetected` naming an edge among the unschedulable
    /// nodes. `connect` rejects cycles, so this only fires when the graph
    /// was corrupted behind the manager's back.
    pub fn compile<'a>(
        nodes: impl IntoIterator<Item = &'a NodeId>,
        connections: &Connections,
        generation: u64,
    ) -> GraphResult<ExecutionPlan> {
        let start_time = Instant::now();

        let index: IndexSet<&NodeId> = nodes.into_iter().collect();
        let n = index.len();
        let (fwd_adj, bwd_adj) = Self::build_adjacency(&index, connections);

        let mut in_degree: Vec<usize> = bwd_adj.iter().map(Vec::len).collect();
        let mut queue: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);

        while let Some(node) = queue.pop_front() {
            order.push(node);
            for &next in &fwd_adj[node] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    queue.push_back(next);
                }
            }
        }

        if order.len() != n {
            let scheduled: HashSet<usize> = order.iter().copied().collect();
            let stuck = (0..n)
                .find(|i| !scheduled.contains(i))
                .and_then(|to| {
                    bwd_adj[to]
                        .iter()
                        .find(|from| !scheduled.contains(*from))
                        .map(|&from| (from, to))
                });
            tracing::error!(
                "Flowchart has a cycle: only {} of {} nodes schedulable",
                order.len(),
                n
            );
            let (from, to) = stuck.unwrap_or((0, 0));
            return Err(GraphError::CycleDetected {
                from: index[from].clone(),
                to: index[to].clone(),
            });
        }

        let stats = PlanStats {
            total_nodes: n,
            source_nodes: bwd_adj.iter().filter(|v| v.is_empty()).count(),
            sink_nodes: fwd_adj.iter().filter(|v| v.is_empty()).count(),
            disconnected_nodes: (0..n)
                .filter(|&i| fwd_adj[i].is_empty() && bwd_adj[i].is_empty())
                .count(),
            compile_time_us: start_time.elapsed().as_micros() as u64,
        };

        Ok(ExecutionPlan {
            order: order.into_iter().map(|i| index[i].clone()).collect(),
            generation,
            stats,
        })
    }

    /// Every node reachable from `seeds` along connections, seeds included.
    pub fn forward_reachable<'a>(
        seeds: impl IntoIterator<Item = &'a NodeId>,
        connections: &Connections,
    ) -> HashSet<NodeId> {
        let mut reachable: HashSet<NodeId> = HashSet::new();
        let mut stack: Vec<NodeId> = Vec::new();

        for seed in seeds {
            if reachable.insert(seed.clone()) {
                stack.push(seed.clone());
            }
        }

        while let Some(node) = stack.pop() {
            for edge in connections.outgoing(&node) {
                if reachable.insert(edge.to_node.clone()) {
                    stack.push(edge.to_node.clone());
                }
            }
        }

        reachable
    }

    /// Build forward and backward adjacency lists. Edges naming nodes
    /// outside `index` are skipped.
    fn build_adjacency(
        index: &IndexSet<&NodeId>,
        connections: &Connections,
    ) -> (Vec<Vec<usize>>, Vec<Vec<usize>>) {
        let n = index.len();
        let mut fwd_adj = vec![Vec::new(); n];
        let mut bwd_adj = vec![Vec::new(); n];

        for edge in connections.iter() {
            let (Some(from), Some(to)) = (
                index.get_index_of(&edge.from_node),
                index.get_index_of(&edge.to_node),
            ) else {
                continue;
            };
            fwd_adj[from].push(to);
            bwd_adj[to].push(from);
        }

        (fwd_adj, bwd_adj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flowchart::connection::Connection;

    fn ids(names: &[&str]) -> Vec<NodeId> {
        names.iter().map(|n| NodeId::from(*n)).collect()
    }

    fn edges(pairs: &[(&str, &str)]) -> Connections {
        let mut c = Connections::new();
        for (i, (from, to)) in pairs.iter().enumerate() {
            c.push(Connection::new(*from, "out", *to, format!("in{}", i)));
        }
        c
    }

    fn position(order: &[NodeId], id: &str) -> usize {
        order.iter().position(|n| n.as_str() == id).unwrap()
    }

    #[test]
    fn test_compile_respects_dependencies() {
        // Inserted in reverse of dependency order.
        let nodes = ids(&["sink", "mid", "src"]);
        let c = edges(&[("src", "mid"), ("mid", "sink")]);
        let plan = Scheduler::compile(&nodes, &c, 1).unwrap();
        assert_eq!(plan.order, ids(&["src", "mid", "sink"]));
        assert_eq!(plan.generation, 1);
        assert_eq!(plan.stats.total_nodes, 3);
        assert_eq!(plan.stats.source_nodes, 1);
        assert_eq!(plan.stats.sink_nodes, 1);
    }

    #[test]
    fn test_compile_keeps_insertion_order_for_independent_nodes() {
        let nodes = ids(&["b", "a", "c"]);
        let plan = Scheduler::compile(&nodes, &Connections::new(), 0).unwrap();
        assert_eq!(plan.order, nodes);
        assert_eq!(plan.stats.disconnected_nodes, 3);
    }

    #[test]
    fn test_compile_diamond() {
        let nodes = ids(&["a", "b", "c", "d"]);
        let c = edges(&[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")]);
        let plan = Scheduler::compile(&nodes, &c, 0).unwrap();
        assert!(position(&plan.order, "a") < position(&plan.order, "b"));
        assert!(position(&plan.order, "a") < position(&plan.order, "c"));
        assert!(position(&plan.order, "b") < position(&plan.order, "d"));
        assert!(position(&plan.order, "c") < position(&plan.order, "d"));
    }

    #[test]
    fn test_compile_reports_cycle() {
        let nodes = ids(&["a", "b"]);
        let c = edges(&[("a", "b"), ("b", "a")]);
        let err = Scheduler::compile(&nodes, &c, 0).unwrap_err();
        assert!(matches!(err, GraphError::CycleDetected { .. }));
    }

    #[test]
    fn test_forward_reachable() {
        let c = edges(&[("a", "b"), ("b", "c"), ("x", "y")]);
        let seeds = ids(&["b"]);
        let reach = Scheduler::forward_reachable(&seeds, &c);
        let mut names: Vec<_> = reach.iter().map(NodeId::as_str).collect();
        names.sort();
        assert_eq!(names, ["b", "c"]);
    }

    #[test]
    fn test_restricted_order() {
        let nodes = ids(&["a", "b", "c"]);
        let c = edges(&[("a", "b"), ("b", "c")]);
        let plan = Scheduler::compile(&nodes, &c, 0).unwrap();
        let subset: HashSet<NodeId> = ids(&["c", "b"]).into_iter().collect();
        assert_eq!(plan.restricted_to(&subset), ids(&["b", "c"]));
    }
}
