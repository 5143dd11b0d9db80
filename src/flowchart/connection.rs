//! Connections: directed edges from an output terminal to an input terminal.
//!
//! A connection carries no data; values are copied along it by the manager.
//! `Connections` keeps edges in insertion order so saved flowcharts list
//! them deterministically.

use crate::flowchart::id::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// One edge `from_node.from_terminal -> to_node.to_terminal`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub from_node: NodeId,
    pub from_terminal: String,
    pub to_node: NodeId,
    pub to_terminal: String,
}

impl Connection {
    pub fn new(
        from_node: impl Into<NodeId>,
        from_terminal: impl Into<String>,
        to_node: impl Into<NodeId>,
        to_terminal: impl Into<String>,
    ) -> Self {
        Self {
            from_node: from_node.into(),
            from_terminal: from_terminal.into(),
            to_node: to_node.into(),
            to_terminal: to_terminal.into(),
        }
    }

    pub fn touches(&self, node: &NodeId) -> bool {
        &self.from_node == node || &self.to_node == node
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} -> {}.{}",
            self.from_node, self.from_terminal, self.to_node, self.to_terminal
        )
    }
}

/// Ordered edge list of one graph.
#[derive(Debug, Clone, Default)]
pub struct Connections {
    edges: Vec<Connection>,
}

impl Connections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.edges.iter()
    }

    pub(crate) fn push(&mut self, connection: Connection) {
        self.edges.push(connection);
    }

    /// The edge feeding input `to_node.to_terminal`, if any.
    pub fn incoming(&self, to_node: &NodeId, to_terminal: &str) -> Option<&Connection> {
        self.edges
            .iter()
            .find(|c| &c.to_node == to_node && c.to_terminal == to_terminal)
    }

    /// Edges leaving any output of `node`.
    pub fn outgoing<'a>(&'a self, node: &'a NodeId) -> impl Iterator<Item = &'a Connection> + 'a {
        self.edges.iter().filter(move |c| &c.from_node == node)
    }

    /// Edges entering any input of `node`.
    pub fn upstream<'a>(&'a self, node: &'a NodeId) -> impl Iterator<Item = &'a Connection> + 'a {
        self.edges.iter().filter(move |c| &c.to_node == node)
    }

    /// Remove the edge feeding `to_node.to_terminal`.
    pub(crate) fn remove_incoming(
        &mut self,
        to_node: &NodeId,
        to_terminal: &str,
    ) -> Option<Connection> {
        let pos = self
            .edges
            .iter()
            .position(|c| &c.to_node == to_node && c.to_terminal == to_terminal)?;
        Some(self.edges.remove(pos))
    }

    /// Remove every edge touching `node`, returning them in order.
    pub(crate) fn remove_touching(&mut self, node: &NodeId) -> Vec<Connection> {
        let (removed, kept): (Vec<_>, Vec<_>) =
            self.edges.drain(..).partition(|c| c.touches(node));
        self.edges = kept;
        removed
    }

    /// Whether adding `from -> to` would close a cycle, i.e. `from` is
    /// already reachable from `to`. A self-edge is always a cycle.
    pub fn would_create_cycle(&self, from: &NodeId, to: &NodeId) -> bool {
        let mut visited: HashSet<&NodeId> = HashSet::new();
        let mut stack = vec![to];

        while let Some(current) = stack.pop() {
            if current == from {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            for edge in self.outgoing(current) {
                stack.push(&edge.to_node);
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(ids: &[&str]) -> Connections {
        let mut c = Connections::new();
        for pair in ids.windows(2) {
            c.push(Connection::new(pair[0], "out", pair[1], "in"));
        }
        c
    }

    #[test]
    fn test_cycle_detection_on_chain() {
        let c = chain(&["a", "b", "c"]);
        assert!(c.would_create_cycle(&"c".into(), &"a".into()));
        assert!(c.would_create_cycle(&"b".into(), &"a".into()));
        assert!(!c.would_create_cycle(&"a".into(), &"c".into()));
        assert!(c.would_create_cycle(&"a".into(), &"a".into()));
    }

    #[test]
    fn test_incoming_and_removal() {
        let mut c = chain(&["a", "b", "c"]);
        assert!(c.incoming(&"b".into(), "in").is_some());
        assert!(c.incoming(&"a".into(), "in").is_none());

        let removed = c.remove_incoming(&"b".into(), "in").unwrap();
        assert_eq!(removed.to_string(), "a.out -> b.in");
        assert_eq!(c.len(), 1);

        let mut c = chain(&["a", "b", "c"]);
        let removed = c.remove_touching(&"b".into());
        assert_eq!(removed.len(), 2);
        assert!(c.is_empty());
    }

    #[test]
    fn test_fan_out_from_one_output() {
        let mut c = Connections::new();
        c.push(Connection::new("src", "out", "x", "in"));
        c.push(Connection::new("src", "out", "y", "in"));
        c.push(Connection::new("src", "other", "z", "in"));
        let src = NodeId::from("src");
        assert_eq!(c.outgoing(&src).filter(|e| e.from_terminal == "out").count(), 2);
        assert_eq!(c.outgoing(&src).count(), 3);
    }
}
