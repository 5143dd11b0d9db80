//! Outcome of a batch or incremental run.

use crate::flowchart::error::ProcessingError;
use crate::flowchart::id::NodeId;
use std::fmt;
use std::time::Duration;

/// A node whose `process()` returned an error.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeFailure {
    pub node: NodeId,
    pub error: ProcessingError,
}

impl fmt::Display for NodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node {} failed: {}", self.node, self.error)
    }
}

/// Per-node result of one run. A run never aborts on a node failure, so
/// callers inspect this to see which nodes succeeded.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Nodes whose `process()` was invoked, in execution order (failed ones included).
    pub processed: Vec<NodeId>,

    pub failures: Vec<NodeFailure>,

    /// Nodes skipped because something upstream failed or was skipped.
    pub unresolved: Vec<NodeId>,

    pub elapsed: Duration,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// No failures and no unresolved nodes.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.unresolved.is_empty()
    }

    pub fn was_processed(&self, node: &NodeId) -> bool {
        self.processed.contains(node)
    }

    pub fn failure(&self, node: &NodeId) -> Option<&ProcessingError> {
        self.failures
            .iter()
            .find(|f| &f.node == node)
            .map(|f| &f.error)
    }

    pub fn is_unresolved(&self, node: &NodeId) -> bool {
        self.unresolved.contains(node)
    }

    /// Processed nodes that did not fail.
    pub fn succeeded(&self) -> impl Iterator<Item = &NodeId> {
        self.processed
            .iter()
            .filter(move |id| self.failure(id).is_none())
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} processed, {} failed, {} unresolved in {:.2?}",
            self.processed.len(),
            self.failures.len(),
            self.unresolved.len(),
            self.elapsed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_failure_report() {
        let report = RunReport {
            processed: vec!["a".into(), "b".into(), "c".into()],
            failures: vec![NodeFailure {
                node: "b".into(),
                error: ProcessingError::failed("boom"),
            }],
            unresolved: vec!["d".into()],
            elapsed: Duration::from_millis(3),
        };
        assert!(!report.is_success());
        assert!(report.failure(&"b".into()).is_some());
        assert!(report.failure(&"a".into()).is_none());
        assert!(report.is_unresolved(&"d".into()));
        let ok: Vec<_> = report.succeeded().map(NodeId::as_str).collect();
        assert_eq!(ok, ["a", "c"]);
        assert!(report.to_string().starts_with("3 processed, 1 failed, 1 unresolved"));
    }

    #[test]
    fn test_empty_report_is_success() {
        assert!(RunReport::new().is_success());
    }
}
