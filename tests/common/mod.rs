//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod nodes;

use flowgraph_rs::{NodeId, NodeManager, Value};
use std::path::PathBuf;

/// Path of a file under `tests/fixtures`
pub fn fixture_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(relative)
}

/// Assert two float sequences are approximately equal
pub fn assert_scalars_eq(actual: &[f32], expected: &[f32]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "Expected {:?}, got {:?}",
        expected,
        actual
    );
    for (a, e) in actual.iter().zip(expected) {
        assert!(
            (a - e).abs() < 1e-5,
            "Expected {:?}, got {:?}",
            expected,
            actual
        );
    }
}

/// Scalars currently held by an output terminal
pub fn output_scalars(manager: &NodeManager, id: &NodeId, terminal: &str) -> Option<Vec<f32>> {
    manager
        .output_value(id, terminal)
        .ok()
        .flatten()
        .and_then(Value::as_scalars)
        .map(<[f32]>::to_vec)
}
