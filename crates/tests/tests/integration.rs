//! End-to-end tests for the plain computation pipeline:
//! build graph -> compile -> compute -> verify -> recompute.

use cascade_tests::{ConstNode, CountingAddNode, FormulaNode, GraphHarness};

use cascade_graph::{ComputationNode, Error};
use std::sync::Arc;

/// A diamond plus a formula tail computes the expected values end to end.
#[test]
fn test_diamond_with_formula_tail() {
    let mut harness = GraphHarness::new();
    let lhs = harness.add_node(ConstNode::new(3.0));
    let rhs = harness.add_node(ConstNode::new(4.0));
    let counter = CountingAddNode::new();
    let sum = harness.add_node(counter.clone() as Arc<dyn ComputationNode>);
    let scaled = harness.add_node(FormulaNode::new("a*10+b"));

    harness.connect((lhs, 0), (sum, 0));
    harness.connect((rhs, 0), (sum, 1));
    harness.connect((sum, 0), (scaled, 0));
    harness.add_input(5.0, scaled, 1);

    harness.compile();
    assert!(harness.compute());

    assert_eq!(harness.output_scalar(sum, 0), 7.0);
    assert_eq!(harness.output_scalar(scaled, 0), 75.0);
    assert_eq!(counter.calls(), 1);
}

/// A second compute pass with unchanged inputs re-invokes nothing and
/// leaves every node timestamp alone.
#[test]
fn test_unchanged_recompute_is_a_no_op() {
    let mut harness = GraphHarness::new();
    let lhs = harness.add_node(ConstNode::new(1.0));
    let rhs = harness.add_node(ConstNode::new(2.0));
    let counter = CountingAddNode::new();
    let sum = harness.add_node(counter.clone() as Arc<dyn ComputationNode>);
    harness.connect((lhs, 0), (sum, 0));
    harness.connect((rhs, 0), (sum, 1));

    harness.compile();
    assert!(harness.compute());
    let ts: Vec<u64> = (0..3).map(|n| harness.node_ts(n)).collect();

    assert!(harness.compute());
    assert_eq!(counter.calls(), 1);
    assert_eq!((0..3).map(|n| harness.node_ts(n)).collect::<Vec<_>>(), ts);
}

/// Changing one source input re-invokes only the affected node.
#[test]
fn test_source_change_recomputes_downstream_only() {
    let mut harness = GraphHarness::new();
    let root = harness.add_node(ConstNode::new(1.0));
    let counter = CountingAddNode::new();
    let sum = harness.add_node(counter.clone() as Arc<dyn ComputationNode>);
    harness.connect((root, 0), (sum, 0));

    harness.compile();
    assert!(harness.compute());
    assert_eq!(harness.output_scalar(sum, 0), 1.0);
    let root_ts = harness.node_ts(root);

    harness.set_source(sum, 1, 41.0);
    assert!(harness.compute());
    assert_eq!(counter.calls(), 2);
    assert_eq!(harness.output_scalar(sum, 0), 42.0);
    // The untouched source keeps its timestamp.
    assert_eq!(harness.node_ts(root), root_ts);
}

/// Structural errors surface from compilation with the offending parts.
#[test]
fn test_structural_errors() {
    // Cycle: 0 -> 1 -> 0 has no sources at all.
    let mut harness = GraphHarness::new();
    let a = harness.add_node(FormulaNode::new("a"));
    let b = harness.add_node(FormulaNode::new("a"));
    harness.connect((a, 0), (b, 0));
    harness.connect((b, 0), (a, 0));
    assert_eq!(harness.try_compile().unwrap_err(), Error::NoSources);

    // Two writers into one port.
    let mut harness = GraphHarness::new();
    let x = harness.add_node(ConstNode::new(1.0));
    let y = harness.add_node(ConstNode::new(2.0));
    let z = harness.add_node(FormulaNode::new("a"));
    harness.connect((x, 0), (z, 0));
    harness.connect((y, 0), (z, 0));
    assert!(matches!(
        harness.try_compile().unwrap_err(),
        Error::DuplicateInputEdge { .. }
    ));
}
