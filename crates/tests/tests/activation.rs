//! End-to-end tests for the activation pipeline:
//! declare IR -> analyze -> generate C++.

use std::sync::Arc;

use cascade_tests::{ForwardActivationNode, SinkActivationNode};

use cascade_codegen::{Error, SourceType, analyze, generate};
use cascade_graph::{Edge, PortRef};
use cascade_ir::{ActivationNode, AlgorithmStorage};

/// A three-node chain resolves its binding types transitively and
/// generates a translation unit with synchronous dispatch.
#[test]
fn test_chain_generates_dispatching_code() {
    let nodes: Vec<Arc<dyn ActivationNode>> = vec![
        ForwardActivationNode::new("seed"),
        ForwardActivationNode::new("x"),
        SinkActivationNode::new(),
    ];
    let edges = [Edge::between(0, 0, 1, 0), Edge::between(1, 0, 2, 0)];
    let mut storage = AlgorithmStorage::new();
    let seed_ty = storage.add_type("uint64_t", None);
    let source_types = [SourceType {
        dest: PortRef::new(0, 0),
        ty: seed_ty,
    }];

    let analysis = analyze(&nodes, &edges, &source_types, &[], &mut storage).unwrap();

    // The sink's from-binding variable resolved through two hops.
    let sink_var = analysis.binding_var[&PortRef::new(2, 0)];
    assert_eq!(
        storage.ir_type(analysis.resolved[&sink_var]).unwrap().name,
        "uint64_t"
    );
    // Only the seed port is a source; it opens the entry sequence.
    assert_eq!(analysis.entry_order, vec![PortRef::new(0, 0)]);

    let code = generate(&storage, &analysis).unwrap();
    assert!(code.contains("struct Context {"));
    assert!(code.contains("void activate_node_0_0(Context& ctx)"));
    assert!(code.contains("activate_node_1_0(ctx);"));
    assert!(code.contains("activate_node_2_0(ctx);"));
    assert!(code.contains("void entry_point(Context* ctx)"));
    assert!(code.contains("activate_node_0_0(*ctx);"));
}

/// A binding chain that feeds itself is rejected as circular.
#[test]
fn test_self_feeding_chain_is_circular() {
    let nodes: Vec<Arc<dyn ActivationNode>> = vec![ForwardActivationNode::new("z")];
    let edges = [Edge::between(0, 0, 0, 0)];
    let mut storage = AlgorithmStorage::new();
    let err = analyze(&nodes, &edges, &[], &[], &mut storage).unwrap_err();
    assert!(matches!(err, Error::CircularBinding { .. }));
}

/// An unconnected bound port must be declared or explicitly ignored.
#[test]
fn test_undeclared_source_port_is_an_error() {
    let nodes: Vec<Arc<dyn ActivationNode>> = vec![SinkActivationNode::new()];
    let mut storage = AlgorithmStorage::new();
    let err = analyze(&nodes, &[], &[], &[], &mut storage).unwrap_err();
    assert_eq!(
        err,
        Error::MissingSourceType {
            port: PortRef::new(0, 0)
        }
    );
}
