//! Activation analysis and code generation errors

use thiserror::Error;

use cascade_graph::{Edge, NodeIndex, PortRef};
use cascade_ir::VarId;

/// Codegen result type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while analyzing an activation graph or generating code
/// from it. Structural errors carry the offending edge/port/node; type
/// resolution errors are reported per offending variable. All are fatal
/// to that compilation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Ir(#[from] cascade_ir::Error),

    #[error("edge {edge} references a node which does not exist ({count} nodes)")]
    EdgeNodeOutOfRange { edge: Edge, count: usize },

    #[error("edge {edge} references port {port} out of range ({count} ports)")]
    EdgePortOutOfRange {
        edge: Edge,
        port: PortRef,
        count: usize,
    },

    #[error("edge {edge} is not the only one coming to the input port {port}")]
    DuplicateInputEdge { edge: Edge, port: PortRef },

    #[error("node {node} declared {found} input activations, expected {expected}")]
    AlgorithmShape {
        node: NodeIndex,
        expected: usize,
        found: usize,
    },

    #[error("input binding targets port {port} which does not exist")]
    BadBindingPort { port: PortRef },

    #[error(
        "input port {port} is bound but neither fed by an edge, declared as a source, nor ignored"
    )]
    MissingSourceType { port: PortRef },

    #[error("source type declared for port {port} which is not an unconnected bound input")]
    UnusedSourceType { port: PortRef },

    #[error("variable {name} (id {var}) has a circular upstream binding chain")]
    CircularBinding { var: VarId, name: String },

    #[error("variable {name} (id {var}) resolves to conflicting types: {}", .types.join(", "))]
    ConflictingTypes {
        var: VarId,
        name: String,
        types: Vec<String>,
    },

    #[error("variable {name} (id {var}) cannot be resolved to a concrete type")]
    UnresolvedBinding { var: VarId, name: String },

    #[error("variable {name} (id {var}) is typed by an invocation with no return type")]
    VoidInvocation { var: VarId, name: String },

    #[error("required inputs of port {port} cannot be satisfied by any activation order")]
    UnsatisfiableRequiredInputs { port: PortRef },

    #[error("statement cannot be rendered inline in a for clause")]
    InlineUnsupported,
}
