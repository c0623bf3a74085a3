//! Graph compilation and evaluation errors

use thiserror::Error;

use crate::graph::{Edge, NodeIndex, PortRef};

/// Graph result type
pub type Result<T> = std::result::Result<T, Error>;

fn join_nodes(nodes: &[NodeIndex]) -> String {
    nodes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_edges(edges: &[Edge]) -> String {
    edges
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Structural graph errors, all detected eagerly during [`compile`] or
/// when validating evaluation state. Always fatal to that compilation;
/// no partial schedules are produced.
///
/// [`compile`]: crate::compile::compile
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("edge {edge} references node {node} which does not exist ({count} nodes)")]
    EdgeNodeOutOfRange {
        edge: Edge,
        node: NodeIndex,
        count: usize,
    },

    #[error("edge {edge} references port {port} out of range ({count} ports)")]
    EdgePortOutOfRange {
        edge: Edge,
        port: PortRef,
        count: usize,
    },

    #[error("edge {edge} is not the only one coming to the input port {port}")]
    DuplicateInputEdge { edge: Edge, port: PortRef },

    #[error("graph has no sources")]
    NoSources,

    #[error("nodes {} cannot be reached from the graph sources", join_nodes(.nodes))]
    UnreachableNodes { nodes: Vec<NodeIndex> },

    #[error("edges {} cannot be compiled due to a cycle", join_edges(.edges))]
    CycleDetected { edges: Vec<Edge> },

    #[error("source input destination {port} is also the target of a graph edge")]
    AmbiguousSourceInput { port: PortRef },

    #[error("more than one source input targets port {port}")]
    DuplicateSourceInput { port: PortRef },

    #[error("source input destination {port} does not exist")]
    SourceDestOutOfRange { port: PortRef },

    #[error("computation result holds {found} nodes, schedule expects {expected}")]
    ShapeMismatch { expected: usize, found: usize },
}
