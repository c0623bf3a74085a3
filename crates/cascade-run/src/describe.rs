//! Graph description loading.
//!
//! Parses the JSON graph description into the in-memory node/edge graph
//! plus the explicit source-input table consumed by the compiler. Port
//! endpoints are written `"node.port"` against the node ids and port
//! names the description declares.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use cascade_graph::{ComputationNode, Edge, PortRef, SourceInput};
use cascade_value::{TypeRegistry, Value};

use crate::nodes::build_node;

#[derive(Debug, Error)]
pub enum DescribeError {
    #[error("invalid graph description: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown node kind: {0}")]
    UnknownNodeKind(String),

    #[error("bad parameters for {kind} node: {message}")]
    BadParams { kind: String, message: String },

    #[error("duplicate node id: {0}")]
    DuplicateNodeId(String),

    #[error("endpoint `{0}` is not of the form `node.port`")]
    BadEndpoint(String),

    #[error("unknown node: {0}")]
    UnknownNode(String),

    #[error("node {node} has no {direction} port named {port}")]
    UnknownPort {
        node: String,
        port: String,
        direction: &'static str,
    },
}

#[derive(Debug, Deserialize)]
struct GraphDescription {
    nodes: Vec<NodeDescription>,
    #[serde(default)]
    edges: Vec<EdgeDescription>,
    #[serde(default)]
    inputs: Vec<InputDescription>,
}

#[derive(Debug, Deserialize)]
struct NodeDescription {
    id: String,
    kind: String,
    #[serde(default)]
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct EdgeDescription {
    from: String,
    to: String,
}

#[derive(Debug, Deserialize)]
struct InputDescription {
    value: f64,
    to: Vec<String>,
}

/// A description resolved into engine inputs.
pub struct LoadedGraph {
    pub node_names: Vec<String>,
    pub nodes: Vec<Arc<dyn ComputationNode>>,
    pub edges: Vec<Edge>,
    pub inputs: Vec<SourceInput>,
}

impl std::fmt::Debug for LoadedGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedGraph")
            .field("node_names", &self.node_names)
            .field("nodes", &format_args!("[{} nodes]", self.nodes.len()))
            .field("edges", &self.edges)
            .field("inputs", &self.inputs)
            .finish()
    }
}

/// Parse and resolve a JSON graph description.
pub fn load_graph(text: &str, types: &TypeRegistry) -> Result<LoadedGraph, DescribeError> {
    let description: GraphDescription = serde_json::from_str(text)?;

    let mut node_names = Vec::new();
    let mut nodes: Vec<Arc<dyn ComputationNode>> = Vec::new();
    for node in &description.nodes {
        if node_names.contains(&node.id) {
            return Err(DescribeError::DuplicateNodeId(node.id.clone()));
        }
        nodes.push(build_node(&node.kind, &node.params)?);
        node_names.push(node.id.clone());
    }

    let resolve = |endpoint: &str, output: bool| -> Result<PortRef, DescribeError> {
        let (node_id, port_name) = endpoint
            .rsplit_once('.')
            .ok_or_else(|| DescribeError::BadEndpoint(endpoint.to_string()))?;
        let node_index = node_names
            .iter()
            .position(|name| name == node_id)
            .ok_or_else(|| DescribeError::UnknownNode(node_id.to_string()))?;
        let names = if output {
            nodes[node_index].output_names()
        } else {
            nodes[node_index].input_names()
        };
        let port_index = names.iter().position(|name| *name == port_name).ok_or_else(|| {
            DescribeError::UnknownPort {
                node: node_id.to_string(),
                port: port_name.to_string(),
                direction: if output { "output" } else { "input" },
            }
        })?;
        Ok(PortRef::new(node_index, port_index))
    };

    let mut edges = Vec::new();
    for edge in &description.edges {
        edges.push(Edge::new(resolve(&edge.from, true)?, resolve(&edge.to, false)?));
    }

    let mut inputs = Vec::new();
    for input in &description.inputs {
        let destinations = input
            .to
            .iter()
            .map(|endpoint| resolve(endpoint, false))
            .collect::<Result<Vec<_>, _>>()?;
        inputs.push(SourceInput::new(Value::of(types, input.value), destinations));
    }

    Ok(LoadedGraph {
        node_names,
        nodes,
        edges,
        inputs,
    })
}
