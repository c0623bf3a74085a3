//! Graph structure: node/port indices, edges, source inputs.
//!
//! The graph itself is just a node list plus an edge list; nodes are trait
//! objects shared with the caller, never owned data entities. All
//! structural invariants (port ranges, single writer per input, acyclicity)
//! are enforced by [`compile`](crate::compile::compile), not assumed here.

use std::fmt;

use cascade_value::Value;

/// Position of a node in the graph's node list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub usize);

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of a port within a node's input or output port list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortIndex(pub usize);

impl fmt::Display for PortIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One end of an edge: a node plus one of its ports.
///
/// Whether the port is an input or an output port depends on which side of
/// an [`Edge`] the reference sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortRef {
    pub node: NodeIndex,
    pub port: PortIndex,
}

impl PortRef {
    pub fn new(node: usize, port: usize) -> Self {
        Self {
            node: NodeIndex(node),
            port: PortIndex(port),
        }
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.node, self.port)
    }
}

/// A directed connection from an output port to an input port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    /// Output side.
    pub from: PortRef,
    /// Input side.
    pub to: PortRef,
}

impl Edge {
    pub fn new(from: PortRef, to: PortRef) -> Self {
        Self { from, to }
    }

    /// Shorthand for `(node, port) -> (node, port)`.
    pub fn between(from_node: usize, from_port: usize, to_node: usize, to_port: usize) -> Self {
        Self {
            from: PortRef::new(from_node, from_port),
            to: PortRef::new(to_node, to_port),
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} -> {}]", self.from, self.to)
    }
}

/// A value fed into input ports that no edge writes.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceInput {
    pub value: Value,
    pub destinations: Vec<PortRef>,
}

impl SourceInput {
    pub fn new(value: Value, destinations: Vec<PortRef>) -> Self {
        Self {
            value,
            destinations,
        }
    }

    /// A source input with a single destination port.
    pub fn to_port(value: Value, node: usize, port: usize) -> Self {
        Self {
            value,
            destinations: vec![PortRef::new(node, port)],
        }
    }
}

/// The finalized source-input table: explicit entries merged with
/// node-declared defaults for every remaining unconnected input port.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceInputs {
    pub inputs: Vec<SourceInput>,
}

impl SourceInputs {
    /// Mutable access to the value feeding `dest`, if any entry targets it.
    ///
    /// Used between computations to change what the graph's source ports
    /// see without recompiling.
    pub fn value_for_mut(&mut self, dest: PortRef) -> Option<&mut Value> {
        self.inputs
            .iter_mut()
            .find(|input| input.destinations.contains(&dest))
            .map(|input| &mut input.value)
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}
