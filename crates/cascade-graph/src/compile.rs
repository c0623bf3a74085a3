//! Graph compilation: validation, leveling, source-input merge.
//!
//! `compile` turns a node/edge graph into an immutable scheduling plan.
//! Nodes are partitioned into topologically ordered levels; every node in
//! level L has all of its upstream dependencies in levels < L. Edges are
//! grouped by the level of their source node, so the evaluator can
//! propagate them as soon as that level completes. The plan also records,
//! per node, the deduplicated set of upstream node indices used for O(1)
//! staleness checks during evaluation.

use std::sync::Arc;

use tracing::{debug, instrument, trace};

use cascade_value::{TypeRegistry, Value};

use crate::error::{Error, Result};
use crate::graph::{Edge, NodeIndex, SourceInput, SourceInputs};
use crate::node::ComputationNode;

/// The compiled schedule: level groups, per-level edge groups, per-node
/// upstream sources, and port widths for shape validation.
///
/// Built once by [`compile`], reused across any number of
/// [`compute`](crate::compute::compute) calls until the graph structure
/// changes.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputationInstructions {
    levels: Vec<Vec<NodeIndex>>,
    /// `edges_by_level[l]` holds the edges whose source node sits in level
    /// `l`, sorted; they are propagated once that level has computed.
    edges_by_level: Vec<Vec<Edge>>,
    /// Deduplicated upstream node indices per node, sorted.
    sources: Vec<Vec<NodeIndex>>,
    input_counts: Vec<usize>,
    output_counts: Vec<usize>,
}

impl ComputationInstructions {
    pub fn node_count(&self) -> usize {
        self.input_counts.len()
    }

    pub fn levels(&self) -> &[Vec<NodeIndex>] {
        &self.levels
    }

    /// Edges to propagate after the given level has computed.
    pub fn edges_after(&self, level: usize) -> &[Edge] {
        &self.edges_by_level[level]
    }

    /// Upstream node indices feeding the given node.
    pub fn sources_of(&self, node: NodeIndex) -> &[NodeIndex] {
        &self.sources[node.0]
    }

    pub fn input_count(&self, node: NodeIndex) -> usize {
        self.input_counts[node.0]
    }

    pub fn output_count(&self, node: NodeIndex) -> usize {
        self.output_counts[node.0]
    }
}

/// Compile a node/edge graph into scheduling instructions, merging the
/// explicitly provided source inputs with node-declared defaults for every
/// remaining unconnected input port.
///
/// Fails on any structural error: dangling edge endpoints, more than one
/// edge writing an input port, a graph without sources, unreachable nodes,
/// cycles, or ambiguous/duplicate source inputs. Level membership and edge
/// order are deterministic for a fixed graph.
#[instrument(skip_all, fields(nodes = nodes.len(), edges = edges.len()))]
pub fn compile(
    nodes: &[Arc<dyn ComputationNode>],
    edges: &[Edge],
    explicit_inputs: &[SourceInput],
    types: &TypeRegistry,
) -> Result<(ComputationInstructions, SourceInputs)> {
    let input_counts: Vec<usize> = nodes.iter().map(|n| n.input_count()).collect();
    let output_counts: Vec<usize> = nodes.iter().map(|n| n.output_count()).collect();

    validate_edges(edges, &input_counts, &output_counts)?;

    // Per-node input-connection map; rejects a second writer per port.
    let mut connected: Vec<Vec<bool>> = input_counts.iter().map(|&c| vec![false; c]).collect();
    for edge in edges {
        let slot = &mut connected[edge.to.node.0][edge.to.port.0];
        if *slot {
            return Err(Error::DuplicateInputEdge {
                edge: *edge,
                port: edge.to,
            });
        }
        *slot = true;
    }

    let levels = build_levels(nodes.len(), edges)?;
    debug!(levels = levels.len(), "graph leveled");

    // Group edges by the level of their source node, sorted within each
    // group so schedules and diagnostics are reproducible.
    let mut level_of = vec![0usize; nodes.len()];
    for (level_index, level) in levels.iter().enumerate() {
        for node in level {
            level_of[node.0] = level_index;
        }
    }
    let mut edges_by_level: Vec<Vec<Edge>> = vec![Vec::new(); levels.len()];
    for edge in edges {
        edges_by_level[level_of[edge.from.node.0]].push(*edge);
    }
    for group in &mut edges_by_level {
        group.sort();
    }

    // Deduplicated upstream node set per node, for staleness checks.
    let mut sources: Vec<Vec<NodeIndex>> = vec![Vec::new(); nodes.len()];
    for edge in edges {
        let list = &mut sources[edge.to.node.0];
        if !list.contains(&edge.from.node) {
            list.push(edge.from.node);
        }
    }
    for list in &mut sources {
        list.sort();
    }

    let source_inputs = merge_source_inputs(nodes, &connected, explicit_inputs, types)?;

    Ok((
        ComputationInstructions {
            levels,
            edges_by_level,
            sources,
            input_counts,
            output_counts,
        },
        source_inputs,
    ))
}

fn validate_edges(
    edges: &[Edge],
    input_counts: &[usize],
    output_counts: &[usize],
) -> Result<()> {
    let node_count = input_counts.len();
    for edge in edges {
        for (end, counts, is_output) in [
            (edge.from, output_counts, true),
            (edge.to, input_counts, false),
        ] {
            if end.node.0 >= node_count {
                return Err(Error::EdgeNodeOutOfRange {
                    edge: *edge,
                    node: end.node,
                    count: node_count,
                });
            }
            let port_count = counts[end.node.0];
            if end.port.0 >= port_count {
                trace!(%edge, is_output, "edge port out of range");
                return Err(Error::EdgePortOutOfRange {
                    edge: *edge,
                    port: end,
                    count: port_count,
                });
            }
        }
    }
    Ok(())
}

/// Partition nodes into topological levels.
///
/// Level 0 holds every node without incoming edges (the sources). Each
/// following level holds the nodes whose incoming edges have all been
/// processed by earlier levels. A stall with nodes left over means the
/// remainder is either unreachable or cyclic; the cyclic case is diagnosed
/// by peeling pure-downstream nodes off the residual graph and reporting
/// the edges that stay.
fn build_levels(node_count: usize, edges: &[Edge]) -> Result<Vec<Vec<NodeIndex>>> {
    if node_count == 0 {
        return Ok(Vec::new());
    }

    let mut incoming = vec![0usize; node_count];
    for edge in edges {
        incoming[edge.to.node.0] += 1;
    }

    let mut known = vec![false; node_count];
    let mut satisfied = vec![0usize; node_count];
    let mut processed = vec![false; edges.len()];

    let mut current: Vec<NodeIndex> = (0..node_count)
        .filter(|&n| incoming[n] == 0)
        .map(NodeIndex)
        .collect();
    if current.is_empty() {
        return Err(Error::NoSources);
    }
    for node in &current {
        known[node.0] = true;
    }

    let mut levels = Vec::new();
    while !current.is_empty() {
        trace!(level = levels.len(), nodes = ?current, "level assigned");
        let mut next: Vec<NodeIndex> = Vec::new();
        for (edge_index, edge) in edges.iter().enumerate() {
            if processed[edge_index]
                || known[edge.to.node.0]
                || !current.contains(&edge.from.node)
            {
                continue;
            }
            processed[edge_index] = true;
            satisfied[edge.to.node.0] += 1;
            if satisfied[edge.to.node.0] == incoming[edge.to.node.0] {
                next.push(edge.to.node);
            }
        }
        next.sort();
        for node in &next {
            known[node.0] = true;
        }
        levels.push(current);
        current = next;
    }

    if known.iter().all(|&k| k) {
        return Ok(levels);
    }

    // Residual graph: the unprocessed edges between unleveled nodes. Peel
    // nodes without residual outgoing edges until a fixpoint; any edges
    // that remain close a cycle.
    let mut residual: Vec<Edge> = edges
        .iter()
        .enumerate()
        .filter(|(i, _)| !processed[*i])
        .map(|(_, e)| *e)
        .collect();
    loop {
        let before = residual.len();
        let has_outgoing: Vec<NodeIndex> = residual.iter().map(|e| e.from.node).collect();
        residual.retain(|e| has_outgoing.contains(&e.to.node));
        if residual.len() == before {
            break;
        }
    }

    if residual.is_empty() {
        let nodes: Vec<NodeIndex> = (0..node_count)
            .filter(|&n| !known[n])
            .map(NodeIndex)
            .collect();
        Err(Error::UnreachableNodes { nodes })
    } else {
        residual.sort();
        Err(Error::CycleDetected { edges: residual })
    }
}

/// Merge explicit source inputs with computed defaults.
///
/// Every explicit destination must be a real, unconnected input port and
/// must not be targeted twice. Every unconnected input port without an
/// explicit entry receives the owning node's declared default value.
fn merge_source_inputs(
    nodes: &[Arc<dyn ComputationNode>],
    connected: &[Vec<bool>],
    explicit_inputs: &[SourceInput],
    types: &TypeRegistry,
) -> Result<SourceInputs> {
    let mut covered: Vec<Vec<bool>> = connected.iter().map(|c| vec![false; c.len()]).collect();
    let mut inputs = Vec::new();

    for input in explicit_inputs {
        for dest in &input.destinations {
            let Some(ports) = connected.get(dest.node.0) else {
                return Err(Error::SourceDestOutOfRange { port: *dest });
            };
            if dest.port.0 >= ports.len() {
                return Err(Error::SourceDestOutOfRange { port: *dest });
            }
            if ports[dest.port.0] {
                return Err(Error::AmbiguousSourceInput { port: *dest });
            }
            if covered[dest.node.0][dest.port.0] {
                return Err(Error::DuplicateSourceInput { port: *dest });
            }
            covered[dest.node.0][dest.port.0] = true;
        }
        inputs.push(input.clone());
    }

    for (node_index, node) in nodes.iter().enumerate() {
        let uncovered: Vec<usize> = (0..node.input_count())
            .filter(|&p| !connected[node_index][p] && !covered[node_index][p])
            .collect();
        if uncovered.is_empty() {
            continue;
        }
        let mut defaults = vec![Value::empty(); node.input_count()];
        node.default_inputs(&mut defaults, types);
        for port in uncovered {
            inputs.push(SourceInput::to_port(
                defaults[port].clone(),
                node_index,
                port,
            ));
        }
    }

    Ok(SourceInputs { inputs })
}
