//! Incremental graph evaluation.
//!
//! `compute` walks a compiled schedule level by level, copies values across
//! edges, and re-invokes only the nodes whose upstream state advanced since
//! their last run. Staleness is tracked with per-node logical timestamps
//! against a global counter bumped once per call; a node is stale when it
//! has never run, when one of its source inputs changed by value this
//! call, or when an upstream node carries a newer timestamp.
//!
//! Everything runs synchronously on the calling thread. Cancellation is
//! cooperative: the first node that reports it aborts the whole call with
//! `Ok(false)`, leaving the partially updated result in place for a later
//! retry.

use std::sync::Arc;

use tracing::{debug, instrument, trace};

use cascade_value::{TypeRegistry, Value};

use crate::compile::ComputationInstructions;
use crate::error::{Error, Result};
use crate::graph::{NodeIndex, SourceInputs};
use crate::node::{CancelToken, ComputationNode, ComputeContext};

/// Mutable evaluation state, reused across `compute` calls.
///
/// Holds the current input/output values per node and the timestamp
/// bookkeeping for incremental recomputation. When the graph topology
/// changes the caller discards the result and allocates a fresh one.
#[derive(Debug, Clone, Default)]
pub struct ComputationResult {
    inputs: Vec<Vec<Value>>,
    outputs: Vec<Vec<Value>>,
    /// Logical timestamp of each node's last recomputation; 0 = never ran.
    node_ts: Vec<u64>,
    /// Global counter, incremented once per `compute` call.
    computation_ts: u64,
}

impl ComputationResult {
    /// Allocate evaluation state shaped after a compiled schedule.
    pub fn new(instructions: &ComputationInstructions) -> Self {
        let node_count = instructions.node_count();
        Self {
            inputs: (0..node_count)
                .map(|n| vec![Value::empty(); instructions.input_count(NodeIndex(n))])
                .collect(),
            outputs: (0..node_count)
                .map(|n| vec![Value::empty(); instructions.output_count(NodeIndex(n))])
                .collect(),
            node_ts: vec![0; node_count],
            computation_ts: 0,
        }
    }

    pub fn inputs(&self, node: NodeIndex) -> &[Value] {
        &self.inputs[node.0]
    }

    pub fn outputs(&self, node: NodeIndex) -> &[Value] {
        &self.outputs[node.0]
    }

    pub fn node_ts(&self, node: NodeIndex) -> u64 {
        self.node_ts[node.0]
    }

    pub fn computation_ts(&self) -> u64 {
        self.computation_ts
    }

    fn validate_shape(&self, instructions: &ComputationInstructions) -> Result<()> {
        if self.node_ts.len() != instructions.node_count() {
            return Err(Error::ShapeMismatch {
                expected: instructions.node_count(),
                found: self.node_ts.len(),
            });
        }
        Ok(())
    }
}

/// Evaluate a compiled graph, recomputing only what is stale.
///
/// Returns `Ok(false)` when a node observed cancellation; the result then
/// holds partially updated state and the caller either discards it or
/// simply calls `compute` again later. Node panics are not caught: one
/// misbehaving node aborts the whole evaluation pass.
#[instrument(skip_all, fields(ts = result.computation_ts + 1))]
pub fn compute(
    instructions: &ComputationInstructions,
    nodes: &[Arc<dyn ComputationNode>],
    source_inputs: &SourceInputs,
    result: &mut ComputationResult,
    types: &TypeRegistry,
    cancel: &CancelToken,
    progress: Option<&dyn Fn(f64)>,
) -> Result<bool> {
    result.validate_shape(instructions)?;
    result.computation_ts += 1;
    let global_ts = result.computation_ts;

    // Apply source inputs, marking nodes whose fed value actually changed.
    // The comparison is by value, not by "was written": re-supplying an
    // identical input must not dirty anything.
    let mut source_changed = vec![false; nodes.len()];
    for input in &source_inputs.inputs {
        for dest in &input.destinations {
            let slot = &mut result.inputs[dest.node.0][dest.port.0];
            if *slot != input.value {
                *slot = input.value.clone();
                source_changed[dest.node.0] = true;
                trace!(node = %dest.node, port = %dest.port, "source input changed");
            }
        }
    }

    let total_nodes = instructions.node_count() as f64;
    let mut nodes_done = 0usize;

    for (level_index, level) in instructions.levels().iter().enumerate() {
        for &node_index in level {
            if cancel.is_cancelled() {
                debug!(node = %node_index, "computation cancelled before node");
                return Ok(false);
            }

            let upstream_max = instructions
                .sources_of(node_index)
                .iter()
                .map(|s| result.node_ts[s.0])
                .max()
                .unwrap_or(0);
            let driven = source_changed[node_index.0];
            let node_ts = result.node_ts[node_index.0];
            let stale = node_ts == 0 || driven || node_ts < upstream_max;

            if stale {
                trace!(node = %node_index, node_ts, upstream_max, driven, "recomputing");
                let base = nodes_done as f64;
                let adapter = progress.map(|outer| {
                    move |fraction: f64| outer((base + fraction) / total_nodes)
                });
                let mut ctx = ComputeContext::new(types, cancel);
                if let Some(adapter) = &adapter {
                    ctx = ctx.with_progress(adapter);
                }
                let node = &nodes[node_index.0];
                let completed = node.compute_outputs(
                    &mut result.outputs[node_index.0],
                    &result.inputs[node_index.0],
                    &ctx,
                );
                if !completed {
                    debug!(node = %node_index, "node reported cancellation");
                    return Ok(false);
                }
                // A source-driven run carries the call's timestamp; a
                // purely upstream-driven one inherits the newest source.
                result.node_ts[node_index.0] = if driven || upstream_max == 0 {
                    global_ts
                } else {
                    upstream_max
                };
            }

            nodes_done += 1;
            if let Some(outer) = progress {
                outer(nodes_done as f64 / total_nodes);
            }
        }

        // Propagate this level's outgoing edges; downstream levels only
        // ever run after this completes.
        for edge in instructions.edges_after(level_index) {
            let value = result.outputs[edge.from.node.0][edge.from.port.0].clone();
            result.inputs[edge.to.node.0][edge.to.port.0] = value;
        }
    }

    Ok(true)
}
