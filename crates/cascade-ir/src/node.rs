//! The activation node contract.
//!
//! The event-driven counterpart of
//! [`ComputationNode`](cascade_graph::ComputationNode): instead of an
//! imperative compute function, an activation node *declares*, per input
//! port, a small IR algorithm describing what happens when that port is
//! activated. The analyzer interprets the IR; the code generator turns it
//! into flat procedural code.

use cascade_graph::PortIndex;

use crate::ids::{StatementId, VarId, VarsId};
use crate::storage::AlgorithmStorage;

/// The activation algorithm for one input port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputActivation {
    /// Bitmask over the node's input ports: which ports must have been
    /// activated at least once before this port's algorithm may run.
    pub required_inputs: u64,
    /// The statement executed when the port is activated.
    pub activate: StatementId,
}

/// Everything an activation node declares about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationAlgorithms {
    /// Input ports bound to IR variables the generated code keeps in sync.
    pub input_bindings: Vec<(PortIndex, VarId)>,
    /// One activation per input port, in port order.
    pub per_input: Vec<InputActivation>,
    /// Persistent per-node state variables, if any.
    pub context: Option<VarsId>,
}

/// A node in an activation graph.
///
/// `activation_algorithms` allocates fresh IR entries in the shared
/// storage on every call; the ids it returns are not stable across calls.
/// Callers invoke it exactly once per node per compilation pass.
pub trait ActivationNode {
    /// Input port names, in port order.
    fn input_names(&self) -> &[&'static str];

    /// Output port names, in port order.
    fn output_names(&self) -> &[&'static str];

    fn input_count(&self) -> usize {
        self.input_names().len()
    }

    fn output_count(&self) -> usize {
        self.output_names().len()
    }

    /// Declare this node's per-port activation algorithms, allocating the
    /// IR into `storage`.
    fn activation_algorithms(&self, storage: &mut AlgorithmStorage) -> ActivationAlgorithms;
}
