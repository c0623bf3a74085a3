//! Stub activation nodes shared by the analyzer/generator test modules.

use std::sync::Arc;

use cascade_graph::PortIndex;
use cascade_ir::{
    ActivationAlgorithms, ActivationNode, AlgorithmStorage, InputActivation, Statement, VarDef,
};

/// One bound input, one output; fires the bound value onward. The bound
/// variable's type comes from the caller's source-type table.
pub(crate) struct SeedNode;

impl ActivationNode for SeedNode {
    fn input_names(&self) -> &[&'static str] {
        &["seed"]
    }

    fn output_names(&self) -> &[&'static str] {
        &["out"]
    }

    fn activation_algorithms(&self, storage: &mut AlgorithmStorage) -> ActivationAlgorithms {
        forwarder(storage, "seed")
    }
}

pub(crate) fn seed_node() -> Arc<dyn ActivationNode> {
    Arc::new(SeedNode)
}

/// Same shape as [`SeedNode`], but fed by an edge: its variable type
/// resolves through the upstream activation.
pub(crate) struct RelayNode;

impl ActivationNode for RelayNode {
    fn input_names(&self) -> &[&'static str] {
        &["in"]
    }

    fn output_names(&self) -> &[&'static str] {
        &["out"]
    }

    fn activation_algorithms(&self, storage: &mut AlgorithmStorage) -> ActivationAlgorithms {
        forwarder(storage, "x")
    }
}

pub(crate) fn relay_node() -> Arc<dyn ActivationNode> {
    Arc::new(RelayNode)
}

/// Terminal node: one bound input, no outputs, no-op activation.
pub(crate) struct SinkNode;

impl ActivationNode for SinkNode {
    fn input_names(&self) -> &[&'static str] {
        &["in"]
    }

    fn output_names(&self) -> &[&'static str] {
        &[]
    }

    fn activation_algorithms(&self, storage: &mut AlgorithmStorage) -> ActivationAlgorithms {
        let var = storage.add_var("y", VarDef::FromBinding);
        let block = storage.add_block(vec![], vec![]);
        let stmt = storage.add_statement(Statement::Block(block));
        ActivationAlgorithms {
            input_bindings: vec![(PortIndex(0), var)],
            per_input: vec![InputActivation {
                required_inputs: 0,
                activate: stmt,
            }],
            context: None,
        }
    }
}

pub(crate) fn sink_node() -> Arc<dyn ActivationNode> {
    Arc::new(SinkNode)
}

/// Fires the same output twice with differently typed values, poisoning
/// any downstream from-binding resolution.
pub(crate) struct ConflictNode;

impl ActivationNode for ConflictNode {
    fn input_names(&self) -> &[&'static str] {
        &["trigger"]
    }

    fn output_names(&self) -> &[&'static str] {
        &["out"]
    }

    fn activation_algorithms(&self, storage: &mut AlgorithmStorage) -> ActivationAlgorithms {
        let trigger = storage.add_var("trigger", VarDef::FromBinding);
        let narrow_ty = storage.add_type("uint32_t", None);
        let wide_ty = storage.add_type("double", None);
        let narrow = storage.add_var("narrow", VarDef::Concrete(narrow_ty));
        let wide = storage.add_var("wide", VarDef::Concrete(wide_ty));
        let first = storage.add_output_activation(PortIndex(0), narrow);
        let first = storage.add_statement(Statement::OutputActivation(first));
        let second = storage.add_output_activation(PortIndex(0), wide);
        let second = storage.add_statement(Statement::OutputActivation(second));
        let block = storage.add_block(vec![narrow, wide], vec![first, second]);
        let stmt = storage.add_statement(Statement::Block(block));
        ActivationAlgorithms {
            input_bindings: vec![(PortIndex(0), trigger)],
            per_input: vec![InputActivation {
                required_inputs: 0,
                activate: stmt,
            }],
            context: None,
        }
    }
}

pub(crate) fn conflict_node() -> Arc<dyn ActivationNode> {
    Arc::new(ConflictNode)
}

/// Forwards its own bound value to its own input when wired `out -> in`,
/// producing a circular binding chain.
pub(crate) struct SelfLoopNode;

impl ActivationNode for SelfLoopNode {
    fn input_names(&self) -> &[&'static str] {
        &["in"]
    }

    fn output_names(&self) -> &[&'static str] {
        &["out"]
    }

    fn activation_algorithms(&self, storage: &mut AlgorithmStorage) -> ActivationAlgorithms {
        forwarder(storage, "z")
    }
}

pub(crate) fn self_loop_node() -> Arc<dyn ActivationNode> {
    Arc::new(SelfLoopNode)
}

/// The shared shape: bind input 0 to a from-binding variable and fire it
/// out of output 0 on activation.
fn forwarder(storage: &mut AlgorithmStorage, var_name: &str) -> ActivationAlgorithms {
    let var = storage.add_var(var_name, VarDef::FromBinding);
    let activation = storage.add_output_activation(PortIndex(0), var);
    let stmt = storage.add_statement(Statement::OutputActivation(activation));
    ActivationAlgorithms {
        input_bindings: vec![(PortIndex(0), var)],
        per_input: vec![InputActivation {
            required_inputs: 0,
            activate: stmt,
        }],
        context: None,
    }
}
