//! Stub nodes shared by the compile/compute test modules.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use cascade_value::{TypeRegistry, Value};

use crate::node::{ComputationNode, ComputeContext};

/// Source node emitting a fixed f64.
pub(crate) struct ConstNode {
    value: f64,
}

impl ComputationNode for ConstNode {
    fn input_names(&self) -> &[&'static str] {
        &[]
    }

    fn output_names(&self) -> &[&'static str] {
        &["value"]
    }

    fn default_inputs(&self, _inputs: &mut [Value], _types: &TypeRegistry) {}

    fn compute_outputs(
        &self,
        outputs: &mut [Value],
        _inputs: &[Value],
        ctx: &ComputeContext<'_>,
    ) -> bool {
        outputs[0] = Value::of(ctx.types, self.value);
        true
    }
}

pub(crate) fn const_node(value: f64) -> Arc<dyn ComputationNode> {
    Arc::new(ConstNode { value })
}

/// Copies its single input to its single output.
pub(crate) struct PassNode;

impl ComputationNode for PassNode {
    fn input_names(&self) -> &[&'static str] {
        &["in"]
    }

    fn output_names(&self) -> &[&'static str] {
        &["out"]
    }

    fn default_inputs(&self, inputs: &mut [Value], types: &TypeRegistry) {
        inputs[0] = Value::of(types, 0.0_f64);
    }

    fn compute_outputs(
        &self,
        outputs: &mut [Value],
        inputs: &[Value],
        _ctx: &ComputeContext<'_>,
    ) -> bool {
        outputs[0] = inputs[0].clone();
        true
    }
}

pub(crate) fn pass_node() -> Arc<dyn ComputationNode> {
    Arc::new(PassNode)
}

/// Adds two f64 inputs.
pub(crate) struct AddNode;

impl ComputationNode for AddNode {
    fn input_names(&self) -> &[&'static str] {
        &["a", "b"]
    }

    fn output_names(&self) -> &[&'static str] {
        &["sum"]
    }

    fn default_inputs(&self, inputs: &mut [Value], types: &TypeRegistry) {
        inputs[0] = Value::of(types, 0.0_f64);
        inputs[1] = Value::of(types, 0.0_f64);
    }

    fn compute_outputs(
        &self,
        outputs: &mut [Value],
        inputs: &[Value],
        ctx: &ComputeContext<'_>,
    ) -> bool {
        let a: f64 = inputs[0].convert_to().unwrap();
        let b: f64 = inputs[1].convert_to().unwrap();
        outputs[0] = Value::of(ctx.types, a + b);
        true
    }
}

pub(crate) fn add_node() -> Arc<dyn ComputationNode> {
    Arc::new(AddNode)
}

/// Adder that counts how many times it was invoked.
pub(crate) struct CountingAdd {
    calls: AtomicU32,
}

impl CountingAdd {
    pub(crate) fn calls(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}

impl ComputationNode for CountingAdd {
    fn input_names(&self) -> &[&'static str] {
        &["a", "b"]
    }

    fn output_names(&self) -> &[&'static str] {
        &["sum"]
    }

    fn default_inputs(&self, inputs: &mut [Value], types: &TypeRegistry) {
        inputs[0] = Value::of(types, 0.0_f64);
        inputs[1] = Value::of(types, 0.0_f64);
    }

    fn compute_outputs(
        &self,
        outputs: &mut [Value],
        inputs: &[Value],
        ctx: &ComputeContext<'_>,
    ) -> bool {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let a: f64 = inputs[0].convert_to().unwrap();
        let b: f64 = inputs[1].convert_to().unwrap();
        outputs[0] = Value::of(ctx.types, a + b);
        true
    }
}

pub(crate) fn counting_add_node() -> Arc<CountingAdd> {
    Arc::new(CountingAdd {
        calls: AtomicU32::new(0),
    })
}

/// Simulates a long scan that notices cancellation partway through: it
/// trips the shared token itself and reports the cancelled state.
pub(crate) struct SelfCancellingNode;

impl ComputationNode for SelfCancellingNode {
    fn input_names(&self) -> &[&'static str] {
        &[]
    }

    fn output_names(&self) -> &[&'static str] {
        &["value"]
    }

    fn default_inputs(&self, _inputs: &mut [Value], _types: &TypeRegistry) {}

    fn compute_outputs(
        &self,
        _outputs: &mut [Value],
        _inputs: &[Value],
        ctx: &ComputeContext<'_>,
    ) -> bool {
        ctx.cancel.cancel();
        !ctx.is_cancelled()
    }
}

pub(crate) fn self_cancelling_node() -> Arc<dyn ComputationNode> {
    Arc::new(SelfCancellingNode)
}
