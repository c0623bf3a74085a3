//! The computation node contract.
//!
//! Every domain node implements [`ComputationNode`]: named ports, default
//! input values, and a pure `compute_outputs` from inputs to outputs. The
//! engine never inspects what a node does; it only schedules it and moves
//! [`Value`]s across its ports.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use cascade_value::{TypeRegistry, Value};

/// Cooperative cancellation token.
///
/// Cancellation is voluntary: long-running nodes poll the token between
/// iterations and bail out with `false`. A node that never checks cannot
/// be cancelled; there is no preemption and no timeout.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Visible to every clone of this token.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Context handed to a node while it computes.
///
/// Carries the type registry for building values, the cancellation token,
/// and an optional progress callback.
pub struct ComputeContext<'a> {
    pub types: &'a TypeRegistry,
    pub cancel: &'a CancelToken,
    pub progress: Option<&'a dyn Fn(f64)>,
}

impl<'a> ComputeContext<'a> {
    pub fn new(types: &'a TypeRegistry, cancel: &'a CancelToken) -> Self {
        Self {
            types,
            cancel,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn Fn(f64)) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Report progress in `[0, 1]`. Successive reports from one node must
    /// be non-decreasing; the callback runs synchronously on the calling
    /// thread.
    pub fn report_progress(&self, fraction: f64) {
        if let Some(progress) = self.progress {
            progress(fraction.clamp(0.0, 1.0));
        }
    }
}

/// A node in a plain computation graph.
///
/// Implementations must not retain references to `inputs` beyond the call.
/// `compute_outputs` returns `false` when it observed a cancellation
/// request before completing; its outputs are then partial and the caller
/// treats them as invalid.
pub trait ComputationNode {
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

    /// Fill every input slot with a sensible default value. `inputs` has
    /// exactly `input_count` slots.
    fn default_inputs(&self, inputs: &mut [Value], types: &TypeRegistry);

    /// Pure function from current inputs to new outputs.
    ///
    /// Long-running implementations poll `ctx.cancel` and report progress
    /// through `ctx` at a cadence coarse enough to stay cheap.
    fn compute_outputs(
        &self,
        outputs: &mut [Value],
        inputs: &[Value],
        ctx: &ComputeContext<'_>,
    ) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_shared_across_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
