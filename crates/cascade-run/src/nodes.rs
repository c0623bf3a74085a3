//! Builtin computation nodes.
//!
//! A deliberately small set, enough to instantiate described graphs: a
//! constant source, arithmetic combiners, and a formula node backed by the
//! expression calculator. Domain node libraries live outside the engine;
//! anything implementing [`ComputationNode`] plugs in the same way.

use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;

use cascade_expr::Expr;
use cascade_graph::{ComputationNode, ComputeContext};
use cascade_value::{TypeRegistry, Value};

use crate::describe::DescribeError;

/// Instantiate a builtin node from its description parameters.
pub fn build_node(
    kind: &str,
    params: &serde_json::Value,
) -> Result<Arc<dyn ComputationNode>, DescribeError> {
    match kind {
        "const" => {
            let params: ConstParams = from_params(kind, params)?;
            Ok(Arc::new(ConstNode {
                value: params.value,
            }))
        }
        "add" => Ok(Arc::new(AddNode)),
        "mul" => Ok(Arc::new(MulNode)),
        "expr" => {
            let params: ExprParams = from_params(kind, params)?;
            let expr = Expr::parse(&params.formula).map_err(|e| DescribeError::BadParams {
                kind: kind.to_string(),
                message: e.to_string(),
            })?;
            Ok(Arc::new(ExprNode { expr }))
        }
        other => Err(DescribeError::UnknownNodeKind(other.to_string())),
    }
}

fn from_params<'de, T: Deserialize<'de>>(
    kind: &str,
    params: &'de serde_json::Value,
) -> Result<T, DescribeError> {
    T::deserialize(params).map_err(|e| DescribeError::BadParams {
        kind: kind.to_string(),
        message: e.to_string(),
    })
}

#[derive(Debug, Deserialize)]
struct ConstParams {
    value: f64,
}

#[derive(Debug, Deserialize)]
struct ExprParams {
    formula: String,
}

fn scalar_input(value: &Value, name: &str) -> f64 {
    match value.convert_to::<f64>() {
        Ok(v) => v,
        Err(e) => {
            warn!(input = name, %e, "non-numeric input treated as 0");
            0.0
        }
    }
}

/// Emits a fixed value.
struct ConstNode {
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

struct AddNode;

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
        let sum = scalar_input(&inputs[0], "a") + scalar_input(&inputs[1], "b");
        outputs[0] = Value::of(ctx.types, sum);
        true
    }
}

struct MulNode;

impl ComputationNode for MulNode {
    fn input_names(&self) -> &[&'static str] {
        &["a", "b"]
    }

    fn output_names(&self) -> &[&'static str] {
        &["product"]
    }

    fn default_inputs(&self, inputs: &mut [Value], types: &TypeRegistry) {
        inputs[0] = Value::of(types, 1.0_f64);
        inputs[1] = Value::of(types, 1.0_f64);
    }

    fn compute_outputs(
        &self,
        outputs: &mut [Value],
        inputs: &[Value],
        ctx: &ComputeContext<'_>,
    ) -> bool {
        let product = scalar_input(&inputs[0], "a") * scalar_input(&inputs[1], "b");
        outputs[0] = Value::of(ctx.types, product);
        true
    }
}

/// Evaluates a compiled formula over inputs `a` and `b`.
struct ExprNode {
    expr: Expr,
}

impl ComputationNode for ExprNode {
    fn input_names(&self) -> &[&'static str] {
        &["a", "b"]
    }

    fn output_names(&self) -> &[&'static str] {
        &["result"]
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
        let bindings = [
            ("a", scalar_input(&inputs[0], "a")),
            ("b", scalar_input(&inputs[1], "b")),
        ];
        match self.expr.eval(&bindings) {
            Ok(result) => outputs[0] = Value::of(ctx.types, result),
            Err(e) => {
                warn!(%e, "formula evaluation failed; output left empty");
                outputs[0] = Value::empty();
            }
        }
        true
    }
}
