//! Integration test harness for Cascade.
//!
//! Drives the full plain-graph pipeline (build nodes/edges, compile into
//! a level schedule, compute incrementally, inspect outputs) plus a small
//! set of reusable stub nodes for both the plain and the activation path.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use cascade_expr::Expr;
use cascade_graph::{
    CancelToken, ComputationInstructions, ComputationNode, ComputationResult, ComputeContext,
    Edge, NodeIndex, PortRef, SourceInput, SourceInputs, compile, compute,
};
use cascade_ir::{
    ActivationAlgorithms, ActivationNode, AlgorithmStorage, InputActivation, Statement, VarDef,
};
use cascade_value::{TypeRegistry, Value};

/// Builds and runs one plain computation graph.
pub struct GraphHarness {
    types: TypeRegistry,
    nodes: Vec<Arc<dyn ComputationNode>>,
    edges: Vec<Edge>,
    explicit: Vec<SourceInput>,
    instructions: Option<ComputationInstructions>,
    source_inputs: SourceInputs,
    result: Option<ComputationResult>,
}

impl Default for GraphHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphHarness {
    pub fn new() -> Self {
        Self {
            types: TypeRegistry::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
            explicit: Vec::new(),
            instructions: None,
            source_inputs: SourceInputs::default(),
            result: None,
        }
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Add a node, returning its index.
    pub fn add_node(&mut self, node: Arc<dyn ComputationNode>) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn connect(&mut self, from: (usize, usize), to: (usize, usize)) {
        self.edges.push(Edge::between(from.0, from.1, to.0, to.1));
    }

    /// Feed an explicit scalar source input into an unconnected port.
    pub fn add_input(&mut self, value: f64, node: usize, port: usize) {
        self.explicit
            .push(SourceInput::to_port(Value::of(&self.types, value), node, port));
    }

    pub fn try_compile(&mut self) -> cascade_graph::Result<()> {
        let (instructions, source_inputs) =
            compile(&self.nodes, &self.edges, &self.explicit, &self.types)?;
        self.result = Some(ComputationResult::new(&instructions));
        self.instructions = Some(instructions);
        self.source_inputs = source_inputs;
        Ok(())
    }

    /// Compile the graph.
    ///
    /// # Panics
    ///
    /// Panics if compilation fails.
    pub fn compile(&mut self) {
        self.try_compile().expect("compilation failed");
    }

    /// Run one compute pass; returns `false` when cancelled.
    ///
    /// # Panics
    ///
    /// Panics if the harness was not compiled or the result shape is off.
    pub fn compute(&mut self) -> bool {
        let instructions = self.instructions.as_ref().expect("compile first");
        let result = self.result.as_mut().expect("compile first");
        compute(
            instructions,
            &self.nodes,
            &self.source_inputs,
            result,
            &self.types,
            &CancelToken::new(),
            None,
        )
        .expect("compute failed")
    }

    /// Change the value an explicit or defaulted source input feeds into
    /// `(node, port)` before the next compute pass.
    ///
    /// # Panics
    ///
    /// Panics if no source input targets that port.
    pub fn set_source(&mut self, node: usize, port: usize, value: f64) {
        let value = Value::of(&self.types, value);
        *self
            .source_inputs
            .value_for_mut(PortRef::new(node, port))
            .expect("no source input targets that port") = value;
    }

    /// A node's output as f64.
    ///
    /// # Panics
    ///
    /// Panics if the output is not numeric.
    pub fn output_scalar(&self, node: usize, port: usize) -> f64 {
        self.result.as_ref().expect("compile first").outputs(NodeIndex(node))[port]
            .convert_to()
            .expect("output is not numeric")
    }

    pub fn node_ts(&self, node: usize) -> u64 {
        self.result
            .as_ref()
            .expect("compile first")
            .node_ts(NodeIndex(node))
    }
}

// ---- plain stub nodes -------------------------------------------------------

/// Source node emitting a fixed f64.
pub struct ConstNode {
    value: f64,
}

impl ConstNode {
    pub fn new(value: f64) -> Arc<dyn ComputationNode> {
        Arc::new(Self { value })
    }
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

/// Adds two f64 inputs and counts its invocations.
pub struct CountingAddNode {
    calls: AtomicU32,
}

impl CountingAddNode {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicU32::new(0),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}

impl ComputationNode for CountingAddNode {
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
        let a: f64 = inputs[0].convert_to().unwrap_or(0.0);
        let b: f64 = inputs[1].convert_to().unwrap_or(0.0);
        outputs[0] = Value::of(ctx.types, a + b);
        true
    }
}

/// Evaluates a calculator formula over inputs `a` and `b`.
pub struct FormulaNode {
    expr: Expr,
}

impl FormulaNode {
    /// # Panics
    ///
    /// Panics if the formula does not compile.
    pub fn new(formula: &str) -> Arc<dyn ComputationNode> {
        Arc::new(Self {
            expr: Expr::parse(formula).expect("formula failed to compile"),
        })
    }
}

impl ComputationNode for FormulaNode {
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
        let a: f64 = inputs[0].convert_to().unwrap_or(0.0);
        let b: f64 = inputs[1].convert_to().unwrap_or(0.0);
        match self.expr.eval(&[("a", a), ("b", b)]) {
            Ok(result) => outputs[0] = Value::of(ctx.types, result),
            Err(_) => outputs[0] = Value::empty(),
        }
        true
    }
}

// ---- activation stub nodes --------------------------------------------------

/// One bound input, one output; fires its bound value onward.
pub struct ForwardActivationNode {
    var_name: &'static str,
}

impl ForwardActivationNode {
    pub fn new(var_name: &'static str) -> Arc<dyn ActivationNode> {
        Arc::new(Self { var_name })
    }
}

impl ActivationNode for ForwardActivationNode {
    fn input_names(&self) -> &[&'static str] {
        &["in"]
    }

    fn output_names(&self) -> &[&'static str] {
        &["out"]
    }

    fn activation_algorithms(&self, storage: &mut AlgorithmStorage) -> ActivationAlgorithms {
        let var = storage.add_var(self.var_name, VarDef::FromBinding);
        let activation = storage.add_output_activation(cascade_graph::PortIndex(0), var);
        let stmt = storage.add_statement(Statement::OutputActivation(activation));
        ActivationAlgorithms {
            input_bindings: vec![(cascade_graph::PortIndex(0), var)],
            per_input: vec![InputActivation {
                required_inputs: 0,
                activate: stmt,
            }],
            context: None,
        }
    }
}

/// Terminal activation node: one bound input, no outputs.
pub struct SinkActivationNode;

impl SinkActivationNode {
    pub fn new() -> Arc<dyn ActivationNode> {
        Arc::new(Self)
    }
}

impl ActivationNode for SinkActivationNode {
    fn input_names(&self) -> &[&'static str] {
        &["in"]
    }

    fn output_names(&self) -> &[&'static str] {
        &[]
    }

    fn activation_algorithms(&self, storage: &mut AlgorithmStorage) -> ActivationAlgorithms {
        let var = storage.add_var("sink", VarDef::FromBinding);
        let block = storage.add_block(vec![], vec![]);
        let stmt = storage.add_statement(Statement::Block(block));
        ActivationAlgorithms {
            input_bindings: vec![(cascade_graph::PortIndex(0), var)],
            per_input: vec![InputActivation {
                required_inputs: 0,
                activate: stmt,
            }],
            context: None,
        }
    }
}
