//! Activation graph analysis.
//!
//! Discrete passes over the IR declared by a graph of activation nodes:
//!
//! 1. extract every output activation per (node, output port) and join it
//!    with the edge list into an upstream-binding map,
//! 2. check source-input completeness against the caller's declarations,
//! 3. resolve every from-binding variable to a concrete IR type by walking
//!    its upstream chain,
//! 4. order the source-port activations so each port's required-inputs
//!    mask is satisfied.
//!
//! The result feeds [`generate`](crate::generate::generate) directly.

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, instrument};

use cascade_graph::{Edge, NodeIndex, PortIndex, PortRef};
use cascade_ir::{
    ActivationAlgorithms, ActivationNode, AlgorithmInspector, AlgorithmStorage, IrTypeId,
    Statement, StatementVisitor, VarDef, VarId,
};

use crate::error::{Error, Result};

/// Caller-declared concrete type of an unconnected bound input port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceType {
    pub dest: PortRef,
    pub ty: IrTypeId,
}

/// Everything the generator needs to know about an analyzed graph.
#[derive(Debug)]
pub struct ActivationAnalysis {
    /// Per-node declarations, in node order.
    pub algorithms: Vec<ActivationAlgorithms>,
    /// Input port -> the variable bound to it.
    pub binding_var: IndexMap<PortRef, VarId>,
    /// Output port -> the input ports its activations feed.
    pub downstream: IndexMap<PortRef, Vec<PortRef>>,
    /// Every variable reachable from the graph's IR, resolved to a
    /// concrete type.
    pub resolved: IndexMap<VarId, IrTypeId>,
    /// Bound input ports not fed by any edge, minus the ignored ones.
    pub source_ports: Vec<PortRef>,
    /// Source-port activation order satisfying all required-input masks.
    pub entry_order: Vec<PortRef>,
}

/// Analyze an activation graph: extract activations, check source
/// completeness, resolve variable types, and order the entry activations.
///
/// `activation_algorithms` is invoked exactly once per node; the IR it
/// allocates lands in `storage`.
#[instrument(skip_all, fields(nodes = nodes.len(), edges = edges.len()))]
pub fn analyze(
    nodes: &[Arc<dyn ActivationNode>],
    edges: &[Edge],
    source_types: &[SourceType],
    ignored_sources: &[PortRef],
    storage: &mut AlgorithmStorage,
) -> Result<ActivationAnalysis> {
    let input_counts: Vec<usize> = nodes.iter().map(|n| n.input_count()).collect();
    let output_counts: Vec<usize> = nodes.iter().map(|n| n.output_count()).collect();

    validate_edges(edges, &input_counts, &output_counts)?;

    // One declaration round per node.
    let algorithms: Vec<ActivationAlgorithms> = nodes
        .iter()
        .map(|node| node.activation_algorithms(storage))
        .collect();
    for (node_index, algorithm) in algorithms.iter().enumerate() {
        if algorithm.per_input.len() != input_counts[node_index] {
            return Err(Error::AlgorithmShape {
                node: NodeIndex(node_index),
                expected: input_counts[node_index],
                found: algorithm.per_input.len(),
            });
        }
    }

    let mut binding_var: IndexMap<PortRef, VarId> = IndexMap::new();
    for (node_index, algorithm) in algorithms.iter().enumerate() {
        for (port, var) in &algorithm.input_bindings {
            let port_ref = PortRef {
                node: NodeIndex(node_index),
                port: *port,
            };
            if port.0 >= input_counts[node_index] {
                return Err(Error::BadBindingPort { port: port_ref });
            }
            binding_var.insert(port_ref, *var);
        }
    }

    // Pass 1: collect fired activations per (node, output port), walking
    // each node's IR once.
    let mut fired: IndexMap<PortRef, Vec<VarId>> = IndexMap::new();
    let mut reachable_vars: IndexSet<VarId> = IndexSet::new();
    for (node_index, algorithm) in algorithms.iter().enumerate() {
        let mut collector = IrCollector::default();
        let mut inspector = AlgorithmInspector::visit_once(storage);
        for input in &algorithm.per_input {
            inspector.walk_id(input.activate, &mut collector)?;
        }
        if let Some(context) = algorithm.context {
            inspector.walk(&Statement::Vars(context), &mut collector)?;
        }
        for (_, var) in &algorithm.input_bindings {
            inspector.walk(&Statement::Var(*var), &mut collector)?;
        }
        for (port, vars) in collector.fired {
            fired
                .entry(PortRef {
                    node: NodeIndex(node_index),
                    port,
                })
                .or_default()
                .extend(vars);
        }
        reachable_vars.extend(collector.vars);
    }
    debug!(
        outputs = fired.len(),
        vars = reachable_vars.len(),
        "activations extracted"
    );

    let mut downstream: IndexMap<PortRef, Vec<PortRef>> = IndexMap::new();
    let mut upstream_fired: IndexMap<PortRef, Vec<VarId>> = IndexMap::new();
    for edge in edges {
        downstream.entry(edge.from).or_default().push(edge.to);
        let vars = fired.get(&edge.from).cloned().unwrap_or_default();
        upstream_fired.entry(edge.to).or_default().extend(vars);
    }

    // Pass 2: source completeness.
    let edge_fed: IndexSet<PortRef> = edges.iter().map(|e| e.to).collect();
    let declared: IndexMap<PortRef, IrTypeId> = source_types
        .iter()
        .map(|st| (st.dest, st.ty))
        .collect();
    let mut source_ports = Vec::new();
    for port_ref in binding_var.keys() {
        if edge_fed.contains(port_ref) {
            continue;
        }
        if declared.contains_key(port_ref) {
            source_ports.push(*port_ref);
        } else if !ignored_sources.contains(port_ref) {
            return Err(Error::MissingSourceType { port: *port_ref });
        }
    }
    for st in source_types {
        let bound = binding_var.contains_key(&st.dest);
        if !bound || edge_fed.contains(&st.dest) {
            return Err(Error::UnusedSourceType { port: st.dest });
        }
    }

    // Pass 3: type resolution over every reachable variable.
    let mut resolver = Resolver {
        storage,
        binding_port_of: binding_var.iter().map(|(p, v)| (*v, *p)).collect(),
        declared,
        upstream_fired,
        resolved: IndexMap::new(),
        stack: Vec::new(),
    };
    for var in &reachable_vars {
        resolver.resolve(*var)?;
    }
    let resolved = resolver.resolved;
    debug!(resolved = resolved.len(), "variable types resolved");

    // Pass 4: entry order over the source ports only.
    let entry_order = entry_order(&algorithms, &source_ports)?;

    Ok(ActivationAnalysis {
        algorithms,
        binding_var,
        downstream,
        resolved,
        source_ports,
        entry_order,
    })
}

fn validate_edges(
    edges: &[Edge],
    input_counts: &[usize],
    output_counts: &[usize],
) -> Result<()> {
    let node_count = input_counts.len();
    let mut seen_inputs: IndexSet<PortRef> = IndexSet::new();
    for edge in edges {
        for (end, counts) in [(edge.from, output_counts), (edge.to, input_counts)] {
            if end.node.0 >= node_count {
                return Err(Error::EdgeNodeOutOfRange {
                    edge: *edge,
                    count: node_count,
                });
            }
            if end.port.0 >= counts[end.node.0] {
                return Err(Error::EdgePortOutOfRange {
                    edge: *edge,
                    port: end,
                    count: counts[end.node.0],
                });
            }
        }
        if !seen_inputs.insert(edge.to) {
            return Err(Error::DuplicateInputEdge {
                edge: *edge,
                port: edge.to,
            });
        }
    }
    Ok(())
}

/// Collects output activations and every variable the walk touches.
#[derive(Default)]
struct IrCollector {
    fired: IndexMap<PortIndex, Vec<VarId>>,
    vars: IndexSet<VarId>,
}

impl StatementVisitor for IrCollector {
    fn enter(
        &mut self,
        storage: &AlgorithmStorage,
        stmt: &Statement,
    ) -> cascade_ir::Result<()> {
        match stmt {
            Statement::OutputActivation(id) => {
                let activation = storage.output_activation(*id)?;
                self.fired
                    .entry(activation.port)
                    .or_default()
                    .push(activation.value);
            }
            Statement::ReturnOutputActivation(id) => {
                let activation = storage.return_output_activation(*id)?;
                self.fired
                    .entry(activation.port)
                    .or_default()
                    .push(activation.value);
            }
            Statement::Var(id) => {
                self.vars.insert(*id);
            }
            _ => {}
        }
        Ok(())
    }
}

/// Walks upstream binding chains down to concrete types.
struct Resolver<'a> {
    storage: &'a AlgorithmStorage,
    binding_port_of: IndexMap<VarId, PortRef>,
    declared: IndexMap<PortRef, IrTypeId>,
    upstream_fired: IndexMap<PortRef, Vec<VarId>>,
    resolved: IndexMap<VarId, IrTypeId>,
    stack: Vec<VarId>,
}

impl Resolver<'_> {
    fn var_name(&self, var: VarId) -> String {
        self.storage
            .var(var)
            .map(|v| v.name.clone())
            .unwrap_or_default()
    }

    fn resolve(&mut self, var: VarId) -> Result<IrTypeId> {
        if let Some(ty) = self.resolved.get(&var) {
            return Ok(*ty);
        }
        if self.stack.contains(&var) {
            return Err(Error::CircularBinding {
                var,
                name: self.var_name(var),
            });
        }
        self.stack.push(var);
        let def = self.storage.var(var)?.def;
        let ty = match def {
            VarDef::Concrete(ty) => ty,
            VarDef::Call(call) => {
                let invocation = self.storage.func_invocation(call)?;
                invocation.ret.ok_or_else(|| Error::VoidInvocation {
                    var,
                    name: self.var_name(var),
                })?
            }
            VarDef::FromBinding => self.resolve_binding(var)?,
        };
        self.stack.pop();
        self.resolved.insert(var, ty);
        Ok(ty)
    }

    /// A from-binding variable takes its type from the declared source
    /// type of its port, or from whatever the upstream activations fire
    /// into it. Ancestors resolving to differently-named types conflict.
    fn resolve_binding(&mut self, var: VarId) -> Result<IrTypeId> {
        let unresolved = || Error::UnresolvedBinding {
            var,
            name: self.var_name(var),
        };
        let Some(port) = self.binding_port_of.get(&var).copied() else {
            return Err(unresolved());
        };
        if let Some(ty) = self.declared.get(&port) {
            return Ok(*ty);
        }
        let Some(fired) = self.upstream_fired.get(&port).cloned() else {
            return Err(unresolved());
        };
        if fired.is_empty() {
            return Err(unresolved());
        }
        let mut types = Vec::new();
        for upstream in fired {
            types.push(self.resolve(upstream)?);
        }
        let mut names: Vec<String> = types
            .iter()
            .map(|ty| Ok(self.storage.ir_type(*ty)?.name.clone()))
            .collect::<Result<_>>()?;
        names.dedup();
        names.sort();
        names.dedup();
        if names.len() > 1 {
            return Err(Error::ConflictingTypes {
                var,
                name: self.var_name(var),
                types: names,
            });
        }
        Ok(types[0])
    }
}

/// Fixed-point pass ordering the source-port activations.
///
/// A port's `required_inputs` mask is considered only over its node's
/// source ports; edge-fed ports are activated transitively by upstream
/// dispatch and do not gate the entry sequence.
fn entry_order(
    algorithms: &[ActivationAlgorithms],
    source_ports: &[PortRef],
) -> Result<Vec<PortRef>> {
    let mut source_mask: IndexMap<NodeIndex, u64> = IndexMap::new();
    for port in source_ports {
        *source_mask.entry(port.node).or_insert(0) |= 1 << port.port.0;
    }

    let mut activated: IndexMap<NodeIndex, u64> = IndexMap::new();
    let mut remaining: Vec<PortRef> = source_ports.to_vec();
    let mut order = Vec::new();

    while !remaining.is_empty() {
        let mut next_remaining = Vec::new();
        let mut progressed = false;
        for port in remaining {
            let node_mask = source_mask.get(&port.node).copied().unwrap_or(0);
            let required = algorithms[port.node.0].per_input[port.port.0].required_inputs
                & node_mask
                & !(1 << port.port.0);
            let done = activated.get(&port.node).copied().unwrap_or(0);
            if required & !done == 0 {
                *activated.entry(port.node).or_insert(0) |= 1 << port.port.0;
                order.push(port);
                progressed = true;
            } else {
                next_remaining.push(port);
            }
        }
        if !progressed {
            return Err(Error::UnsatisfiableRequiredInputs {
                port: next_remaining[0],
            });
        }
        remaining = next_remaining;
    }

    Ok(order)
}
