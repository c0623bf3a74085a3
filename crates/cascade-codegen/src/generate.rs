//! C++ code generation for analyzed activation graphs.
//!
//! Emits a single self-contained translation unit: include lines derived
//! from header/lib provenance, topologically ordered per-variable type
//! aliases, one `Context` struct holding every binding and state variable,
//! one activation function per (node, input port) translating the IR 1:1,
//! `std::any` accessor thunks, and an `entry_point` firing the source
//! ports in required-input order.
//!
//! Output activations compile to synchronous direct dispatch: copy the
//! activated value into every statically-determined downstream binding,
//! then call the downstream activation function in place. Nothing is
//! queued.

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, instrument};

use cascade_graph::{NodeIndex, PortIndex, PortRef};
use cascade_ir::{
    AlgorithmInspector, AlgorithmStorage, FuncInvocationId, Operand, Statement, StatementId,
    StatementVisitor, VarDef, VarId,
};

use crate::analyze::ActivationAnalysis;
use crate::code::GeneratedCode;
use crate::error::{Error, Result};

/// Generate the C++ translation unit for an analyzed activation graph.
#[instrument(skip_all, fields(nodes = analysis.algorithms.len()))]
pub fn generate(
    storage: &AlgorithmStorage,
    analysis: &ActivationAnalysis,
) -> Result<GeneratedCode> {
    let fields = context_fields(storage, analysis)?;
    let mut out = String::new();

    out.push_str("// Generated activation graph. Do not edit.\n");

    // Includes from header/lib provenance, plus <any> for the accessors.
    let includes = collect_includes(storage, analysis)?;
    out.push('\n');
    out.push_str("#include <any>\n");
    for (header, lib) in &includes {
        match lib {
            Some(lib) => out.push_str(&format!("#include <{header}>  // lib: {lib}\n")),
            None => out.push_str(&format!("#include <{header}>\n")),
        }
    }

    // Per-variable type aliases, arguments before the invocations that
    // consume them.
    out.push('\n');
    for var in topo_vars(storage, analysis)? {
        let ty = analysis.resolved[&var];
        let name = &storage.ir_type(ty)?.name;
        out.push_str(&format!("using var_{}_t = {name};\n", var.0));
    }

    // The context: every input-binding and per-node state variable.
    out.push('\n');
    out.push_str("struct Context {\n");
    for (var, field) in &fields {
        out.push_str(&format!("    var_{}_t {field}{{}};\n", var.0));
    }
    out.push_str("};\n");

    out.push('\n');
    out.push_str("Context* create_context() { return new Context(); }\n");
    out.push_str("void delete_context(Context* ctx) { delete ctx; }\n");

    // Forward declarations, then one definition per (node, input port).
    out.push('\n');
    for (node, port) in all_input_ports(analysis) {
        out.push_str(&format!(
            "void activate_node_{}_{}(Context& ctx);\n",
            node.0, port.0
        ));
    }

    for (node, port) in all_input_ports(analysis) {
        out.push('\n');
        out.push_str(&format!(
            "void activate_node_{}_{}(Context& ctx) {{\n",
            node.0, port.0
        ));
        let mut renderer = FnRenderer {
            storage,
            analysis,
            fields: &fields,
            node,
            out: String::new(),
            indent: 1,
        };
        renderer.render_stmt_id(analysis.algorithms[node.0].per_input[port.0].activate)?;
        out.push_str(&renderer.out);
        out.push_str("}\n");
    }

    emit_accessors(&mut out, storage, analysis, &fields)?;

    out.push('\n');
    out.push_str("void entry_point(Context* ctx) {\n");
    for port in &analysis.entry_order {
        out.push_str(&format!(
            "    activate_node_{}_{}(*ctx);\n",
            port.node.0, port.port.0
        ));
    }
    out.push_str("}\n");

    debug!(bytes = out.len(), "code generated");
    Ok(GeneratedCode::new(out))
}

/// Context field per variable: input bindings first, then state variables,
/// grouped by node. Field names are prefixed with the node index so equal
/// variable names from different nodes cannot collide.
fn context_fields(
    storage: &AlgorithmStorage,
    analysis: &ActivationAnalysis,
) -> Result<IndexMap<VarId, String>> {
    let mut fields = IndexMap::new();
    for (node_index, algorithm) in analysis.algorithms.iter().enumerate() {
        for (_, var) in &algorithm.input_bindings {
            let name = &storage.var(*var)?.name;
            fields.insert(*var, format!("n{node_index}_{name}"));
        }
        if let Some(context) = algorithm.context {
            for var in &storage.var_group(context)?.items {
                let name = &storage.var(*var)?.name;
                fields.insert(*var, format!("n{node_index}_{name}"));
            }
        }
    }
    Ok(fields)
}

fn all_input_ports(analysis: &ActivationAnalysis) -> Vec<(NodeIndex, PortIndex)> {
    analysis
        .algorithms
        .iter()
        .enumerate()
        .flat_map(|(node, algorithm)| {
            (0..algorithm.per_input.len()).map(move |port| (NodeIndex(node), PortIndex(port)))
        })
        .collect()
}

/// Header name -> owning lib name, deduplicated and sorted.
fn collect_includes(
    storage: &AlgorithmStorage,
    analysis: &ActivationAnalysis,
) -> Result<IndexMap<String, Option<String>>> {
    struct IncludeCollector {
        includes: IndexMap<String, Option<String>>,
    }

    impl StatementVisitor for IncludeCollector {
        fn enter(
            &mut self,
            storage: &AlgorithmStorage,
            stmt: &Statement,
        ) -> cascade_ir::Result<()> {
            if let Statement::HeaderFile(id) = stmt {
                let header = storage.header_file(*id)?;
                let lib = match header.lib {
                    Some(lib) => Some(storage.lib(lib)?.name.clone()),
                    None => None,
                };
                self.includes.insert(header.name.clone(), lib);
            }
            Ok(())
        }
    }

    let mut collector = IncludeCollector {
        includes: IndexMap::new(),
    };
    let mut inspector = AlgorithmInspector::visit_once(storage);
    for algorithm in &analysis.algorithms {
        for input in &algorithm.per_input {
            inspector.walk_id(input.activate, &mut collector)?;
        }
        if let Some(context) = algorithm.context {
            inspector.walk(&Statement::Vars(context), &mut collector)?;
        }
        for (_, var) in &algorithm.input_bindings {
            inspector.walk(&Statement::Var(*var), &mut collector)?;
        }
    }
    // Types reached only through resolution (declared source types) still
    // contribute their headers.
    for ty in analysis.resolved.values() {
        if let Some(header_id) = storage.ir_type(*ty)?.header {
            let header = storage.header_file(header_id)?;
            let lib = match header.lib {
                Some(lib) => Some(storage.lib(lib)?.name.clone()),
                None => None,
            };
            collector.includes.insert(header.name.clone(), lib);
        }
    }

    let mut includes: Vec<(String, Option<String>)> = collector.includes.into_iter().collect();
    includes.sort();
    Ok(includes.into_iter().collect())
}

/// Variables ordered so every invocation-typed variable follows the
/// variables its invocation consumes.
fn topo_vars(storage: &AlgorithmStorage, analysis: &ActivationAnalysis) -> Result<Vec<VarId>> {
    fn visit(
        var: VarId,
        storage: &AlgorithmStorage,
        resolved: &IndexMap<VarId, cascade_ir::IrTypeId>,
        seen: &mut IndexSet<VarId>,
        out: &mut Vec<VarId>,
    ) -> Result<()> {
        if !seen.insert(var) {
            return Ok(());
        }
        if let VarDef::Call(call) = storage.var(var)?.def {
            for arg in &storage.func_invocation(call)?.args {
                if resolved.contains_key(arg) {
                    visit(*arg, storage, resolved, seen, out)?;
                }
            }
        }
        out.push(var);
        Ok(())
    }

    let mut seen = IndexSet::new();
    let mut out = Vec::new();
    for var in analysis.resolved.keys() {
        visit(*var, storage, &analysis.resolved, &mut seen, &mut out)?;
    }
    Ok(out)
}

fn emit_accessors(
    out: &mut String,
    storage: &AlgorithmStorage,
    analysis: &ActivationAnalysis,
    fields: &IndexMap<VarId, String>,
) -> Result<()> {
    // Input bindings keyed by node * 0x10000 + port; state variables by
    // node * 0x10000 + index within the node's context group.
    let mut binding_slots: Vec<(u32, VarId)> = Vec::new();
    let mut state_slots: Vec<(u32, VarId)> = Vec::new();
    for (node_index, algorithm) in analysis.algorithms.iter().enumerate() {
        for (port, var) in &algorithm.input_bindings {
            binding_slots.push(((node_index as u32) * 0x1_0000 + port.0 as u32, *var));
        }
        if let Some(context) = algorithm.context {
            for (state_index, var) in storage.var_group(context)?.items.iter().enumerate() {
                state_slots.push(((node_index as u32) * 0x1_0000 + state_index as u32, *var));
            }
        }
    }

    for (kind, slots) in [("input_binding", binding_slots), ("state", state_slots)] {
        out.push('\n');
        out.push_str(&format!(
            "std::any get_{kind}(Context& ctx, unsigned int key) {{\n    switch (key) {{\n"
        ));
        for (key, var) in &slots {
            out.push_str(&format!("    case {key}u: return ctx.{};\n", fields[var]));
        }
        out.push_str("    default: return std::any();\n    }\n}\n");

        out.push('\n');
        out.push_str(&format!(
            "void set_{kind}(Context& ctx, unsigned int key, const std::any& value) {{\n    switch (key) {{\n"
        ));
        for (key, var) in &slots {
            out.push_str(&format!(
                "    case {key}u: ctx.{} = std::any_cast<var_{}_t>(value); break;\n",
                fields[var], var.0
            ));
        }
        out.push_str("    default: break;\n    }\n}\n");
    }
    Ok(())
}

/// Renders one activation function body, translating the IR 1:1.
struct FnRenderer<'a> {
    storage: &'a AlgorithmStorage,
    analysis: &'a ActivationAnalysis,
    fields: &'a IndexMap<VarId, String>,
    node: NodeIndex,
    out: String,
    indent: usize,
}

impl FnRenderer<'_> {
    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    /// Context fields are reached through `ctx`; everything else is a
    /// function-local declared by an enclosing block.
    fn var_expr(&self, var: VarId) -> Result<String> {
        match self.fields.get(&var) {
            Some(field) => Ok(format!("ctx.{field}")),
            None => Ok(self.storage.var(var)?.name.clone()),
        }
    }

    fn call_expr(&self, call: FuncInvocationId) -> Result<String> {
        let invocation = self.storage.func_invocation(call)?;
        let symbol = &self.storage.symbol(invocation.symbol)?.name;
        let args: Vec<String> = invocation
            .args
            .iter()
            .map(|arg| self.var_expr(*arg))
            .collect::<Result<_>>()?;
        Ok(format!("{symbol}({})", args.join(", ")))
    }

    fn operand_expr(&self, operand: Operand) -> Result<String> {
        match operand {
            Operand::Var(var) => self.var_expr(var),
            Operand::Call(call) => self.call_expr(call),
        }
    }

    fn render_stmt_id(&mut self, id: StatementId) -> Result<()> {
        let stmt = *self.storage.statement(id)?;
        self.render_stmt(stmt)
    }

    fn render_stmt(&mut self, stmt: Statement) -> Result<()> {
        match stmt {
            Statement::Assign(id) => {
                let assign = self.storage.assign(id)?;
                let line = format!(
                    "{} = {};",
                    self.var_expr(assign.dst)?,
                    self.operand_expr(assign.src)?
                );
                self.line(&line);
            }
            Statement::Block(id) => {
                let block = self.storage.block(id)?.clone();
                self.line("{");
                self.indent += 1;
                for local in &block.locals {
                    // Context variables are never re-declared locally.
                    if !self.fields.contains_key(local) {
                        let name = &self.storage.var(*local)?.name;
                        self.line(&format!("var_{}_t {name}{{}};", local.0));
                    }
                }
                for inner in &block.stmts {
                    self.render_stmt_id(*inner)?;
                }
                self.indent -= 1;
                self.line("}");
            }
            Statement::Do(id) => {
                let do_while = self.storage.do_stmt(id)?.clone();
                self.line("do {");
                self.indent += 1;
                self.render_stmt_id(do_while.body)?;
                self.indent -= 1;
                let cond = self.operand_expr(do_while.cond)?;
                self.line(&format!("}} while ({cond});"));
            }
            Statement::For(id) => {
                let for_stmt = self.storage.for_stmt(id)?.clone();
                let init = match for_stmt.init {
                    Some(init) => self.render_inline(init)?,
                    None => String::new(),
                };
                let cond = match for_stmt.cond {
                    Some(cond) => self.operand_expr(cond)?,
                    None => String::new(),
                };
                let step = match for_stmt.step {
                    Some(step) => self.render_inline(step)?,
                    None => String::new(),
                };
                self.line(&format!("for ({init}; {cond}; {step}) {{"));
                self.indent += 1;
                self.render_stmt_id(for_stmt.body)?;
                self.indent -= 1;
                self.line("}");
            }
            Statement::FuncInvocation(id) => {
                let call = self.call_expr(id)?;
                self.line(&format!("{call};"));
            }
            Statement::If(id) => {
                let if_stmt = self.storage.if_stmt(id)?.clone();
                let cond = self.operand_expr(if_stmt.cond)?;
                self.line(&format!("if ({cond}) {{"));
                self.indent += 1;
                self.render_stmt_id(if_stmt.then_branch)?;
                self.indent -= 1;
                if let Some(else_branch) = if_stmt.else_branch {
                    self.line("} else {");
                    self.indent += 1;
                    self.render_stmt_id(else_branch)?;
                    self.indent -= 1;
                }
                self.line("}");
            }
            Statement::While(id) => {
                let while_stmt = self.storage.while_stmt(id)?.clone();
                let cond = self.operand_expr(while_stmt.cond)?;
                self.line(&format!("while ({cond}) {{"));
                self.indent += 1;
                self.render_stmt_id(while_stmt.body)?;
                self.indent -= 1;
                self.line("}");
            }
            Statement::OutputActivation(id) => {
                let activation = *self.storage.output_activation(id)?;
                self.dispatch(activation.port, activation.value, false)?;
            }
            Statement::ReturnOutputActivation(id) => {
                let activation = *self.storage.return_output_activation(id)?;
                self.dispatch(activation.port, activation.value, true)?;
            }
            // Metadata in statement position is a no-op at runtime; header
            // files in particular only force an include.
            Statement::HeaderFile(_)
            | Statement::Lib(_)
            | Statement::Symbol(_)
            | Statement::Type(_)
            | Statement::Var(_)
            | Statement::Vars(_)
            | Statement::InputBinding(_) => {}
        }
        Ok(())
    }

    /// Single-expression rendering for `for` init/step clauses.
    fn render_inline(&mut self, id: StatementId) -> Result<String> {
        match *self.storage.statement(id)? {
            Statement::Assign(assign_id) => {
                let assign = self.storage.assign(assign_id)?;
                Ok(format!(
                    "{} = {}",
                    self.var_expr(assign.dst)?,
                    self.operand_expr(assign.src)?
                ))
            }
            Statement::FuncInvocation(call_id) => self.call_expr(call_id),
            _ => Err(Error::InlineUnsupported),
        }
    }

    /// Activation is synchronous direct dispatch: copy the value into
    /// every downstream binding, then call that downstream's activation
    /// function.
    fn dispatch(&mut self, port: PortIndex, value: VarId, then_return: bool) -> Result<()> {
        let out_ref = PortRef {
            node: self.node,
            port,
        };
        let dests = self
            .analysis
            .downstream
            .get(&out_ref)
            .cloned()
            .unwrap_or_default();
        for dest in dests {
            if let Some(var) = self.analysis.binding_var.get(&dest) {
                let line = format!(
                    "ctx.{} = {};",
                    self.fields[var],
                    self.var_expr(value)?
                );
                self.line(&line);
            }
            self.line(&format!(
                "activate_node_{}_{}(ctx);",
                dest.node.0, dest.port.0
            ));
        }
        if then_return {
            self.line("return;");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::analyze::{SourceType, analyze};
    use crate::testkit::{relay_node, seed_node, sink_node};
    use cascade_graph::Edge;
    use cascade_ir::ActivationNode;

    #[test]
    fn test_generated_chain_shape() {
        let nodes: Vec<Arc<dyn ActivationNode>> = vec![seed_node(), relay_node(), sink_node()];
        let edges = [Edge::between(0, 0, 1, 0), Edge::between(1, 0, 2, 0)];
        let mut storage = AlgorithmStorage::new();
        let seed_ty = storage.add_type("uint64_t", None);
        let source_types = [SourceType {
            dest: PortRef::new(0, 0),
            ty: seed_ty,
        }];
        let analysis = analyze(&nodes, &edges, &source_types, &[], &mut storage).unwrap();
        let code = generate(&storage, &analysis).unwrap();

        assert!(code.contains("#include <any>"));
        assert!(code.contains("struct Context {"));
        assert!(code.contains("Context* create_context()"));
        assert!(code.contains("void activate_node_0_0(Context& ctx)"));
        assert!(code.contains("void activate_node_1_0(Context& ctx)"));
        assert!(code.contains("void activate_node_2_0(Context& ctx)"));
        // Seed's activation feeds the relay synchronously.
        assert!(code.contains("activate_node_1_0(ctx);"));
        assert!(code.contains("activate_node_2_0(ctx);"));
        // The sink's binding resolved transitively to the seed's type.
        assert!(code.contains("using var_"));
        assert!(code.contains("= uint64_t;"));
        assert!(code.contains("std::any get_input_binding"));
        assert!(code.contains("void entry_point(Context* ctx)"));
        assert!(code.contains("activate_node_0_0(*ctx);"));
    }

    #[test]
    fn test_state_accessors_cover_context_vars() {
        use cascade_graph::PortIndex;
        use cascade_ir::{
            ActivationAlgorithms, ActivationNode, AlgorithmStorage, InputActivation, Statement,
            VarDef,
        };

        // A node with one concrete-typed state variable it increments.
        struct Accumulator;

        impl ActivationNode for Accumulator {
            fn input_names(&self) -> &[&'static str] {
                &["sample"]
            }

            fn output_names(&self) -> &[&'static str] {
                &[]
            }

            fn activation_algorithms(
                &self,
                storage: &mut AlgorithmStorage,
            ) -> ActivationAlgorithms {
                let header = storage.add_header_file("cstdint", None);
                let ty = storage.add_type("uint64_t", Some(header));
                let sample = storage.add_var("sample", VarDef::Concrete(ty));
                let total = storage.add_var("total", VarDef::Concrete(ty));
                let context = storage.add_vars(vec![total]);
                let symbol = storage.add_symbol("accumulate", None);
                let call = storage.add_func_invocation(symbol, Some(ty), vec![total, sample]);
                let assign = storage.add_assign(total, cascade_ir::Operand::Call(call));
                let assign = storage.add_statement(Statement::Assign(assign));
                let block = storage.add_block(vec![], vec![assign]);
                let stmt = storage.add_statement(Statement::Block(block));
                ActivationAlgorithms {
                    input_bindings: vec![(PortIndex(0), sample)],
                    per_input: vec![InputActivation {
                        required_inputs: 0,
                        activate: stmt,
                    }],
                    context: Some(context),
                }
            }
        }

        let nodes: Vec<Arc<dyn ActivationNode>> = vec![Arc::new(Accumulator)];
        let mut storage = AlgorithmStorage::new();
        let analysis = analyze(
            &nodes,
            &[],
            &[],
            &[PortRef::new(0, 0)],
            &mut storage,
        )
        .unwrap();
        let code = generate(&storage, &analysis).unwrap();

        assert!(code.contains("#include <cstdint>"));
        assert!(code.contains("n0_total"));
        assert!(code.contains("std::any get_state"));
        assert!(code.contains("ctx.n0_total = accumulate(ctx.n0_total, ctx.n0_sample);"));
    }
}
