//! Interned, append-only storage for activation-algorithm IR.
//!
//! Each IR kind lives in its own id-indexed map. Ids are handed out in
//! creation order and never reused; entities are immutable once stored, so
//! sharing is by id and nothing ever dangles. One storage serves one
//! compilation pass.

use indexmap::IndexMap;

use cascade_graph::PortIndex;

use crate::entities::{
    Assign, Block, DoWhile, For, FuncInvocation, HeaderFile, If, InputBinding, IrType, Lib,
    Operand, OutputActivation, ReturnOutputActivation, Statement, Symbol, Var, VarDef, Vars,
    While,
};
use crate::error::{Error, Result};
use crate::ids::{
    AssignId, BlockId, DoId, ForId, FuncInvocationId, HeaderFileId, IfId, InputBindingId,
    IrTypeId, LibId, OutputActivationId, ReturnOutputActivationId, StatementId, SymbolId, VarId,
    VarsId, WhileId,
};

macro_rules! store_kind {
    ($field:ident, $kind:literal, $id:ident, $entity:ident, $add:ident, $get:ident) => {
        pub fn $add(&mut self, entity: $entity) -> $id {
            let id = $id(self.$field.len() as u32);
            self.$field.insert(id, entity);
            id
        }

        pub fn $get(&self, id: $id) -> Result<&$entity> {
            self.$field
                .get(&id)
                .ok_or_else(|| Error::unknown($kind, id.0))
        }
    };
}

/// The per-kind interned IR store.
#[derive(Debug, Default)]
pub struct AlgorithmStorage {
    libs: IndexMap<LibId, Lib>,
    header_files: IndexMap<HeaderFileId, HeaderFile>,
    symbols: IndexMap<SymbolId, Symbol>,
    types: IndexMap<IrTypeId, IrType>,
    vars: IndexMap<VarId, Var>,
    var_groups: IndexMap<VarsId, Vars>,
    func_invocations: IndexMap<FuncInvocationId, FuncInvocation>,
    assigns: IndexMap<AssignId, Assign>,
    blocks: IndexMap<BlockId, Block>,
    ifs: IndexMap<IfId, If>,
    whiles: IndexMap<WhileId, While>,
    dos: IndexMap<DoId, DoWhile>,
    fors: IndexMap<ForId, For>,
    output_activations: IndexMap<OutputActivationId, OutputActivation>,
    return_output_activations: IndexMap<ReturnOutputActivationId, ReturnOutputActivation>,
    input_bindings: IndexMap<InputBindingId, InputBinding>,
    statements: IndexMap<StatementId, Statement>,
}

impl AlgorithmStorage {
    pub fn new() -> Self {
        Self::default()
    }

    store_kind!(libs, "lib", LibId, Lib, add_lib_entity, lib);
    store_kind!(
        header_files,
        "header file",
        HeaderFileId,
        HeaderFile,
        add_header_file_entity,
        header_file
    );
    store_kind!(symbols, "symbol", SymbolId, Symbol, add_symbol_entity, symbol);
    store_kind!(types, "type", IrTypeId, IrType, add_type_entity, ir_type);
    store_kind!(vars, "var", VarId, Var, add_var_entity, var);
    store_kind!(var_groups, "vars", VarsId, Vars, add_vars_entity, var_group);
    store_kind!(
        func_invocations,
        "func invocation",
        FuncInvocationId,
        FuncInvocation,
        add_func_invocation_entity,
        func_invocation
    );
    store_kind!(assigns, "assign", AssignId, Assign, add_assign_entity, assign);
    store_kind!(blocks, "block", BlockId, Block, add_block_entity, block);
    store_kind!(ifs, "if", IfId, If, add_if_entity, if_stmt);
    store_kind!(whiles, "while", WhileId, While, add_while_entity, while_stmt);
    store_kind!(dos, "do", DoId, DoWhile, add_do_entity, do_stmt);
    store_kind!(fors, "for", ForId, For, add_for_entity, for_stmt);
    store_kind!(
        output_activations,
        "output activation",
        OutputActivationId,
        OutputActivation,
        add_output_activation_entity,
        output_activation
    );
    store_kind!(
        return_output_activations,
        "return output activation",
        ReturnOutputActivationId,
        ReturnOutputActivation,
        add_return_output_activation_entity,
        return_output_activation
    );
    store_kind!(
        input_bindings,
        "input binding",
        InputBindingId,
        InputBinding,
        add_input_binding_entity,
        input_binding
    );

    pub fn add_statement(&mut self, stmt: Statement) -> StatementId {
        let id = StatementId(self.statements.len() as u32);
        self.statements.insert(id, stmt);
        id
    }

    pub fn statement(&self, id: StatementId) -> Result<&Statement> {
        self.statements
            .get(&id)
            .ok_or_else(|| Error::unknown("statement", id.0))
    }

    // ---- construction sugar ------------------------------------------------

    pub fn add_lib(&mut self, name: &str) -> LibId {
        self.add_lib_entity(Lib {
            name: name.to_string(),
        })
    }

    pub fn add_header_file(&mut self, name: &str, lib: Option<LibId>) -> HeaderFileId {
        self.add_header_file_entity(HeaderFile {
            name: name.to_string(),
            lib,
        })
    }

    pub fn add_symbol(&mut self, name: &str, header: Option<HeaderFileId>) -> SymbolId {
        self.add_symbol_entity(Symbol {
            name: name.to_string(),
            header,
        })
    }

    pub fn add_type(&mut self, name: &str, header: Option<HeaderFileId>) -> IrTypeId {
        self.add_type_entity(IrType {
            name: name.to_string(),
            header,
        })
    }

    pub fn add_var(&mut self, name: &str, def: VarDef) -> VarId {
        self.add_var_entity(Var {
            name: name.to_string(),
            def,
        })
    }

    pub fn add_vars(&mut self, items: Vec<VarId>) -> VarsId {
        self.add_vars_entity(Vars { items })
    }

    pub fn add_func_invocation(
        &mut self,
        symbol: SymbolId,
        ret: Option<IrTypeId>,
        args: Vec<VarId>,
    ) -> FuncInvocationId {
        self.add_func_invocation_entity(FuncInvocation { symbol, ret, args })
    }

    pub fn add_assign(&mut self, dst: VarId, src: Operand) -> AssignId {
        self.add_assign_entity(Assign { dst, src })
    }

    pub fn add_block(&mut self, locals: Vec<VarId>, stmts: Vec<StatementId>) -> BlockId {
        self.add_block_entity(Block { locals, stmts })
    }

    pub fn add_if(
        &mut self,
        cond: Operand,
        then_branch: StatementId,
        else_branch: Option<StatementId>,
    ) -> IfId {
        self.add_if_entity(If {
            cond,
            then_branch,
            else_branch,
        })
    }

    pub fn add_while(&mut self, cond: Operand, body: StatementId) -> WhileId {
        self.add_while_entity(While { cond, body })
    }

    pub fn add_do(&mut self, body: StatementId, cond: Operand) -> DoId {
        self.add_do_entity(DoWhile { body, cond })
    }

    pub fn add_for(
        &mut self,
        init: Option<StatementId>,
        cond: Option<Operand>,
        step: Option<StatementId>,
        body: StatementId,
    ) -> ForId {
        self.add_for_entity(For {
            init,
            cond,
            step,
            body,
        })
    }

    pub fn add_output_activation(&mut self, port: PortIndex, value: VarId) -> OutputActivationId {
        self.add_output_activation_entity(OutputActivation { port, value })
    }

    pub fn add_return_output_activation(
        &mut self,
        port: PortIndex,
        value: VarId,
    ) -> ReturnOutputActivationId {
        self.add_return_output_activation_entity(ReturnOutputActivation { port, value })
    }

    pub fn add_input_binding(&mut self, port: PortIndex, var: VarId) -> InputBindingId {
        self.add_input_binding_entity(InputBinding { port, var })
    }

    /// All interned statements in creation order.
    pub fn statements(&self) -> impl Iterator<Item = (StatementId, &Statement)> {
        self.statements.iter().map(|(id, stmt)| (*id, stmt))
    }

    /// All variables in creation order.
    pub fn vars(&self) -> impl Iterator<Item = (VarId, &Var)> {
        self.vars.iter().map(|(id, var)| (*id, var))
    }
}
