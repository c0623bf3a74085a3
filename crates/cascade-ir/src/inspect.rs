//! Uniform pre/post-order walk over statement trees.
//!
//! [`AlgorithmInspector`] drives a [`StatementVisitor`] through a
//! statement and everything it references: operands, variables and their
//! definitions, invocation symbols, header/lib provenance. The optional
//! visit-once mode memoizes on `(kind, id)` and is what the extraction
//! passes use to see each shared entity exactly once.
//!
//! Entities only ever reference ids created before them, so the walk
//! terminates even without memoization.

use std::collections::HashSet;

use crate::entities::{Operand, Statement, VarDef};
use crate::error::Result;
use crate::ids::StatementId;
use crate::storage::AlgorithmStorage;

/// Callbacks invoked around each visited statement.
pub trait StatementVisitor {
    fn enter(&mut self, storage: &AlgorithmStorage, stmt: &Statement) -> Result<()> {
        let _ = (storage, stmt);
        Ok(())
    }

    fn leave(&mut self, storage: &AlgorithmStorage, stmt: &Statement) -> Result<()> {
        let _ = (storage, stmt);
        Ok(())
    }
}

/// Walks statement trees against one storage.
pub struct AlgorithmInspector<'s> {
    storage: &'s AlgorithmStorage,
    visit_once: bool,
    seen: HashSet<(&'static str, u32)>,
}

impl<'s> AlgorithmInspector<'s> {
    /// Walk every occurrence, including repeats of shared entities.
    pub fn new(storage: &'s AlgorithmStorage) -> Self {
        Self {
            storage,
            visit_once: false,
            seen: HashSet::new(),
        }
    }

    /// Walk each `(kind, id)` at most once across all walks performed by
    /// this inspector.
    pub fn visit_once(storage: &'s AlgorithmStorage) -> Self {
        Self {
            storage,
            visit_once: true,
            seen: HashSet::new(),
        }
    }

    pub fn walk_id<V: StatementVisitor>(
        &mut self,
        id: StatementId,
        visitor: &mut V,
    ) -> Result<()> {
        let stmt = *self.storage.statement(id)?;
        self.walk(&stmt, visitor)
    }

    pub fn walk<V: StatementVisitor>(&mut self, stmt: &Statement, visitor: &mut V) -> Result<()> {
        if self.visit_once && !self.seen.insert(stmt.memo_key()) {
            return Ok(());
        }
        let storage = self.storage;
        visitor.enter(storage, stmt)?;
        match stmt {
            Statement::Assign(id) => {
                let assign = storage.assign(*id)?;
                self.walk(&Statement::Var(assign.dst), visitor)?;
                self.walk_operand(assign.src, visitor)?;
            }
            Statement::Block(id) => {
                let block = storage.block(*id)?;
                for local in &block.locals {
                    self.walk(&Statement::Var(*local), visitor)?;
                }
                for inner in &block.stmts {
                    self.walk_id(*inner, visitor)?;
                }
            }
            Statement::Do(id) => {
                let do_while = storage.do_stmt(*id)?;
                self.walk_id(do_while.body, visitor)?;
                self.walk_operand(do_while.cond, visitor)?;
            }
            Statement::For(id) => {
                let for_stmt = storage.for_stmt(*id)?;
                if let Some(init) = for_stmt.init {
                    self.walk_id(init, visitor)?;
                }
                if let Some(cond) = for_stmt.cond {
                    self.walk_operand(cond, visitor)?;
                }
                if let Some(step) = for_stmt.step {
                    self.walk_id(step, visitor)?;
                }
                self.walk_id(for_stmt.body, visitor)?;
            }
            Statement::FuncInvocation(id) => {
                let call = storage.func_invocation(*id)?;
                self.walk(&Statement::Symbol(call.symbol), visitor)?;
                if let Some(ret) = call.ret {
                    self.walk(&Statement::Type(ret), visitor)?;
                }
                for arg in &call.args {
                    self.walk(&Statement::Var(*arg), visitor)?;
                }
            }
            Statement::HeaderFile(id) => {
                let header = storage.header_file(*id)?;
                if let Some(lib) = header.lib {
                    self.walk(&Statement::Lib(lib), visitor)?;
                }
            }
            Statement::If(id) => {
                let if_stmt = storage.if_stmt(*id)?;
                self.walk_operand(if_stmt.cond, visitor)?;
                self.walk_id(if_stmt.then_branch, visitor)?;
                if let Some(else_branch) = if_stmt.else_branch {
                    self.walk_id(else_branch, visitor)?;
                }
            }
            Statement::InputBinding(id) => {
                let binding = storage.input_binding(*id)?;
                self.walk(&Statement::Var(binding.var), visitor)?;
            }
            Statement::Lib(_) => {}
            Statement::OutputActivation(id) => {
                let activation = storage.output_activation(*id)?;
                self.walk(&Statement::Var(activation.value), visitor)?;
            }
            Statement::ReturnOutputActivation(id) => {
                let activation = storage.return_output_activation(*id)?;
                self.walk(&Statement::Var(activation.value), visitor)?;
            }
            Statement::Symbol(id) => {
                let symbol = storage.symbol(*id)?;
                if let Some(header) = symbol.header {
                    self.walk(&Statement::HeaderFile(header), visitor)?;
                }
            }
            Statement::Type(id) => {
                let ir_type = storage.ir_type(*id)?;
                if let Some(header) = ir_type.header {
                    self.walk(&Statement::HeaderFile(header), visitor)?;
                }
            }
            Statement::Var(id) => {
                let def = storage.var(*id)?.def;
                match def {
                    VarDef::Concrete(ty) => self.walk(&Statement::Type(ty), visitor)?,
                    VarDef::Call(call) => {
                        self.walk(&Statement::FuncInvocation(call), visitor)?;
                    }
                    VarDef::FromBinding => {}
                }
            }
            Statement::Vars(id) => {
                let items = storage.var_group(*id)?.items.clone();
                for item in items {
                    self.walk(&Statement::Var(item), visitor)?;
                }
            }
            Statement::While(id) => {
                let while_stmt = storage.while_stmt(*id)?;
                self.walk_operand(while_stmt.cond, visitor)?;
                self.walk_id(while_stmt.body, visitor)?;
            }
        }
        visitor.leave(storage, stmt)
    }

    fn walk_operand<V: StatementVisitor>(
        &mut self,
        operand: Operand,
        visitor: &mut V,
    ) -> Result<()> {
        match operand {
            Operand::Var(id) => self.walk(&Statement::Var(id), visitor),
            Operand::Call(id) => self.walk(&Statement::FuncInvocation(id), visitor),
        }
    }
}
