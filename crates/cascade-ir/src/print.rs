//! Pseudo-code rendering of statement trees.
//!
//! Indentation-aware dump built on the inspector walk, used by
//! diagnostics and tests. One line per visited entity, children indented.

use crate::entities::{Statement, VarDef};
use crate::error::Result;
use crate::inspect::{AlgorithmInspector, StatementVisitor};
use crate::ids::StatementId;
use crate::storage::AlgorithmStorage;

/// Render the statement tree under `id` as indented pseudo-code.
pub fn render_statement(storage: &AlgorithmStorage, id: StatementId) -> Result<String> {
    let mut printer = Printer::default();
    AlgorithmInspector::new(storage).walk_id(id, &mut printer)?;
    Ok(printer.out)
}

#[derive(Default)]
struct Printer {
    out: String,
    depth: usize,
}

impl StatementVisitor for Printer {
    fn enter(&mut self, storage: &AlgorithmStorage, stmt: &Statement) -> Result<()> {
        let line = describe(storage, stmt)?;
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
        self.out.push_str(&line);
        self.out.push('\n');
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self, _storage: &AlgorithmStorage, _stmt: &Statement) -> Result<()> {
        self.depth -= 1;
        Ok(())
    }
}

fn describe(storage: &AlgorithmStorage, stmt: &Statement) -> Result<String> {
    Ok(match stmt {
        Statement::Assign(id) => {
            let assign = storage.assign(*id)?;
            format!("assign {}", storage.var(assign.dst)?.name)
        }
        Statement::Block(_) => "block".to_string(),
        Statement::Do(_) => "do-while".to_string(),
        Statement::For(_) => "for".to_string(),
        Statement::FuncInvocation(id) => {
            let call = storage.func_invocation(*id)?;
            format!("invoke {}", storage.symbol(call.symbol)?.name)
        }
        Statement::HeaderFile(id) => format!("header {}", storage.header_file(*id)?.name),
        Statement::If(_) => "if".to_string(),
        Statement::InputBinding(id) => {
            let binding = storage.input_binding(*id)?;
            format!(
                "bind input {} to {}",
                binding.port,
                storage.var(binding.var)?.name
            )
        }
        Statement::Lib(id) => format!("lib {}", storage.lib(*id)?.name),
        Statement::OutputActivation(id) => {
            let activation = storage.output_activation(*id)?;
            format!("activate output {}", activation.port)
        }
        Statement::ReturnOutputActivation(id) => {
            let activation = storage.return_output_activation(*id)?;
            format!("activate output {} and return", activation.port)
        }
        Statement::Symbol(id) => format!("symbol {}", storage.symbol(*id)?.name),
        Statement::Type(id) => format!("type {}", storage.ir_type(*id)?.name),
        Statement::Var(id) => {
            let var = storage.var(*id)?;
            match var.def {
                VarDef::Concrete(ty) => {
                    format!("var {}: {}", var.name, storage.ir_type(ty)?.name)
                }
                VarDef::Call(_) => format!("var {}: <invocation>", var.name),
                VarDef::FromBinding => format!("var {}: <from binding>", var.name),
            }
        }
        Statement::Vars(_) => "vars".to_string(),
        Statement::While(_) => "while".to_string(),
    })
}
