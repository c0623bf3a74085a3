// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::panic))]

//! Cascade activation-algorithm IR.
//!
//! An interned, id-indexed store for the tiny statement/expression
//! language activation nodes declare their behavior in, plus the uniform
//! walk ([`AlgorithmInspector`]) that analysis, extraction and printing
//! are built on.
//!
//! # Design
//!
//! - Arena + index: the storage owns every entity, everything else
//!   references by id. Per-kind id newtypes keep kinds apart at compile
//!   time.
//! - Append-only: entities are immutable once created, so ids can be
//!   shared freely and nothing dangles.

pub mod entities;
pub mod error;
pub mod ids;
pub mod inspect;
pub mod node;
pub mod print;
pub mod storage;

pub use entities::{
    Assign, Block, DoWhile, For, FuncInvocation, HeaderFile, If, InputBinding, IrType, Lib,
    Operand, OutputActivation, ReturnOutputActivation, Statement, Symbol, Var, VarDef, Vars,
    While,
};
pub use error::{Error, Result};
pub use ids::{
    AssignId, BlockId, DoId, ForId, FuncInvocationId, HeaderFileId, IfId, InputBindingId,
    IrTypeId, LibId, OutputActivationId, ReturnOutputActivationId, StatementId, SymbolId, VarId,
    VarsId, WhileId,
};
pub use inspect::{AlgorithmInspector, StatementVisitor};
pub use node::{ActivationAlgorithms, ActivationNode, InputActivation};
pub use print::render_statement;
pub use storage::AlgorithmStorage;
