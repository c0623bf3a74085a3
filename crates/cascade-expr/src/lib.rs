// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Cascade expression calculator.
//!
//! A small infix calculator used by overlay/formula evaluations: text is
//! compiled once into an RPN program ([`Expr::parse`]) and evaluated any
//! number of times against named variable bindings ([`Expr::eval`]).
//! Malformed input fails at compile time, never at evaluation time.

pub mod error;
pub mod expr;
pub mod lexer;

pub use error::{Error, Result};
pub use expr::{Expr, Instr};
pub use lexer::Token;
