// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::panic))]

//! Cascade activation graph analyzer and code generator.
//!
//! Takes a graph of [`ActivationNode`](cascade_ir::ActivationNode)s plus
//! the IR they declare, resolves every from-binding variable to a concrete
//! type across upstream activations and declared source types, and emits a
//! self-contained C++ translation unit: a `Context` struct, one activation
//! function per (node, input port) with synchronous direct dispatch,
//! accessor thunks, and an `entry_point`.
//!
//! Pipeline: [`analyze`] -> [`ActivationAnalysis`] -> [`generate`] ->
//! [`GeneratedCode`].

pub mod analyze;
pub mod code;
pub mod error;
pub mod generate;

#[cfg(test)]
pub(crate) mod testkit;

pub use analyze::{ActivationAnalysis, SourceType, analyze};
pub use code::GeneratedCode;
pub use error::{Error, Result};
pub use generate::generate;
