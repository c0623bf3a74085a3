// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::panic))]

//! Cascade graph engine.
//!
//! Compiles a directed graph of typed computation nodes into a topological
//! level schedule and evaluates it incrementally: only nodes whose inputs
//! actually changed since their last run are re-invoked, tracked through
//! per-node logical timestamps.
//!
//! Pipeline: node/edge lists -> [`compile`] -> [`ComputationInstructions`]
//! -> [`compute`] against a reusable [`ComputationResult`].

pub mod compile;
pub mod compute;
pub mod error;
pub mod graph;
pub mod node;

#[cfg(test)]
pub(crate) mod testkit;

pub use compile::{ComputationInstructions, compile};
pub use compute::{ComputationResult, compute};
pub use error::{Error, Result};
pub use graph::{Edge, NodeIndex, PortIndex, PortRef, SourceInput, SourceInputs};
pub use node::{CancelToken, ComputationNode, ComputeContext};
