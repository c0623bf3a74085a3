// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Cascade value runtime.
//!
//! Runtime-typed data for dataflow graphs: interned structural type
//! descriptors ([`Type`], [`TypeRegistry`]), type-erased values with a
//! reflective path-based access API ([`Value`], [`Path`]), and the
//! static-typing bridges ([`Reflect`], [`Convert`]).
//!
//! # Design
//!
//! - Types are hash-consed: structural equality reduces to pointer
//!   comparison for handles from one registry.
//! - Values own their payloads; copies are deep.
//! - The registry is explicit. Nothing in this crate keeps global state,
//!   so tests and embedders can run any number of independent registries.

pub mod error;
pub mod path;
pub mod ty;
pub mod value;

pub use error::{Error, Result};
pub use path::{Path, PathItem};
pub use ty::{AggregateKind, Field, ScalarKind, Type, TypeDesc, TypeRegistry};
pub use value::{Byte, Convert, Payload, Reflect, Scalar, Value};
