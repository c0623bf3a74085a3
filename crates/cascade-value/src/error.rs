//! Value runtime errors

use thiserror::Error;

use crate::ty::AggregateKind;

/// Value runtime result type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by reflective value access and conversion.
///
/// All of these are recoverable by the caller; no shared state is
/// corrupted by a failed operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("kind mismatch: expected {expected}, found {found}")]
    KindMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("index {index} out of range (size {size})")]
    OutOfRange { index: usize, size: usize },

    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("unknown key: {0}")]
    UnknownKey(String),

    #[error("unknown enum alternative: {0}")]
    UnknownAlternative(String),

    #[error("path item {item} cannot address a {kind:?} value")]
    BadPathItem { item: String, kind: AggregateKind },

    #[error("{op} is not supported for {kind:?} values")]
    Unsupported {
        op: &'static str,
        kind: AggregateKind,
    },

    #[error("value is empty")]
    Empty,

    #[error("cannot assign a value of type {found} to a component of type {expected}")]
    ComponentType { expected: String, found: String },
}
