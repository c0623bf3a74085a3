//! Expression calculator errors

use thiserror::Error;

/// Expression result type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from expression compilation and evaluation.
///
/// Malformed text always fails at construction time, never at
/// evaluation time; evaluation can only fail on unbound variables.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("unexpected character at offset {0}")]
    UnexpectedChar(usize),

    #[error("unexpected token `{0}`")]
    UnexpectedToken(String),

    #[error("expression ends with a dangling operator")]
    TrailingOperator,

    #[error("mismatched parentheses")]
    MismatchedParens,

    #[error("empty expression")]
    Empty,

    #[error("unknown variable: {0}")]
    UnknownVariable(String),
}
