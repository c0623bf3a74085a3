//! IR storage errors

use thiserror::Error;

/// IR result type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by id lookups against an
/// [`AlgorithmStorage`](crate::storage::AlgorithmStorage).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    #[error("unknown {kind} id {id}")]
    UnknownId { kind: &'static str, id: u32 },
}

impl Error {
    pub fn unknown(kind: &'static str, id: u32) -> Self {
        Error::UnknownId { kind, id }
    }
}
