//! Generated source text.

use std::fmt;

/// Generated C++ source code.
///
/// Newtype over the emitted text so it cannot be confused with arbitrary
/// strings flowing through the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCode(String);

impl GeneratedCode {
    pub fn new(code: String) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn contains(&self, pat: &str) -> bool {
        self.0.contains(pat)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for GeneratedCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<GeneratedCode> for String {
    fn from(code: GeneratedCode) -> Self {
        code.into_inner()
    }
}
