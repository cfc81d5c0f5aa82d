//! Error types for the command module.

use std::fmt;

/// Failure to synthesize a command from a validated spec.
///
/// Synthesis is total over [`ValidSpec`](crate::encoding::ValidSpec), so this
/// type has no values. It exists so callers can already match on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisError {}

impl fmt::Display for SynthesisError {
    fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

impl std::error::Error for SynthesisError {}
