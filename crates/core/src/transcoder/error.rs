//! Error types for the transcoder module.

use std::path::PathBuf;
use thiserror::Error;

use crate::command::SynthesisError;
use crate::encoding::ConfigError;
use crate::probe::ProbeError;
use crate::supervisor::RunError;

/// Errors from the full probe, validate, synthesize and run pipeline.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The encoding spec was rejected before anything was launched.
    #[error("Invalid encoding spec: {0}")]
    Config(#[from] ConfigError),

    /// The source could not be probed.
    #[error("Probe failed: {0}")]
    Probe(#[from] ProbeError),

    /// The command could not be synthesized.
    #[error("Synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    /// The target directory does not exist and could not be created.
    #[error("Failed to create output directory: {path}")]
    OutputDirectoryFailed { path: PathBuf },

    /// The supervised run failed.
    #[error(transparent)]
    Run(#[from] RunError),
}

impl EncodeError {
    /// Whether the caller can fix this by changing the spec.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Run(e) => e.is_retryable(),
            Self::Probe(ProbeError::Io(_)) => true,
            _ => false,
        }
    }
}
