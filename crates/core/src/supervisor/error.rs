//! Error types for the supervisor module.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can end a supervised run.
#[derive(Debug, Error)]
pub enum RunError {
    /// The executable is missing or could not be started.
    #[error("Failed to launch {program}: {source}")]
    LaunchFailed {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The tool exited non-zero or printed a fatal diagnostic.
    #[error("External tool failed (exit code {exit_code:?}): {}", .diagnostics.last().map(String::as_str).unwrap_or("no diagnostics"))]
    ExternalToolFailed {
        exit_code: Option<i32>,
        diagnostics: Vec<String>,
    },

    /// The run was cancelled by the caller.
    #[error("Run cancelled")]
    Cancelled,

    /// The run exceeded its deadline.
    #[error("Run timed out after {after:?}")]
    TimedOut { after: Duration },

    /// I/O error while reading output or waiting for the process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RunError {
    /// Creates a new external tool failure.
    pub fn tool_failed(exit_code: Option<i32>, diagnostics: Vec<String>) -> Self {
        Self::ExternalToolFailed {
            exit_code,
            diagnostics,
        }
    }

    /// Diagnostic lines captured before a tool failure.
    pub fn diagnostics(&self) -> &[String] {
        match self {
            Self::ExternalToolFailed { diagnostics, .. } => diagnostics,
            _ => &[],
        }
    }

    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TimedOut { .. } | Self::Io(_))
    }

    /// Label used for metrics.
    pub(crate) fn result_label(&self) -> &'static str {
        match self {
            Self::LaunchFailed { .. } => "launch_failed",
            Self::ExternalToolFailed { .. } => "failed",
            Self::Cancelled => "cancelled",
            Self::TimedOut { .. } => "timed_out",
            Self::Io(_) => "io_error",
        }
    }
}
