//! Error types for the encoding module.

use std::fmt;
use thiserror::Error;

/// Thread-count field named by [`ConfigError::InvalidThreadCount`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadField {
    Filter,
    Decoding,
    Encoding,
}

impl fmt::Display for ThreadField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Filter => "filter_threads",
            Self::Decoding => "decoding_threads",
            Self::Encoding => "encoding_threads",
        };
        f.write_str(name)
    }
}

/// Caller-fixable problems detected before any process is launched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Neither an audio nor a video stream was requested.
    #[error("No stream selected: at least one of audio or video must be set")]
    NoStreamSelected,

    /// Duration is negative or not a finite number.
    #[error("Invalid duration: {0}")]
    InvalidDuration(f64),

    /// Offset is negative or not a finite number.
    #[error("Invalid offset: {0}")]
    InvalidOffset(f64),

    /// Thread count below the `-1` sentinel.
    #[error("Invalid thread count for {0}: must be -1 or greater")]
    InvalidThreadCount(ThreadField),
}
