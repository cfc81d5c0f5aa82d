//! Types for the transcoder module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::encoding::EncodingSpec;

/// One source-to-target encoding request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodeJob {
    /// Input media path.
    pub source: PathBuf,
    /// Output media path.
    pub target: PathBuf,
    /// What to encode.
    pub spec: EncodingSpec,
}

impl EncodeJob {
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>, spec: EncodingSpec) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            spec,
        }
    }
}
