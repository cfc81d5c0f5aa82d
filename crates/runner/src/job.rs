use serde::Deserialize;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ffdrive_core::{EncodeJob, EncodingSpec, TranscoderConfig};

/// A job file: what to encode and, optionally, how to run the tools.
#[derive(Debug, Deserialize)]
pub struct JobFile {
    pub source: PathBuf,
    pub target: PathBuf,
    pub encoding: EncodingSpec,
    #[serde(default)]
    pub transcoder: TranscoderConfig,
}

impl JobFile {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read job file {:?}", path))?;
        Self::parse(&contents).with_context(|| format!("Invalid job file {:?}", path))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn into_parts(self) -> (EncodeJob, TranscoderConfig) {
        (
            EncodeJob::new(self.source, self.target, self.encoding),
            self.transcoder,
        )
    }
}
