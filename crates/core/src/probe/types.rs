//! Types for the probe module.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Kind of an elementary stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    Audio,
    Video,
    Subtitle,
    Data,
    Other,
}

impl StreamKind {
    /// Maps an ffprobe `codec_type` string.
    pub fn from_codec_type(codec_type: &str) -> Self {
        match codec_type {
            "audio" => Self::Audio,
            "video" => Self::Video,
            "subtitle" => Self::Subtitle,
            "data" => Self::Data,
            _ => Self::Other,
        }
    }
}

/// One stream of the probed source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeStream {
    /// Stream index within the container.
    pub index: u32,
    /// Stream kind.
    pub kind: StreamKind,
    /// Codec name, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
}

/// Description of the input media, produced outside the core.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceProbe {
    /// Container format name (first entry of ffprobe's `format_name`).
    pub container: String,
    /// Streams in container order.
    #[serde(default)]
    pub streams: Vec<ProbeStream>,
    /// Total duration, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Duration>,
}

impl SourceProbe {
    /// Creates a probe with no streams.
    pub fn new(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            ..Default::default()
        }
    }

    /// Sets the total duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Appends a stream, numbering it after the existing ones.
    pub fn with_stream(mut self, kind: StreamKind, codec: Option<&str>) -> Self {
        let index = self.streams.len() as u32;
        self.streams.push(ProbeStream {
            index,
            kind,
            codec: codec.map(str::to_string),
        });
        self
    }

    pub fn has_audio(&self) -> bool {
        self.streams.iter().any(|s| s.kind == StreamKind::Audio)
    }

    pub fn has_video(&self) -> bool {
        self.streams.iter().any(|s| s.kind == StreamKind::Video)
    }

    /// Source time left after seeking to `offset`, if the duration is known.
    pub fn remaining_after(&self, offset: Duration) -> Option<Duration> {
        self.duration.map(|d| d.saturating_sub(offset))
    }
}
