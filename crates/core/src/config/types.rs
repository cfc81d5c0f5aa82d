use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Where the start offset is applied relative to the input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeekStrategy {
    /// `-ss` before `-i`: fast keyframe seek on the input.
    #[default]
    Input,
    /// `-ss` after `-i`: decode and discard up to the offset.
    Output,
}

/// Configuration for driving ffmpeg.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranscoderConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Path to ffprobe binary.
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    /// Empty leaves the tool's own default.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Placement of the offset seek.
    #[serde(default)]
    pub seek_strategy: SeekStrategy,

    /// How long a cancelled process may take to quit before it is killed.
    #[serde(default = "default_grace_period")]
    pub grace_period_ms: u64,

    /// Deadline for a single run in seconds, 0 for none.
    #[serde(default)]
    pub timeout_secs: u64,

    /// Number of diagnostic lines kept for failure reports.
    #[serde(default = "default_tail_lines")]
    pub diagnostic_tail_lines: usize,

    /// Additional output arguments placed just before the target path.
    #[serde(default)]
    pub extra_output_args: Vec<String>,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_grace_period() -> u64 {
    5000
}

fn default_tail_lines() -> usize {
    20
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            log_level: default_log_level(),
            seek_strategy: SeekStrategy::default(),
            grace_period_ms: default_grace_period(),
            timeout_secs: 0,
            diagnostic_tail_lines: default_tail_lines(),
            extra_output_args: Vec::new(),
        }
    }
}

impl TranscoderConfig {
    /// Creates a new config with custom ffmpeg/ffprobe paths.
    pub fn with_paths(ffmpeg_path: PathBuf, ffprobe_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            ffprobe_path,
            ..Default::default()
        }
    }

    /// Sets the seek strategy.
    pub fn with_seek_strategy(mut self, strategy: SeekStrategy) -> Self {
        self.seek_strategy = strategy;
        self
    }

    /// Sets the termination grace period.
    pub fn with_grace_period(mut self, grace: Duration) -> Self {
        self.grace_period_ms = grace.as_millis() as u64;
        self
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Grace period as a [`Duration`].
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    /// Run deadline, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}
