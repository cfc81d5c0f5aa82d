//! Stateful parser for ffmpeg's status lines.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Serialize;
use std::time::Duration;

use super::markers::find_fatal_marker;

static TIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\s)time=\s*(-)?(\d+):(\d{1,2}):(\d{1,2}(?:\.\d+)?)").unwrap()
});

static SPEED_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"speed=\s*(\d+\.?\d*)x").unwrap());

/// A processed-time update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressUpdate {
    /// Media time processed so far.
    pub elapsed: Duration,
    /// Completion in `0.0..=1.0`, when the total is known.
    pub fraction: Option<f64>,
    /// Processing speed relative to real time, when reported.
    pub speed: Option<f32>,
}

/// Structured output of [`ProgressParser::feed`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// The tool reported how far it got.
    Progress(ProgressUpdate),
    /// The tool printed a line that means the job cannot succeed.
    Fatal {
        /// The offending line.
        line: String,
        /// Which known phrase matched.
        marker: &'static str,
    },
}

impl ProgressEvent {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal { .. })
    }
}

/// Running state of one supervised run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressState {
    elapsed: Duration,
    total: Option<Duration>,
    fraction: f64,
    failed: bool,
}

impl ProgressState {
    /// Last processed time seen.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Expected total, if known.
    pub fn total(&self) -> Option<Duration> {
        self.total
    }

    /// Highest completion fraction reported so far.
    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    /// Whether a fatal marker has been seen.
    pub fn failed(&self) -> bool {
        self.failed
    }
}

/// Turns diagnostic lines into [`ProgressEvent`]s.
///
/// Fractions never decrease, even if the tool's reported time does. A zero
/// total is treated as unknown.
#[derive(Debug, Clone, Default)]
pub struct ProgressParser {
    state: ProgressState,
}

impl ProgressParser {
    /// Creates a parser for a run expected to process `total` media time.
    pub fn new(total: Option<Duration>) -> Self {
        Self {
            state: ProgressState {
                total: total.filter(|t| !t.is_zero()),
                ..Default::default()
            },
        }
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    /// Parses one complete line.
    pub fn feed(&mut self, line: &str) -> Option<ProgressEvent> {
        if let Some(marker) = find_fatal_marker(line) {
            self.state.failed = true;
            return Some(ProgressEvent::Fatal {
                line: line.to_string(),
                marker,
            });
        }

        let elapsed = parse_time(line)?;
        self.state.elapsed = elapsed;

        let fraction = self.state.total.map(|total| {
            let raw = (elapsed.as_secs_f64() / total.as_secs_f64()).min(1.0);
            self.state.fraction = self.state.fraction.max(raw);
            self.state.fraction
        });

        let speed = SPEED_REGEX
            .captures(line)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<f32>().ok());

        Some(ProgressEvent::Progress(ProgressUpdate {
            elapsed,
            fraction,
            speed,
        }))
    }
}

/// Extracts the `time=HH:MM:SS.frac` value of a status line.
///
/// Negative times, printed by ffmpeg before the first packet, clamp to zero.
/// Values too large to represent are ignored.
pub fn parse_time(line: &str) -> Option<Duration> {
    let caps = TIME_REGEX.captures(line)?;

    let hours: u64 = caps.get(2)?.as_str().parse().ok()?;
    let minutes: u64 = caps.get(3)?.as_str().parse().ok()?;
    let seconds: f64 = caps.get(4)?.as_str().parse().ok()?;

    if caps.get(1).is_some() {
        return Some(Duration::ZERO);
    }

    let whole = hours.checked_mul(3600)?.checked_add(minutes * 60)?;
    Duration::from_secs(whole).checked_add(Duration::try_from_secs_f64(seconds).ok()?)
}
