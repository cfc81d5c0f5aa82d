use std::time::Duration;

use super::error::{ConfigError, ThreadField};
use super::types::{AudioSpec, EncodingSpec, VideoSpec, TOOL_DEFAULT_THREADS};

/// Thread count accepted by ffmpeg.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadCount {
    /// Leave the flag out and let ffmpeg decide.
    ToolDefault,
    /// Pass an explicit count.
    Fixed(u32),
}

impl ThreadCount {
    fn from_raw(raw: i32, field: ThreadField) -> Result<Self, ConfigError> {
        if raw == TOOL_DEFAULT_THREADS {
            return Ok(Self::ToolDefault);
        }
        u32::try_from(raw)
            .map(Self::Fixed)
            .map_err(|_| ConfigError::InvalidThreadCount(field))
    }

    /// Returns the explicit count, if any.
    pub fn fixed(&self) -> Option<u32> {
        match self {
            Self::ToolDefault => None,
            Self::Fixed(n) => Some(*n),
        }
    }
}

/// An [`EncodingSpec`] that passed [`validate`].
///
/// Times are exposed as [`Duration`] and thread counts as [`ThreadCount`], so
/// downstream code never sees an out-of-range value.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidSpec {
    spec: EncodingSpec,
    offset: Option<Duration>,
    duration: Option<Duration>,
    filter_threads: ThreadCount,
    decoding_threads: ThreadCount,
    encoding_threads: ThreadCount,
}

impl ValidSpec {
    /// The validated model.
    pub fn spec(&self) -> &EncodingSpec {
        &self.spec
    }

    pub fn format(&self) -> &str {
        self.spec.format()
    }

    pub fn offset(&self) -> Option<Duration> {
        self.offset
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn audio(&self) -> Option<&AudioSpec> {
        self.spec.audio()
    }

    pub fn video(&self) -> Option<&VideoSpec> {
        self.spec.video()
    }

    pub fn map_metadata(&self) -> bool {
        self.spec.map_metadata()
    }

    pub fn filter_threads(&self) -> ThreadCount {
        self.filter_threads
    }

    pub fn decoding_threads(&self) -> ThreadCount {
        self.decoding_threads
    }

    pub fn encoding_threads(&self) -> ThreadCount {
        self.encoding_threads
    }
}

fn non_negative_seconds(value: f64) -> Option<Duration> {
    if value.is_finite() && value >= 0.0 {
        Duration::try_from_secs_f64(value).ok()
    } else {
        None
    }
}

/// Checks the cross-field rules of an encoding spec.
///
/// Rules are applied in this order and the first failure is reported:
/// - at least one of audio or video must be present
/// - duration, when set, must be a non-negative finite number
/// - offset, when set, must be a non-negative finite number
/// - thread counts must be `-1` or greater (filter, decoding, encoding)
pub fn validate(spec: &EncodingSpec) -> Result<ValidSpec, ConfigError> {
    if spec.audio().is_none() && spec.video().is_none() {
        return Err(ConfigError::NoStreamSelected);
    }

    let duration = match spec.duration() {
        Some(secs) => Some(non_negative_seconds(secs).ok_or(ConfigError::InvalidDuration(secs))?),
        None => None,
    };

    let offset = match spec.offset() {
        Some(secs) => Some(non_negative_seconds(secs).ok_or(ConfigError::InvalidOffset(secs))?),
        None => None,
    };

    let filter_threads = ThreadCount::from_raw(spec.filter_threads(), ThreadField::Filter)?;
    let decoding_threads = ThreadCount::from_raw(spec.decoding_threads(), ThreadField::Decoding)?;
    let encoding_threads = ThreadCount::from_raw(spec.encoding_threads(), ThreadField::Encoding)?;

    Ok(ValidSpec {
        spec: spec.clone(),
        offset,
        duration,
        filter_threads,
        decoding_threads,
        encoding_threads,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video_spec() -> EncodingSpec {
        EncodingSpec::new("mp4").with_video(VideoSpec::with_codec("libx264"))
    }

    #[test]
    fn test_no_stream_selected() {
        let result = validate(&EncodingSpec::new("mp4"));
        assert_eq!(result.unwrap_err(), ConfigError::NoStreamSelected);
    }

    #[test]
    fn test_no_stream_reported_before_other_rules() {
        let spec = EncodingSpec::new("mp4")
            .with_duration(-1.0)
            .with_offset(-1.0)
            .with_encoding_threads(-5);
        assert_eq!(validate(&spec).unwrap_err(), ConfigError::NoStreamSelected);
    }

    #[test]
    fn test_duration_checked_before_offset() {
        let spec = video_spec().with_duration(-1.0).with_offset(-2.0);
        assert!(matches!(
            validate(&spec).unwrap_err(),
            ConfigError::InvalidDuration(d) if d == -1.0
        ));
    }

    #[test]
    fn test_invalid_offset() {
        let spec = video_spec().with_offset(-0.5);
        assert!(matches!(
            validate(&spec).unwrap_err(),
            ConfigError::InvalidOffset(_)
        ));
    }

    #[test]
    fn test_non_finite_times_rejected() {
        let spec = video_spec().with_duration(f64::NAN);
        assert!(matches!(
            validate(&spec).unwrap_err(),
            ConfigError::InvalidDuration(_)
        ));

        let spec = video_spec().with_offset(f64::INFINITY);
        assert!(matches!(
            validate(&spec).unwrap_err(),
            ConfigError::InvalidOffset(_)
        ));
    }

    #[test]
    fn test_thread_fields_checked_in_order() {
        let spec = video_spec()
            .with_decoding_threads(-2)
            .with_encoding_threads(-3);
        assert_eq!(
            validate(&spec).unwrap_err(),
            ConfigError::InvalidThreadCount(ThreadField::Decoding)
        );

        let spec = video_spec()
            .with_filter_threads(-9)
            .with_decoding_threads(-2);
        assert_eq!(
            validate(&spec).unwrap_err(),
            ConfigError::InvalidThreadCount(ThreadField::Filter)
        );

        let spec = video_spec().with_encoding_threads(i32::MIN);
        assert_eq!(
            validate(&spec).unwrap_err(),
            ConfigError::InvalidThreadCount(ThreadField::Encoding)
        );
    }

    #[test]
    fn test_valid_spec_typed_view() {
        let spec = EncodingSpec::new("mp4")
            .with_audio(AudioSpec::with_codec("aac"))
            .with_offset(5.0)
            .with_duration(10.0)
            .with_filter_threads(0)
            .with_encoding_threads(8);

        let valid = validate(&spec).unwrap();
        assert_eq!(valid.offset(), Some(Duration::from_secs(5)));
        assert_eq!(valid.duration(), Some(Duration::from_secs(10)));
        assert_eq!(valid.filter_threads(), ThreadCount::Fixed(0));
        assert_eq!(valid.decoding_threads(), ThreadCount::ToolDefault);
        assert_eq!(valid.encoding_threads().fixed(), Some(8));
        assert_eq!(valid.spec(), &spec);
    }

    #[test]
    fn test_zero_times_are_valid() {
        let spec = video_spec().with_offset(0.0).with_duration(0.0);
        let valid = validate(&spec).unwrap();
        assert_eq!(valid.offset(), Some(Duration::ZERO));
        assert_eq!(valid.duration(), Some(Duration::ZERO));
    }

    #[test]
    fn test_validate_is_idempotent() {
        let spec = video_spec().with_duration(3.25).with_decoding_threads(2);
        let first = validate(&spec).unwrap();
        let second = validate(&spec).unwrap();
        assert_eq!(first, second);

        let bad = video_spec().with_offset(-1.0);
        assert_eq!(validate(&bad).unwrap_err(), validate(&bad).unwrap_err());
    }
}
