//! Types for the encoding module.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Thread count value that leaves the choice to ffmpeg.
pub const TOOL_DEFAULT_THREADS: i32 = -1;

/// Audio stream parameters.
///
/// Values are forwarded verbatim to ffmpeg; legality of codec names, rates
/// and channel layouts is left to the tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioSpec {
    /// Encoder name (e.g. "aac", "libmp3lame", "copy").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    /// Bit rate in bits per second.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bit_rate: Option<u32>,
    /// Number of output channels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<u32>,
    /// Sampling rate in Hz.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling_rate: Option<u32>,
    /// Volume, 256 being unchanged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<u32>,
    /// Codec-specific VBR quality.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<u32>,
}

impl AudioSpec {
    /// Creates audio parameters for the given codec.
    pub fn with_codec(codec: impl Into<String>) -> Self {
        Self {
            codec: Some(codec.into()),
            ..Default::default()
        }
    }

    /// Sets the bit rate in bits per second.
    pub fn bit_rate(mut self, bit_rate: u32) -> Self {
        self.bit_rate = Some(bit_rate);
        self
    }

    /// Sets the channel count.
    pub fn channels(mut self, channels: u32) -> Self {
        self.channels = Some(channels);
        self
    }

    /// Sets the sampling rate in Hz.
    pub fn sampling_rate(mut self, rate: u32) -> Self {
        self.sampling_rate = Some(rate);
        self
    }

    /// Sets the volume.
    pub fn volume(mut self, volume: u32) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Sets the VBR quality.
    pub fn quality(mut self, quality: u32) -> Self {
        self.quality = Some(quality);
        self
    }
}

/// Frame dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSize {
    pub width: u32,
    pub height: u32,
}

impl VideoSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for VideoSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Video stream parameters.
///
/// Like [`AudioSpec`], these are pass-through values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoSpec {
    /// Encoder name (e.g. "libx264", "copy").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    /// FourCC tag (e.g. "DIVX").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Bit rate in bits per second.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bit_rate: Option<u32>,
    /// Frames per second.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<u32>,
    /// Output frame size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<VideoSize>,
    /// Pixel format (e.g. "yuv420p").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixel_format: Option<String>,
    /// Codec-specific quality scale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<u32>,
}

impl VideoSpec {
    /// Creates video parameters for the given codec.
    pub fn with_codec(codec: impl Into<String>) -> Self {
        Self {
            codec: Some(codec.into()),
            ..Default::default()
        }
    }

    /// Sets the FourCC tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Sets the bit rate in bits per second.
    pub fn bit_rate(mut self, bit_rate: u32) -> Self {
        self.bit_rate = Some(bit_rate);
        self
    }

    /// Sets the frame rate.
    pub fn frame_rate(mut self, fps: u32) -> Self {
        self.frame_rate = Some(fps);
        self
    }

    /// Sets the output frame size.
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.size = Some(VideoSize::new(width, height));
        self
    }

    /// Sets the pixel format.
    pub fn pixel_format(mut self, pix_fmt: impl Into<String>) -> Self {
        self.pixel_format = Some(pix_fmt.into());
        self
    }

    /// Sets the quality scale.
    pub fn quality(mut self, quality: u32) -> Self {
        self.quality = Some(quality);
        self
    }
}

/// Description of a desired transcoding job.
///
/// Built with the `with_*` setters, none of which validate anything. Pass
/// the finished value to [`validate`](super::validate) before synthesizing a
/// command from it.
///
/// # Example
///
/// ```ignore
/// let spec = EncodingSpec::new("mp4")
///     .with_offset(5.0)
///     .with_duration(10.0)
///     .with_video(VideoSpec::with_codec("libx264"))
///     .with_audio(AudioSpec::with_codec("aac").bit_rate(128_000));
/// let valid = validate(&spec)?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingSpec {
    #[serde(default)]
    format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    offset: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    audio: Option<AudioSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    video: Option<VideoSpec>,
    #[serde(default)]
    map_metadata: bool,
    #[serde(default = "default_threads")]
    filter_threads: i32,
    #[serde(default = "default_threads")]
    decoding_threads: i32,
    #[serde(default = "default_threads")]
    encoding_threads: i32,
}

fn default_threads() -> i32 {
    TOOL_DEFAULT_THREADS
}

impl Default for EncodingSpec {
    fn default() -> Self {
        Self {
            format: String::new(),
            offset: None,
            duration: None,
            audio: None,
            video: None,
            map_metadata: false,
            filter_threads: TOOL_DEFAULT_THREADS,
            decoding_threads: TOOL_DEFAULT_THREADS,
            encoding_threads: TOOL_DEFAULT_THREADS,
        }
    }
}

impl EncodingSpec {
    /// Creates a spec targeting the given container format.
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            ..Default::default()
        }
    }

    /// Sets the container format.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Sets the start offset in seconds.
    pub fn with_offset(mut self, seconds: f64) -> Self {
        self.offset = Some(seconds);
        self
    }

    /// Clears the start offset.
    pub fn without_offset(mut self) -> Self {
        self.offset = None;
        self
    }

    /// Sets the encoded duration in seconds.
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    /// Clears the duration limit.
    pub fn without_duration(mut self) -> Self {
        self.duration = None;
        self
    }

    /// Encodes an audio stream with the given parameters.
    pub fn with_audio(mut self, audio: AudioSpec) -> Self {
        self.audio = Some(audio);
        self
    }

    /// Drops the audio stream from the output.
    pub fn without_audio(mut self) -> Self {
        self.audio = None;
        self
    }

    /// Encodes a video stream with the given parameters.
    pub fn with_video(mut self, video: VideoSpec) -> Self {
        self.video = Some(video);
        self
    }

    /// Drops the video stream from the output.
    pub fn without_video(mut self) -> Self {
        self.video = None;
        self
    }

    /// Copies global metadata from the source when set.
    pub fn with_map_metadata(mut self, map_metadata: bool) -> Self {
        self.map_metadata = map_metadata;
        self
    }

    /// Sets the filter thread count, `-1` for the tool default.
    pub fn with_filter_threads(mut self, threads: i32) -> Self {
        self.filter_threads = threads;
        self
    }

    /// Sets the decoding thread count, `-1` for the tool default.
    pub fn with_decoding_threads(mut self, threads: i32) -> Self {
        self.decoding_threads = threads;
        self
    }

    /// Sets the encoding thread count, `-1` for the tool default.
    pub fn with_encoding_threads(mut self, threads: i32) -> Self {
        self.encoding_threads = threads;
        self
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn offset(&self) -> Option<f64> {
        self.offset
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn audio(&self) -> Option<&AudioSpec> {
        self.audio.as_ref()
    }

    pub fn video(&self) -> Option<&VideoSpec> {
        self.video.as_ref()
    }

    pub fn map_metadata(&self) -> bool {
        self.map_metadata
    }

    pub fn filter_threads(&self) -> i32 {
        self.filter_threads
    }

    pub fn decoding_threads(&self) -> i32 {
        self.decoding_threads
    }

    pub fn encoding_threads(&self) -> i32 {
        self.encoding_threads
    }

    /// Stable digest of the spec's fields, suitable as a cache key.
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        format!("{:x}", Sha256::digest(json.as_bytes()))
    }
}

impl fmt::Display for EncodingSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EncodingSpec(format={}, offset={:?}, duration={:?}, audio={:?}, video={:?}, \
             map_metadata={}, filter_threads={}, decoding_threads={}, encoding_threads={})",
            self.format,
            self.offset,
            self.duration,
            self.audio,
            self.video,
            self.map_metadata,
            self.filter_threads,
            self.decoding_threads,
            self.encoding_threads
        )
    }
}
