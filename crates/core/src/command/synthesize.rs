//! Compiles a validated spec into an ffmpeg argument vector.

use std::ffi::OsString;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use super::plan::InvocationPlan;
use crate::config::{SeekStrategy, TranscoderConfig};
use crate::encoding::{AudioSpec, ThreadCount, ValidSpec, VideoSpec};
use crate::probe::SourceProbe;

/// Deterministic builder of [`InvocationPlan`]s.
///
/// Arguments are always emitted in the same order:
///
/// 1. `-y`, log level, `-filter_threads`, decoding `-threads`
/// 2. `-ss` (input seek), `-i <source>`, `-ss` (output seek)
/// 3. video flags or `-vn`, audio flags or `-an`
/// 4. encoding `-threads`, `-t`, `-map_metadata 0`, `-f`
/// 5. extra output arguments, then the target path
#[derive(Debug, Clone)]
pub struct CommandSynthesizer {
    program: PathBuf,
    log_level: String,
    seek_strategy: SeekStrategy,
    extra_output_args: Vec<String>,
}

impl CommandSynthesizer {
    /// Creates a synthesizer for the given ffmpeg binary with no log level
    /// override and input seeking.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            log_level: String::new(),
            seek_strategy: SeekStrategy::Input,
            extra_output_args: Vec::new(),
        }
    }

    /// Creates a synthesizer from transcoder configuration.
    pub fn from_config(config: &TranscoderConfig) -> Self {
        Self {
            program: config.ffmpeg_path.clone(),
            log_level: config.log_level.clone(),
            seek_strategy: config.seek_strategy,
            extra_output_args: config.extra_output_args.clone(),
        }
    }

    /// Sets the `-loglevel` value. Empty leaves it out.
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Sets where the offset seek is placed.
    pub fn with_seek_strategy(mut self, strategy: SeekStrategy) -> Self {
        self.seek_strategy = strategy;
        self
    }

    /// Sets arguments appended right before the target path.
    pub fn with_extra_output_args(mut self, args: Vec<String>) -> Self {
        self.extra_output_args = args;
        self
    }

    pub fn seek_strategy(&self) -> SeekStrategy {
        self.seek_strategy
    }

    /// Builds the invocation for encoding `source` into `target`.
    pub fn synthesize(
        &self,
        spec: &ValidSpec,
        source: &Path,
        target: &Path,
        probe: &SourceProbe,
    ) -> InvocationPlan {
        let mut args: Vec<OsString> = vec!["-y".into()];

        if !self.log_level.is_empty() {
            push_opt(&mut args, "-loglevel", &self.log_level);
            args.push("-stats".into());
        }

        if let ThreadCount::Fixed(n) = spec.filter_threads() {
            push_opt(&mut args, "-filter_threads", n);
        }

        // Before -i, so it applies to the decoder
        if let ThreadCount::Fixed(n) = spec.decoding_threads() {
            push_opt(&mut args, "-threads", n);
        }

        let seek = spec.offset().map(format_seconds);

        if self.seek_strategy == SeekStrategy::Input {
            if let Some(ref seek) = seek {
                push_opt(&mut args, "-ss", seek);
            }
        }

        args.push("-i".into());
        args.push(path_arg(source));

        if self.seek_strategy == SeekStrategy::Output {
            if let Some(ref seek) = seek {
                push_opt(&mut args, "-ss", seek);
            }
        }

        // A probe listing streams but none of a kind means that kind cannot
        // be mapped; an empty probe says nothing either way.
        let probe_known = !probe.streams.is_empty();

        match spec.video() {
            Some(video) if !probe_known || probe.has_video() => push_video_args(&mut args, video),
            Some(_) => {
                debug!("Source has no video stream, disabling video output");
                args.push("-vn".into());
            }
            None => args.push("-vn".into()),
        }

        match spec.audio() {
            Some(audio) if !probe_known || probe.has_audio() => push_audio_args(&mut args, audio),
            Some(_) => {
                debug!("Source has no audio stream, disabling audio output");
                args.push("-an".into());
            }
            None => args.push("-an".into()),
        }

        // After -i, so it applies to the encoder
        if let ThreadCount::Fixed(n) = spec.encoding_threads() {
            push_opt(&mut args, "-threads", n);
        }

        if let Some(duration) = spec.duration() {
            push_opt(&mut args, "-t", format_seconds(duration));
        }

        if spec.map_metadata() {
            push_opt(&mut args, "-map_metadata", 0);
        }

        if !spec.format().is_empty() {
            push_opt(&mut args, "-f", spec.format());
        }

        args.extend(self.extra_output_args.iter().map(OsString::from));

        args.push(path_arg(target));

        InvocationPlan::new(self.program.clone(), args, expected_duration(spec, probe))
    }
}

/// Media time the run will process: the requested duration, cut short by
/// the end of the source when the probe knows it.
fn expected_duration(spec: &ValidSpec, probe: &SourceProbe) -> Option<Duration> {
    let remaining = probe.remaining_after(spec.offset().unwrap_or(Duration::ZERO));
    match (spec.duration(), remaining) {
        (Some(duration), Some(remaining)) => Some(duration.min(remaining)),
        (duration, remaining) => duration.or(remaining),
    }
}

fn push_opt(args: &mut Vec<OsString>, flag: &str, value: impl fmt::Display) {
    args.push(flag.into());
    args.push(value.to_string().into());
}

fn push_video_args(args: &mut Vec<OsString>, video: &VideoSpec) {
    if let Some(ref codec) = video.codec {
        push_opt(args, "-c:v", codec);
    }
    if let Some(ref tag) = video.tag {
        push_opt(args, "-tag:v", tag);
    }
    if let Some(bit_rate) = video.bit_rate {
        push_opt(args, "-b:v", bit_rate);
    }
    if let Some(fps) = video.frame_rate {
        push_opt(args, "-r", fps);
    }
    if let Some(size) = video.size {
        push_opt(args, "-s", size);
    }
    if let Some(ref pix_fmt) = video.pixel_format {
        push_opt(args, "-pix_fmt", pix_fmt);
    }
    if let Some(quality) = video.quality {
        push_opt(args, "-q:v", quality);
    }
}

fn push_audio_args(args: &mut Vec<OsString>, audio: &AudioSpec) {
    if let Some(ref codec) = audio.codec {
        push_opt(args, "-c:a", codec);
    }
    if let Some(bit_rate) = audio.bit_rate {
        push_opt(args, "-b:a", bit_rate);
    }
    if let Some(channels) = audio.channels {
        push_opt(args, "-ac", channels);
    }
    if let Some(rate) = audio.sampling_rate {
        push_opt(args, "-ar", rate);
    }
    if let Some(volume) = audio.volume {
        push_opt(args, "-vol", volume);
    }
    if let Some(quality) = audio.quality {
        push_opt(args, "-q:a", quality);
    }
}

/// Formats a duration as seconds rounded to the millisecond, keeping at
/// least one decimal digit ("5.0", "2.5", "1.234").
pub fn format_seconds(duration: Duration) -> String {
    let millis = (duration.as_nanos() + 500_000) / 1_000_000;
    let whole = millis / 1000;
    let frac = millis % 1000;

    if frac == 0 {
        return format!("{}.0", whole);
    }

    let digits = format!("{:03}", frac);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

/// Renders a path so ffmpeg reads it as a plain file.
///
/// Paths starting with `-` would parse as options, and relative paths whose
/// first component contains `:` would parse as a protocol. Both get an
/// explicit `file:` prefix. The path's bytes are kept as they are.
pub fn path_arg(path: &Path) -> OsString {
    let raw = path.as_os_str();

    let looks_like_option = raw.as_encoded_bytes().first() == Some(&b'-');
    let looks_like_protocol = path.is_relative()
        && matches!(
            path.components().next(),
            Some(Component::Normal(first)) if first.as_encoded_bytes().contains(&b':')
        );

    if looks_like_option || looks_like_protocol {
        let mut arg = OsString::from("file:");
        arg.push(raw);
        arg
    } else {
        raw.to_os_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{validate, EncodingSpec};
    use crate::probe::StreamKind;
    use crate::progress::{ProgressEvent, ProgressParser};

    fn av_probe(secs: u64) -> SourceProbe {
        SourceProbe::new("mov")
            .with_duration(Duration::from_secs(secs))
            .with_stream(StreamKind::Video, Some("h264"))
            .with_stream(StreamKind::Audio, Some("aac"))
    }

    fn position(args: &[OsString], flag: &str) -> usize {
        args.iter()
            .position(|a| a == flag)
            .unwrap_or_else(|| panic!("{} not in {:?}", flag, args))
    }

    fn value_after<'a>(args: &'a [OsString], flag: &str) -> Option<&'a str> {
        let idx = args.iter().position(|a| a == flag)?;
        args.get(idx + 1).and_then(|a| a.to_str())
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(Duration::from_secs(5)), "5.0");
        assert_eq!(format_seconds(Duration::from_millis(2500)), "2.5");
        assert_eq!(format_seconds(Duration::from_millis(1234)), "1.234");
        assert_eq!(format_seconds(Duration::from_millis(10)), "0.01");
        assert_eq!(format_seconds(Duration::from_micros(1_999_600)), "2.0");
        assert_eq!(format_seconds(Duration::ZERO), "0.0");
    }

    #[test]
    fn test_path_arg_defuses_option_like_paths() {
        assert_eq!(path_arg(Path::new("-evil.mp4")), "file:-evil.mp4");
        assert_eq!(path_arg(Path::new("-")), "file:-");
        assert_eq!(path_arg(Path::new("http:clip.mp4")), "file:http:clip.mp4");
        assert_eq!(path_arg(Path::new("/media/out.mp4")), "/media/out.mp4");
        assert_eq!(path_arg(Path::new("out.mp4")), "out.mp4");
        assert_eq!(path_arg(Path::new("dir/a:b.mp4")), "dir/a:b.mp4");
    }

    #[cfg(unix)]
    #[test]
    fn test_path_arg_keeps_non_utf8_bytes() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let raw = OsStr::from_bytes(b"/tmp/clip\xff.mov");
        assert_eq!(path_arg(Path::new(raw)).as_bytes(), b"/tmp/clip\xff.mov");

        let dashed = OsStr::from_bytes(b"-clip\xfe.mov");
        assert_eq!(path_arg(Path::new(dashed)).as_bytes(), b"file:-clip\xfe.mov");
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_paths_reach_the_plan_intact() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let spec = EncodingSpec::new("mp4").with_video(VideoSpec::default());
        let valid = validate(&spec).unwrap();
        let source = Path::new(OsStr::from_bytes(b"in\xe9.mov"));
        let target = Path::new(OsStr::from_bytes(b"/out/\xff\xfe.mp4"));

        let plan = CommandSynthesizer::new("ffmpeg").synthesize(
            &valid,
            source,
            target,
            &SourceProbe::default(),
        );
        let args = plan.args();

        assert_eq!(args[position(args, "-i") + 1].as_bytes(), b"in\xe9.mov");
        assert_eq!(args.last().map(|a| a.as_bytes()), Some(&b"/out/\xff\xfe.mp4"[..]));
    }

    #[test]
    fn test_scenario_offset_and_duration() {
        let spec = EncodingSpec::new("mp4")
            .with_video(VideoSpec::default())
            .with_audio(AudioSpec::default())
            .with_duration(10.0)
            .with_offset(5.0);
        let valid = validate(&spec).unwrap();

        let plan = CommandSynthesizer::new("ffmpeg").synthesize(
            &valid,
            Path::new("input.mov"),
            Path::new("output.mp4"),
            &av_probe(30),
        );
        let args = plan.args();

        let ss = position(args, "-ss");
        let input = position(args, "-i");
        let t = position(args, "-t");
        assert_eq!(args[ss + 1], "5.0");
        assert_eq!(args[t + 1], "10.0");
        assert!(ss < input);
        assert!(input < t);
        assert_eq!(args.last().and_then(|a| a.to_str()), Some("output.mp4"));
        assert_eq!(plan.expected_duration(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_full_argument_order() {
        let spec = EncodingSpec::new("mp4")
            .with_video(
                VideoSpec::with_codec("libx264")
                    .tag("avc1")
                    .bit_rate(2_000_000)
                    .frame_rate(30)
                    .size(1280, 720)
                    .pixel_format("yuv420p"),
            )
            .with_audio(
                AudioSpec::with_codec("aac")
                    .bit_rate(128_000)
                    .channels(2)
                    .sampling_rate(48_000),
            )
            .with_offset(1.5)
            .with_duration(20.0)
            .with_map_metadata(true)
            .with_filter_threads(2)
            .with_decoding_threads(3)
            .with_encoding_threads(4);
        let valid = validate(&spec).unwrap();

        let plan = CommandSynthesizer::new("/usr/bin/ffmpeg")
            .with_log_level("info")
            .with_extra_output_args(vec!["-movflags".into(), "+faststart".into()])
            .synthesize(
                &valid,
                Path::new("/in/source.mov"),
                Path::new("/out/target.mp4"),
                &av_probe(60),
            );

        let expected: Vec<&str> = vec![
            "-y", "-loglevel", "info", "-stats",
            "-filter_threads", "2",
            "-threads", "3",
            "-ss", "1.5",
            "-i", "/in/source.mov",
            "-c:v", "libx264", "-tag:v", "avc1", "-b:v", "2000000", "-r", "30",
            "-s", "1280x720", "-pix_fmt", "yuv420p",
            "-c:a", "aac", "-b:a", "128000", "-ac", "2", "-ar", "48000",
            "-threads", "4",
            "-t", "20.0",
            "-map_metadata", "0",
            "-f", "mp4",
            "-movflags", "+faststart",
            "/out/target.mp4",
        ];
        assert_eq!(plan.args(), expected.as_slice());
        assert_eq!(plan.program(), Path::new("/usr/bin/ffmpeg"));
    }

    #[test]
    fn test_absent_streams_emit_disable_flags() {
        let spec = EncodingSpec::new("mp3").with_audio(AudioSpec::with_codec("libmp3lame"));
        let valid = validate(&spec).unwrap();
        let plan = CommandSynthesizer::new("ffmpeg").synthesize(
            &valid,
            Path::new("in.flac"),
            Path::new("out.mp3"),
            &SourceProbe::default(),
        );
        let args = plan.args();

        assert!(args.contains(&OsString::from("-vn")));
        assert!(!args.contains(&OsString::from("-an")));
        assert!(!args.contains(&OsString::from("-c:v")));
        assert!(position(args, "-vn") < position(args, "-c:a"));
    }

    #[test]
    fn test_probe_without_audio_disables_audio() {
        let spec = EncodingSpec::new("mp4")
            .with_video(VideoSpec::with_codec("libx264"))
            .with_audio(AudioSpec::with_codec("aac"));
        let valid = validate(&spec).unwrap();
        let probe = SourceProbe::new("mov").with_stream(StreamKind::Video, Some("prores"));

        let plan = CommandSynthesizer::new("ffmpeg").synthesize(
            &valid,
            Path::new("in.mov"),
            Path::new("out.mp4"),
            &probe,
        );
        assert!(plan.args().contains(&OsString::from("-an")));
        assert!(!plan.args().contains(&OsString::from("-c:a")));
        assert!(plan.args().contains(&OsString::from("-c:v")));
    }

    #[test]
    fn test_tool_default_threads_omitted() {
        let spec = EncodingSpec::new("mp4").with_video(VideoSpec::default());
        let valid = validate(&spec).unwrap();
        let plan = CommandSynthesizer::new("ffmpeg").synthesize(
            &valid,
            Path::new("in.mov"),
            Path::new("out.mp4"),
            &SourceProbe::default(),
        );
        let args = plan.args();

        assert!(!args.contains(&OsString::from("-threads")));
        assert!(!args.contains(&OsString::from("-filter_threads")));
        assert!(!args.contains(&OsString::from("-ss")));
        assert!(!args.contains(&OsString::from("-t")));
        assert!(!args.contains(&OsString::from("-map_metadata")));
        assert!(!args.contains(&OsString::from("-loglevel")));
        assert_eq!(plan.expected_duration(), None);
    }

    #[test]
    fn test_output_seek_places_offset_after_input() {
        let spec = EncodingSpec::new("mp4")
            .with_video(VideoSpec::default())
            .with_offset(12.0);
        let valid = validate(&spec).unwrap();
        let plan = CommandSynthesizer::new("ffmpeg")
            .with_seek_strategy(SeekStrategy::Output)
            .synthesize(
                &valid,
                Path::new("in.mov"),
                Path::new("out.mp4"),
                &av_probe(100),
            );
        let args = plan.args();

        assert!(position(args, "-i") < position(args, "-ss"));
        assert!(position(args, "-ss") < position(args, "-an"));
        assert_eq!(plan.expected_duration(), Some(Duration::from_secs(88)));
    }

    #[test]
    fn test_expected_duration_from_probe() {
        let spec = EncodingSpec::new("mp4")
            .with_video(VideoSpec::default())
            .with_offset(5.0);
        let valid = validate(&spec).unwrap();
        let plan = CommandSynthesizer::new("ffmpeg").synthesize(
            &valid,
            Path::new("in.mov"),
            Path::new("out.mp4"),
            &av_probe(30),
        );
        assert_eq!(plan.expected_duration(), Some(Duration::from_secs(25)));
    }

    #[test]
    fn test_expected_duration_stops_at_end_of_source() {
        let spec = EncodingSpec::new("mp4")
            .with_video(VideoSpec::default())
            .with_offset(25.0)
            .with_duration(10.0);
        let valid = validate(&spec).unwrap();
        let plan = CommandSynthesizer::new("ffmpeg").synthesize(
            &valid,
            Path::new("in.mov"),
            Path::new("out.mp4"),
            &av_probe(30),
        );

        // The flag still asks for the full duration.
        assert_eq!(value_after(plan.args(), "-t"), Some("10.0"));
        assert_eq!(plan.expected_duration(), Some(Duration::from_secs(5)));

        let mut parser = ProgressParser::new(plan.expected_duration());
        match parser.feed("frame=150 time=00:00:05.00 speed=1x") {
            Some(ProgressEvent::Progress(update)) => assert_eq!(update.fraction, Some(1.0)),
            other => panic!("expected progress, got {:?}", other),
        }
    }

    #[test]
    fn test_expected_duration_without_probe_duration() {
        let spec = EncodingSpec::new("mp4")
            .with_video(VideoSpec::default())
            .with_offset(25.0)
            .with_duration(10.0);
        let valid = validate(&spec).unwrap();
        let plan = CommandSynthesizer::new("ffmpeg").synthesize(
            &valid,
            Path::new("in.mov"),
            Path::new("out.mp4"),
            &SourceProbe::default(),
        );
        assert_eq!(plan.expected_duration(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_synthesis_is_deterministic() {
        let spec = EncodingSpec::new("mkv")
            .with_video(VideoSpec::with_codec("libx265").quality(23))
            .with_audio(AudioSpec::with_codec("libopus").volume(256).quality(5))
            .with_offset(0.333)
            .with_duration(7.25)
            .with_encoding_threads(0);
        let valid = validate(&spec).unwrap();
        let synth = CommandSynthesizer::new("ffmpeg").with_log_level("warning");

        let first = synth.synthesize(&valid, Path::new("a.mov"), Path::new("b.mkv"), &av_probe(10));
        for _ in 0..5 {
            let again =
                synth.synthesize(&valid, Path::new("a.mov"), Path::new("b.mkv"), &av_probe(10));
            assert_eq!(first, again);
        }
    }

    #[test]
    fn test_known_flags_recover_values() {
        let spec = EncodingSpec::new("mp4")
            .with_video(VideoSpec::default())
            .with_audio(AudioSpec::default())
            .with_offset(3.125)
            .with_duration(42.5)
            .with_filter_threads(6)
            .with_decoding_threads(2)
            .with_encoding_threads(8);
        let valid = validate(&spec).unwrap();
        let plan = CommandSynthesizer::new("ffmpeg").synthesize(
            &valid,
            Path::new("in.mov"),
            Path::new("out.mp4"),
            &SourceProbe::default(),
        );
        let args = plan.args();
        let input = position(args, "-i");

        let offset: f64 = value_after(args, "-ss").unwrap().parse().unwrap();
        let duration: f64 = value_after(args, "-t").unwrap().parse().unwrap();
        let filter: i32 = value_after(args, "-filter_threads").unwrap().parse().unwrap();
        let decoding: i32 = value_after(&args[..input], "-threads").unwrap().parse().unwrap();
        let encoding: i32 = value_after(&args[input..], "-threads").unwrap().parse().unwrap();

        assert_eq!(offset, 3.125);
        assert_eq!(duration, 42.5);
        assert_eq!(filter, 6);
        assert_eq!(decoding, 2);
        assert_eq!(encoding, 8);
    }

    #[test]
    fn test_target_starting_with_dash_is_defused() {
        let spec = EncodingSpec::new("mp4").with_video(VideoSpec::default());
        let valid = validate(&spec).unwrap();
        let plan = CommandSynthesizer::new("ffmpeg").synthesize(
            &valid,
            Path::new("-in.mov"),
            Path::new("-out.mp4"),
            &SourceProbe::default(),
        );
        assert_eq!(value_after(plan.args(), "-i"), Some("file:-in.mov"));
        assert_eq!(plan.args().last().and_then(|a| a.to_str()), Some("file:-out.mp4"));
    }

    #[test]
    fn test_from_config() {
        let config = TranscoderConfig {
            log_level: "error".to_string(),
            seek_strategy: SeekStrategy::Output,
            ..Default::default()
        };
        let synth = CommandSynthesizer::from_config(&config);
        assert_eq!(synth.seek_strategy(), SeekStrategy::Output);

        let spec = EncodingSpec::new("").with_audio(AudioSpec::default());
        let plan = synth.synthesize(
            &validate(&spec).unwrap(),
            Path::new("in.wav"),
            Path::new("out.wav"),
            &SourceProbe::default(),
        );
        assert_eq!(value_after(plan.args(), "-loglevel"), Some("error"));
        assert!(!plan.args().contains(&OsString::from("-f")));
        assert_eq!(plan.program(), Path::new("ffmpeg"));
    }
}
