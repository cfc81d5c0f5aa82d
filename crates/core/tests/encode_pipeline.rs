//! Encoding pipeline integration tests.
//!
//! These tests run the full validate, probe, synthesize and run sequence
//! with a mock prober and stock system binaries in place of ffmpeg:
//! - Spec errors surface before any probing or launching
//! - Output directories are created on demand
//! - Tool failures and successes map to the right results

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use ffdrive_core::{
    testing::MockProber, AudioSpec, ConfigError, EncodeError, EncodeJob, Encoder, EncodingSpec,
    FfmpegEncoder, RunError, SeekStrategy, SourceProbe, StreamKind, TranscoderConfig, VideoSpec,
};

struct TestHarness {
    encoder: FfmpegEncoder,
    prober: MockProber,
    out_dir: TempDir,
}

impl TestHarness {
    fn new(tool: &str) -> Self {
        Self::with_config(TranscoderConfig {
            ffmpeg_path: PathBuf::from(tool),
            ..Default::default()
        })
    }

    fn with_config(config: TranscoderConfig) -> Self {
        let prober = MockProber::new();
        let encoder = FfmpegEncoder::with_prober(config, Arc::new(prober.clone()));
        let out_dir = TempDir::new().expect("Failed to create output dir");
        Self {
            encoder,
            prober,
            out_dir,
        }
    }

    fn target(&self, name: &str) -> PathBuf {
        self.out_dir.path().join(name)
    }
}

fn audio_spec() -> EncodingSpec {
    EncodingSpec::new("mp3").with_audio(AudioSpec::with_codec("libmp3lame").bit_rate(128_000))
}

#[tokio::test]
async fn test_invalid_spec_never_probes() {
    let harness = TestHarness::new("/bin/echo");
    let spec = EncodingSpec::new("mp4")
        .with_video(VideoSpec::default())
        .with_duration(-1.0);

    let err = harness
        .encoder
        .encode(
            EncodeJob::new("in.mov", harness.target("out.mp4"), spec),
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EncodeError::Config(ConfigError::InvalidDuration(_))));
    assert_eq!(harness.prober.probe_count().await, 0);
}

#[tokio::test]
async fn test_successful_encode_creates_output_dir() {
    let harness = TestHarness::new("/bin/echo");
    let target = harness.target("nested/deeper/out.mp3");

    let outcome = harness
        .encoder
        .encode(
            EncodeJob::new("in.wav", &target, audio_spec()),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.exit_code, Some(0));
    assert!(target.parent().unwrap().is_dir());
    assert_eq!(
        harness.prober.recorded_calls().await,
        vec![PathBuf::from("in.wav")]
    );
}

#[tokio::test]
async fn test_tool_failure_maps_to_run_error() {
    let harness = TestHarness::new("/bin/false");

    let err = harness
        .encoder
        .encode(
            EncodeJob::new("in.wav", harness.target("out.mp3"), audio_spec()),
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EncodeError::Run(RunError::ExternalToolFailed {
            exit_code: Some(1),
            ..
        })
    ));
    assert!(!err.is_config());
}

#[tokio::test]
async fn test_encode_with_progress_closes_channel() {
    let harness = TestHarness::new("/bin/echo");
    let (tx, mut rx) = mpsc::unbounded_channel();

    harness
        .encoder
        .encode_with_progress(
            EncodeJob::new("in.wav", harness.target("out.mp3"), audio_spec()),
            tx,
            CancellationToken::new(),
        )
        .await
        .unwrap();

    // echo prints nothing on stderr, so no events, and the sender is gone.
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn test_plan_drops_missing_streams_and_seeks_after_input() {
    let harness = TestHarness::with_config(
        TranscoderConfig::with_paths("/usr/bin/ffmpeg".into(), "/usr/bin/ffprobe".into())
            .with_seek_strategy(SeekStrategy::Output),
    );
    harness
        .prober
        .set_probe_result(
            "clip.mov",
            SourceProbe::new("mov")
                .with_duration(Duration::from_secs(60))
                .with_stream(StreamKind::Video, Some("prores")),
        )
        .await;

    let spec = EncodingSpec::new("mp4")
        .with_video(VideoSpec::with_codec("libx264"))
        .with_audio(AudioSpec::with_codec("aac"))
        .with_offset(15.0);
    let plan = harness
        .encoder
        .plan(&EncodeJob::new("clip.mov", "out.mp4", spec))
        .await
        .unwrap();

    let args = plan.args();
    let pos = |flag: &str| args.iter().position(|a| a == flag);
    assert!(pos("-an").is_some());
    assert!(pos("-c:a").is_none());
    assert!(pos("-i").unwrap() < pos("-ss").unwrap());
    assert_eq!(plan.expected_duration(), Some(Duration::from_secs(45)));
}
