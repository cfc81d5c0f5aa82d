//! FFmpeg-based encoder implementation.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::error::EncodeError;
use super::traits::Encoder;
use super::types::EncodeJob;
use crate::command::{CommandSynthesizer, InvocationPlan};
use crate::config::TranscoderConfig;
use crate::encoding::validate;
use crate::probe::{FfprobeProber, Prober};
use crate::progress::ProgressEvent;
use crate::supervisor::{ProcessSupervisor, RunOutcome};

/// Runs encoding jobs through ffmpeg.
pub struct FfmpegEncoder {
    config: TranscoderConfig,
    prober: Arc<dyn Prober>,
    synthesizer: CommandSynthesizer,
    supervisor: ProcessSupervisor,
}

impl FfmpegEncoder {
    /// Creates a new encoder with the given configuration, probing sources
    /// with the configured ffprobe.
    pub fn new(config: TranscoderConfig) -> Self {
        let prober = Arc::new(FfprobeProber::new(config.ffprobe_path.clone()));
        Self::with_prober(config, prober)
    }

    /// Creates an encoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(TranscoderConfig::default())
    }

    /// Creates an encoder that probes sources with `prober`.
    pub fn with_prober(config: TranscoderConfig, prober: Arc<dyn Prober>) -> Self {
        Self {
            synthesizer: CommandSynthesizer::from_config(&config),
            supervisor: ProcessSupervisor::from_config(&config),
            config,
            prober,
        }
    }

    pub fn config(&self) -> &TranscoderConfig {
        &self.config
    }

    async fn run_job(
        &self,
        job: &EncodeJob,
        progress_tx: Option<mpsc::UnboundedSender<ProgressEvent>>,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, EncodeError> {
        let plan = self.plan(job).await?;

        if let Some(parent) = job.target.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|_| {
                EncodeError::OutputDirectoryFailed {
                    path: parent.to_path_buf(),
                }
            })?;
        }

        let on_progress = move |event: ProgressEvent| {
            if let Some(ref tx) = progress_tx {
                let _ = tx.send(event);
            }
        };

        let outcome = self
            .supervisor
            .run(&plan, on_progress, self.config.timeout(), cancel)
            .await?;

        info!(
            target_path = %job.target.display(),
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            "Encoding finished"
        );
        Ok(outcome)
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn plan(&self, job: &EncodeJob) -> Result<InvocationPlan, EncodeError> {
        // Validation comes first so a bad spec never touches the source.
        let valid = validate(&job.spec)?;
        let probe = self.prober.probe(&job.source).await?;

        debug!(
            prober = self.prober.name(),
            container = %probe.container,
            duration = ?probe.duration,
            "Probed source"
        );

        Ok(self
            .synthesizer
            .synthesize(&valid, &job.source, &job.target, &probe))
    }

    async fn encode(
        &self,
        job: EncodeJob,
        cancel: CancellationToken,
    ) -> Result<RunOutcome, EncodeError> {
        self.run_job(&job, None, &cancel).await
    }

    async fn encode_with_progress(
        &self,
        job: EncodeJob,
        progress_tx: mpsc::UnboundedSender<ProgressEvent>,
        cancel: CancellationToken,
    ) -> Result<RunOutcome, EncodeError> {
        self.run_job(&job, Some(progress_tx), &cancel).await
    }
}
