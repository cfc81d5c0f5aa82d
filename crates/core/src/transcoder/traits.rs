//! Trait definitions for the transcoder module.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::error::EncodeError;
use super::types::EncodeJob;
use crate::command::InvocationPlan;
use crate::progress::ProgressEvent;
use crate::supervisor::RunOutcome;

/// An encoder that drives an external transcoding tool.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Returns the name of this encoder implementation.
    fn name(&self) -> &str;

    /// Validates the job's spec, probes its source and compiles the
    /// invocation, without launching anything.
    async fn plan(&self, job: &EncodeJob) -> Result<InvocationPlan, EncodeError>;

    /// Encodes the job, stopping early if `cancel` is triggered.
    async fn encode(
        &self,
        job: EncodeJob,
        cancel: CancellationToken,
    ) -> Result<RunOutcome, EncodeError>;

    /// Encodes the job with progress reporting.
    ///
    /// Events are sent in output order. If the receiver is dropped, encoding
    /// continues without progress reporting.
    async fn encode_with_progress(
        &self,
        job: EncodeJob,
        progress_tx: mpsc::UnboundedSender<ProgressEvent>,
        cancel: CancellationToken,
    ) -> Result<RunOutcome, EncodeError>;
}
