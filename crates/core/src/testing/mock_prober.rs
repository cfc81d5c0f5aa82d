//! Mock prober for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::probe::{ProbeError, Prober, SourceProbe, StreamKind};

/// Mock implementation of the Prober trait.
///
/// Returns pre-configured probes by path, falling back to a default probe
/// (a 10 second source with one video and one audio stream). Every call is
/// recorded.
///
/// # Example
///
/// ```rust,ignore
/// use ffdrive_core::testing::MockProber;
///
/// let prober = MockProber::new();
/// prober.set_probe_result("in.mov", SourceProbe::new("mov")).await;
/// ```
#[derive(Debug, Clone)]
pub struct MockProber {
    /// Paths probed so far, in call order.
    calls: Arc<RwLock<Vec<PathBuf>>>,
    /// Pre-configured probe results by path.
    probe_results: Arc<RwLock<HashMap<PathBuf, SourceProbe>>>,
    /// Probe returned for paths without a configured result.
    default_probe: Arc<RwLock<Option<SourceProbe>>>,
    /// If set, the next probe will fail with this error.
    next_error: Arc<RwLock<Option<ProbeError>>>,
}

impl Default for MockProber {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProber {
    /// Create a new mock prober.
    pub fn new() -> Self {
        let default_probe = SourceProbe::new("mov")
            .with_duration(Duration::from_secs(10))
            .with_stream(StreamKind::Video, Some("h264"))
            .with_stream(StreamKind::Audio, Some("aac"));

        Self {
            calls: Arc::new(RwLock::new(Vec::new())),
            probe_results: Arc::new(RwLock::new(HashMap::new())),
            default_probe: Arc::new(RwLock::new(Some(default_probe))),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Set a probe result for a specific path.
    pub async fn set_probe_result(&self, path: impl AsRef<Path>, probe: SourceProbe) {
        self.probe_results
            .write()
            .await
            .insert(path.as_ref().to_path_buf(), probe);
    }

    /// Set the probe returned for unknown paths. `None` makes them fail.
    pub async fn set_default_probe(&self, probe: Option<SourceProbe>) {
        *self.default_probe.write().await = probe;
    }

    /// Make the next probe fail.
    pub async fn set_next_error(&self, error: ProbeError) {
        *self.next_error.write().await = Some(error);
    }

    /// Paths probed so far.
    pub async fn recorded_calls(&self) -> Vec<PathBuf> {
        self.calls.read().await.clone()
    }

    /// Number of probes performed.
    pub async fn probe_count(&self) -> usize {
        self.calls.read().await.len()
    }
}

#[async_trait]
impl Prober for MockProber {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(&self, path: &Path) -> Result<SourceProbe, ProbeError> {
        self.calls.write().await.push(path.to_path_buf());

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        if let Some(probe) = self.probe_results.read().await.get(path) {
            return Ok(probe.clone());
        }

        self.default_probe
            .read()
            .await
            .clone()
            .ok_or_else(|| ProbeError::InputNotFound {
                path: path.to_path_buf(),
            })
    }
}
