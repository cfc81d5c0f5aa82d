mod job;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ffdrive_core::{validate_config, Encoder, FfmpegEncoder, ProgressEvent};

use job::JobFile;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ffdrive v{}", VERSION);

    let job_path = std::env::var("FFDRIVE_JOB")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("job.toml"));

    info!("Loading job from {:?}", job_path);
    let (job, config) = JobFile::load(&job_path)?.into_parts();
    validate_config(&config).context("Transcoder configuration validation failed")?;

    info!(
        source = %job.source.display(),
        target = %job.target.display(),
        spec = %job.spec,
        "Job loaded"
    );

    let encoder = FfmpegEncoder::new(config);
    let cancel = CancellationToken::new();

    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping encode");
            ctrl_c.cancel();
        }
    });

    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
    let reporter = tokio::spawn(async move {
        while let Some(event) = progress_rx.recv().await {
            match event {
                ProgressEvent::Progress(update) => match update.fraction {
                    Some(fraction) => info!(
                        percent = (fraction * 1000.0).round() / 10.0,
                        speed = ?update.speed,
                        "Encoding"
                    ),
                    None => info!(elapsed = ?update.elapsed, "Encoding"),
                },
                ProgressEvent::Fatal { line, .. } => error!("{}", line),
            }
        }
    });

    let result = encoder
        .encode_with_progress(job, progress_tx, cancel)
        .await;
    let _ = reporter.await;

    let outcome = result.context("Encoding failed")?;
    info!(
        run_id = %outcome.run_id,
        elapsed = ?outcome.elapsed,
        processed = ?outcome.processed,
        "Done"
    );

    Ok(())
}
