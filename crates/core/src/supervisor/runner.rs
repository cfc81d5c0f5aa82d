//! Launches ffmpeg and follows it to completion.

use chrono::Utc;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, trace, warn, Instrument};
use uuid::Uuid;

use super::error::RunError;
use super::types::{DiagnosticTail, Lifecycle, RunOutcome, RunState};
use crate::command::InvocationPlan;
use crate::config::TranscoderConfig;
use crate::metrics;
use crate::progress::{LineAssembler, ProgressEvent, ProgressParser};

const READ_BUFFER_SIZE: usize = 4096;

/// Default time a process gets to quit after being asked to.
const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Default number of diagnostic lines kept.
const DEFAULT_TAIL_LINES: usize = 20;

/// Why a run was stopped before the tool exited on its own.
#[derive(Debug, Clone, Copy)]
enum Interrupt {
    Cancelled,
    TimedOut(Duration),
}

impl Interrupt {
    fn state(self) -> RunState {
        match self {
            Self::Cancelled => RunState::Cancelled,
            Self::TimedOut(_) => RunState::TimedOut,
        }
    }

    fn into_error(self) -> RunError {
        match self {
            Self::Cancelled => RunError::Cancelled,
            Self::TimedOut(after) => RunError::TimedOut { after },
        }
    }
}

/// Runs one [`InvocationPlan`] at a time per call and reports its progress.
///
/// A supervisor holds only settings; every call to [`run`](Self::run) owns
/// its own process, parser and state, so one supervisor can drive many
/// concurrent runs.
#[derive(Debug, Clone)]
pub struct ProcessSupervisor {
    grace_period: Duration,
    tail_lines: usize,
}

impl Default for ProcessSupervisor {
    fn default() -> Self {
        Self {
            grace_period: DEFAULT_GRACE_PERIOD,
            tail_lines: DEFAULT_TAIL_LINES,
        }
    }
}

impl ProcessSupervisor {
    /// Creates a supervisor with the given termination grace period.
    pub fn new(grace_period: Duration) -> Self {
        Self {
            grace_period,
            ..Default::default()
        }
    }

    /// Creates a supervisor from transcoder configuration.
    pub fn from_config(config: &TranscoderConfig) -> Self {
        Self {
            grace_period: config.grace_period(),
            tail_lines: config.diagnostic_tail_lines,
        }
    }

    /// Sets how many diagnostic lines are kept for failure reports.
    pub fn with_tail_lines(mut self, lines: usize) -> Self {
        self.tail_lines = lines;
        self
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Runs the plan to completion.
    ///
    /// `on_progress` is called once per parsed event, in output order.
    /// Cancelling `cancel` or reaching `deadline` asks the tool to quit,
    /// then kills it once the grace period elapses. The process has exited
    /// and been reaped by the time this returns.
    pub async fn run<F>(
        &self,
        plan: &InvocationPlan,
        on_progress: F,
        deadline: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, RunError>
    where
        F: FnMut(ProgressEvent) + Send,
    {
        let mut lifecycle = Lifecycle::new();
        self.supervise(plan, on_progress, deadline, cancel, &mut lifecycle)
            .await
    }

    /// Runs the plan on a background task.
    ///
    /// Events arrive on the returned receiver in output order; the handle
    /// exposes the run state, cancellation and the final result.
    pub fn spawn(
        &self,
        plan: InvocationPlan,
        deadline: Option<Duration>,
    ) -> (RunHandle, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(RunState::NotStarted);
        let cancel = CancellationToken::new();

        let supervisor = self.clone();
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            let mut lifecycle = Lifecycle::with_publisher(state_tx);
            supervisor
                .supervise(
                    &plan,
                    move |event| {
                        // A dropped receiver only means nobody is listening.
                        let _ = event_tx.send(event);
                    },
                    deadline,
                    &token,
                    &mut lifecycle,
                )
                .await
        });

        let handle = RunHandle {
            cancel,
            state: state_rx,
            task,
        };
        (handle, event_rx)
    }

    async fn supervise<F>(
        &self,
        plan: &InvocationPlan,
        on_progress: F,
        deadline: Option<Duration>,
        cancel: &CancellationToken,
        lifecycle: &mut Lifecycle,
    ) -> Result<RunOutcome, RunError>
    where
        F: FnMut(ProgressEvent) + Send,
    {
        let run_id = Uuid::new_v4();
        let span = info_span!("ffmpeg_run", %run_id);
        let start = Instant::now();

        let result = self
            .supervise_inner(run_id, plan, on_progress, deadline, cancel, lifecycle)
            .instrument(span)
            .await;

        let label = match &result {
            Ok(_) => "succeeded",
            Err(e) => e.result_label(),
        };
        metrics::record_run_finished(label, start.elapsed().as_secs_f64());

        result
    }

    async fn supervise_inner<F>(
        &self,
        run_id: Uuid,
        plan: &InvocationPlan,
        mut on_progress: F,
        deadline: Option<Duration>,
        cancel: &CancellationToken,
        lifecycle: &mut Lifecycle,
    ) -> Result<RunOutcome, RunError>
    where
        F: FnMut(ProgressEvent) + Send,
    {
        let started_at = Utc::now();
        let start = Instant::now();
        let deadline_at = deadline.map(|d| start + d);

        let mut child = match Command::new(plan.program())
            .args(plan.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                warn!(program = %plan.program().display(), error = %e, "Failed to launch external tool");
                lifecycle.advance(RunState::Failed { exit_code: None });
                return Err(RunError::LaunchFailed {
                    program: plan.program().to_path_buf(),
                    source: e,
                });
            }
        };

        lifecycle.advance(RunState::Running);
        metrics::RUNS_STARTED.inc();
        info!(
            pid = ?child.id(),
            program = %plan.program().display(),
            args = ?plan.args(),
            "Launched external tool"
        );

        let mut stdin = child.stdin.take();
        let mut stderr = match child.stderr.take() {
            Some(stderr) => stderr,
            None => {
                self.terminate(&mut child, stdin.take()).await;
                lifecycle.advance(RunState::Failed { exit_code: None });
                return Err(RunError::Io(std::io::Error::other(
                    "stderr of external tool was not captured",
                )));
            }
        };

        let mut parser = ProgressParser::new(plan.expected_duration());
        let mut assembler = LineAssembler::new();
        let mut tail = DiagnosticTail::new(self.tail_lines);
        let mut buf = vec![0u8; READ_BUFFER_SIZE];

        let interrupt = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break Some(Interrupt::Cancelled),
                _ = sleep_until_deadline(deadline_at) => {
                    break Some(Interrupt::TimedOut(deadline.unwrap_or_default()))
                }
                read = stderr.read(&mut buf) => match read {
                    Ok(0) => break None,
                    Ok(n) => {
                        for line in assembler.push(&buf[..n]) {
                            dispatch(&line, &mut parser, &mut tail, &mut on_progress);
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to read tool output");
                        self.terminate(&mut child, stdin.take()).await;
                        lifecycle.advance(RunState::Failed { exit_code: None });
                        return Err(RunError::Io(e));
                    }
                }
            }
        };

        // An unterminated last line may still be a fatal diagnostic.
        if let Some(line) = assembler.finish() {
            dispatch(&line, &mut parser, &mut tail, &mut on_progress);
        }

        let exit = match interrupt {
            Some(interrupt) => Err(interrupt),
            None => tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(Interrupt::Cancelled),
                _ = sleep_until_deadline(deadline_at) => {
                    Err(Interrupt::TimedOut(deadline.unwrap_or_default()))
                }
                status = child.wait() => Ok(status),
            },
        };

        let status: ExitStatus = match exit {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                warn!(error = %e, "Failed to wait for external tool");
                self.terminate(&mut child, stdin.take()).await;
                lifecycle.advance(RunState::Failed { exit_code: None });
                return Err(RunError::Io(e));
            }
            Err(interrupt) => {
                info!(reason = ?interrupt, "Stopping external tool");
                self.terminate(&mut child, stdin.take()).await;
                lifecycle.advance(interrupt.state());
                return Err(interrupt.into_error());
            }
        };

        let exit_code = status.code();
        let state = parser.state();
        info!(
            ?exit_code,
            processed = ?state.elapsed(),
            fatal = state.failed(),
            "External tool exited"
        );

        // A fatal marker wins over a zero exit code.
        if state.failed() || !status.success() {
            lifecycle.advance(RunState::Failed { exit_code });
            return Err(RunError::tool_failed(exit_code, tail.into_lines()));
        }

        lifecycle.advance(RunState::Succeeded);
        Ok(RunOutcome {
            run_id,
            started_at,
            elapsed: start.elapsed(),
            processed: state.elapsed(),
            exit_code,
            diagnostics: tail.into_lines(),
        })
    }

    /// Asks the tool to quit, then kills it if it is still alive after the
    /// grace period. The child is always reaped.
    async fn terminate(&self, child: &mut Child, stdin: Option<ChildStdin>) {
        if let Some(mut stdin) = stdin {
            // ffmpeg finishes the output and exits on 'q'
            if let Err(e) = stdin.write_all(b"q").await {
                debug!(error = %e, "Could not send quit request");
            }
            if let Err(e) = stdin.flush().await {
                debug!(error = %e, "Could not flush quit request");
            }
            drop(stdin);
        }

        match timeout(self.grace_period, child.wait()).await {
            Ok(Ok(status)) => debug!(?status, "External tool quit on request"),
            Ok(Err(e)) => {
                warn!(error = %e, "Failed waiting for external tool to quit, killing");
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "Failed to kill external tool");
                }
            }
            Err(_) => {
                warn!(grace = ?self.grace_period, "External tool ignored quit request, killing");
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "Failed to kill external tool");
                }
            }
        }
    }
}

fn dispatch<F>(
    line: &str,
    parser: &mut ProgressParser,
    tail: &mut DiagnosticTail,
    on_progress: &mut F,
) where
    F: FnMut(ProgressEvent),
{
    trace!(line, "tool output");

    let event = parser.feed(line);
    match &event {
        Some(ProgressEvent::Progress(update)) => {
            debug!(elapsed = ?update.elapsed, fraction = ?update.fraction, "Progress");
        }
        Some(ProgressEvent::Fatal { marker, .. }) => {
            warn!(marker, line, "Fatal diagnostic from external tool");
            metrics::FATAL_MARKERS_SEEN.with_label_values(&[*marker]).inc();
            tail.push(line);
        }
        None => tail.push(line),
    }

    if let Some(event) = event {
        on_progress(event);
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}

/// Handle to a run started with [`ProcessSupervisor::spawn`].
#[derive(Debug)]
pub struct RunHandle {
    cancel: CancellationToken,
    state: watch::Receiver<RunState>,
    task: JoinHandle<Result<RunOutcome, RunError>>,
}

impl RunHandle {
    /// Requests cancellation; the result becomes [`RunError::Cancelled`].
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that cancels this run when triggered.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        *self.state.borrow()
    }

    /// Waits until the run reaches a terminal state and returns it.
    pub async fn wait_terminal(&mut self) -> RunState {
        loop {
            let state = *self.state.borrow_and_update();
            if state.is_terminal() {
                return state;
            }
            if self.state.changed().await.is_err() {
                return *self.state.borrow();
            }
        }
    }

    /// Whether the background task has finished.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the run's result.
    pub async fn wait(self) -> Result<RunOutcome, RunError> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(RunError::Io(std::io::Error::other(e))),
        }
    }
}
