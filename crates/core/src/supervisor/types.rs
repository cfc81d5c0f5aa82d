//! Types for the supervisor module.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

/// Lifecycle of a supervised run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    NotStarted,
    Running,
    Succeeded,
    Failed { exit_code: Option<i32> },
    Cancelled,
    TimedOut,
}

impl RunState {
    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::Failed { .. } | Self::Cancelled | Self::TimedOut
        )
    }

    /// Whether `next` is a legal successor of this state.
    ///
    /// A launch failure moves straight from `NotStarted` to `Failed`.
    pub fn can_advance_to(&self, next: &RunState) -> bool {
        match self {
            Self::NotStarted => matches!(next, Self::Running | Self::Failed { .. }),
            Self::Running => next.is_terminal(),
            _ => false,
        }
    }
}

/// State holder that enforces [`RunState`] transitions and optionally
/// publishes them to a watcher.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    state: RunState,
    publisher: Option<watch::Sender<RunState>>,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            state: RunState::NotStarted,
            publisher: None,
        }
    }

    pub(crate) fn with_publisher(publisher: watch::Sender<RunState>) -> Self {
        Self {
            state: RunState::NotStarted,
            publisher: Some(publisher),
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> RunState {
        self.state
    }

    /// Moves to `next`; returns false and stays put if the move is illegal.
    pub(crate) fn advance(&mut self, next: RunState) -> bool {
        if !self.state.can_advance_to(&next) {
            debug!(from = ?self.state, to = ?next, "Ignoring illegal run state transition");
            return false;
        }
        debug!(from = ?self.state, to = ?next, "Run state transition");
        self.state = next;
        if let Some(ref publisher) = self.publisher {
            publisher.send_replace(next);
        }
        true
    }
}

/// Successful completion of a supervised run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    /// Identifier used in log records for this run.
    pub run_id: Uuid,
    /// Launch time.
    pub started_at: DateTime<Utc>,
    /// Wall-clock run time.
    pub elapsed: Duration,
    /// Last media time the tool reported.
    pub processed: Duration,
    /// Process exit code.
    pub exit_code: Option<i32>,
    /// Trailing non-progress output.
    pub diagnostics: Vec<String>,
}

/// Bounded buffer of the most recent diagnostic lines.
#[derive(Debug)]
pub(crate) struct DiagnosticTail {
    lines: VecDeque<String>,
    capacity: usize,
}

impl DiagnosticTail {
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub(crate) fn push(&mut self, line: &str) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.to_string());
    }

    pub(crate) fn into_lines(self) -> Vec<String> {
        self.lines.into()
    }
}
