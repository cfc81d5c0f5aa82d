//! The compiled external-process invocation.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A single ffmpeg launch: program, ordered arguments, and how much media
/// time the run is expected to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationPlan {
    program: PathBuf,
    args: Vec<OsString>,
    expected_duration: Option<Duration>,
}

impl InvocationPlan {
    /// Creates a plan from its parts.
    pub fn new<I, A>(
        program: impl Into<PathBuf>,
        args: I,
        expected_duration: Option<Duration>,
    ) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            expected_duration,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments as passed to the process. Paths keep their exact bytes.
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Media time the tool should process, used for completion fractions.
    pub fn expected_duration(&self) -> Option<Duration> {
        self.expected_duration
    }
}

impl fmt::Display for InvocationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {:?}", arg)?;
        }
        Ok(())
    }
}
