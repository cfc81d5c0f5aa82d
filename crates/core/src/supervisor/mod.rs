//! Process supervision for ffmpeg runs.
//!
//! [`ProcessSupervisor`] launches an [`InvocationPlan`](crate::command::InvocationPlan),
//! streams its diagnostic output through the progress parser, and maps the
//! way the process ended to a [`RunOutcome`] or [`RunError`].
//!
//! # Example
//!
//! ```ignore
//! let supervisor = ProcessSupervisor::new(Duration::from_secs(5));
//! let cancel = CancellationToken::new();
//! let outcome = supervisor
//!     .run(&plan, |event| println!("{:?}", event), Some(Duration::from_secs(600)), &cancel)
//!     .await?;
//! ```

mod error;
mod runner;
mod types;

pub use error::RunError;
pub use runner::{ProcessSupervisor, RunHandle};
pub use types::{RunOutcome, RunState};
