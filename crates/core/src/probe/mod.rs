//! Source media description consumed by the command synthesizer.
//!
//! The core only reads [`SourceProbe`] values. [`FfprobeProber`] is provided
//! as a ready-made collaborator that fills one in from `ffprobe` JSON.

mod error;
mod ffprobe;
mod traits;
mod types;

pub use error::ProbeError;
pub use ffprobe::FfprobeProber;
pub use traits::Prober;
pub use types::{ProbeStream, SourceProbe, StreamKind};
