//! End-to-end encoding: validate, probe, synthesize and run.
//!
//! [`FfmpegEncoder`] ties the other modules together behind the [`Encoder`]
//! trait so callers can swap in a different tool or a test double.

mod error;
mod ffmpeg;
mod traits;
mod types;

pub use error::EncodeError;
pub use ffmpeg::FfmpegEncoder;
pub use traits::Encoder;
pub use types::EncodeJob;
