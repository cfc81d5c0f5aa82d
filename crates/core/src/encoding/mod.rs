//! Encoding configuration model and its validator.
//!
//! An [`EncodingSpec`] is assembled with fluent `with_*` setters and checked
//! by [`validate`], which yields a [`ValidSpec`] the command synthesizer
//! accepts.

mod error;
mod types;
mod validate;

pub use error::{ConfigError, ThreadField};
pub use types::{AudioSpec, EncodingSpec, VideoSize, VideoSpec, TOOL_DEFAULT_THREADS};
pub use validate::{validate, ThreadCount, ValidSpec};
