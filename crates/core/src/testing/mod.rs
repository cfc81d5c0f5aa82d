//! Test doubles for the external collaborators of the encoding pipeline.
//!
//! # Example
//!
//! ```rust,ignore
//! use ffdrive_core::testing::MockProber;
//! use ffdrive_core::{FfmpegEncoder, TranscoderConfig};
//!
//! let prober = MockProber::new();
//! let encoder = FfmpegEncoder::with_prober(TranscoderConfig::default(), Arc::new(prober));
//! ```

mod mock_prober;

pub use mock_prober::MockProber;
