//! Progress parsing for ffmpeg's diagnostic stream.
//!
//! [`LineAssembler`] turns raw stderr bytes into lines and
//! [`ProgressParser`] turns lines into [`ProgressEvent`]s.

mod lines;
mod markers;
mod parser;

pub use lines::{LineAssembler, MAX_LINE_BYTES};
pub use markers::{find_fatal_marker, FATAL_MARKERS};
pub use parser::{parse_time, ProgressEvent, ProgressParser, ProgressState, ProgressUpdate};
