//! Phrases ffmpeg prints when a job cannot succeed.

/// Substrings that mark a fatal condition in ffmpeg's diagnostic output.
pub const FATAL_MARKERS: &[&str] = &[
    "Unknown encoder",
    "Unknown decoder",
    "Unknown format",
    "Unrecognized option",
    "Invalid data found when processing input",
    "is not a suitable output format",
    "Error while opening encoder",
    "not found for output stream",
    "Error opening input",
    "Error opening output",
    "Could not write header",
    "No such file or directory",
    "Conversion failed!",
];

/// Returns the marker contained in `line`, if any.
pub fn find_fatal_marker(line: &str) -> Option<&'static str> {
    FATAL_MARKERS.iter().copied().find(|marker| line.contains(marker))
}
