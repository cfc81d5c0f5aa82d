//! Line reassembly for the tool's diagnostic stream.

/// Longest line buffered before it is emitted without a terminator.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Splits a byte stream into lines, carrying partial lines across reads.
///
/// `\n`, `\r` and `\r\n` all terminate a line; ffmpeg rewrites its status
/// line in place with `\r`. Empty lines are dropped and bytes are decoded as
/// lossy UTF-8. A line reaching the length limit is emitted as is and the
/// rest continues as a new line.
#[derive(Debug)]
pub struct LineAssembler {
    pending: Vec<u8>,
    max_line: usize,
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self::with_max_line(MAX_LINE_BYTES)
    }
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an assembler that splits lines longer than `max_line` bytes.
    pub fn with_max_line(max_line: usize) -> Self {
        Self {
            pending: Vec::new(),
            max_line: max_line.max(1),
        }
    }

    /// Consumes a chunk and returns every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in chunk {
            if byte == b'\n' || byte == b'\r' {
                if !self.pending.is_empty() {
                    lines.push(String::from_utf8_lossy(&self.pending).into_owned());
                    self.pending.clear();
                }
            } else {
                self.pending.push(byte);
                if self.pending.len() >= self.max_line {
                    lines.push(String::from_utf8_lossy(&self.pending).into_owned());
                    self.pending.clear();
                }
            }
        }
        lines
    }

    /// Returns the unterminated tail, if any, once the stream has ended.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Some(line)
    }

    /// Whether a partial line is buffered.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
