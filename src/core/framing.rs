//! Newline framing for the device byte stream.
//!
//! The device emits text terminated by `\n` (often `\r\n`). [`LineFramer`]
//! turns arbitrarily chunked reads into trimmed, non-empty [`Line`]s and
//! [`encode_line`] produces the bytes written back to the device.

use std::fmt;
use std::sync::Arc;

/// A trimmed, non-empty unit of text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Line(Arc<str>);

impl Line {
    /// Trim `text`; returns `None` when nothing is left
    pub fn new(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(Arc::from(trimmed)))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Line {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Incremental line splitter
///
/// The partial-line buffer has no upper bound.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: Vec<u8>,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and collect every line it completes
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Line> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buffer[start..].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            if let Some(line) = decode_segment(&self.buffer[start..end]) {
                lines.push(line);
            }
            start = end + 1;
        }
        self.buffer.drain(..start);

        lines
    }

    /// Bytes buffered for a line that has not been terminated yet
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Flush the unterminated tail once the stream has ended
    pub fn finish(&mut self) -> Option<Line> {
        let tail = std::mem::take(&mut self.buffer);
        decode_segment(&tail)
    }
}

fn decode_segment(segment: &[u8]) -> Option<Line> {
    let segment = segment.strip_suffix(b"\r").unwrap_or(segment);
    Line::new(&String::from_utf8_lossy(segment))
}

/// Frame an outgoing command: trimmed text plus a single `\n`.
///
/// Returns `None` for text that is empty after trimming; nothing must be
/// written in that case.
pub fn encode_line(text: &str) -> Option<Vec<u8>> {
    let line = Line::new(text)?;
    let mut bytes = Vec::with_capacity(line.len() + 1);
    bytes.extend_from_slice(line.as_str().as_bytes());
    bytes.push(b'\n');
    Some(bytes)
}
