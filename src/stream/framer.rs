//! Line framing over an arbitrarily chunked byte stream
//!
//! The turn stream arrives as opaque chunks whose boundaries carry no
//! meaning: a chunk may end mid-line, contain many lines, or be empty.
//! `LineFramer` holds the one carry-over buffer needed to reassemble
//! complete lines. It knows nothing about event semantics.

/// Incremental splitter of byte chunks into complete lines.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: Vec<u8>,
}

impl LineFramer {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Feed one chunk, yielding every line it completes, in order.
    ///
    /// A trailing fragment without a line terminator stays buffered until a
    /// later chunk completes it. Lines are decoded lossily so that a stray
    /// invalid byte cannot kill the stream.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buffer[start..].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            let mut line = &self.buffer[start..end];
            if line.ends_with(b"\r") {
                line = &line[..line.len() - 1];
            }
            lines.push(String::from_utf8_lossy(line).into_owned());
            start = end + 1;
        }
        self.buffer.drain(..start);
        lines
    }

    /// End of stream. A buffered fragment with no terminator is a truncated
    /// frame, not a valid event, and is dropped.
    pub fn finish(self) {
        if !self.buffer.is_empty() {
            tracing::debug!(
                bytes = self.buffer.len(),
                "discarding truncated trailing frame"
            );
        }
    }
}
