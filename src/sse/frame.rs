//! Frame extraction from the raw transport text.
//!
//! The backend separates events with a blank line. Chunks arrive from
//! the transport fragmented at arbitrary positions, so complete frames
//! can only be sliced off once their terminator has been observed; the
//! trailing remainder stays buffered for the next chunk.

/// One blank-line-terminated block of raw stream text.
///
/// Ephemeral: frames exist only on the way from the reader to the
/// parser and are never retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame(pub String);

impl Frame {
    /// The raw text of the frame, without its terminator.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Accumulates transport chunks and slices off complete frames.
///
/// Feeding `"AB\n\n"` as one chunk or as `"A"` then `"B\n\n"` yields
/// the same single frame `"AB"`; the caller never sees a frame before
/// its terminator arrived.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    buffer: String,
    /// Trailing bytes of an incomplete UTF-8 sequence from the last
    /// chunk; the transport fragments without regard for codepoints.
    utf8_carry: Vec<u8>,
}

impl FrameBuffer {
    /// Create an empty frame buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one raw transport chunk and drain completed frames.
    ///
    /// Incomplete trailing UTF-8 sequences are carried over to the next
    /// chunk; actually invalid bytes are replaced rather than wedging
    /// the stream.
    pub fn push_bytes(&mut self, chunk: &[u8]) -> Vec<Frame> {
        self.utf8_carry.extend_from_slice(chunk);
        let text = match std::str::from_utf8(&self.utf8_carry) {
            Ok(text) => {
                let text = text.to_string();
                self.utf8_carry.clear();
                text
            }
            Err(err) if err.error_len().is_none() => {
                // Incomplete sequence at the tail: decode the valid
                // prefix, keep the rest for the next chunk.
                let valid = err.valid_up_to();
                let text = String::from_utf8_lossy(&self.utf8_carry[..valid]).into_owned();
                self.utf8_carry.drain(..valid);
                text
            }
            Err(_) => {
                let text = String::from_utf8_lossy(&self.utf8_carry).into_owned();
                self.utf8_carry.clear();
                text
            }
        };
        self.push_chunk(&text)
    }

    /// Append one transport chunk and drain every frame it completes.
    ///
    /// Both `\n\n` and `\r\n\r\n` terminators are accepted; the backend
    /// has emitted both depending on the proxy in front of it.
    pub fn push_chunk(&mut self, chunk: &str) -> Vec<Frame> {
        self.buffer.push_str(chunk);

        let mut frames = Vec::new();
        loop {
            let Some((terminator_pos, terminator_len)) = self.find_terminator() else {
                break;
            };

            let block: String = self.buffer[..terminator_pos].to_string();
            self.buffer.drain(..terminator_pos + terminator_len);

            // Consecutive terminators produce empty blocks; skip them.
            if !block.trim().is_empty() {
                frames.push(Frame(block));
            }
        }
        frames
    }

    /// Flush any trailing partial block at clean end-of-stream.
    ///
    /// Some backends close the connection right after the last event
    /// without a final blank line; the remainder is still a frame.
    pub fn finish(&mut self) -> Option<Frame> {
        let rest = std::mem::take(&mut self.buffer);
        if rest.trim().is_empty() {
            None
        } else {
            Some(Frame(rest))
        }
    }

    /// Whether any partial data is currently buffered.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    fn find_terminator(&self) -> Option<(usize, usize)> {
        let lf = self.buffer.find("\n\n");
        let crlf = self.buffer.find("\r\n\r\n");
        match (lf, crlf) {
            (Some(l), Some(c)) if c < l => Some((c, 4)),
            (Some(l), _) => Some((l, 2)),
            (None, Some(c)) => Some((c, 4)),
            (None, None) => None,
        }
    }
}
