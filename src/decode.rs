//! Incremental UTF-8 decoding for chunked response bodies

use crate::error::DecodeError;

const BYTE_ORDER_MARK: char = '\u{FEFF}';

/// Decodes a byte stream chunk by chunk.
///
/// A character split across chunk boundaries is held back until its last
/// byte arrives. One byte order mark at the very start of the stream is
/// dropped.
#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    pending: Vec<u8>,
    consumed: usize,
    started: bool,
}

impl Utf8StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk, returning every character completed by it
    pub fn decode(&mut self, chunk: &[u8]) -> Result<String, DecodeError> {
        self.pending.extend_from_slice(chunk);

        let mut text = match std::str::from_utf8(&self.pending) {
            Ok(text) => text.to_owned(),
            Err(e) if e.error_len().is_some() => {
                return Err(DecodeError::Malformed {
                    offset: self.consumed + e.valid_up_to(),
                });
            }
            // Incomplete tail: keep it for the next chunk. The prefix is
            // already validated, so the lossy conversion never substitutes.
            Err(e) => String::from_utf8_lossy(&self.pending[..e.valid_up_to()]).into_owned(),
        };

        self.pending.drain(..text.len());
        self.consumed += text.len();

        if !self.started && !text.is_empty() {
            self.started = true;
            if text.starts_with(BYTE_ORDER_MARK) {
                text.drain(..BYTE_ORDER_MARK.len_utf8());
            }
        }

        Ok(text)
    }

    /// Number of bytes held back waiting for the rest of a character
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Check that the stream did not stop inside a character.
    ///
    /// Leftover bytes are an error rather than being dropped silently, so a
    /// cut-off answer ends with the stream error notice.
    pub fn finish(&mut self) -> Result<(), DecodeError> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            let pending = self.pending.len();
            self.pending.clear();
            Err(DecodeError::Truncated { pending })
        }
    }
}
