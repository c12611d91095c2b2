//! Growable byte buffer with a read cursor
//!
//! Holds the unconsumed tail of a log stream. Chunks are appended at the end,
//! decoding advances the cursor, and fully parsed bytes are dropped from the
//! front between chunks.

/// Buffered bytes plus a read position.
#[derive(Debug, Default)]
pub struct ByteCursor {
    buffer: Vec<u8>,
    position: usize,
}

impl ByteCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk after the bytes already buffered.
    pub fn append(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Number of buffered bytes at or after the cursor.
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }

    /// Bytes at or after the cursor.
    pub fn unconsumed(&self) -> &[u8] {
        &self.buffer[self.position..]
    }

    /// Byte at `offset` past the cursor, if buffered.
    pub fn peek(&self, offset: usize) -> Option<u8> {
        self.buffer.get(self.position + offset).copied()
    }

    /// Advance the cursor by up to `count` bytes.
    pub fn consume(&mut self, count: usize) {
        self.position = (self.position + count).min(self.buffer.len());
    }

    /// Move the cursor back by up to `count` bytes.
    pub fn rewind(&mut self, count: usize) {
        self.position = self.position.saturating_sub(count);
    }

    /// Drop consumed bytes, keeping at most `look_back` of them before the cursor.
    pub fn discard_consumed(&mut self, look_back: usize) {
        let discard = self.position.saturating_sub(look_back);
        if discard > 0 {
            self.buffer.drain(..discard);
            self.position -= discard;
        }
    }

    /// Current read offset into the buffered bytes.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Total buffered bytes, consumed or not.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
