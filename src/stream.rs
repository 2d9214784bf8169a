//! Bounded input cursor.

const INPUT_CURSOR_MAGIC: u16 = 0xB00F;

/// Cursor over an immutable input buffer.
///
/// Every read is bounds-checked. A read that would run past the end sets a
/// sticky error flag and returns `None` (or 0 for the integer accessors);
/// after that all reads fail closed until the cursor is recreated.
#[derive(Debug, Clone)]
pub struct InputCursor<'a> {
    data: &'a [u8],
    pos: usize,
    error: bool,
    magic: u16,
}

impl<'a> InputCursor<'a> {
    /// Create a cursor at the start of `data`.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            error: false,
            magic: INPUT_CURSOR_MAGIC,
        }
    }

    /// The whole input.
    #[inline]
    #[must_use]
    pub const fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Current offset.
    #[inline]
    #[must_use]
    pub const fn tell(&self) -> usize {
        self.pos
    }

    /// Move the cursor to `pos`. Seeking past the end sets the error flag.
    pub fn seek(&mut self, pos: usize) {
        if pos > self.data.len() {
            self.error = true;
        } else {
            self.pos = pos;
        }
    }

    /// Bytes between the cursor and the end of the input.
    #[inline]
    #[must_use]
    pub const fn bytes_unconsumed(&self) -> usize {
        // `pos <= data.len()` is maintained by every mutation.
        self.data.len() - self.pos
    }

    /// Returns `true` if at least `n` unconsumed bytes remain.
    #[inline]
    #[must_use]
    pub const fn bytes_available(&self, n: usize) -> bool {
        n <= self.bytes_unconsumed()
    }

    /// Returns `true` once any read has failed.
    #[inline]
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.error
    }

    /// Consume `n` bytes and return them.
    pub fn get_bytes(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.error {
            return None;
        }
        if self.magic != INPUT_CURSOR_MAGIC || !self.bytes_available(n) {
            self.error = true;
            return None;
        }
        let s = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Some(s)
    }

    /// Look at the next byte without consuming it.
    #[must_use]
    pub fn peek_byte(&self) -> Option<u8> {
        if self.error || self.magic != INPUT_CURSOR_MAGIC {
            return None;
        }
        self.data.get(self.pos).copied()
    }

    /// Consume one byte, or return 0 and set the error flag.
    pub fn get_byte(&mut self) -> u8 {
        self.get_bytes(1).map_or(0, |s| s[0])
    }

    /// Consume a big-endian `u16`, or return 0 and set the error flag.
    pub fn get_u16(&mut self) -> u16 {
        self.get_bytes(2)
            .map_or(0, |s| u16::from_be_bytes([s[0], s[1]]))
    }

    /// Consume a big-endian `u32`, or return 0 and set the error flag.
    pub fn get_u32(&mut self) -> u32 {
        self.get_bytes(4)
            .map_or(0, |s| u32::from_be_bytes([s[0], s[1], s[2], s[3]]))
    }

    /// Consume a big-endian `u64`, or return 0 and set the error flag.
    pub fn get_u64(&mut self) -> u64 {
        self.get_bytes(8).map_or(0, |s| {
            u64::from_be_bytes([s[0], s[1], s[2], s[3], s[4], s[5], s[6], s[7]])
        })
    }
}
