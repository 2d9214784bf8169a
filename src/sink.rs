//! Bounded output buffer with in-place insertion.

use crate::ErrorCode;

const OUTPUT_BUFFER_MAGIC: u16 = 0x0B0F;

/// Output buffer over caller-supplied storage.
///
/// Bytes can be appended or inserted at any position up to the current end;
/// insertion slides the tail of the valid data to the right. A write that does
/// not fit sets a sticky error flag and leaves the storage untouched, so a
/// sequence of writes needs only one check at the end.
///
/// A buffer created with [`OutputBuffer::size_only`] has no storage at all: it
/// tracks the length the output would have, which is how encoded sizes are
/// computed without producing bytes.
#[derive(Debug)]
pub struct OutputBuffer<'a> {
    storage: Option<&'a mut [u8]>,
    capacity: usize,
    len: usize,
    error: bool,
    magic: u16,
}

impl<'a> OutputBuffer<'a> {
    /// Create a buffer writing into `storage`. The storage length is the capacity.
    #[must_use]
    pub fn new(storage: &'a mut [u8]) -> Self {
        let capacity = storage.len();
        Self {
            storage: Some(storage),
            capacity,
            len: 0,
            error: false,
            magic: OUTPUT_BUFFER_MAGIC,
        }
    }

    /// Create a storage-less buffer that only accounts for length, up to `capacity`.
    #[must_use]
    pub const fn size_only(capacity: usize) -> Self {
        Self {
            storage: None,
            capacity,
            len: 0,
            error: false,
            magic: OUTPUT_BUFFER_MAGIC,
        }
    }

    /// Returns `true` if this buffer only computes sizes.
    #[inline]
    #[must_use]
    pub const fn is_size_only(&self) -> bool {
        self.storage.is_none()
    }

    /// Insert `data` at `pos`, moving bytes at `pos..` right by `data.len()`.
    ///
    /// Sets the error flag instead of writing if `pos` is past the end of the
    /// valid data or if `data` does not fit.
    pub fn insert(&mut self, data: &[u8], pos: usize) {
        if self.error {
            return;
        }
        // Checked in this order so that `capacity - len` cannot wrap.
        if self.magic != OUTPUT_BUFFER_MAGIC
            || self.len > self.capacity
            || !self.will_it_fit(data.len())
            || pos > self.len
        {
            self.error = true;
            return;
        }

        let n = data.len();
        if let Some(buf) = self.storage.as_deref_mut() {
            buf.copy_within(pos..self.len, pos + n);
            buf[pos..pos + n].copy_from_slice(data);
        }
        self.len += n;
    }

    /// Append `data` at the end of the valid data.
    #[inline]
    pub fn append(&mut self, data: &[u8]) {
        self.insert(data, self.len);
    }

    /// Insert a single byte at `pos`.
    #[inline]
    pub fn insert_byte(&mut self, byte: u8, pos: usize) {
        self.insert(&[byte], pos);
    }

    /// Append a single byte.
    #[inline]
    pub fn append_byte(&mut self, byte: u8) {
        self.insert(&[byte], self.len);
    }

    /// Append a big-endian `u16`.
    #[inline]
    pub fn append_u16(&mut self, v: u16) {
        self.append(&v.to_be_bytes());
    }

    /// Append a big-endian `u32`.
    #[inline]
    pub fn append_u32(&mut self, v: u32) {
        self.append(&v.to_be_bytes());
    }

    /// Append a big-endian `u64`.
    #[inline]
    pub fn append_u64(&mut self, v: u64) {
        self.append(&v.to_be_bytes());
    }

    /// Length of the valid data, which is also the position of the next append.
    #[inline]
    #[must_use]
    pub const fn end_position(&self) -> usize {
        self.len
    }

    /// Bytes that can still be written.
    #[inline]
    #[must_use]
    pub const fn room_left(&self) -> usize {
        self.capacity.saturating_sub(self.len)
    }

    /// Returns `true` if `n` more bytes fit.
    #[inline]
    #[must_use]
    pub const fn will_it_fit(&self, n: usize) -> bool {
        n <= self.room_left()
    }

    /// Returns `true` once any write has failed.
    #[inline]
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.error
    }

    /// The valid data, or `None` if the buffer is in error or size-only.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        if self.error || self.magic != OUTPUT_BUFFER_MAGIC {
            return None;
        }
        self.storage.as_deref().map(|buf| &buf[..self.len])
    }

    /// The valid data from `start` to the end, or `None` as for [`Self::as_bytes`].
    #[must_use]
    pub fn tail(&self, start: usize) -> Option<&[u8]> {
        self.as_bytes().and_then(|b| b.get(start..))
    }

    /// Consume the buffer and return the valid data with the storage lifetime.
    #[must_use]
    pub fn into_bytes(self) -> Option<&'a [u8]> {
        if self.error || self.magic != OUTPUT_BUFFER_MAGIC {
            return None;
        }
        let buf: &'a [u8] = self.storage?;
        Some(&buf[..self.len])
    }

    /// Copy the valid data into `dest`, returning the copied prefix of `dest`.
    ///
    /// # Errors
    ///
    /// Returns `BufferTooSmall` if `dest` is shorter than the valid data or if
    /// the buffer is in error or size-only.
    pub fn copy_out<'d>(&self, dest: &'d mut [u8]) -> Result<&'d [u8], ErrorCode> {
        let src = self.as_bytes().ok_or(ErrorCode::BufferTooSmall)?;
        let out = dest.get_mut(..src.len()).ok_or(ErrorCode::BufferTooSmall)?;
        out.copy_from_slice(src);
        Ok(out)
    }
}
