//! String allocation for indefinite-length strings.
//!
//! The decoder coalesces the chunks of an indefinite-length string into one
//! contiguous allocation. It only ever has one allocation in progress: it grows
//! it chunk by chunk, then either commits it (the bytes become part of a
//! returned item) or frees it (on error).

use core::mem;

use crate::limits::{MAX_BUFFER_LEN, MEM_POOL_HEADER_LEN};
use crate::ErrorCode;

/// Allocator capability the decoder uses for string coalescing.
///
/// Memory handed out by [`commit`](Self::commit) must stay valid for `'a`,
/// the lifetime of the decoded items.
pub trait StringAllocator<'a> {
    /// Start or grow the pending allocation to `new_len` bytes and return it
    /// for writing. Bytes already in the pending allocation are preserved.
    ///
    /// # Errors
    ///
    /// Returns `StringAllocate` when the request cannot be satisfied, or
    /// `MemPoolInternal` when the allocator's own state is corrupt.
    fn reallocate(&mut self, new_len: usize) -> Result<&mut [u8], ErrorCode>;

    /// Hand out the pending allocation. The allocator must not reuse it.
    fn commit(&mut self) -> &'a [u8];

    /// Discard the pending allocation.
    fn free(&mut self);

    /// Called once when decoding finishes.
    fn destroy(&mut self) {}
}

impl<'a, T: StringAllocator<'a> + ?Sized> StringAllocator<'a> for &mut T {
    fn reallocate(&mut self, new_len: usize) -> Result<&mut [u8], ErrorCode> {
        (**self).reallocate(new_len)
    }

    fn commit(&mut self) -> &'a [u8] {
        (**self).commit()
    }

    fn free(&mut self) {
        (**self).free();
    }

    fn destroy(&mut self) {
        (**self).destroy();
    }
}

/// Bump allocator over a caller-supplied block.
///
/// The first [`MEM_POOL_HEADER_LEN`] bytes of the block hold the pool's
/// bookkeeping: the block length and the bytes in use, each a big-endian
/// `u32`. Both are re-read and checked on every allocation. Committed strings
/// are carved off the front of the free region and are never reused, so a
/// pool must be sized for all allocated strings of one decode pass.
#[derive(Debug)]
pub struct MemPool<'a> {
    header: &'a mut [u8],
    free: &'a mut [u8],
    pending: usize,
}

impl<'a> MemPool<'a> {
    /// Set up a pool over `block`.
    ///
    /// # Errors
    ///
    /// Returns `BufferTooLarge` if `block` is longer than `u32::MAX` bytes and
    /// `BufferTooSmall` if it cannot hold the header plus one byte.
    pub fn new(block: &'a mut [u8]) -> Result<Self, ErrorCode> {
        if block.len() > MAX_BUFFER_LEN {
            return Err(ErrorCode::BufferTooLarge);
        }
        if block.len() < MEM_POOL_HEADER_LEN + 1 {
            return Err(ErrorCode::BufferTooSmall);
        }
        let block_len = u32::try_from(block.len()).map_err(|_| ErrorCode::BufferTooLarge)?;
        let (header, free) = block.split_at_mut(MEM_POOL_HEADER_LEN);
        let mut pool = Self {
            header,
            free,
            pending: 0,
        };
        pool.header[..4].copy_from_slice(&block_len.to_be_bytes());
        pool.write_in_use(MEM_POOL_HEADER_LEN);
        Ok(pool)
    }

    /// Bytes still available for allocation.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.free.len()
    }

    /// Bytes used by the header and committed strings.
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.read_u32(4)
    }

    fn read_u32(&self, at: usize) -> usize {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.header[at..at + 4]);
        u32::from_be_bytes(raw) as usize
    }

    fn write_in_use(&mut self, in_use: usize) {
        // Never exceeds the block length, which fits a u32.
        let v = u32::try_from(in_use).unwrap_or(u32::MAX);
        self.header[4..8].copy_from_slice(&v.to_be_bytes());
    }

    fn check(&self) -> Result<(), ErrorCode> {
        let block_len = self.read_u32(0);
        let in_use = self.read_u32(4);
        if in_use < MEM_POOL_HEADER_LEN || in_use.checked_add(self.free.len()) != Some(block_len) {
            cbor_debug!("memory pool header corrupt: len {} in use {}", block_len, in_use);
            return Err(ErrorCode::MemPoolInternal);
        }
        Ok(())
    }
}

impl<'a> StringAllocator<'a> for MemPool<'a> {
    fn reallocate(&mut self, new_len: usize) -> Result<&mut [u8], ErrorCode> {
        self.check()?;
        if new_len > self.free.len() {
            cbor_debug!(
                "memory pool exhausted: {} bytes requested, {} free",
                new_len,
                self.free.len()
            );
            return Err(ErrorCode::StringAllocate);
        }
        self.pending = new_len;
        Ok(&mut self.free[..new_len])
    }

    fn commit(&mut self) -> &'a [u8] {
        let free = mem::take(&mut self.free);
        let (used, rest) = free.split_at_mut(self.pending.min(free.len()));
        self.free = rest;
        self.pending = 0;
        let in_use = self.in_use() + used.len();
        self.write_in_use(in_use);
        used
    }

    fn free(&mut self) {
        self.pending = 0;
    }

    fn destroy(&mut self) {
        cbor_trace!("memory pool released with {} bytes in use", self.in_use());
    }
}
