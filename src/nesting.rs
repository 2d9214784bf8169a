//! Fixed-depth nesting trackers for the encoder and the decoder.
//!
//! Both sides replace recursion with an array of `MAX_NESTING + 1` frames and
//! an index into it. Frame 0 is the implicit top level.

use crate::limits::{MAX_ITEMS_IN_ARRAY, MAX_NESTING};
use crate::value::Count;
use crate::ErrorCode;

pub const MAJOR_TYPE_BYTE_STRING: u8 = 2;
pub const MAJOR_TYPE_ARRAY: u8 = 4;
pub const MAJOR_TYPE_MAP: u8 = 5;

#[derive(Debug, Clone, Copy)]
struct EncodeFrame {
    start: u32,
    count: u16,
    major: u8,
}

const TOP_LEVEL_ENCODE_FRAME: EncodeFrame = EncodeFrame {
    start: 0,
    count: 0,
    major: MAJOR_TYPE_ARRAY,
};

/// Open containers on the encode side: start offset, item count, major type.
#[derive(Debug, Clone)]
pub struct EncodeNesting {
    frames: [EncodeFrame; MAX_NESTING + 1],
    depth: usize,
}

impl EncodeNesting {
    pub const fn new() -> Self {
        Self {
            frames: [TOP_LEVEL_ENCODE_FRAME; MAX_NESTING + 1],
            depth: 0,
        }
    }

    /// Count one more item in the innermost container.
    pub fn increment(&mut self) -> Result<(), ErrorCode> {
        let frame = &mut self.frames[self.depth];
        if 1 >= MAX_ITEMS_IN_ARRAY - frame.count {
            return Err(ErrorCode::ArrayTooLong);
        }
        frame.count += 1;
        Ok(())
    }

    /// Push a container of `major` type starting at output offset `start`.
    pub fn increase(&mut self, major: u8, start: u32) -> Result<(), ErrorCode> {
        if self.depth >= MAX_NESTING {
            return Err(ErrorCode::ArrayNestingTooDeep);
        }
        self.depth += 1;
        self.frames[self.depth] = EncodeFrame {
            start,
            count: 0,
            major,
        };
        Ok(())
    }

    pub fn decrease(&mut self) {
        if self.depth > 0 {
            self.depth -= 1;
        }
    }

    #[inline]
    pub const fn is_nested(&self) -> bool {
        self.depth > 0
    }

    #[cfg(test)]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub const fn major(&self) -> u8 {
        self.frames[self.depth].major
    }

    #[inline]
    pub const fn start(&self) -> u32 {
        self.frames[self.depth].start
    }

    /// Items in the innermost container, counting a map entry once.
    #[inline]
    pub const fn count(&self) -> u16 {
        let frame = &self.frames[self.depth];
        // Labels and values are counted separately while a map is open.
        let divisor = if frame.major == MAJOR_TYPE_MAP { 2 } else { 1 };
        frame.count / divisor
    }
}

/// The kind of container a decode frame tracks. Maps decoded as arrays are
/// tracked as arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Array,
    Map,
}

#[derive(Debug, Clone, Copy)]
struct DecodeFrame {
    kind: FrameKind,
    remaining: Count,
}

const TOP_LEVEL_DECODE_FRAME: DecodeFrame = DecodeFrame {
    kind: FrameKind::Array,
    remaining: Count::Indefinite,
};

/// Open containers on the decode side: kind and remaining item count.
#[derive(Debug, Clone)]
pub struct DecodeNesting {
    frames: [DecodeFrame; MAX_NESTING + 1],
    level: usize,
}

impl DecodeNesting {
    pub const fn new() -> Self {
        Self {
            frames: [TOP_LEVEL_DECODE_FRAME; MAX_NESTING + 1],
            level: 0,
        }
    }

    #[inline]
    pub const fn is_nested(&self) -> bool {
        self.level > 0
    }

    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn level(&self) -> u8 {
        // Bounded by MAX_NESTING.
        self.level as u8
    }

    #[inline]
    pub const fn is_indefinite(&self) -> bool {
        matches!(self.frames[self.level].remaining, Count::Indefinite)
    }

    /// Returns `true` if the innermost open container is decoded as a map.
    #[inline]
    pub fn in_map(&self) -> bool {
        self.is_nested() && self.frames[self.level].kind == FrameKind::Map
    }

    /// Enter a non-empty container.
    pub fn descend(&mut self, kind: FrameKind, count: Count) -> Result<(), ErrorCode> {
        if let Count::Definite(n) = count {
            if n > MAX_ITEMS_IN_ARRAY {
                return Err(ErrorCode::ArrayTooLong);
            }
        }
        if self.level >= MAX_NESTING {
            return Err(ErrorCode::ArrayNestingTooDeep);
        }
        self.level += 1;
        self.frames[self.level] = DecodeFrame {
            kind,
            remaining: count,
        };
        Ok(())
    }

    /// Account for one finished item, leaving every definite container whose
    /// count reaches zero.
    pub fn decrement_count(&mut self) {
        while self.is_nested() {
            let frame = &mut self.frames[self.level];
            match frame.remaining {
                Count::Indefinite => break,
                Count::Definite(n) => {
                    let left = n.saturating_sub(1);
                    frame.remaining = Count::Definite(left);
                    if left != 0 {
                        break;
                    }
                }
            }
            self.level -= 1;
        }
    }

    /// Leave the innermost container on a break marker.
    pub fn break_ascend(&mut self) -> Result<(), ErrorCode> {
        if !self.is_nested() || !self.is_indefinite() {
            return Err(ErrorCode::BadBreak);
        }
        self.level -= 1;
        Ok(())
    }
}
