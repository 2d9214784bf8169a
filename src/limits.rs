//! Fixed capacity limits.
//!
//! These are compile-time constants rather than runtime configuration: the
//! nesting trackers are fixed-size arrays, so the bounds below are also the
//! worst-case memory and work per decode or encode context.

/// Maximum nesting depth of arrays, maps and byte-string wraps.
///
/// Level 0 is the implicit top level, so containers may be opened at levels
/// `1..=MAX_NESTING`.
pub const MAX_NESTING: usize = 15;

/// Maximum number of items in a single array, or labels plus values in a map.
///
/// `u16::MAX` is not usable: the decoder reserves it conceptually for
/// indefinite lengths (modeled as [`Count::Indefinite`](crate::Count)).
pub const MAX_ITEMS_IN_ARRAY: u16 = u16::MAX - 1;

/// Maximum number of caller-configured tags recognized per decode pass.
pub const MAX_CUSTOM_TAGS: usize = 16;

/// Largest storage buffer or memory pool the codec addresses.
pub const MAX_BUFFER_LEN: usize = u32::MAX as usize;

/// Output offset past which a container can no longer be opened.
///
/// Slightly below `u32::MAX` so the recorded start offsets fit a `u32`.
pub const MAX_ARRAY_OFFSET: usize = u32::MAX as usize - 100;

/// Bytes at the start of a memory pool block reserved for pool bookkeeping.
pub const MEM_POOL_HEADER_LEN: usize = 8;
