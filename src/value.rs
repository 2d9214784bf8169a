//! Decoded items.
//!
//! An [`Item`] is what one decoder step produces: a [`Value`], its map
//! [`Label`] if it sits in a map, where it sits in the tree, and which
//! recognized tags applied to it. String payloads borrow either the input
//! buffer or memory handed out by the string allocator; both outlive the
//! decoder, so items can be kept across later `get_next` calls.

use crate::tags::TagBits;
use crate::utf8;

/// Number of items in an array or entries in a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Count {
    /// Length stated in the encoding.
    Definite(u16),
    /// Indefinite length: terminated by a break marker.
    Indefinite,
}

impl Count {
    /// The definite length, if any.
    #[must_use]
    pub const fn definite(self) -> Option<u16> {
        match self {
            Self::Definite(n) => Some(n),
            Self::Indefinite => None,
        }
    }

    /// Returns `true` for an indefinite-length container.
    #[must_use]
    pub const fn is_indefinite(self) -> bool {
        matches!(self, Self::Indefinite)
    }

    /// Returns `true` for a definite-length container with no items.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        matches!(self, Self::Definite(0))
    }
}

/// How the decoder treats maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DecodeMode {
    /// Map entries are returned as one item each with the label attached.
    /// Labels may be text, byte strings or integers.
    #[default]
    Normal,
    /// As `Normal`, but only text-string labels are accepted.
    MapStringsOnly,
    /// Maps are returned as [`Value::MapAsArray`] and labels and values are
    /// returned as separate, unlabeled items.
    MapAsArray,
}

/// The decoded payload of one item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    /// Integer in `i64` range.
    Int64(i64),
    /// Positive integer above `i64::MAX`.
    UInt64(u64),
    /// Byte string.
    ByteString(&'a [u8]),
    /// Text string. UTF-8 is not validated during decoding; see [`Item::text`].
    TextString(&'a [u8]),
    /// Array header. Its items follow as separate items.
    Array(Count),
    /// Map header. Its entries follow as separate labeled items.
    Map(Count),
    /// Map header in [`DecodeMode::MapAsArray`]: the count is labels plus
    /// values, twice the number of entries.
    MapAsArray(Count),
    /// Half, single or double float, widened to double.
    Double(f64),
    /// `true` or `false`.
    Bool(bool),
    /// `null`.
    Null,
    /// `undefined`.
    Undefined,
    /// Tag 1 content: whole seconds and a fractional part in `[0, 1)` for
    /// positive times.
    DateEpoch {
        /// Seconds since the epoch.
        seconds: i64,
        /// Fractional seconds; zero for integer content.
        fraction: f64,
    },
    /// Tag 0 content.
    DateString(&'a [u8]),
    /// Tag 2 content: big-endian magnitude.
    PosBignum(&'a [u8]),
    /// Tag 3 content: big-endian magnitude `n` of `-1 - n`.
    NegBignum(&'a [u8]),
    /// A simple value without a defined meaning here.
    UnknownSimple(u8),
}

impl<'a> Value<'a> {
    /// The integer, if this is an `Int64`.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Int64(v) => Some(v),
            _ => None,
        }
    }

    /// The integer, if this is a non-negative `Int64` or a `UInt64`.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn as_u64(&self) -> Option<u64> {
        match *self {
            Self::Int64(v) if v >= 0 => Some(v as u64),
            Self::UInt64(v) => Some(v),
            _ => None,
        }
    }

    /// String-like payload bytes (byte, text, date string and bignums).
    #[must_use]
    pub const fn as_bytes(&self) -> Option<&'a [u8]> {
        match *self {
            Self::ByteString(b)
            | Self::TextString(b)
            | Self::DateString(b)
            | Self::PosBignum(b)
            | Self::NegBignum(b) => Some(b),
            _ => None,
        }
    }

    /// The container count for array and map headers.
    #[must_use]
    pub const fn count(&self) -> Option<Count> {
        match *self {
            Self::Array(c) | Self::Map(c) | Self::MapAsArray(c) => Some(c),
            _ => None,
        }
    }
}

/// Label of a map entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Label<'a> {
    /// The item is not a map entry, or maps are decoded as arrays.
    #[default]
    None,
    /// Integer label in `i64` range.
    Int64(i64),
    /// Integer label above `i64::MAX`.
    UInt64(u64),
    /// Text-string label.
    TextString(&'a [u8]),
    /// Byte-string label.
    ByteString(&'a [u8]),
}

impl<'a> Label<'a> {
    /// The label as UTF-8 text, if it is a valid text-string label.
    #[must_use]
    pub fn text(&self) -> Option<&'a str> {
        match *self {
            Self::TextString(b) => utf8::validate(b).ok(),
            _ => None,
        }
    }
}

/// One decoded item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Item<'a> {
    /// The decoded value.
    pub value: Value<'a>,
    /// The map label, or `Label::None`.
    pub label: Label<'a>,
    /// Nesting level of this item; 0 at the top level.
    pub nesting_level: u8,
    /// Nesting level of the next item. Lower than `nesting_level` when this
    /// item closed one or more containers; higher when this item opened one.
    pub next_nesting_level: u8,
    /// The value's string bytes live in allocator memory.
    pub data_allocated: bool,
    /// The label's string bytes live in allocator memory.
    pub label_allocated: bool,
    /// Recognized tags applied to the value.
    pub tags: TagBits,
}

impl<'a> Item<'a> {
    pub(crate) const fn new(value: Value<'a>) -> Self {
        Self {
            value,
            label: Label::None,
            nesting_level: 0,
            next_nesting_level: 0,
            data_allocated: false,
            label_allocated: false,
            tags: TagBits::EMPTY,
        }
    }

    /// The value as UTF-8 text, for text strings and date strings holding
    /// valid UTF-8.
    #[must_use]
    pub fn text(&self) -> Option<&'a str> {
        match self.value {
            Value::TextString(b) | Value::DateString(b) => utf8::validate(b).ok(),
            _ => None,
        }
    }

    /// Returns `true` if this item closed at least one container.
    #[must_use]
    pub const fn closes_container(&self) -> bool {
        self.next_nesting_level < self.nesting_level
    }
}
