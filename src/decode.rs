//! Streaming pre-order decoder.
//!
//! Decoding is layered. From the bottom up:
//!
//! 1. `decode_item` reads one head and its payload (strings, integers, floats,
//!    simple values, container and tag heads).
//! 2. `get_full_item` coalesces the chunks of an indefinite-length string
//!    into allocator memory.
//! 3. `get_tagged_item` folds leading tags into a [`TagBits`] and applies the
//!    date and bignum tags to the tagged value.
//! 4. `get_map_entry` joins a map label with its value.
//! 5. `get_next` tracks nesting, consuming break markers of
//!    indefinite-length containers.

use crate::float::{half_to_double, single_to_double};
use crate::limits::{MAX_CUSTOM_TAGS, MAX_ITEMS_IN_ARRAY};
use crate::nesting::{DecodeNesting, FrameKind};
use crate::stream::InputCursor;
use crate::string_alloc::{MemPool, StringAllocator};
use crate::tags::{
    tag_bit, TagBits, TagListOut, BIT_DATE_EPOCH, BIT_DATE_STRING, BIT_NEG_BIGNUM, BIT_POS_BIGNUM,
};
use crate::value::{Count, DecodeMode, Item, Label, Value};
use crate::{CborError, ErrorCode};

const ADDITIONAL_INFO_ONE_BYTE: u8 = 24;
const ADDITIONAL_INFO_TWO_BYTES: u8 = 25;
const ADDITIONAL_INFO_FOUR_BYTES: u8 = 26;
const ADDITIONAL_INFO_EIGHT_BYTES: u8 = 27;
const ADDITIONAL_INFO_INDEFINITE: u8 = 31;

const SIMPLE_FALSE: u8 = 20;
const SIMPLE_TRUE: u8 = 21;
const SIMPLE_NULL: u8 = 22;
const SIMPLE_UNDEF: u8 = 23;

const BREAK: u8 = 0xff;

const DATE_STRING_FLAG: u64 = 1 << BIT_DATE_STRING;
const DATE_EPOCH_FLAG: u64 = 1 << BIT_DATE_EPOCH;
const POS_BIGNUM_FLAG: u64 = 1 << BIT_POS_BIGNUM;
const NEG_BIGNUM_FLAG: u64 = 1 << BIT_NEG_BIGNUM;

/// 2^63 as a double: the first value past the `i64` range.
const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StringKind {
    Bytes,
    Text,
}

impl StringKind {
    const fn value(self, s: &[u8]) -> Value<'_> {
        match self {
            Self::Bytes => Value::ByteString(s),
            Self::Text => Value::TextString(s),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum RawKind<'a> {
    Value(Value<'a>),
    IndefiniteString(StringKind),
    Tag(u64),
    Break,
}

#[derive(Debug, Clone, Copy)]
struct RawItem<'a> {
    kind: RawKind<'a>,
    allocated: bool,
}

impl<'a> RawItem<'a> {
    const fn value(value: Value<'a>) -> Self {
        Self {
            kind: RawKind::Value(value),
            allocated: false,
        }
    }
}

/// Read an initial byte and its argument.
///
/// Returns the major type, the additional info and the argument. For
/// additional info below 24 and for 31 the argument is the additional info
/// itself.
fn decode_head(input: &mut InputCursor<'_>) -> Result<(u8, u8, u64), ErrorCode> {
    let initial = input.get_byte();
    let major = initial >> 5;
    let additional_info = initial & 0x1f;

    let argument = match additional_info {
        ADDITIONAL_INFO_ONE_BYTE => u64::from(input.get_byte()),
        ADDITIONAL_INFO_TWO_BYTES => u64::from(input.get_u16()),
        ADDITIONAL_INFO_FOUR_BYTES => u64::from(input.get_u32()),
        ADDITIONAL_INFO_EIGHT_BYTES => input.get_u64(),
        28..=30 => return Err(ErrorCode::Unsupported),
        _ => u64::from(additional_info),
    };
    // Any short read above left zeros and set the cursor's error flag.
    if input.is_error() {
        return Err(ErrorCode::HitEnd);
    }
    Ok((major, additional_info, argument))
}

fn decode_integer(major: u8, argument: u64) -> Result<Value<'static>, ErrorCode> {
    match (major, i64::try_from(argument)) {
        (0, Ok(n)) => Ok(Value::Int64(n)),
        (0, Err(_)) => Ok(Value::UInt64(argument)),
        (_, Ok(n)) => Ok(Value::Int64(-n - 1)),
        (_, Err(_)) => Err(ErrorCode::IntOverflow),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn decode_simple(additional_info: u8, argument: u64) -> Result<RawKind<'static>, ErrorCode> {
    let value = match additional_info {
        ADDITIONAL_INFO_TWO_BYTES => Value::Double(half_to_double(argument as u16)),
        ADDITIONAL_INFO_FOUR_BYTES => Value::Double(single_to_double(f32::from_bits(argument as u32))),
        ADDITIONAL_INFO_EIGHT_BYTES => Value::Double(f64::from_bits(argument)),
        SIMPLE_FALSE => Value::Bool(false),
        SIMPLE_TRUE => Value::Bool(true),
        SIMPLE_NULL => Value::Null,
        SIMPLE_UNDEF => Value::Undefined,
        ADDITIONAL_INFO_INDEFINITE => return Ok(RawKind::Break),
        ADDITIONAL_INFO_ONE_BYTE => {
            // 0..=31 have single-byte encodings or are reserved.
            if argument <= 31 {
                return Err(ErrorCode::BadSimple);
            }
            Value::UnknownSimple(argument as u8)
        }
        _ => Value::UnknownSimple(additional_info),
    };
    Ok(RawKind::Value(value))
}

/// Decode one item without joining string chunks, tags or map entries.
///
/// With `copy_into`, definite-length strings are copied into allocator memory.
fn decode_item<'a, A: StringAllocator<'a>>(
    input: &mut InputCursor<'a>,
    copy_into: Option<&mut A>,
) -> Result<RawItem<'a>, ErrorCode> {
    let (major, additional_info, argument) = decode_head(input)?;
    let indefinite = additional_info == ADDITIONAL_INFO_INDEFINITE;

    match major {
        0 | 1 => {
            if indefinite {
                return Err(ErrorCode::InvalidCbor);
            }
            decode_integer(major, argument).map(RawItem::value)
        }
        2 | 3 => {
            let kind = if major == 2 {
                StringKind::Bytes
            } else {
                StringKind::Text
            };
            if indefinite {
                return Ok(RawItem {
                    kind: RawKind::IndefiniteString(kind),
                    allocated: false,
                });
            }
            let len = usize::try_from(argument).map_err(|_| ErrorCode::HitEnd)?;
            let bytes = input.get_bytes(len).ok_or(ErrorCode::HitEnd)?;
            match copy_into {
                Some(alloc) => {
                    alloc.reallocate(len)?.copy_from_slice(bytes);
                    Ok(RawItem {
                        kind: RawKind::Value(kind.value(alloc.commit())),
                        allocated: true,
                    })
                }
                None => Ok(RawItem::value(kind.value(bytes))),
            }
        }
        4 | 5 => {
            let count = if indefinite {
                Count::Indefinite
            } else {
                match u16::try_from(argument) {
                    Ok(n) if n <= MAX_ITEMS_IN_ARRAY => Count::Definite(n),
                    _ => return Err(ErrorCode::ArrayTooLong),
                }
            };
            Ok(RawItem::value(if major == 4 {
                Value::Array(count)
            } else {
                Value::Map(count)
            }))
        }
        6 => {
            if indefinite {
                return Err(ErrorCode::InvalidCbor);
            }
            Ok(RawItem {
                kind: RawKind::Tag(argument),
                allocated: false,
            })
        }
        _ => decode_simple(additional_info, argument).map(|kind| RawItem {
            kind,
            allocated: false,
        }),
    }
}

/// Append string chunks to the pending allocation until the break.
fn coalesce_chunks<'a, A: StringAllocator<'a>>(
    input: &mut InputCursor<'a>,
    alloc: &mut A,
    kind: StringKind,
) -> Result<(), ErrorCode> {
    let mut total = 0usize;
    loop {
        let chunk = decode_item::<A>(input, None)?;
        let bytes = match (chunk.kind, kind) {
            (RawKind::Break, _) => return Ok(()),
            (RawKind::Value(Value::ByteString(b)), StringKind::Bytes)
            | (RawKind::Value(Value::TextString(b)), StringKind::Text) => b,
            // Wrong string type, a nested indefinite string, or not a string.
            _ => return Err(ErrorCode::IndefiniteStringChunk),
        };
        let grown = total
            .checked_add(bytes.len())
            .ok_or(ErrorCode::StringAllocate)?;
        alloc.reallocate(grown)?[total..].copy_from_slice(bytes);
        total = grown;
    }
}

fn decode_date_epoch(value: Value<'_>) -> Result<Value<'_>, ErrorCode> {
    match value {
        Value::Int64(seconds) => Ok(Value::DateEpoch {
            seconds,
            fraction: 0.0,
        }),
        Value::UInt64(_) => Err(ErrorCode::DateOverflow),
        Value::Double(d) => {
            // NaN is outside every range.
            if !(-TWO_POW_63..TWO_POW_63).contains(&d) {
                return Err(ErrorCode::DateOverflow);
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
            let seconds = d as i64;
            #[allow(clippy::cast_precision_loss)]
            let fraction = d - seconds as f64;
            Ok(Value::DateEpoch { seconds, fraction })
        }
        _ => Err(ErrorCode::BadOptTag),
    }
}

/// Reinterpret a value carrying the date or bignum tags.
fn apply_tag_semantics(value: Value<'_>, tags: TagBits) -> Result<Value<'_>, ErrorCode> {
    match tags.first_four() {
        0 => Ok(value),
        DATE_STRING_FLAG => match value {
            Value::TextString(s) => Ok(Value::DateString(s)),
            _ => Err(ErrorCode::BadOptTag),
        },
        DATE_EPOCH_FLAG => decode_date_epoch(value),
        POS_BIGNUM_FLAG => match value {
            Value::ByteString(b) => Ok(Value::PosBignum(b)),
            _ => Err(ErrorCode::BadOptTag),
        },
        NEG_BIGNUM_FLAG => match value {
            Value::ByteString(b) => Ok(Value::NegBignum(b)),
            _ => Err(ErrorCode::BadOptTag),
        },
        // More than one of them on a single item.
        _ => Err(ErrorCode::BadOptTag),
    }
}

/// Streaming CBOR decoder.
///
/// Each [`get_next`](Self::get_next) returns the next item in pre-order.
/// Arrays and maps are returned as header items followed by their contents;
/// [`Item::nesting_level`] and [`Item::next_nesting_level`] describe the tree.
/// In the default [`DecodeMode::Normal`] a map entry is one item carrying its
/// label.
///
/// Strings borrow the input. Indefinite-length strings need a string
/// allocator ([`set_mem_pool`](Decoder::set_mem_pool) or
/// [`set_up_allocator`](Self::set_up_allocator)) to be joined.
///
/// ```
/// use pocket_cbor::{DecodeMode, Decoder, Label, Value};
///
/// let input = [0xa1, 0x61, b'a', 0x82, 0x01, 0x02];
/// let mut dec = Decoder::new(&input, DecodeMode::Normal);
/// assert!(matches!(dec.get_next().unwrap().value, Value::Map(_)));
/// let entry = dec.get_next().unwrap();
/// assert_eq!(entry.label, Label::TextString(b"a"));
/// assert_eq!(dec.get_next().unwrap().value, Value::Int64(1));
/// let last = dec.get_next().unwrap();
/// assert_eq!(last.value, Value::Int64(2));
/// assert_eq!(last.next_nesting_level, 0);
/// dec.finish().unwrap();
/// ```
#[derive(Debug)]
pub struct Decoder<'a, A = MemPool<'a>> {
    input: InputCursor<'a>,
    mode: DecodeMode,
    nesting: DecodeNesting,
    allocator: Option<A>,
    copy_all_strings: bool,
    caller_tags: &'a [u64],
}

impl<'a> Decoder<'a, MemPool<'a>> {
    /// Start decoding `input`.
    #[must_use]
    pub const fn new(input: &'a [u8], mode: DecodeMode) -> Self {
        Self {
            input: InputCursor::new(input),
            mode,
            nesting: DecodeNesting::new(),
            allocator: None,
            copy_all_strings: false,
            caller_tags: &[],
        }
    }

    /// Use `block` as a memory pool for string allocation.
    ///
    /// With `copy_all_strings`, every string is copied into the pool, not just
    /// joined indefinite-length strings, so decoded items no longer reference
    /// the input.
    ///
    /// # Errors
    ///
    /// Returns `BufferTooSmall` if `block` cannot hold the pool header plus one
    /// byte and `BufferTooLarge` if it exceeds `u32::MAX` bytes.
    pub fn set_mem_pool(
        &mut self,
        block: &'a mut [u8],
        copy_all_strings: bool,
    ) -> Result<(), CborError> {
        let pool = MemPool::new(block).map_err(|code| CborError::decode(code, self.input.tell()))?;
        self.allocator = Some(pool);
        self.copy_all_strings = copy_all_strings;
        Ok(())
    }
}

impl<'a, A: StringAllocator<'a>> Decoder<'a, A> {
    /// Replace the string allocator with `allocator`.
    #[must_use]
    pub fn set_up_allocator<B: StringAllocator<'a>>(
        self,
        allocator: B,
        copy_all_strings: bool,
    ) -> Decoder<'a, B> {
        Decoder {
            input: self.input,
            mode: self.mode,
            nesting: self.nesting,
            allocator: Some(allocator),
            copy_all_strings,
            caller_tags: self.caller_tags,
        }
    }

    /// Recognize `tags` in addition to the built-in tag table. The tag at
    /// index `i` maps to bit `48 + i` of [`Item::tags`].
    ///
    /// # Errors
    ///
    /// Returns `TooManyTags` for more than [`MAX_CUSTOM_TAGS`] tags.
    pub fn set_caller_configured_tag_list(&mut self, tags: &'a [u64]) -> Result<(), CborError> {
        if tags.len() > MAX_CUSTOM_TAGS {
            return Err(CborError::decode(ErrorCode::TooManyTags, self.input.tell()));
        }
        self.caller_tags = tags;
        Ok(())
    }

    /// The map decoding mode.
    #[must_use]
    pub const fn mode(&self) -> DecodeMode {
        self.mode
    }

    /// Input offset of the next item.
    #[must_use]
    pub const fn tell(&self) -> usize {
        self.input.tell()
    }

    /// Returns `true` if `item` carries `tag`. Only tags in the built-in table
    /// or the caller-configured list can be queried.
    #[must_use]
    pub fn is_tagged(&self, item: &Item<'_>, tag: u64) -> bool {
        tag_bit(tag, self.caller_tags).is_some_and(|bit| item.tags.contains_bit(bit))
    }

    fn get_full_item(&mut self) -> Result<RawItem<'a>, ErrorCode> {
        let copy_into = if self.copy_all_strings {
            self.allocator.as_mut()
        } else {
            None
        };
        let raw = decode_item(&mut self.input, copy_into)?;
        let RawKind::IndefiniteString(kind) = raw.kind else {
            return Ok(raw);
        };

        let Some(alloc) = self.allocator.as_mut() else {
            return Err(ErrorCode::NoStringAllocator);
        };
        match coalesce_chunks(&mut self.input, alloc, kind) {
            Ok(()) => Ok(RawItem {
                kind: RawKind::Value(kind.value(alloc.commit())),
                allocated: true,
            }),
            Err(code) => {
                alloc.free();
                Err(code)
            }
        }
    }

    /// Fetch the next non-tag item with the recognized tags before it.
    fn get_tagged_item(
        &mut self,
        mut tags_out: Option<&mut TagListOut<'_>>,
    ) -> Result<(RawItem<'a>, TagBits), ErrorCode> {
        let mut tags = TagBits::EMPTY;
        if let Some(out) = tags_out.as_deref_mut() {
            out.clear();
        }
        loop {
            let mut raw = self.get_full_item()?;
            match raw.kind {
                RawKind::Tag(tag) => {
                    if let Some(bit) = tag_bit(tag, self.caller_tags) {
                        tags = tags.with_bit(bit);
                    }
                    if let Some(out) = tags_out.as_deref_mut() {
                        out.push(tag)?;
                    }
                }
                RawKind::Value(value) => {
                    raw.kind = RawKind::Value(apply_tag_semantics(value, tags)?);
                    return Ok((raw, tags));
                }
                RawKind::IndefiniteString(_) | RawKind::Break => {
                    if tags.first_four() != 0 {
                        return Err(ErrorCode::BadOptTag);
                    }
                    return Ok((raw, tags));
                }
            }
        }
    }

    /// Fetch one item, or one map entry with its label attached.
    fn get_map_entry(
        &mut self,
        mut tags_out: Option<&mut TagListOut<'_>>,
    ) -> Result<Item<'a>, ErrorCode> {
        let (raw, tags) = self.get_tagged_item(tags_out.as_deref_mut())?;
        let RawKind::Value(value) = raw.kind else {
            // A break; only `get_next` knows whether it is allowed.
            return Err(ErrorCode::BadBreak);
        };

        let mut item = Item::new(value);
        item.tags = tags;
        item.data_allocated = raw.allocated;

        if self.mode == DecodeMode::MapAsArray {
            if let Value::Map(count) = value {
                item.value = Value::MapAsArray(match count {
                    Count::Indefinite => Count::Indefinite,
                    Count::Definite(n) => match u16::try_from(u32::from(n) * 2) {
                        Ok(doubled) if doubled <= MAX_ITEMS_IN_ARRAY => Count::Definite(doubled),
                        _ => return Err(ErrorCode::ArrayTooLong),
                    },
                });
            }
            return Ok(item);
        }

        if !self.nesting.in_map() {
            return Ok(item);
        }

        // `item` is the label; the value follows.
        let label = match item.value {
            Value::TextString(s) => Label::TextString(s),
            _ if self.mode == DecodeMode::MapStringsOnly => return Err(ErrorCode::MapLabelType),
            Value::Int64(n) => Label::Int64(n),
            Value::UInt64(n) => Label::UInt64(n),
            Value::ByteString(b) => Label::ByteString(b),
            _ => return Err(ErrorCode::MapLabelType),
        };
        let label_allocated = item.data_allocated;

        let (raw, tags) = self.get_tagged_item(tags_out)?;
        let RawKind::Value(value) = raw.kind else {
            return Err(ErrorCode::BadBreak);
        };
        let mut entry = Item::new(value);
        entry.tags = tags;
        entry.data_allocated = raw.allocated;
        entry.label = label;
        entry.label_allocated = label_allocated;
        Ok(entry)
    }

    fn get_next_inner(
        &mut self,
        tags_out: Option<&mut TagListOut<'_>>,
    ) -> Result<Item<'a>, ErrorCode> {
        if self.input.bytes_unconsumed() == 0 && !self.nesting.is_nested() {
            return Err(ErrorCode::HitEnd);
        }

        let mut item = self.get_map_entry(tags_out)?;
        item.nesting_level = self.nesting.level();

        match item.value {
            Value::Array(count) | Value::Map(count) | Value::MapAsArray(count) => {
                if count.is_empty() {
                    // An empty definite container is a leaf.
                    self.nesting.decrement_count();
                } else {
                    let kind = if matches!(item.value, Value::Map(_)) {
                        FrameKind::Map
                    } else {
                        FrameKind::Array
                    };
                    self.nesting.descend(kind, count)?;
                }
            }
            _ => self.nesting.decrement_count(),
        }

        // Consume the breaks that end indefinite-length containers here. Only
        // the next initial byte is examined.
        while self.nesting.is_nested()
            && self.nesting.is_indefinite()
            && self.input.peek_byte() == Some(BREAK)
        {
            self.input.get_byte();
            self.nesting.break_ascend()?;
            self.nesting.decrement_count();
        }

        item.next_nesting_level = self.nesting.level();
        Ok(item)
    }

    /// Decode the next item.
    ///
    /// At the end of a well-formed top-level sequence this returns `HitEnd`
    /// with nothing left to read; [`finish`](Self::finish) then succeeds.
    ///
    /// # Errors
    ///
    /// Returns the first decoding error. The decoder is not usable for further
    /// items afterwards.
    pub fn get_next(&mut self) -> Result<Item<'a>, CborError> {
        self.get_next_reporting(None)
    }

    /// [`get_next`](Self::get_next), also recording into `tags` every tag
    /// number that preceded the item, recognized or not, in wire order.
    ///
    /// # Errors
    ///
    /// As for `get_next`; `TooManyTags` if `tags` is too small.
    pub fn get_next_with_tags(&mut self, tags: &mut TagListOut<'_>) -> Result<Item<'a>, CborError> {
        self.get_next_reporting(Some(tags))
    }

    fn get_next_reporting(
        &mut self,
        tags_out: Option<&mut TagListOut<'_>>,
    ) -> Result<Item<'a>, CborError> {
        let start = self.input.tell();
        self.get_next_inner(tags_out).map_err(|code| {
            cbor_debug!("cbor decode failed at {}: {}", start, code);
            CborError::decode(code, start)
        })
    }

    /// Finish decoding and release the string allocator.
    ///
    /// # Errors
    ///
    /// Returns `ArrayOrMapStillOpen` if a container was not fully decoded,
    /// `HitEnd` if the last item was cut short, and `ExtraBytes` if input
    /// remains.
    pub fn finish(mut self) -> Result<(), CborError> {
        let offset = self.input.tell();
        let result = if self.nesting.is_nested() {
            Err(CborError::decode(ErrorCode::ArrayOrMapStillOpen, offset))
        } else if self.input.is_error() {
            Err(CborError::decode(ErrorCode::HitEnd, offset))
        } else if self.input.bytes_unconsumed() != 0 {
            Err(CborError::decode(ErrorCode::ExtraBytes, offset))
        } else {
            Ok(())
        };
        if let Some(alloc) = self.allocator.as_mut() {
            cbor_trace!("releasing string allocator");
            alloc.destroy();
        }
        result
    }
}
