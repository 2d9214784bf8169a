use core::fmt;

/// The side of the codec that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CborErrorKind {
    /// Latched by the encoder and reported from `Encoder::finish`.
    Encode,
    /// Reported by the decoder for the item being decoded.
    Decode,
}

/// Coarse classification of an [`ErrorCode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A buffer, pool or fixed limit was too small or too large.
    Capacity,
    /// Unbalanced opens/closes, unterminated containers or trailing input.
    Structure,
    /// The input bytes are not well-formed CBOR this decoder accepts.
    Malformed,
    /// The string allocator is missing, exhausted or corrupt.
    Allocator,
}

/// A stable status code identifying why an operation failed.
///
/// This enum is string-free to support `no_std`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorCode {
    /// The output buffer or memory pool is too small.
    BufferTooSmall,
    /// Arrays/maps are nested deeper than `MAX_NESTING`.
    ArrayNestingTooDeep,
    /// An array or map has more than `MAX_ITEMS_IN_ARRAY` items.
    ArrayTooLong,
    /// More closes than opens.
    TooManyCloses,
    /// A close does not match the type of the innermost open container.
    CloseMismatch,
    /// `finish` was called with containers still open.
    ArrayOrMapStillOpen,
    /// A buffer or offset exceeds what the codec can address.
    BufferTooLarge,
    /// A simple value is reserved or redundantly encoded.
    BadSimple,
    /// Reserved additional-info value 28..=30.
    Unsupported,
    /// The input ended in the middle of an item.
    HitEnd,
    /// A negative integer is below `i64::MIN`.
    IntOverflow,
    /// A map label is not a text string, byte string or integer (or not a text
    /// string in strings-only mode).
    MapLabelType,
    /// An epoch date does not fit in 64-bit seconds.
    DateOverflow,
    /// Input is not well-formed CBOR.
    InvalidCbor,
    /// A date/bignum tag is applied to the wrong type or tags conflict.
    BadOptTag,
    /// Input remains after the last item.
    ExtraBytes,
    /// An indefinite-length string was found but no string allocator is set.
    NoStringAllocator,
    /// A chunk of an indefinite-length string has the wrong type.
    IndefiniteStringChunk,
    /// The string allocator could not satisfy a request.
    StringAllocate,
    /// A break appeared outside an indefinite-length array or map.
    BadBreak,
    /// More tags than the caller-configured list or tag output can hold.
    TooManyTags,
    /// The memory pool bookkeeping is inconsistent.
    MemPoolInternal,
}

impl ErrorCode {
    /// Classify this code.
    #[must_use]
    pub const fn category(self) -> ErrorCategory {
        match self {
            Self::BufferTooSmall
            | Self::ArrayNestingTooDeep
            | Self::ArrayTooLong
            | Self::BufferTooLarge
            | Self::TooManyTags => ErrorCategory::Capacity,
            Self::TooManyCloses
            | Self::CloseMismatch
            | Self::ArrayOrMapStillOpen
            | Self::BadBreak
            | Self::ExtraBytes => ErrorCategory::Structure,
            Self::BadSimple
            | Self::Unsupported
            | Self::HitEnd
            | Self::IntOverflow
            | Self::MapLabelType
            | Self::DateOverflow
            | Self::InvalidCbor
            | Self::BadOptTag
            | Self::IndefiniteStringChunk => ErrorCategory::Malformed,
            Self::NoStringAllocator | Self::StringAllocate | Self::MemPoolInternal => {
                ErrorCategory::Allocator
            }
        }
    }

    const fn message(self) -> &'static str {
        match self {
            Self::BufferTooSmall => "buffer too small",
            Self::ArrayNestingTooDeep => "array or map nesting too deep",
            Self::ArrayTooLong => "array or map has too many items",
            Self::TooManyCloses => "more closes than opens",
            Self::CloseMismatch => "close does not match open container type",
            Self::ArrayOrMapStillOpen => "array or map still open",
            Self::BufferTooLarge => "buffer too large",
            Self::BadSimple => "invalid simple value",
            Self::Unsupported => "reserved additional info value",
            Self::HitEnd => "hit end of input",
            Self::IntOverflow => "negative integer out of range",
            Self::MapLabelType => "unsupported map label type",
            Self::DateOverflow => "epoch date out of range",
            Self::InvalidCbor => "invalid CBOR",
            Self::BadOptTag => "tag content has the wrong type",
            Self::ExtraBytes => "extra bytes after last item",
            Self::NoStringAllocator => "indefinite-length string needs a string allocator",
            Self::IndefiniteStringChunk => "bad indefinite-length string chunk",
            Self::StringAllocate => "string allocation failed",
            Self::BadBreak => "break outside indefinite-length array or map",
            Self::TooManyTags => "too many tags",
            Self::MemPoolInternal => "memory pool corrupt",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// A codec error with classification, a stable code, and a byte offset.
///
/// For decode errors `offset` is the input offset of the item being decoded.
/// For encode errors it is the output position at which the error was latched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CborError {
    /// Which side produced the error.
    pub kind: CborErrorKind,
    /// The error code.
    pub code: ErrorCode,
    /// Byte offset where the error was detected.
    pub offset: usize,
}

impl CborError {
    /// Construct a decode error at `offset`.
    #[inline]
    #[must_use]
    pub const fn decode(code: ErrorCode, offset: usize) -> Self {
        Self {
            kind: CborErrorKind::Decode,
            code,
            offset,
        }
    }

    /// Construct an encode error at output position `offset`.
    #[inline]
    #[must_use]
    pub const fn encode(code: ErrorCode, offset: usize) -> Self {
        Self {
            kind: CborErrorKind::Encode,
            code,
            offset,
        }
    }

    /// Classify this error.
    #[inline]
    #[must_use]
    pub const fn category(self) -> ErrorCategory {
        self.code.category()
    }
}

impl fmt::Display for CborError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            CborErrorKind::Encode => write!(f, "cbor encode failed at {}: {}", self.offset, self.code),
            CborErrorKind::Decode => write!(f, "cbor decode failed at {}: {}", self.offset, self.code),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CborError {}
