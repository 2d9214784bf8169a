//! # pocket-cbor
//!
//! A deterministic CBOR ([RFC 7049]) encoder and streaming decoder for
//! constrained environments. Both sides work over caller-supplied fixed
//! buffers: no heap, no recursion, and bounded stack use.
//!
//! [RFC 7049]: https://www.rfc-editor.org/rfc/rfc7049
//!
//! ## Encoding
//!
//! [`Encoder`] writes preferred serialization: every integer, length and tag
//! uses its shortest head, and floats are written in the narrowest of half,
//! single or double precision that preserves the value exactly. Arrays and
//! maps are always definite-length. Their heads are inserted in front of the
//! content when the container is closed, so no count is needed up front.
//!
//! Errors are sticky. The first failure is latched, later calls become no-ops,
//! and [`Encoder::finish`] reports it with the output position where it
//! happened.
//!
//! ## Decoding
//!
//! [`Decoder`] returns one [`Item`] per call in pre-order. Arrays and maps
//! arrive as header items followed by their contents, with nesting levels
//! describing the tree. Map entries arrive as one item carrying a [`Label`]
//! unless [`DecodeMode::MapAsArray`] is selected.
//!
//! String payloads borrow the input. Indefinite-length strings are joined into
//! memory from a [`StringAllocator`]; [`MemPool`] is a bump allocator over a
//! caller block.
//!
//! Recognized tags are reported as [`TagBits`]: bits `0..48` follow
//! [`BUILT_IN_TAGS`] and bits `48..64` a caller-configured list. Dates and
//! bignums are turned into [`Value::DateString`], [`Value::DateEpoch`],
//! [`Value::PosBignum`] and [`Value::NegBignum`].
//!
//! ## Limits
//!
//! Containers nest at most [`MAX_NESTING`] deep and hold at most
//! [`MAX_ITEMS_IN_ARRAY`] items. Buffers are limited to `u32::MAX` bytes.
//!
//! ## Feature flags
//!
//! - `std` *(default)*: implements `std::error::Error` for [`CborError`].
//! - `alloc` *(default)*: enables [`encode_to_vec`].
//! - `log` *(default)*: reports failures through the `log` facade at debug
//!   level and allocator lifecycle at trace level.
//! - `sha2`: enables [`Encoder::close_bstr_wrap_sha256`].
//! - `simdutf8`: enables SIMD-accelerated UTF-8 validation for
//!   [`Item::text`] and [`Label::text`].
//!
//! ## `no_std`
//!
//! The crate is `no_std` compatible. Without `alloc` everything except
//! `encode_to_vec` is available.

#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[macro_use]
mod trace;

#[cfg(feature = "alloc")]
mod alloc_util;
mod decode;
mod encode;
mod error;
mod float;
pub mod limits;
mod nesting;
mod sink;
mod stream;
mod string_alloc;
mod tags;
mod utf8;
mod value;

pub use crate::decode::Decoder;
#[cfg(feature = "alloc")]
pub use crate::encode::encode_to_vec;
pub use crate::encode::Encoder;
pub use crate::error::{CborError, CborErrorKind, ErrorCategory, ErrorCode};
pub use crate::float::{
    double_to_half, double_to_smallest, half_to_double, half_to_single, single_to_double,
    single_to_half, single_to_smallest, SmallestFloat,
};
pub use crate::limits::{MAX_CUSTOM_TAGS, MAX_ITEMS_IN_ARRAY, MAX_NESTING};
pub use crate::sink::OutputBuffer;
pub use crate::stream::InputCursor;
pub use crate::string_alloc::{MemPool, StringAllocator};
pub use crate::tags::{
    TagBits, TagListOut, BUILT_IN_TAGS, BUILT_IN_TAG_BITS, TAG_B64, TAG_B64URL, TAG_BIGFLOAT,
    TAG_BIN_UUID, TAG_CBOR, TAG_CBOR_MAGIC, TAG_COSE_ENCRYPT, TAG_COSE_ENCRYPT0, TAG_COSE_MAC,
    TAG_COSE_MAC0, TAG_COSE_SIGN, TAG_COSE_SIGN1, TAG_CWT, TAG_DATE_EPOCH, TAG_DATE_STRING,
    TAG_DECIMAL_FRACTION, TAG_ENC_AS_B16, TAG_ENC_AS_B64, TAG_ENC_AS_B64URL, TAG_GEO_COORD,
    TAG_MIME, TAG_NEG_BIGNUM, TAG_POS_BIGNUM, TAG_REGEX, TAG_URI,
};
pub use crate::value::{Count, DecodeMode, Item, Label, Value};
