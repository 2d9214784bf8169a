//! Preferred-serialization encoder over a fixed output buffer.

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

#[cfg(feature = "alloc")]
use crate::alloc_util::output_storage;
use crate::float::{double_to_smallest, single_to_smallest, SmallestFloat};
use crate::limits::{MAX_ARRAY_OFFSET, MAX_BUFFER_LEN};
use crate::nesting::{EncodeNesting, MAJOR_TYPE_ARRAY, MAJOR_TYPE_BYTE_STRING, MAJOR_TYPE_MAP};
use crate::sink::OutputBuffer;
use crate::tags::{
    TAG_B64, TAG_B64URL, TAG_BIN_UUID, TAG_DATE_EPOCH, TAG_DATE_STRING, TAG_MIME, TAG_NEG_BIGNUM,
    TAG_POS_BIGNUM, TAG_REGEX, TAG_URI,
};
use crate::{CborError, ErrorCode};

const MAJOR_TYPE_POSITIVE_INT: u8 = 0;
const MAJOR_TYPE_NEGATIVE_INT: u8 = 1;
const MAJOR_TYPE_TEXT_STRING: u8 = 3;
const MAJOR_TYPE_TAG: u8 = 6;
const MAJOR_TYPE_SIMPLE: u8 = 7;

const SIMPLE_FALSE: u8 = 20;
const SIMPLE_TRUE: u8 = 21;
const SIMPLE_NULL: u8 = 22;
const SIMPLE_UNDEF: u8 = 23;

const ADDITIONAL_INFO_ONE_BYTE: u8 = 24;

/// Encode a major type and argument in preferred (shortest) form.
///
/// `min_len` forces at least that many argument bytes; it is nonzero only for
/// floats, whose width is part of their meaning. Returns the head buffer and
/// the index its first byte starts at.
#[allow(clippy::cast_possible_truncation)]
fn encode_head(major: u8, min_len: usize, mut argument: u64) -> ([u8; 9], usize) {
    const ITERATE: [usize; 4] = [1, 1, 2, 4];

    let mut bytes = [0u8; 9];
    let mut pos = bytes.len();

    let additional_info = if argument < u64::from(ADDITIONAL_INFO_ONE_BYTE) && min_len == 0 {
        argument as u8
    } else {
        let mut remaining_min = min_len;
        let mut i = 0;
        while (argument != 0 || remaining_min > 0) && i < ITERATE.len() {
            for _ in 0..ITERATE[i] {
                pos -= 1;
                bytes[pos] = (argument & 0xff) as u8;
                argument >>= 8;
            }
            remaining_min = remaining_min.saturating_sub(ITERATE[i]);
            i += 1;
        }
        // i is 1..=4 here, giving 24, 25, 26 or 27.
        ADDITIONAL_INFO_ONE_BYTE + i as u8 - 1
    };
    pos -= 1;
    bytes[pos] = (major << 5) | additional_info;
    (bytes, pos)
}

/// Builds `_to_map` (text label) and `_to_map_n` (integer label) variants of
/// an add or open operation.
macro_rules! map_variants {
    ($name:ident, $to_map:ident, $to_map_n:ident $(, $arg:ident: $ty:ty)*) => {
        #[doc = concat!("[`Self::", stringify!($name), "`] preceded by a text-string map label.")]
        pub fn $to_map(&mut self, label: &str $(, $arg: $ty)*) {
            self.add_text(label);
            self.$name($($arg),*);
        }

        #[doc = concat!("[`Self::", stringify!($name), "`] preceded by an integer map label.")]
        pub fn $to_map_n(&mut self, label: i64 $(, $arg: $ty)*) {
            self.add_int64(label);
            self.$name($($arg),*);
        }
    };
}

/// CBOR encoder writing preferred serialization into caller storage.
///
/// Errors are sticky: the first failing add, open or close is latched, every
/// later call becomes a no-op, and [`finish`](Self::finish) reports it. A
/// sequence of adds therefore needs a single check at the end.
///
/// Integers, lengths and floats always use their shortest form. Arrays and
/// maps are written definite-length: their heads are inserted in front of the
/// content when they are closed. Indefinite-length items are never produced.
///
/// ```
/// use pocket_cbor::Encoder;
///
/// let mut storage = [0u8; 32];
/// let mut enc = Encoder::new(&mut storage);
/// enc.open_map();
/// enc.add_int64_to_map("a", 1);
/// enc.add_text_to_map_n(2, "b");
/// enc.close_map();
/// assert_eq!(enc.finish().unwrap(), &[0xa2, 0x61, b'a', 0x01, 0x02, 0x61, b'b']);
/// ```
#[derive(Debug)]
pub struct Encoder<'a> {
    out: OutputBuffer<'a>,
    nesting: EncodeNesting,
    error: Option<ErrorCode>,
    error_offset: usize,
}

impl<'a> Encoder<'a> {
    /// Create an encoder writing into `storage`.
    ///
    /// Storage longer than `u32::MAX` bytes latches `BufferTooLarge`.
    #[must_use]
    pub fn new(storage: &'a mut [u8]) -> Self {
        let too_large = storage.len() > MAX_BUFFER_LEN;
        let mut enc = Self {
            out: OutputBuffer::new(storage),
            nesting: EncodeNesting::new(),
            error: None,
            error_offset: 0,
        };
        if too_large {
            enc.latch(ErrorCode::BufferTooLarge);
        }
        enc
    }

    /// Create an encoder that produces no bytes and only computes the encoded
    /// length, for [`finish_get_size`](Self::finish_get_size).
    #[must_use]
    pub const fn size_only() -> Self {
        Self {
            out: OutputBuffer::size_only(MAX_BUFFER_LEN),
            nesting: EncodeNesting::new(),
            error: None,
            error_offset: 0,
        }
    }

    /// The latched error, if any. Does not include running out of storage,
    /// which is only reported by `finish`.
    #[must_use]
    pub const fn error(&self) -> Option<ErrorCode> {
        self.error
    }

    fn latch(&mut self, code: ErrorCode) {
        if self.error.is_none() {
            cbor_debug!("cbor encode error latched at {}: {}", self.out.end_position(), code);
            self.error = Some(code);
            self.error_offset = self.out.end_position();
        }
    }

    fn insert_head(&mut self, major: u8, min_len: usize, argument: u64, pos: usize) {
        let (bytes, start) = encode_head(major, min_len, argument);
        self.out.insert(&bytes[start..], pos);
    }

    fn append_head(&mut self, major: u8, min_len: usize, argument: u64) {
        let pos = self.out.end_position();
        self.insert_head(major, min_len, argument, pos);
    }

    /// Count one item in the current container and append its head.
    fn add_item_head(&mut self, major: u8, min_len: usize, argument: u64) -> bool {
        if self.error.is_some() {
            return false;
        }
        if let Err(code) = self.nesting.increment() {
            self.latch(code);
            return false;
        }
        self.append_head(major, min_len, argument);
        true
    }

    fn add_buffer(&mut self, major: u8, bytes: &[u8]) {
        let Ok(len) = u64::try_from(bytes.len()) else {
            self.latch(ErrorCode::BufferTooLarge);
            return;
        };
        if self.add_item_head(major, 0, len) {
            self.out.append(bytes);
        }
    }

    fn add_type7(&mut self, min_len: usize, argument: u64) {
        self.add_item_head(MAJOR_TYPE_SIMPLE, min_len, argument);
    }

    fn add_smallest_float(&mut self, f: SmallestFloat) {
        self.add_type7(f.size(), f.bits());
    }

    /// Add a signed integer.
    pub fn add_int64(&mut self, value: i64) {
        if value < 0 {
            // -1 - n never overflows for negative n.
            let magnitude = (-1 - value).unsigned_abs();
            self.add_item_head(MAJOR_TYPE_NEGATIVE_INT, 0, magnitude);
        } else {
            self.add_uint64(value.unsigned_abs());
        }
    }

    /// Add an unsigned integer.
    pub fn add_uint64(&mut self, value: u64) {
        self.add_item_head(MAJOR_TYPE_POSITIVE_INT, 0, value);
    }

    /// Add a byte string.
    pub fn add_bytes(&mut self, bytes: &[u8]) {
        self.add_buffer(MAJOR_TYPE_BYTE_STRING, bytes);
    }

    /// Add a text string.
    pub fn add_text(&mut self, text: &str) {
        self.add_buffer(MAJOR_TYPE_TEXT_STRING, text.as_bytes());
    }

    /// Add a double in the narrowest of half, single or double precision that
    /// represents it exactly.
    pub fn add_double(&mut self, value: f64) {
        self.add_smallest_float(double_to_smallest(value, true));
    }

    /// Add a single in half precision when that is exact, else single.
    pub fn add_float(&mut self, value: f32) {
        self.add_smallest_float(single_to_smallest(value, true));
    }

    /// Add a tag number. The tag applies to the next item added and does not
    /// count as an item itself.
    pub fn add_tag(&mut self, tag: u64) {
        if self.error.is_none() {
            self.append_head(MAJOR_TYPE_TAG, 0, tag);
        }
    }

    /// Add a simple value. Values 24 through 31 are reserved and latch
    /// `BadSimple`.
    pub fn add_simple(&mut self, value: u8) {
        if (24..=31).contains(&value) {
            if self.error.is_none() {
                self.latch(ErrorCode::BadSimple);
            }
            return;
        }
        self.add_type7(0, u64::from(value));
    }

    /// Add `true` or `false`.
    pub fn add_bool(&mut self, value: bool) {
        self.add_simple(if value { SIMPLE_TRUE } else { SIMPLE_FALSE });
    }

    /// Add `null`.
    pub fn add_null(&mut self) {
        self.add_simple(SIMPLE_NULL);
    }

    /// Add `undefined`.
    pub fn add_undef(&mut self) {
        self.add_simple(SIMPLE_UNDEF);
    }

    /// Add an epoch date (tag 1) in whole seconds.
    pub fn add_date_epoch(&mut self, seconds: i64) {
        self.add_tag(TAG_DATE_EPOCH);
        self.add_int64(seconds);
    }

    /// Add an RFC 3339 date string (tag 0).
    pub fn add_date_string(&mut self, date: &str) {
        self.add_tag(TAG_DATE_STRING);
        self.add_text(date);
    }

    /// Add a URI (tag 32).
    pub fn add_uri(&mut self, uri: &str) {
        self.add_tag(TAG_URI);
        self.add_text(uri);
    }

    /// Add base64-encoded text (tag 34).
    pub fn add_b64_text(&mut self, text: &str) {
        self.add_tag(TAG_B64);
        self.add_text(text);
    }

    /// Add base64url-encoded text (tag 33).
    pub fn add_b64url_text(&mut self, text: &str) {
        self.add_tag(TAG_B64URL);
        self.add_text(text);
    }

    /// Add a regular expression (tag 35).
    pub fn add_regex(&mut self, regex: &str) {
        self.add_tag(TAG_REGEX);
        self.add_text(regex);
    }

    /// Add a MIME message (tag 36).
    pub fn add_mime_data(&mut self, mime: &str) {
        self.add_tag(TAG_MIME);
        self.add_text(mime);
    }

    /// Add a binary UUID (tag 37).
    pub fn add_binary_uuid(&mut self, uuid: &[u8]) {
        self.add_tag(TAG_BIN_UUID);
        self.add_bytes(uuid);
    }

    /// Add a positive bignum (tag 2) from its big-endian magnitude.
    pub fn add_positive_bignum(&mut self, magnitude: &[u8]) {
        self.add_tag(TAG_POS_BIGNUM);
        self.add_bytes(magnitude);
    }

    /// Add a negative bignum (tag 3). `magnitude` is the big-endian `n` of
    /// the value `-1 - n`.
    pub fn add_negative_bignum(&mut self, magnitude: &[u8]) {
        self.add_tag(TAG_NEG_BIGNUM);
        self.add_bytes(magnitude);
    }

    /// Add one item that is already CBOR-encoded. The bytes are copied as-is
    /// and not checked.
    pub fn add_encoded(&mut self, encoded: &[u8]) {
        if self.error.is_some() {
            return;
        }
        if let Err(code) = self.nesting.increment() {
            self.latch(code);
            return;
        }
        self.out.append(encoded);
    }

    map_variants!(add_int64, add_int64_to_map, add_int64_to_map_n, value: i64);
    map_variants!(add_uint64, add_uint64_to_map, add_uint64_to_map_n, value: u64);
    map_variants!(add_bytes, add_bytes_to_map, add_bytes_to_map_n, bytes: &[u8]);
    map_variants!(add_text, add_text_to_map, add_text_to_map_n, text: &str);
    map_variants!(add_double, add_double_to_map, add_double_to_map_n, value: f64);
    map_variants!(add_float, add_float_to_map, add_float_to_map_n, value: f32);
    map_variants!(add_simple, add_simple_to_map, add_simple_to_map_n, value: u8);
    map_variants!(add_bool, add_bool_to_map, add_bool_to_map_n, value: bool);
    map_variants!(add_null, add_null_to_map, add_null_to_map_n);
    map_variants!(add_undef, add_undef_to_map, add_undef_to_map_n);
    map_variants!(add_date_epoch, add_date_epoch_to_map, add_date_epoch_to_map_n, seconds: i64);
    map_variants!(add_date_string, add_date_string_to_map, add_date_string_to_map_n, date: &str);
    map_variants!(add_uri, add_uri_to_map, add_uri_to_map_n, uri: &str);
    map_variants!(add_b64_text, add_b64_text_to_map, add_b64_text_to_map_n, text: &str);
    map_variants!(add_b64url_text, add_b64url_text_to_map, add_b64url_text_to_map_n, text: &str);
    map_variants!(add_regex, add_regex_to_map, add_regex_to_map_n, regex: &str);
    map_variants!(add_mime_data, add_mime_data_to_map, add_mime_data_to_map_n, mime: &str);
    map_variants!(add_binary_uuid, add_binary_uuid_to_map, add_binary_uuid_to_map_n, uuid: &[u8]);
    map_variants!(
        add_positive_bignum,
        add_positive_bignum_to_map,
        add_positive_bignum_to_map_n,
        magnitude: &[u8]
    );
    map_variants!(
        add_negative_bignum,
        add_negative_bignum_to_map,
        add_negative_bignum_to_map_n,
        magnitude: &[u8]
    );
    map_variants!(add_encoded, add_encoded_to_map, add_encoded_to_map_n, encoded: &[u8]);

    fn open(&mut self, major: u8) {
        if self.error.is_some() {
            return;
        }
        if let Err(code) = self.nesting.increment() {
            self.latch(code);
            return;
        }
        let end = self.out.end_position();
        let start = match u32::try_from(end) {
            Ok(start) if end < MAX_ARRAY_OFFSET => start,
            _ => {
                self.latch(ErrorCode::BufferTooLarge);
                return;
            }
        };
        if let Err(code) = self.nesting.increase(major, start) {
            self.latch(code);
        }
    }

    /// Close the innermost container, which must be of type `major`, by
    /// inserting its head at its start. Returns the start and the head length.
    fn close(&mut self, major: u8) -> Option<(usize, usize)> {
        if self.error.is_some() {
            return None;
        }
        if !self.nesting.is_nested() {
            self.latch(ErrorCode::TooManyCloses);
            return None;
        }
        if self.nesting.major() != major {
            self.latch(ErrorCode::CloseMismatch);
            return None;
        }
        let start = self.nesting.start() as usize;
        let end = self.out.end_position();
        let argument = if major == MAJOR_TYPE_BYTE_STRING {
            // start <= end is kept by the output buffer.
            (end - start) as u64
        } else {
            u64::from(self.nesting.count())
        };
        self.insert_head(major, 0, argument, start);
        let head_len = self.out.end_position() - end;
        self.nesting.decrease();
        Some((start, head_len))
    }

    /// Open an array. Items added until the matching close are its elements.
    pub fn open_array(&mut self) {
        self.open(MAJOR_TYPE_ARRAY);
    }

    /// Close the innermost array.
    pub fn close_array(&mut self) {
        self.close(MAJOR_TYPE_ARRAY);
    }

    /// Open a map. Add entries with the `_to_map`/`_to_map_n` operations, or
    /// alternate label and value items.
    pub fn open_map(&mut self) {
        self.open(MAJOR_TYPE_MAP);
    }

    /// Close the innermost map.
    pub fn close_map(&mut self) {
        self.close(MAJOR_TYPE_MAP);
    }

    /// Open a byte string whose content is the encoding of the items added
    /// until [`close_bstr_wrap`](Self::close_bstr_wrap).
    pub fn bstr_wrap(&mut self) {
        self.open(MAJOR_TYPE_BYTE_STRING);
    }

    /// Close the innermost byte-string wrap and return the wrapped encoding
    /// (without the byte-string head).
    ///
    /// Returns `None` if an error is latched, the output buffer overflowed, or
    /// this encoder only computes sizes. The returned slice borrows the
    /// encoder, so it cannot outlive the next add.
    pub fn close_bstr_wrap(&mut self) -> Option<&[u8]> {
        let (start, head_len) = self.close(MAJOR_TYPE_BYTE_STRING)?;
        self.out.tail(start + head_len)
    }

    /// [`close_bstr_wrap`](Self::close_bstr_wrap), returning the SHA-256
    /// digest of the wrapped encoding.
    #[cfg(feature = "sha2")]
    #[cfg_attr(docsrs, doc(cfg(feature = "sha2")))]
    pub fn close_bstr_wrap_sha256(&mut self) -> Option<[u8; 32]> {
        use sha2::{Digest, Sha256};

        let payload = self.close_bstr_wrap()?;
        let mut h = Sha256::new();
        h.update(payload);
        let mut out = [0u8; 32];
        out.copy_from_slice(&h.finalize());
        Some(out)
    }

    map_variants!(open_array, open_array_in_map, open_array_in_map_n);
    map_variants!(open_map, open_map_in_map, open_map_in_map_n);
    map_variants!(bstr_wrap, bstr_wrap_in_map, bstr_wrap_in_map_n);

    fn check_complete(&self) -> Result<(), CborError> {
        if let Some(code) = self.error {
            return Err(CborError::encode(code, self.error_offset));
        }
        if self.nesting.is_nested() {
            return Err(CborError::encode(
                ErrorCode::ArrayOrMapStillOpen,
                self.out.end_position(),
            ));
        }
        if self.out.is_error() {
            return Err(CborError::encode(
                ErrorCode::BufferTooSmall,
                self.out.end_position(),
            ));
        }
        Ok(())
    }

    /// Length of the complete encoding.
    ///
    /// # Errors
    ///
    /// As for [`finish`](Self::finish).
    pub fn finish_get_size(&self) -> Result<usize, CborError> {
        self.check_complete()?;
        Ok(self.out.end_position())
    }

    /// Finish encoding and return the encoded bytes. A size-only encoder
    /// returns an empty slice; use `finish_get_size` for its length.
    ///
    /// # Errors
    ///
    /// Returns the latched error first, then `ArrayOrMapStillOpen` if a
    /// container is open, then `BufferTooSmall` if the output did not fit.
    pub fn finish(self) -> Result<&'a [u8], CborError> {
        self.check_complete()?;
        if self.out.is_size_only() {
            return Ok(&[]);
        }
        let end = self.out.end_position();
        self.out
            .into_bytes()
            .ok_or_else(|| CborError::encode(ErrorCode::BufferTooSmall, end))
    }
}

/// Encode into an exactly sized `Vec`.
///
/// `f` runs twice: once against a size-only encoder, then against storage of
/// exactly that size. It must add the same items both times.
///
/// # Errors
///
/// Returns the encoder's error, or `BufferTooSmall` if the allocation fails.
#[cfg(feature = "alloc")]
#[cfg_attr(docsrs, doc(cfg(feature = "alloc")))]
pub fn encode_to_vec<F>(mut f: F) -> Result<Vec<u8>, CborError>
where
    F: FnMut(&mut Encoder<'_>),
{
    let mut sizer = Encoder::size_only();
    f(&mut sizer);
    let len = sizer.finish_get_size()?;

    let mut buf = output_storage(len)?;
    let mut enc = Encoder::new(&mut buf);
    f(&mut enc);
    let written = enc.finish()?.len();
    buf.truncate(written);
    Ok(buf)
}
