//! Tag numbers, the built-in tag table and per-item tag bitmaps.

use crate::limits::MAX_CUSTOM_TAGS;
use crate::ErrorCode;

/// Standard date/time string (RFC 3339 text).
pub const TAG_DATE_STRING: u64 = 0;
/// Epoch-based date/time.
pub const TAG_DATE_EPOCH: u64 = 1;
/// Positive bignum.
pub const TAG_POS_BIGNUM: u64 = 2;
/// Negative bignum.
pub const TAG_NEG_BIGNUM: u64 = 3;
/// Decimal fraction.
pub const TAG_DECIMAL_FRACTION: u64 = 4;
/// Bigfloat.
pub const TAG_BIGFLOAT: u64 = 5;
/// `COSE_Encrypt0`.
pub const TAG_COSE_ENCRYPT0: u64 = 16;
/// `COSE_Mac0`.
pub const TAG_COSE_MAC0: u64 = 17;
/// `COSE_Sign1`.
pub const TAG_COSE_SIGN1: u64 = 18;
/// Expected conversion to base64url.
pub const TAG_ENC_AS_B64URL: u64 = 21;
/// Expected conversion to base64.
pub const TAG_ENC_AS_B64: u64 = 22;
/// Expected conversion to base16.
pub const TAG_ENC_AS_B16: u64 = 23;
/// Embedded CBOR data item.
pub const TAG_CBOR: u64 = 24;
/// URI text.
pub const TAG_URI: u64 = 32;
/// base64url-encoded text.
pub const TAG_B64URL: u64 = 33;
/// base64-encoded text.
pub const TAG_B64: u64 = 34;
/// Regular expression text.
pub const TAG_REGEX: u64 = 35;
/// MIME message text.
pub const TAG_MIME: u64 = 36;
/// Binary UUID.
pub const TAG_BIN_UUID: u64 = 37;
/// CBOR Web Token.
pub const TAG_CWT: u64 = 61;
/// `COSE_Encrypt`.
pub const TAG_COSE_ENCRYPT: u64 = 96;
/// `COSE_Mac`.
pub const TAG_COSE_MAC: u64 = 97;
/// `COSE_Sign`.
pub const TAG_COSE_SIGN: u64 = 98;
/// Geographic coordinates.
pub const TAG_GEO_COORD: u64 = 103;
/// Self-describe CBOR magic number.
pub const TAG_CBOR_MAGIC: u64 = 55799;

/// Tags recognized without configuration. Index `i` maps to bit `i` of
/// [`TagBits`].
///
/// This table is append-only: bit meanings are part of the public contract,
/// so new tags go at the end and nothing is ever removed or reordered.
pub const BUILT_IN_TAGS: [u64; 25] = [
    TAG_DATE_STRING,
    TAG_DATE_EPOCH,
    TAG_POS_BIGNUM,
    TAG_NEG_BIGNUM,
    TAG_DECIMAL_FRACTION,
    TAG_BIGFLOAT,
    TAG_COSE_ENCRYPT0,
    TAG_COSE_MAC0,
    TAG_COSE_SIGN1,
    TAG_ENC_AS_B64URL,
    TAG_ENC_AS_B64,
    TAG_ENC_AS_B16,
    TAG_CBOR,
    TAG_URI,
    TAG_B64URL,
    TAG_B64,
    TAG_REGEX,
    TAG_MIME,
    TAG_BIN_UUID,
    TAG_CWT,
    TAG_COSE_ENCRYPT,
    TAG_COSE_MAC,
    TAG_COSE_SIGN,
    TAG_GEO_COORD,
    TAG_CBOR_MAGIC,
];

/// Bits reserved for built-in tags. Caller-configured tags start here.
pub const BUILT_IN_TAG_BITS: u32 = 48;

pub const BIT_DATE_STRING: u32 = 0;
pub const BIT_DATE_EPOCH: u32 = 1;
pub const BIT_POS_BIGNUM: u32 = 2;
pub const BIT_NEG_BIGNUM: u32 = 3;

/// Which recognized tags were applied to an item.
///
/// Bits `0..48` follow [`BUILT_IN_TAGS`]; bits `48..64` follow the
/// caller-configured tag list in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TagBits(u64);

impl TagBits {
    /// No tags.
    pub const EMPTY: Self = Self(0);

    /// Wrap a raw bitmap.
    #[must_use]
    pub const fn from_raw(bits: u64) -> Self {
        Self(bits)
    }

    /// The raw bitmap.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Returns `true` if no recognized tag was applied.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if bit `bit` is set.
    #[must_use]
    pub const fn contains_bit(self, bit: u32) -> bool {
        bit < 64 && self.0 & (1 << bit) != 0
    }

    #[must_use]
    pub(crate) const fn with_bit(self, bit: u32) -> Self {
        Self(self.0 | (1 << bit))
    }

    /// The date-string, date-epoch and bignum bits only.
    #[must_use]
    pub(crate) const fn first_four(self) -> u64 {
        self.0 & 0x0f
    }
}

/// Bit index for `tag`: the built-in table first, then the caller's list.
#[must_use]
pub fn tag_bit(tag: u64, caller: &[u64]) -> Option<u32> {
    let index = |list: &[u64]| list.iter().position(|&t| t == tag);
    if let Some(i) = index(&BUILT_IN_TAGS[..]) {
        return u32::try_from(i).ok();
    }
    index(caller)
        .filter(|&i| i < MAX_CUSTOM_TAGS)
        .and_then(|i| u32::try_from(i).ok())
        .map(|i| BUILT_IN_TAG_BITS + i)
}

/// Caller storage receiving every tag number that precedes an item.
///
/// Unlike [`TagBits`] this records unrecognized tags too, in wire order.
#[derive(Debug)]
pub struct TagListOut<'t> {
    storage: &'t mut [u64],
    len: usize,
}

impl<'t> TagListOut<'t> {
    /// Record into `storage`; its length is the capacity.
    #[must_use]
    pub fn new(storage: &'t mut [u64]) -> Self {
        Self { storage, len: 0 }
    }

    /// The recorded tags.
    #[must_use]
    pub fn as_slice(&self) -> &[u64] {
        &self.storage[..self.len]
    }

    /// Number of recorded tags.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn clear(&mut self) {
        self.len = 0;
    }

    pub(crate) fn push(&mut self, tag: u64) -> Result<(), ErrorCode> {
        let slot = self.storage.get_mut(self.len).ok_or(ErrorCode::TooManyTags)?;
        *slot = tag;
        self.len += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_bits_follow_table_order() {
        for (i, &tag) in BUILT_IN_TAGS.iter().enumerate() {
            assert_eq!(tag_bit(tag, &[]), Some(u32::try_from(i).unwrap()));
        }
        assert_eq!(tag_bit(TAG_DATE_EPOCH, &[]), Some(BIT_DATE_EPOCH));
        assert_eq!(tag_bit(TAG_NEG_BIGNUM, &[]), Some(BIT_NEG_BIGNUM));
        assert_eq!(tag_bit(TAG_POS_BIGNUM, &[]), Some(BIT_POS_BIGNUM));
        assert_eq!(tag_bit(TAG_DATE_STRING, &[]), Some(BIT_DATE_STRING));
    }

    #[test]
    fn caller_tags_use_high_bits() {
        let caller = [1000, 2000, TAG_URI];
        assert_eq!(tag_bit(1000, &caller), Some(48));
        assert_eq!(tag_bit(2000, &caller), Some(49));
        // Built-in wins.
        assert_eq!(tag_bit(TAG_URI, &caller), Some(13));
        assert_eq!(tag_bit(3000, &caller), None);
    }

    #[test]
    fn tag_bits() {
        let bits = TagBits::EMPTY.with_bit(2).with_bit(50);
        assert!(bits.contains_bit(2));
        assert!(bits.contains_bit(50));
        assert!(!bits.contains_bit(3));
        assert!(!bits.contains_bit(64));
        assert_eq!(bits.first_four(), 0b0100);
        assert!(TagBits::default().is_empty());
    }

    #[test]
    fn tag_list_out_capacity() {
        let mut storage = [0u64; 2];
        let mut out = TagListOut::new(&mut storage);
        assert!(out.is_empty());
        out.push(7).unwrap();
        out.push(8).unwrap();
        assert_eq!(out.push(9), Err(ErrorCode::TooManyTags));
        assert_eq!(out.as_slice(), &[7, 8]);
        out.clear();
        assert_eq!(out.len(), 0);
    }
}
