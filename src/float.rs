//! IEEE-754 half/single/double conversion by bit manipulation.
//!
//! Nothing here uses a numeric `as` cast between float widths: every
//! conversion takes the sign, exponent and significand fields apart and
//! rebuilds them, so NaN payloads survive and results are the same on every
//! target. Floats only enter or leave this module through `to_bits`/`from_bits`.

const HALF_SIGNIFICAND_BITS: u32 = 10;
const HALF_SIGNIFICAND_MASK: u16 = 0x03ff;
const HALF_EXPONENT_MASK: u16 = 0x7c00;
const HALF_SIGN_MASK: u16 = 0x8000;
const HALF_QUIET_NAN_BIT: u16 = 0x0200;
const HALF_EXPONENT_BIAS: i32 = 15;
const HALF_EXPONENT_MAX: i32 = 15;
const HALF_EXPONENT_MIN: i32 = -14;
/// Below this exponent a value is too small even for a half subnormal.
const HALF_SUBNORMAL_EXPONENT_MIN: i32 = HALF_EXPONENT_MIN - 10;
const HALF_EXPONENT_INF_OR_NAN: i32 = 16;

const SINGLE_SIGNIFICAND_BITS: u32 = 23;
const SINGLE_SIGNIFICAND_MASK: u32 = 0x007f_ffff;
const SINGLE_EXPONENT_MASK: u32 = 0x7f80_0000;
const SINGLE_SIGN_MASK: u32 = 0x8000_0000;
const SINGLE_QUIET_NAN_BIT: u32 = 0x0040_0000;
const SINGLE_EXPONENT_BIAS: i32 = 127;
const SINGLE_EXPONENT_MAX: i32 = 127;
const SINGLE_EXPONENT_MIN: i32 = -126;
const SINGLE_EXPONENT_INF_OR_NAN: i32 = 128;
const SINGLE_EXPONENT_ZERO: i32 = -127;

const DOUBLE_SIGNIFICAND_BITS: u32 = 52;
const DOUBLE_SIGNIFICAND_MASK: u64 = 0x000f_ffff_ffff_ffff;
const DOUBLE_EXPONENT_MASK: u64 = 0x7ff0_0000_0000_0000;
const DOUBLE_SIGN_MASK: u64 = 0x8000_0000_0000_0000;
const DOUBLE_QUIET_NAN_BIT: u64 = 0x0008_0000_0000_0000;
const DOUBLE_EXPONENT_BIAS: i32 = 1023;
const DOUBLE_EXPONENT_INF_OR_NAN: i32 = 1024;
const DOUBLE_EXPONENT_ZERO: i32 = -1023;

/// Significand bits a double loses when narrowed to half.
const DROPPED_IN_HALF: u64 = (1 << (DOUBLE_SIGNIFICAND_BITS - HALF_SIGNIFICAND_BITS)) - 1;
/// Significand bits a double loses when narrowed to single.
const DROPPED_IN_SINGLE: u64 = (1 << (DOUBLE_SIGNIFICAND_BITS - SINGLE_SIGNIFICAND_BITS)) - 1;
/// Significand bits a single loses when narrowed to half.
const SINGLE_DROPPED_IN_HALF: u32 = (1 << (SINGLE_SIGNIFICAND_BITS - HALF_SIGNIFICAND_BITS)) - 1;

/// The narrowest lossless encoding of a float, as raw IEEE-754 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmallestFloat {
    /// Half precision (CBOR additional info 25).
    Half(u16),
    /// Single precision (CBOR additional info 26).
    Single(u32),
    /// Double precision (CBOR additional info 27).
    Double(u64),
}

impl SmallestFloat {
    /// The raw bits widened to `u64`.
    #[must_use]
    pub fn bits(self) -> u64 {
        match self {
            Self::Half(h) => u64::from(h),
            Self::Single(s) => u64::from(s),
            Self::Double(d) => d,
        }
    }

    /// Encoded width in bytes: 2, 4 or 8.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::Half(_) => 2,
            Self::Single(_) => 4,
            Self::Double(_) => 8,
        }
    }
}

#[inline]
const fn double_parts(bits: u64) -> (u64, i32, u64) {
    let sign = bits & DOUBLE_SIGN_MASK;
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    let exp = ((bits & DOUBLE_EXPONENT_MASK) >> DOUBLE_SIGNIFICAND_BITS) as i32 - DOUBLE_EXPONENT_BIAS;
    (sign, exp, bits & DOUBLE_SIGNIFICAND_MASK)
}

#[inline]
const fn single_parts(bits: u32) -> (u32, i32, u32) {
    let sign = bits & SINGLE_SIGN_MASK;
    #[allow(clippy::cast_possible_wrap)]
    let exp = ((bits & SINGLE_EXPONENT_MASK) >> SINGLE_SIGNIFICAND_BITS) as i32 - SINGLE_EXPONENT_BIAS;
    (sign, exp, bits & SINGLE_SIGNIFICAND_MASK)
}

#[inline]
fn half_parts(bits: u16) -> (u16, i32, u16) {
    let sign = bits & HALF_SIGN_MASK;
    let exp = i32::from((bits & HALF_EXPONENT_MASK) >> HALF_SIGNIFICAND_BITS) - HALF_EXPONENT_BIAS;
    (sign, exp, bits & HALF_SIGNIFICAND_MASK)
}

/// Widen a half-precision value to a double. Lossless.
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub fn half_to_double(half: u16) -> f64 {
    let (sign, exp, mut significand) = half_parts(half);
    let sign = u64::from(sign) << 48;

    let bits = if exp == -HALF_EXPONENT_BIAS {
        if significand == 0 {
            sign
        } else {
            // Subnormal: shift until the implicit bit appears.
            let mut e = HALF_EXPONENT_MIN;
            while significand & (1 << HALF_SIGNIFICAND_BITS) == 0 {
                significand <<= 1;
                e -= 1;
            }
            significand &= HALF_SIGNIFICAND_MASK;
            sign | (((e + DOUBLE_EXPONENT_BIAS) as u64) << DOUBLE_SIGNIFICAND_BITS)
                | (u64::from(significand) << (DOUBLE_SIGNIFICAND_BITS - HALF_SIGNIFICAND_BITS))
        }
    } else if exp == HALF_EXPONENT_INF_OR_NAN {
        let mut frac = 0u64;
        if significand != 0 {
            frac = u64::from(significand & !HALF_QUIET_NAN_BIT);
            if significand & HALF_QUIET_NAN_BIT != 0 {
                frac |= DOUBLE_QUIET_NAN_BIT;
            }
        }
        sign | DOUBLE_EXPONENT_MASK | frac
    } else {
        sign | (((exp + DOUBLE_EXPONENT_BIAS) as u64) << DOUBLE_SIGNIFICAND_BITS)
            | (u64::from(significand) << (DOUBLE_SIGNIFICAND_BITS - HALF_SIGNIFICAND_BITS))
    };
    f64::from_bits(bits)
}

/// Widen a half-precision value to a single. Lossless.
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub fn half_to_single(half: u16) -> f32 {
    let (sign, exp, mut significand) = half_parts(half);
    let sign = u32::from(sign) << 16;

    let bits = if exp == -HALF_EXPONENT_BIAS {
        if significand == 0 {
            sign
        } else {
            let mut e = HALF_EXPONENT_MIN;
            while significand & (1 << HALF_SIGNIFICAND_BITS) == 0 {
                significand <<= 1;
                e -= 1;
            }
            significand &= HALF_SIGNIFICAND_MASK;
            sign | (((e + SINGLE_EXPONENT_BIAS) as u32) << SINGLE_SIGNIFICAND_BITS)
                | (u32::from(significand) << (SINGLE_SIGNIFICAND_BITS - HALF_SIGNIFICAND_BITS))
        }
    } else if exp == HALF_EXPONENT_INF_OR_NAN {
        let mut frac = 0u32;
        if significand != 0 {
            frac = u32::from(significand & !HALF_QUIET_NAN_BIT);
            if significand & HALF_QUIET_NAN_BIT != 0 {
                frac |= SINGLE_QUIET_NAN_BIT;
            }
        }
        sign | SINGLE_EXPONENT_MASK | frac
    } else {
        sign | (((exp + SINGLE_EXPONENT_BIAS) as u32) << SINGLE_SIGNIFICAND_BITS)
            | (u32::from(significand) << (SINGLE_SIGNIFICAND_BITS - HALF_SIGNIFICAND_BITS))
    };
    f32::from_bits(bits)
}

/// Widen a single-precision value to a double. Lossless.
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub fn single_to_double(single: f32) -> f64 {
    let (sign, exp, mut significand) = single_parts(single.to_bits());
    let sign = u64::from(sign) << 32;

    let bits = if exp == SINGLE_EXPONENT_ZERO {
        if significand == 0 {
            sign
        } else {
            let mut e = SINGLE_EXPONENT_MIN;
            while significand & (1 << SINGLE_SIGNIFICAND_BITS) == 0 {
                significand <<= 1;
                e -= 1;
            }
            significand &= SINGLE_SIGNIFICAND_MASK;
            sign | (((e + DOUBLE_EXPONENT_BIAS) as u64) << DOUBLE_SIGNIFICAND_BITS)
                | (u64::from(significand) << (DOUBLE_SIGNIFICAND_BITS - SINGLE_SIGNIFICAND_BITS))
        }
    } else if exp == SINGLE_EXPONENT_INF_OR_NAN {
        let mut frac = 0u64;
        if significand != 0 {
            frac = u64::from(significand & !SINGLE_QUIET_NAN_BIT);
            if significand & SINGLE_QUIET_NAN_BIT != 0 {
                frac |= DOUBLE_QUIET_NAN_BIT;
            }
        }
        sign | DOUBLE_EXPONENT_MASK | frac
    } else {
        sign | (((exp + DOUBLE_EXPONENT_BIAS) as u64) << DOUBLE_SIGNIFICAND_BITS)
            | (u64::from(significand) << (DOUBLE_SIGNIFICAND_BITS - SINGLE_SIGNIFICAND_BITS))
    };
    f64::from_bits(bits)
}

/// Narrow a single to half precision. Lossy: too-large values become
/// infinity, too-small values become a half subnormal or zero, and dropped
/// significand bits are truncated.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn single_to_half(single: f32) -> u16 {
    let (sign, exp, significand) = single_parts(single.to_bits());
    let sign = (sign >> 16) as u16;

    if exp == SINGLE_EXPONENT_INF_OR_NAN {
        let mut frac = 0u16;
        if significand != 0 {
            frac = (significand as u16) & (HALF_SIGNIFICAND_MASK & !HALF_QUIET_NAN_BIT);
            if significand & SINGLE_QUIET_NAN_BIT != 0 {
                frac |= HALF_QUIET_NAN_BIT;
            }
            if frac == 0 {
                // Keep it a NaN when only high payload bits were set.
                frac = HALF_QUIET_NAN_BIT;
            }
        }
        sign | HALF_EXPONENT_MASK | frac
    } else if exp == SINGLE_EXPONENT_ZERO {
        // Zero, or a single subnormal far below the half range.
        sign
    } else if exp > HALF_EXPONENT_MAX {
        sign | HALF_EXPONENT_MASK
    } else if exp < HALF_SUBNORMAL_EXPONENT_MIN {
        sign
    } else if exp < HALF_EXPONENT_MIN {
        let diff = (HALF_EXPONENT_MIN - exp) as u32;
        let frac = (significand >> (SINGLE_SIGNIFICAND_BITS - HALF_SIGNIFICAND_BITS + diff)) as u16
            | (1 << (HALF_SIGNIFICAND_BITS - diff));
        sign | frac
    } else {
        sign | (((exp + HALF_EXPONENT_BIAS) as u16) << HALF_SIGNIFICAND_BITS)
            | (significand >> (SINGLE_SIGNIFICAND_BITS - HALF_SIGNIFICAND_BITS)) as u16
    }
}

/// Narrow a double to half precision. Lossy in the same way as
/// [`single_to_half`].
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn double_to_half(double: f64) -> u16 {
    let (sign, exp, significand) = double_parts(double.to_bits());
    let sign = (sign >> 48) as u16;

    if exp == DOUBLE_EXPONENT_INF_OR_NAN {
        let mut frac = 0u16;
        if significand != 0 {
            frac = (significand as u16) & (HALF_SIGNIFICAND_MASK & !HALF_QUIET_NAN_BIT);
            if significand & DOUBLE_QUIET_NAN_BIT != 0 {
                frac |= HALF_QUIET_NAN_BIT;
            }
            if frac == 0 {
                frac = HALF_QUIET_NAN_BIT;
            }
        }
        sign | HALF_EXPONENT_MASK | frac
    } else if exp == DOUBLE_EXPONENT_ZERO {
        sign
    } else if exp > HALF_EXPONENT_MAX {
        sign | HALF_EXPONENT_MASK
    } else if exp < HALF_SUBNORMAL_EXPONENT_MIN {
        sign
    } else if exp < HALF_EXPONENT_MIN {
        let diff = (HALF_EXPONENT_MIN - exp) as u32;
        let frac = (significand >> (DOUBLE_SIGNIFICAND_BITS - HALF_SIGNIFICAND_BITS + diff)) as u16
            | (1 << (HALF_SIGNIFICAND_BITS - diff));
        sign | frac
    } else {
        sign | (((exp + HALF_EXPONENT_BIAS) as u16) << HALF_SIGNIFICAND_BITS)
            | (significand >> (DOUBLE_SIGNIFICAND_BITS - HALF_SIGNIFICAND_BITS)) as u16
    }
}

/// Narrow a double to single precision bits. Only called where the result is
/// exact or the input is zero, infinity or NaN.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn double_to_single_bits(double: f64) -> u32 {
    let (sign, exp, significand) = double_parts(double.to_bits());
    let sign = (sign >> 32) as u32;

    if exp == DOUBLE_EXPONENT_INF_OR_NAN {
        let mut frac = 0u32;
        if significand != 0 {
            frac = (significand as u32) & (SINGLE_SIGNIFICAND_MASK & !SINGLE_QUIET_NAN_BIT);
            if significand & DOUBLE_QUIET_NAN_BIT != 0 {
                frac |= SINGLE_QUIET_NAN_BIT;
            }
            if frac == 0 {
                frac = SINGLE_QUIET_NAN_BIT;
            }
        }
        sign | SINGLE_EXPONENT_MASK | frac
    } else if exp < SINGLE_EXPONENT_MIN {
        sign
    } else if exp > SINGLE_EXPONENT_MAX {
        sign | SINGLE_EXPONENT_MASK
    } else {
        sign | (((exp + SINGLE_EXPONENT_BIAS) as u32) << SINGLE_SIGNIFICAND_BITS)
            | (significand >> (DOUBLE_SIGNIFICAND_BITS - SINGLE_SIGNIFICAND_BITS)) as u32
    }
}

/// Pick the narrowest width that holds `d` without loss.
///
/// Zero, infinity and NaN always take the narrowest width available (half if
/// `allow_half`, else single). Half is used only for values with a normal
/// half exponent; half subnormals fall through to single.
#[must_use]
pub fn double_to_smallest(d: f64, allow_half: bool) -> SmallestFloat {
    let bits = d.to_bits();
    let (_, exp, significand) = double_parts(bits);

    if bits & !DOUBLE_SIGN_MASK == 0 || exp == DOUBLE_EXPONENT_INF_OR_NAN {
        if allow_half {
            SmallestFloat::Half(double_to_half(d))
        } else {
            SmallestFloat::Single(double_to_single_bits(d))
        }
    } else if allow_half
        && (HALF_EXPONENT_MIN..=HALF_EXPONENT_MAX).contains(&exp)
        && significand & DROPPED_IN_HALF == 0
    {
        SmallestFloat::Half(double_to_half(d))
    } else if (SINGLE_EXPONENT_MIN..=SINGLE_EXPONENT_MAX).contains(&exp)
        && significand & DROPPED_IN_SINGLE == 0
    {
        SmallestFloat::Single(double_to_single_bits(d))
    } else {
        SmallestFloat::Double(bits)
    }
}

/// Pick half or single for `f`, whichever is narrowest without loss.
#[must_use]
pub fn single_to_smallest(f: f32, allow_half: bool) -> SmallestFloat {
    let bits = f.to_bits();
    let (_, exp, significand) = single_parts(bits);

    if allow_half
        && (bits & !SINGLE_SIGN_MASK == 0
            || exp == SINGLE_EXPONENT_INF_OR_NAN
            || ((HALF_EXPONENT_MIN..=HALF_EXPONENT_MAX).contains(&exp)
                && significand & SINGLE_DROPPED_IN_HALF == 0))
    {
        SmallestFloat::Half(single_to_half(f))
    } else {
        SmallestFloat::Single(bits)
    }
}
