//! Deterministic 64.64 fixed-point arithmetic.
//!
//! Natural log and exponential over integers scaled by 2^64. Every
//! participant recomputing a price from the same inputs must land on the
//! same bit pattern, so there is no floating point anywhere in this
//! module: `ln` reduces its argument by powers of two and extracts the
//! fractional binary log with 64 squaring steps, `exp` splits into a
//! power-of-two shift and a polynomial for the fractional part.

use serde::{Deserialize, Serialize};

use super::error::{ExchangeError, Result};

/// The fixed-point representation of 1.0.
pub const ONE: u128 = 1 << 64;

/// floor(ln 2 · 2^64).
pub(crate) const LN2: u128 = 0xb172_17f7_d1cf_79ab;

/// Taylor coefficients of 2^z for z in [0, 1): floor(ln(2)^k / k! · 2^64)
/// for k = 1..=18. The degree-18 remainder at z = 1 is below one ulp.
const POW2_COEFFS: [u128; 18] = [
    0xb172_17f7_d1cf_79ab,
    0x3d7f_7bff_058b_1d50,
    0x0e35_846b_8250_5fc5,
    0x0276_556d_f749_cee5,
    0x0057_61ff_9e29_9cc4,
    0x000a_1848_97c3_63c3,
    0x0000_ffe5_fe2c_4586,
    0x0000_162c_0223_a5c8,
    0x0000_01b5_253d_395e,
    0x0000_001e_4cf5_158b,
    0x0000_0001_e8ca_c735,
    0x0000_0000_1c3b_d650,
    0x0000_0000_0181_6193,
    0x0000_0000_0013_1496,
    0x0000_0000_0000_e1b7,
    0x0000_0000_0000_09c7,
    0x0000_0000_0000_0066,
    0x0000_0000_0000_0003,
];

/// A signed 64.64 fixed-point number.
///
/// Raw integer value scaled by 2^64; covers roughly ±9.2·10^18 with
/// ~19 decimal digits of fractional precision.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Fixed(i128);

impl Fixed {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(1 << 64);

    /// Builds a fixed-point number from an integer.
    pub const fn from_int(v: i64) -> Self {
        Self((v as i128) << 64)
    }

    /// Wraps a raw 64.64 scaled integer.
    pub const fn from_raw(raw: i128) -> Self {
        Self(raw)
    }

    /// Returns the raw 64.64 scaled integer.
    pub const fn raw(self) -> i128 {
        self.0
    }

    /// Integer part, rounded toward negative infinity.
    pub const fn floor(self) -> i64 {
        (self.0 >> 64) as i64
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }
}

/// Natural logarithm. Domain: x > 0.
///
/// Exact range reduction (the binary-log squaring loop carries no
/// approximation error beyond the final fractional bit), then one
/// multiplication by ln 2.
pub fn ln(x: Fixed) -> Result<Fixed> {
    if x.0 <= 0 {
        return Err(ExchangeError::DomainError("ln of non-positive input"));
    }
    Ok(Fixed(ln_raw(x.0 as u128)))
}

/// Exponential. Fails with `DomainError` once the result would overflow
/// the 64.64 range (x > 63·ln 2 ≈ 43.67); negative inputs are total.
pub fn exp(x: Fixed) -> Result<Fixed> {
    if x.0 < 0 {
        let neg = x.0.unsigned_abs();
        return Ok(Fixed(exp_neg(neg) as i128));
    }
    let x = x.0 as u128;
    let shift = x / LN2;
    if shift >= 63 {
        return Err(ExchangeError::DomainError("exp overflow"));
    }
    let rem = x - shift * LN2;
    let z = rem * ONE / LN2;
    let p = if z == 0 { ONE } else { pow2_frac(z) };
    Ok(Fixed((p << shift) as i128))
}

/// e^(−x/2^64) · 2^64 for x ≥ 0. Total: saturates to 0 once the true
/// result drops below one ulp.
pub(crate) fn exp_neg(x: u128) -> u128 {
    if x == 0 {
        return ONE;
    }
    let shift = x / LN2;
    if shift >= 64 {
        return 0;
    }
    let rem = x - shift * LN2;
    let z = rem * ONE / LN2;
    if z == 0 {
        ONE >> shift
    } else {
        // 2^(-shift - z) = 2^(1 - z) / 2^(shift + 1)
        pow2_frac(ONE - z) >> (shift + 1)
    }
}

/// ln(x/2^64) · 2^64 for raw x > 0. May be negative (x < ONE).
pub(crate) fn ln_raw(x: u128) -> i128 {
    let (ilog, frac) = log2_parts(x);
    // (ilog·2^64 + frac)·LN2 / 2^64, the first term exact
    i128::from(ilog) * LN2 as i128 + ((frac * LN2) >> 64) as i128
}

/// Binary log split into integer part and 64 fractional bits.
///
/// The mantissa is renormalized into [1, 2) and squared 64 times; each
/// squaring that lands at or above 2 contributes one fractional bit.
fn log2_parts(x: u128) -> (i32, u128) {
    debug_assert!(x > 0);
    let ilog = 63 - x.leading_zeros() as i32;
    let mut z = if ilog >= 0 { x >> ilog } else { x << -ilog };
    let mut frac: u128 = 0;
    for i in 1..=64u32 {
        z = sqr_shr64(z);
        if z >= 2 * ONE {
            z >>= 1;
            frac += ONE >> i;
        }
    }
    (ilog, frac)
}

/// 2^(z/2^64) · 2^64 for z in (0, 2^64): the fractional power of two,
/// result in [2^64, 2^65).
fn pow2_frac(z: u128) -> u128 {
    debug_assert!(z < ONE);
    let mut result = ONE;
    let mut zpow = z;
    for c in POW2_COEFFS {
        result += (c * zpow) >> 64;
        zpow = (zpow * z) >> 64;
    }
    result
}

/// floor(a·b / d) with a full 256-bit intermediate product.
///
/// The quotient must fit in u128; every call site guarantees this
/// structurally (the result is bounded by one of the factors).
pub(crate) fn mul_div_floor(a: u128, b: u128, d: u128) -> u128 {
    debug_assert!(d > 0);
    let (hi, lo) = mul_wide(a, b);
    if hi == 0 {
        return lo / d;
    }
    debug_assert!(hi < d, "mul_div_floor quotient overflows u128");
    // binary long division of the 256-bit product by d
    let mut rem = hi;
    let mut quot: u128 = 0;
    for i in (0..128).rev() {
        let carry = rem >> 127;
        rem = (rem << 1) | ((lo >> i) & 1);
        quot <<= 1;
        if carry == 1 || rem >= d {
            rem = rem.wrapping_sub(d);
            quot |= 1;
        }
    }
    quot
}

/// Full 256-bit product of two u128 values as (high, low) halves.
const fn mul_wide(a: u128, b: u128) -> (u128, u128) {
    const MASK: u128 = (1 << 64) - 1;
    let (ah, al) = (a >> 64, a & MASK);
    let (bh, bl) = (b >> 64, b & MASK);
    let ll = al * bl;
    let lh = al * bh;
    let hl = ah * bl;
    let hh = ah * bh;
    let mid = (ll >> 64) + (lh & MASK) + (hl & MASK);
    let lo = (mid << 64) | (ll & MASK);
    let hi = hh + (lh >> 64) + (hl >> 64) + (mid >> 64);
    (hi, lo)
}

/// floor(z² / 2^64) for z < 2^65, where z² would overflow u128.
const fn sqr_shr64(z: u128) -> u128 {
    let hi = z >> 64;
    let lo = z & (ONE - 1);
    // (hi·2^64 + lo)² / 2^64 = hi²·2^64 + 2·hi·lo + lo²/2^64
    hi * hi * ONE + 2 * hi * lo + ((lo * lo) >> 64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ln_of_one_is_zero() {
        assert_eq!(ln(Fixed::ONE).unwrap(), Fixed::ZERO);
    }

    #[test]
    fn test_ln_of_two_is_ln2_exactly() {
        let got = ln(Fixed::from_int(2)).unwrap();
        assert_eq!(got.raw(), LN2 as i128);
    }

    #[test]
    fn test_ln_known_values() {
        assert_eq!(ln(Fixed::from_int(3)).unwrap().raw(), 20265819725292939636);
        assert_eq!(ln(Fixed::from_int(10)).unwrap().raw(), 42475197918399869016);
    }

    #[test]
    fn test_ln_rejects_non_positive() {
        assert!(ln(Fixed::ZERO).is_err());
        assert!(ln(Fixed::from_int(-1)).is_err());
    }

    #[test]
    fn test_exp_of_zero_is_one() {
        assert_eq!(exp(Fixed::ZERO).unwrap(), Fixed::ONE);
    }

    #[test]
    fn test_exp_of_ln2_is_two_exactly() {
        let got = exp(Fixed::from_raw(LN2 as i128)).unwrap();
        assert_eq!(got, Fixed::from_int(2));
    }

    #[test]
    fn test_exp_of_one_near_e() {
        // true e·2^64 = 50143449209799256682; the polynomial is within
        // a few ulps of it
        assert_eq!(exp(Fixed::ONE).unwrap().raw(), 50143449209799256672);
    }

    #[test]
    fn test_exp_negative_input() {
        // true e^-1·2^64 = 6786177901268885274
        let got = exp(Fixed::from_int(-1)).unwrap();
        assert_eq!(got.raw(), 6786177901268885272);
    }

    #[test]
    fn test_exp_overflow_rejected() {
        assert!(exp(Fixed::from_int(44)).is_err());
        assert!(exp(Fixed::from_int(43)).is_ok());
    }

    #[test]
    fn test_exp_ln_roundtrip_within_ulps() {
        for v in [2i64, 3, 7, 100, 12345] {
            let x = Fixed::from_int(v);
            let back = exp(ln(x).unwrap()).unwrap();
            let diff = (back.raw() - x.raw()).unsigned_abs();
            assert!(diff < 2048, "roundtrip of {v} off by {diff} ulps");
        }
    }

    #[test]
    fn test_exp_neg_saturates_to_zero() {
        assert_eq!(exp_neg(64 * ONE), 0);
        assert_eq!(exp_neg(LN2), ONE / 2);
    }

    #[test]
    fn test_exp_neg_monotone_decreasing() {
        let mut prev = exp_neg(0);
        for i in 1..40u128 {
            let cur = exp_neg(i * ONE / 2);
            assert!(cur < prev, "exp_neg not decreasing at step {i}");
            prev = cur;
        }
    }

    #[test]
    fn test_floor_rounds_toward_negative_infinity() {
        assert_eq!(Fixed::from_raw(-1).floor(), -1);
        assert_eq!(Fixed::from_int(5).floor(), 5);
    }

    #[test]
    fn test_mul_div_small_operands() {
        assert_eq!(mul_div_floor(10, 7, 3), 23);
        assert_eq!(mul_div_floor(u128::MAX / 2, 2, 2), u128::MAX / 2);
    }

    #[test]
    fn test_mul_div_wide_product() {
        // (2^100)·(2^100) / 2^100 = 2^100 exercises the 256-bit path
        let big = 1u128 << 100;
        assert_eq!(mul_div_floor(big, big, big), big);
        // floor behavior on a non-exact wide quotient
        assert_eq!(mul_div_floor(big, 3, 7), (big * 3) / 7);
        assert_eq!(mul_div_floor(big, big + 1, big), big + 1);
    }

    #[test]
    fn test_mul_wide_halves() {
        let (hi, lo) = mul_wide(u128::MAX, u128::MAX);
        // (2^128 - 1)² = 2^256 - 2^129 + 1
        assert_eq!(lo, 1);
        assert_eq!(hi, u128::MAX - 1);
    }
}
