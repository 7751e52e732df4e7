// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! 256-bit unsigned intermediate for exact multiply-then-divide.

use crate::error::{ArithOp, ArithmeticError};

const LOW_MASK: u128 = u64::MAX as u128;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct U256 {
    hi: u128,
    lo: u128,
}

impl U256 {
    /// Full 128x128 -> 256 bit product.
    pub(crate) fn widening_mul(a: u128, b: u128) -> Self {
        let (a1, a0) = (a >> 64, a & LOW_MASK);
        let (b1, b0) = (b >> 64, b & LOW_MASK);

        let p00 = a0 * b0;
        let p01 = a0 * b1;
        let p10 = a1 * b0;
        let p11 = a1 * b1;

        // Each partial product is < 2^128; the middle column fits in < 3 * 2^64.
        let mid = (p00 >> 64) + (p01 & LOW_MASK) + (p10 & LOW_MASK);
        let lo = (p00 & LOW_MASK) | ((mid & LOW_MASK) << 64);
        let hi = p11 + (p01 >> 64) + (p10 >> 64) + (mid >> 64);

        Self { hi, lo }
    }

    /// Truncating division by a non-zero divisor.
    ///
    /// Returns `None` when the quotient does not fit in 128 bits.
    pub(crate) fn div_rem(self, divisor: u128) -> Option<(u128, u128)> {
        debug_assert!(divisor != 0);
        if self.hi >= divisor {
            return None;
        }

        let mut rem = self.hi;
        let mut quot: u128 = 0;
        for i in (0..128).rev() {
            let carry = rem >> 127 == 1;
            rem = (rem << 1) | ((self.lo >> i) & 1);
            quot <<= 1;
            if carry || rem >= divisor {
                rem = rem.wrapping_sub(divisor);
                quot |= 1;
            }
        }
        Some((quot, rem))
    }
}

/// `floor(a * b / d)` over signed 128-bit operands, exact.
///
/// The product is formed at 256 bits and divided once, so the only rounding
/// is the final step toward negative infinity.
pub(crate) fn mul_div_floor(a: i128, b: i128, d: i128, op: ArithOp) -> Result<i128, ArithmeticError> {
    if d == 0 {
        return Err(ArithmeticError::DivisionByZero(op));
    }
    if a == 0 || b == 0 {
        return Ok(0);
    }

    let negative = (a < 0) ^ (b < 0) ^ (d < 0);
    let product = U256::widening_mul(a.unsigned_abs(), b.unsigned_abs());
    let overflow = if negative {
        ArithmeticError::Underflow(op)
    } else {
        ArithmeticError::Overflow(op)
    };

    let (quot, rem) = product.div_rem(d.unsigned_abs()).ok_or(overflow)?;

    if negative {
        let magnitude = if rem != 0 {
            quot.checked_add(1).ok_or(overflow)?
        } else {
            quot
        };
        const MIN_MAGNITUDE: u128 = 1u128 << 127;
        if magnitude > MIN_MAGNITUDE {
            return Err(overflow);
        }
        if magnitude == MIN_MAGNITUDE {
            return Ok(i128::MIN);
        }
        Ok(-(magnitude as i128))
    } else {
        if quot > i128::MAX as u128 {
            return Err(overflow);
        }
        Ok(quot as i128)
    }
}
