// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Exact decimal fixed-point value (scale 10^18) over `i128`.
//!
//! There is no float constructor and no approximate equality. Literals go
//! through [`FixedPointValue::parse`], integers through
//! [`FixedPointValue::from_int`] / [`FixedPointValue::from_integer`].

use core::fmt;
use core::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

use crate::config::{DECIMALS, SCALE};
use crate::error::{ArithOp, ArithmeticError, ParseFixedError};
use crate::fxp::wide::mul_div_floor;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct FixedPointValue(i128);

impl FixedPointValue {
    pub const ZERO: FixedPointValue = FixedPointValue(0);
    pub const ONE: FixedPointValue = FixedPointValue(SCALE);
    pub const MAX: FixedPointValue = FixedPointValue(i128::MAX);
    pub const MIN: FixedPointValue = FixedPointValue(i128::MIN);

    /// Wraps an already-scaled integer.
    pub const fn from_raw(raw: i128) -> Self {
        FixedPointValue(raw)
    }

    pub const fn raw(self) -> i128 {
        self.0
    }

    /// Whole-unit constructor. Every `i64` fits, so this cannot fail.
    pub const fn from_int(units: i64) -> Self {
        FixedPointValue(units as i128 * SCALE)
    }

    /// Constructor for thousandths, used for ratio constants (`milli(250)` = 0.25).
    pub const fn milli(thousandths: i64) -> Self {
        FixedPointValue(thousandths as i128 * (SCALE / 1_000))
    }

    /// Whole-unit constructor for wide integers.
    pub fn from_integer(units: i128) -> Result<Self, ArithmeticError> {
        units.checked_mul(SCALE).map(FixedPointValue).ok_or(if units < 0 {
            ArithmeticError::Underflow(ArithOp::Mul)
        } else {
            ArithmeticError::Overflow(ArithOp::Mul)
        })
    }

    /// Parses `[+-]digits[.digits]` with at most 18 fractional digits.
    ///
    /// Excess precision is rejected rather than rounded.
    pub fn parse(literal: &str) -> Result<Self, ParseFixedError> {
        let (negative, body) = match literal.as_bytes().first() {
            None => return Err(ParseFixedError::Empty),
            Some(b'-') => (true, &literal[1..]),
            Some(b'+') => (false, &literal[1..]),
            Some(_) => (false, literal),
        };
        let (int_part, frac_part) = match body.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (body, None),
        };
        if int_part.is_empty() && frac_part.map_or(true, str::is_empty) {
            return Err(ParseFixedError::Empty);
        }

        // Unsigned, so `MIN` (one more than `MAX` in magnitude) parses.
        let mut magnitude: u128 = 0;
        for c in int_part.chars() {
            let digit = c.to_digit(10).ok_or(ParseFixedError::InvalidDigit(c))?;
            magnitude = magnitude
                .checked_mul(10)
                .and_then(|m| m.checked_add(digit as u128))
                .ok_or(ParseFixedError::OutOfRange)?;
        }
        magnitude = magnitude.checked_mul(SCALE as u128).ok_or(ParseFixedError::OutOfRange)?;

        if let Some(frac) = frac_part {
            if frac.len() > DECIMALS as usize {
                return Err(ParseFixedError::TooManyFractionDigits { max: DECIMALS });
            }
            let mut frac_raw: u128 = 0;
            for c in frac.chars() {
                let digit = c.to_digit(10).ok_or(ParseFixedError::InvalidDigit(c))?;
                frac_raw = frac_raw * 10 + digit as u128;
            }
            frac_raw *= 10u128.pow(DECIMALS - frac.len() as u32);
            magnitude = magnitude.checked_add(frac_raw).ok_or(ParseFixedError::OutOfRange)?;
        }

        let raw = if negative {
            if magnitude > i128::MIN.unsigned_abs() {
                return Err(ParseFixedError::OutOfRange);
            }
            // Wraps only for `i128::MIN.unsigned_abs()`, which lands on `i128::MIN`.
            (magnitude as i128).wrapping_neg()
        } else {
            i128::try_from(magnitude).map_err(|_| ParseFixedError::OutOfRange)?
        };
        Ok(FixedPointValue(raw))
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub const fn signum(self) -> i8 {
        if self.0 > 0 {
            1
        } else if self.0 < 0 {
            -1
        } else {
            0
        }
    }

    /// Canonical little-endian encoding used by state hashing.
    pub const fn to_le_bytes(self) -> [u8; 16] {
        self.0.to_le_bytes()
    }

    // --- Checked primitives (unlogged; `CertifiedMath` wraps these) ---

    pub fn checked_add(self, rhs: Self) -> Result<Self, ArithmeticError> {
        self.0.checked_add(rhs.0).map(FixedPointValue).ok_or(if rhs.0 > 0 {
            ArithmeticError::Overflow(ArithOp::Add)
        } else {
            ArithmeticError::Underflow(ArithOp::Add)
        })
    }

    pub fn checked_sub(self, rhs: Self) -> Result<Self, ArithmeticError> {
        self.0.checked_sub(rhs.0).map(FixedPointValue).ok_or(if rhs.0 < 0 {
            ArithmeticError::Overflow(ArithOp::Sub)
        } else {
            ArithmeticError::Underflow(ArithOp::Sub)
        })
    }

    /// Product rescaled by floor division.
    pub fn checked_mul(self, rhs: Self) -> Result<Self, ArithmeticError> {
        mul_div_floor(self.0, rhs.0, SCALE, ArithOp::Mul).map(FixedPointValue)
    }

    /// Quotient rounded toward negative infinity.
    pub fn checked_div_floor(self, rhs: Self) -> Result<Self, ArithmeticError> {
        mul_div_floor(self.0, SCALE, rhs.0, ArithOp::DivFloor).map(FixedPointValue)
    }

    /// `floor(self * numerator / denominator)` with a single rounding step.
    pub fn checked_mul_div_floor(self, numerator: Self, denominator: Self) -> Result<Self, ArithmeticError> {
        mul_div_floor(self.0, numerator.0, denominator.0, ArithOp::MulDivFloor).map(FixedPointValue)
    }

    /// Square-and-multiply power; each intermediate product is floored.
    pub fn checked_pow(self, exponent: u32) -> Result<Self, ArithmeticError> {
        let relabel = |e: ArithmeticError| match e {
            ArithmeticError::Overflow(_) => ArithmeticError::Overflow(ArithOp::Pow),
            ArithmeticError::Underflow(_) => ArithmeticError::Underflow(ArithOp::Pow),
            other => other,
        };
        let mut result = FixedPointValue::ONE;
        let mut base = self;
        let mut exp = exponent;
        while exp > 0 {
            if exp & 1 == 1 {
                result = result.checked_mul(base).map_err(relabel)?;
            }
            exp >>= 1;
            if exp > 0 {
                base = base.checked_mul(base).map_err(relabel)?;
            }
        }
        Ok(result)
    }

    pub fn checked_abs(self) -> Result<Self, ArithmeticError> {
        self.0
            .checked_abs()
            .map(FixedPointValue)
            .ok_or(ArithmeticError::Overflow(ArithOp::Abs))
    }

    pub fn checked_neg(self) -> Result<Self, ArithmeticError> {
        self.0
            .checked_neg()
            .map(FixedPointValue)
            .ok_or(ArithmeticError::Overflow(ArithOp::Neg))
    }

    pub fn checked_clamp(self, min: Self, max: Self) -> Result<Self, ArithmeticError> {
        if min > max {
            return Err(ArithmeticError::InvalidBounds);
        }
        Ok(self.max(min).min(max))
    }
}

impl fmt::Display for FixedPointValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.0.unsigned_abs();
        let scale = SCALE as u128;
        let int = magnitude / scale;
        let frac = magnitude % scale;
        if self.0 < 0 {
            f.write_str("-")?;
        }
        if frac == 0 {
            return write!(f, "{}", int);
        }
        let digits = format!("{:0width$}", frac, width = DECIMALS as usize);
        write!(f, "{}.{}", int, digits.trim_end_matches('0'))
    }
}

impl fmt::Debug for FixedPointValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FixedPointValue({})", self)
    }
}

impl FromStr for FixedPointValue {
    type Err = ParseFixedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FixedPointValue::parse(s)
    }
}

// Decimal string in human-readable formats (canonical JSON), raw i128 otherwise.
impl Serialize for FixedPointValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            serializer.serialize_i128(self.0)
        }
    }
}

impl<'de> Deserialize<'de> for FixedPointValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let literal = String::deserialize(deserializer)?;
            FixedPointValue::parse(&literal).map_err(de::Error::custom)
        } else {
            i128::deserialize(deserializer).map(FixedPointValue)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_are_exact() {
        let v = FixedPointValue::parse("123.456").unwrap();
        assert_eq!(v.raw(), 123_456_000_000_000_000_000);
        assert_eq!(v.to_string(), "123.456");
        assert_eq!(FixedPointValue::parse("-0.000000000000000001").unwrap().raw(), -1);
        assert_eq!(FixedPointValue::parse("10000000").unwrap(), FixedPointValue::from_int(10_000_000));
        assert_eq!(FixedPointValue::parse(".5").unwrap(), FixedPointValue::milli(500));
        assert_eq!(FixedPointValue::from_int(-3).to_string(), "-3");
    }

    #[test]
    fn parse_rejects_garbage_and_excess_precision() {
        assert_eq!(FixedPointValue::parse(""), Err(ParseFixedError::Empty));
        assert_eq!(FixedPointValue::parse("-"), Err(ParseFixedError::Empty));
        assert_eq!(FixedPointValue::parse("1e5"), Err(ParseFixedError::InvalidDigit('e')));
        assert_eq!(
            FixedPointValue::parse("0.1234567890123456789"),
            Err(ParseFixedError::TooManyFractionDigits { max: 18 })
        );
        assert_eq!(
            FixedPointValue::parse("999999999999999999999999"),
            Err(ParseFixedError::OutOfRange)
        );
    }

    #[test]
    fn json_uses_decimal_strings() {
        let v = FixedPointValue::milli(250);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "\"0.25\"");
        let back: FixedPointValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn extremes_survive_display_and_json() {
        for v in [
            FixedPointValue::MIN,
            FixedPointValue::MAX,
            FixedPointValue::from_raw(1),
            FixedPointValue::from_raw(-1),
            FixedPointValue::from_raw(i128::MIN + 1),
        ] {
            let text = v.to_string();
            assert_eq!(FixedPointValue::parse(&text), Ok(v), "{text}");
            let json = serde_json::to_string(&v).unwrap();
            assert_eq!(serde_json::from_str::<FixedPointValue>(&json).unwrap(), v);
        }
        assert_eq!(
            FixedPointValue::MIN.to_string(),
            "-170141183460469231731.687303715884105728"
        );
    }

    #[test]
    fn one_past_either_extreme_is_out_of_range() {
        assert_eq!(
            FixedPointValue::parse("-170141183460469231731.687303715884105729"),
            Err(ParseFixedError::OutOfRange)
        );
        assert_eq!(
            FixedPointValue::parse("170141183460469231731.687303715884105728"),
            Err(ParseFixedError::OutOfRange)
        );
    }
}
