// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Certified fixed-point operations.
//!
//! Every call goes through [`CertifiedMath`], which performs the checked
//! operation and appends one [`OperationLogEntry`] to the caller's
//! [`OperationLog`], failures included. No hidden state, no clock, no RNG.
//!
//! Rounding: `mul`, `div_floor`, `mul_div_floor` and `pow` round toward
//! negative infinity. Call sites that split amounts must account for the
//! remainder themselves.

use serde::{Deserialize, Serialize};

use crate::config::OPLOG_HASH_DOMAIN;
use crate::error::{ArithOp, ArithmeticError};
use crate::fxp::value::FixedPointValue;
use crate::snapshot::hash::Hash32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationResult {
    Value(FixedPointValue),
    Error(ArithmeticError),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationLogEntry {
    pub sequence_index: u64,
    pub operation: ArithOp,
    pub operands: Vec<FixedPointValue>,
    pub result: OperationResult,
    pub correlation_id: String,
}

/// Append-only, insertion-ordered record of certified operations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationLog {
    entries: Vec<OperationLogEntry>,
}

impl OperationLog {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[OperationLogEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<OperationLogEntry> {
        self.entries
    }

    fn append(
        &mut self,
        operation: ArithOp,
        operands: Vec<FixedPointValue>,
        result: OperationResult,
        correlation_id: &str,
    ) {
        let sequence_index = self.entries.len() as u64;
        self.entries.push(OperationLogEntry {
            sequence_index,
            operation,
            operands,
            result,
            correlation_id: correlation_id.to_string(),
        });
    }

    /// BLAKE3 digest over the entries in insertion order.
    ///
    /// # Hash Input Structure
    /// ```text
    /// domain tag
    /// For each entry:
    ///   sequence_index (u64 LE)
    ///   op code (u8)
    ///   operand count (u32 LE), operands (i128 LE each)
    ///   result tag (u8: 0 = value, 1 = error) + raw (i128 LE) or error code (u8)
    ///   correlation_id length (u32 LE) + UTF-8 bytes
    /// ```
    pub fn digest(&self) -> Hash32 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(OPLOG_HASH_DOMAIN);
        for entry in &self.entries {
            hasher.update(&entry.sequence_index.to_le_bytes());
            hasher.update(&[entry.operation.code()]);
            hasher.update(&(entry.operands.len() as u32).to_le_bytes());
            for operand in &entry.operands {
                hasher.update(&operand.to_le_bytes());
            }
            match entry.result {
                OperationResult::Value(v) => {
                    hasher.update(&[0]);
                    hasher.update(&v.to_le_bytes());
                }
                OperationResult::Error(e) => {
                    hasher.update(&[1, e.code()]);
                }
            }
            hasher.update(&(entry.correlation_id.len() as u32).to_le_bytes());
            hasher.update(entry.correlation_id.as_bytes());
        }
        Hash32(*hasher.finalize().as_bytes())
    }
}

/// Logged arithmetic bound to one operation log and one correlation id.
pub struct CertifiedMath<'a> {
    log: &'a mut OperationLog,
    correlation_id: &'a str,
}

impl<'a> CertifiedMath<'a> {
    pub fn new(log: &'a mut OperationLog, correlation_id: &'a str) -> Self {
        Self { log, correlation_id }
    }

    pub fn correlation_id(&self) -> &str {
        self.correlation_id
    }

    fn record(
        &mut self,
        op: ArithOp,
        operands: Vec<FixedPointValue>,
        outcome: Result<FixedPointValue, ArithmeticError>,
    ) -> Result<FixedPointValue, ArithmeticError> {
        let result = match outcome {
            Ok(v) => OperationResult::Value(v),
            Err(e) => OperationResult::Error(e),
        };
        self.log.append(op, operands, result, self.correlation_id);
        outcome
    }

    pub fn add(&mut self, a: FixedPointValue, b: FixedPointValue) -> Result<FixedPointValue, ArithmeticError> {
        self.record(ArithOp::Add, vec![a, b], a.checked_add(b))
    }

    pub fn sub(&mut self, a: FixedPointValue, b: FixedPointValue) -> Result<FixedPointValue, ArithmeticError> {
        self.record(ArithOp::Sub, vec![a, b], a.checked_sub(b))
    }

    /// `a * b`, rescaled with floor rounding.
    pub fn mul(&mut self, a: FixedPointValue, b: FixedPointValue) -> Result<FixedPointValue, ArithmeticError> {
        self.record(ArithOp::Mul, vec![a, b], a.checked_mul(b))
    }

    /// `a / b` rounded toward negative infinity.
    pub fn div_floor(&mut self, a: FixedPointValue, b: FixedPointValue) -> Result<FixedPointValue, ArithmeticError> {
        self.record(ArithOp::DivFloor, vec![a, b], a.checked_div_floor(b))
    }

    /// `a * b / c` with one floor step at the end.
    pub fn mul_div_floor(
        &mut self,
        a: FixedPointValue,
        b: FixedPointValue,
        c: FixedPointValue,
    ) -> Result<FixedPointValue, ArithmeticError> {
        self.record(ArithOp::MulDivFloor, vec![a, b, c], a.checked_mul_div_floor(b, c))
    }

    /// Integer power; the exponent is logged as a whole-unit operand.
    pub fn pow(&mut self, base: FixedPointValue, exponent: u32) -> Result<FixedPointValue, ArithmeticError> {
        let outcome = base.checked_pow(exponent);
        self.record(ArithOp::Pow, vec![base, FixedPointValue::from_int(exponent as i64)], outcome)
    }

    pub fn clamp(
        &mut self,
        v: FixedPointValue,
        min: FixedPointValue,
        max: FixedPointValue,
    ) -> Result<FixedPointValue, ArithmeticError> {
        self.record(ArithOp::Clamp, vec![v, min, max], v.checked_clamp(min, max))
    }

    pub fn abs(&mut self, v: FixedPointValue) -> Result<FixedPointValue, ArithmeticError> {
        self.record(ArithOp::Abs, vec![v], v.checked_abs())
    }

    pub fn neg(&mut self, v: FixedPointValue) -> Result<FixedPointValue, ArithmeticError> {
        self.record(ArithOp::Neg, vec![v], v.checked_neg())
    }

    /// Sum of all operands, logged as a single entry.
    pub fn sum<I>(&mut self, values: I) -> Result<FixedPointValue, ArithmeticError>
    where
        I: IntoIterator<Item = FixedPointValue>,
    {
        let operands: Vec<FixedPointValue> = values.into_iter().collect();
        let mut outcome = Ok(FixedPointValue::ZERO);
        for v in &operands {
            outcome = outcome.and_then(|acc: FixedPointValue| acc.checked_add(*v));
        }
        let outcome = outcome.map_err(|e| match e {
            ArithmeticError::Overflow(_) => ArithmeticError::Overflow(ArithOp::Sum),
            ArithmeticError::Underflow(_) => ArithmeticError::Underflow(ArithOp::Sum),
            other => other,
        });
        self.record(ArithOp::Sum, operands, outcome)
    }
}
