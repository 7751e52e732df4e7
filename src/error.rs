// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Error types.

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::guard::violation::ViolationReport;
use crate::incident::IncidentCode;

/// Arithmetic operation tags, shared by errors and the operation log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    DivFloor,
    MulDivFloor,
    Pow,
    Clamp,
    Abs,
    Neg,
    Sum,
}

impl ArithOp {
    /// Stable code used in operation log digests.
    pub const fn code(self) -> u8 {
        match self {
            ArithOp::Add => 1,
            ArithOp::Sub => 2,
            ArithOp::Mul => 3,
            ArithOp::DivFloor => 4,
            ArithOp::MulDivFloor => 5,
            ArithOp::Pow => 6,
            ArithOp::Clamp => 7,
            ArithOp::Abs => 8,
            ArithOp::Neg => 9,
            ArithOp::Sum => 10,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ArithOp::Add => "add",
            ArithOp::Sub => "sub",
            ArithOp::Mul => "mul",
            ArithOp::DivFloor => "div_floor",
            ArithOp::MulDivFloor => "mul_div_floor",
            ArithOp::Pow => "pow",
            ArithOp::Clamp => "clamp",
            ArithOp::Abs => "abs",
            ArithOp::Neg => "neg",
            ArithOp::Sum => "sum",
        }
    }
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single fixed-point operation. Never wrapped, never corrected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithmeticError {
    #[error("overflow in {0}")]
    Overflow(ArithOp),
    #[error("underflow in {0}")]
    Underflow(ArithOp),
    #[error("division by zero in {0}")]
    DivisionByZero(ArithOp),
    #[error("invalid clamp bounds: min exceeds max")]
    InvalidBounds,
}

impl ArithmeticError {
    /// Stable code used in operation log digests.
    pub const fn code(&self) -> u8 {
        match self {
            ArithmeticError::Overflow(_) => 1,
            ArithmeticError::Underflow(_) => 2,
            ArithmeticError::DivisionByZero(_) => 3,
            ArithmeticError::InvalidBounds => 4,
        }
    }
}

/// Rejected fixed-point literal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseFixedError {
    #[error("empty literal")]
    Empty,
    #[error("invalid character {0:?} in literal")]
    InvalidDigit(char),
    #[error("more than {max} fractional digits")]
    TooManyFractionDigits { max: u32 },
    #[error("literal out of range")]
    OutOfRange,
}

#[derive(Error, Debug)]
pub enum KernelError {
    #[error("arithmetic error: {0}")]
    Arithmetic(#[from] ArithmeticError),

    #[error("invalid fixed-point literal: {0}")]
    Parse(#[from] ParseFixedError),

    #[error("invalid genesis state: {0}")]
    InvalidGenesis(Box<ViolationReport>),

    #[error("engine halted by incident {code}; operator clearance required")]
    EngineHalted { code: IncidentCode },

    #[error("engine is not halted")]
    NotHalted,

    #[error("canonical encoding failed: {0}")]
    Encoding(String),

    #[error("unsupported schema {schema:?} version {version}")]
    UnsupportedSchema { schema: String, version: u32 },
}

impl From<serde_json::Error> for KernelError {
    fn from(e: serde_json::Error) -> Self {
        KernelError::Encoding(e.to_string())
    }
}

pub type KernelResult<T> = core::result::Result<T, KernelError>;
pub type Result<T> = KernelResult<T>;
