// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Fixed-point numeric substrate.
//!
//! `value` holds the exact decimal type, `wide` the 256-bit intermediate used by
//! multiplication and division, `ops` the certified (logged) operations.

pub mod ops;
pub mod value;
mod wide;

pub use ops::{CertifiedMath, OperationLog, OperationLogEntry, OperationResult};
pub use value::FixedPointValue;
