// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.

//! quintet-kernel: a deterministic, fixed-point, five-token ledger state machine.
//!
//! Every economic quantity is a [`fxp::FixedPointValue`]; every computation that
//! feeds a decision goes through [`fxp::ops::CertifiedMath`] and lands in an
//! append-only operation log. State only moves through
//! [`state::engine::TransitionEngine::submit`], and any recorded event log can be
//! re-executed by [`replay::ReplayHarness`] to the same canonical hash.

pub mod config;
pub mod error;
pub mod fxp;
pub mod types;
pub mod guard;
pub mod stability;
pub mod incident;
pub mod state;
pub mod snapshot;
pub mod signing;
pub mod event;
pub mod replay;
pub mod proof;

pub use error::{ArithmeticError, KernelError, KernelResult};
pub use event::{EventJournal, EventLogHeader, EventRecord, LogEntry, Outcome};
pub use fxp::FixedPointValue;
pub use replay::{ReplayError, ReplayHarness, ReplayReport};
pub use snapshot::Hash32;
pub use state::{ActionBundle, GenesisSpec, TokenStateBundle, TransitionContext, TransitionEngine, TransitionOutcome};

#[cfg(test)]
pub mod tests;
