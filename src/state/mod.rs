// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod action;
pub mod audit;
pub mod bundle;
pub mod engine;

pub use action::{
    ActionBundle, ActionKind, ActorContext, Allocation, CostInputs, Direction, DirectionSignal, TransitionContext,
};
pub use audit::{AuditEntry, AuditTrail};
pub use bundle::{GenesisSpec, RewardLedger, TokenStateBundle};
pub use engine::{CommitReceipt, EngineStatus, Rejection, TransitionEngine, TransitionOutcome, TransitionPhase};
