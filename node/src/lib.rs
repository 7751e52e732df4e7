// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! quintet-node: durable hosting for the quintet kernel.
//!
//! Genesis snapshots, the append-only event log, crash recovery by replay,
//! proofs over the log, and telemetry.
pub mod config;
pub mod events;
pub mod persistence;
pub mod signer;
pub mod telemetry;

pub use config::NodeConfig;
pub use events::EventCommitter;
