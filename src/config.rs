// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Configuration constants.

/// Number of decimal fractional digits carried by a `FixedPointValue`.
pub const DECIMALS: u32 = 18;

/// Scaling factor for the fixed-point representation (10^DECIMALS).
pub const SCALE: i128 = 1_000_000_000_000_000_000;

/// Domain tag mixed into every canonical state hash.
pub const STATE_HASH_DOMAIN: &[u8] = b"quintet/state/v1";

/// Domain tag mixed into action bundle hashes.
pub const ACTION_HASH_DOMAIN: &[u8] = b"quintet/action/v1";

/// Domain tag mixed into operation log digests.
pub const OPLOG_HASH_DOMAIN: &[u8] = b"quintet/oplog/v1";

/// Schema name written in every event log header.
pub const EVENT_LOG_SCHEMA: &str = "quintet-event-log";

/// Current event log schema version. Bump on any record layout change.
pub const EVENT_LOG_VERSION: u32 = 1;

/// Schema version of exported audit artifacts.
pub const AUDIT_SCHEMA_VERSION: u32 = 1;

/// Kernel protocol version recorded in replay proofs.
pub const KERNEL_PROTOCOL_VERSION: u64 = 1;

/// Number of incident records included in an audit export by default.
pub const DEFAULT_INCIDENT_TAIL: usize = 32;
