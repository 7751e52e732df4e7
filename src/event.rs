// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Event Log as Primary Truth
//!
//! Every submission that reaches a terminal phase, and every operator action
//! that changes how later submissions are treated, is recorded as a
//! [`LogEntry`]. Replaying the entries from the same genesis reproduces the
//! same state hash after every entry.
//!
//! # Determinism Guarantees
//! - Timestamps are the injected ones carried by the bundles
//! - No randomness, no wall clock
//! - Entries are numbered densely from 1 in log order
//!
//! # Invariants
//! - Same genesis + same log => same final state hash, on any architecture
//! - Entries are immutable once appended

use serde::{Deserialize, Serialize};

use crate::config::{EVENT_LOG_SCHEMA, EVENT_LOG_VERSION};
use crate::error::{KernelError, Result};
use crate::guard::violation::ViolationKind;
use crate::incident::QuarantineTarget;
use crate::snapshot::canonical::to_canonical_json;
use crate::snapshot::hash::{hash_bytes, Hash32};
use crate::state::action::{ActionBundle, TransitionContext};
use crate::state::engine::TransitionOutcome;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Committed,
    Rejected,
    Halted,
}

/// A submitted bundle and what became of it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the log.
    pub sequence_id: u64,
    pub context: TransitionContext,
    pub action_bundle: ActionBundle,
    pub outcome: Outcome,
    /// Canonical state hash after this entry; unchanged on rejection.
    pub resulting_state_hash: Hash32,
    #[serde(default)]
    pub violation_kind: Option<ViolationKind>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "entry", rename_all = "snake_case")]
pub enum LogEntry {
    Action(EventRecord),
    HaltCleared { sequence_id: u64, operator: String },
    QuarantineReleased { sequence_id: u64, target: QuarantineTarget },
}

impl LogEntry {
    pub fn sequence_id(&self) -> u64 {
        match self {
            LogEntry::Action(r) => r.sequence_id,
            LogEntry::HaltCleared { sequence_id, .. } | LogEntry::QuarantineReleased { sequence_id, .. } => {
                *sequence_id
            }
        }
    }

    pub fn entry_type(&self) -> &'static str {
        match self {
            LogEntry::Action(_) => "action",
            LogEntry::HaltCleared { .. } => "halt_cleared",
            LogEntry::QuarantineReleased { .. } => "quarantine_released",
        }
    }

    pub fn to_canonical_json(&self) -> Result<String> {
        to_canonical_json(self)
    }
}

/// First line of every persisted log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLogHeader {
    pub schema: String,
    pub version: u32,
}

impl EventLogHeader {
    pub fn current() -> Self {
        Self {
            schema: EVENT_LOG_SCHEMA.to_string(),
            version: EVENT_LOG_VERSION,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema != EVENT_LOG_SCHEMA || self.version != EVENT_LOG_VERSION {
            return Err(KernelError::UnsupportedSchema {
                schema: self.schema.clone(),
                version: self.version,
            });
        }
        Ok(())
    }
}

/// In-memory, append-only sequence of log entries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventJournal {
    entries: Vec<LogEntry>,
}

impl EventJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<LogEntry>) -> Self {
        Self { entries }
    }

    /// Position the next entry will take.
    pub fn next_sequence_id(&self) -> u64 {
        self.entries.len() as u64 + 1
    }

    /// Builds (without appending) the record for a finished submission.
    pub fn action_entry(
        &self,
        bundle: ActionBundle,
        context: TransitionContext,
        outcome: &TransitionOutcome,
        resulting_state_hash: Hash32,
    ) -> LogEntry {
        LogEntry::Action(EventRecord {
            sequence_id: self.next_sequence_id(),
            context,
            action_bundle: bundle,
            outcome: outcome.outcome(),
            resulting_state_hash,
            violation_kind: outcome.violation_kind(),
        })
    }

    pub fn halt_cleared_entry(&self, operator: &str) -> LogEntry {
        LogEntry::HaltCleared {
            sequence_id: self.next_sequence_id(),
            operator: operator.to_string(),
        }
    }

    pub fn quarantine_released_entry(&self, target: QuarantineTarget) -> LogEntry {
        LogEntry::QuarantineReleased {
            sequence_id: self.next_sequence_id(),
            target,
        }
    }

    pub fn append(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<LogEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// BLAKE3 over the header line and every entry's canonical JSON line.
    pub fn log_hash(&self) -> Result<Hash32> {
        let mut bytes = to_canonical_json(&EventLogHeader::current())?.into_bytes();
        bytes.push(b'\n');
        for entry in &self.entries {
            bytes.extend_from_slice(entry.to_canonical_json()?.as_bytes());
            bytes.push(b'\n');
        }
        Ok(hash_bytes(&bytes))
    }
}
