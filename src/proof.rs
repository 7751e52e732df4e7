// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Deterministic proof and audit export structures.

use serde::{Deserialize, Serialize};

use crate::config::{AUDIT_SCHEMA_VERSION, KERNEL_PROTOCOL_VERSION};
use crate::error::Result;
use crate::incident::IncidentRecord;
use crate::snapshot::canonical::to_canonical_json;
use crate::snapshot::hash::Hash32;
use crate::state::engine::{EngineStatus, TransitionEngine};
use crate::types::{Parameters, SequenceId};

/// Snapshot export for external verification tooling.
///
/// Self-contained: a verifier can check `state_hash` against a replay of the
/// event log without access to the live process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditArtifact {
    pub schema_version: u32,
    pub state_hash: Hash32,
    pub sequence_id: SequenceId,
    pub parameters: Parameters,
    pub incident_log_tail: Vec<IncidentRecord>,
    /// Head of the chained audit trail of committed operation logs.
    pub operation_log_digest: Hash32,
    pub status: EngineStatus,
}

impl AuditArtifact {
    pub fn from_engine(engine: &TransitionEngine, tail: usize) -> Self {
        Self {
            schema_version: AUDIT_SCHEMA_VERSION,
            state_hash: engine.state_hash(),
            sequence_id: engine.sequence_id(),
            parameters: engine.state().parameters().clone(),
            incident_log_tail: engine.incidents().tail(tail).to_vec(),
            operation_log_digest: engine.audit().head(),
            status: engine.status(),
        }
    }

    pub fn to_canonical_json(&self) -> Result<String> {
        to_canonical_json(self)
    }
}

/// A receipt that a specific event log, replayed from a specific genesis,
/// ends in a specific state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplayProof {
    pub kernel_version: u64,
    /// State hash of the starting bundle.
    pub genesis_hash: Hash32,
    /// BLAKE3 of the canonical event log.
    pub event_log_hash: Hash32,
    pub final_state_hash: Hash32,
    pub entries: u64,
}

impl ReplayProof {
    pub fn new(genesis_hash: Hash32, event_log_hash: Hash32, final_state_hash: Hash32, entries: u64) -> Self {
        Self {
            kernel_version: KERNEL_PROTOCOL_VERSION,
            genesis_hash,
            event_log_hash,
            final_state_hash,
            entries,
        }
    }
}
