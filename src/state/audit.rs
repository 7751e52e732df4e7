// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Append-only audit trail of committed transitions' operation logs.

use serde::{Deserialize, Serialize};

use crate::fxp::{OperationLog, OperationLogEntry};
use crate::snapshot::hash::Hash32;
use crate::types::SequenceId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub sequence_id: SequenceId,
    pub correlation_id: String,
    pub digest: Hash32,
    pub operations: Vec<OperationLogEntry>,
}

/// Entries are chained: `head = BLAKE3(head || sequence_id LE || digest)`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrail {
    entries: Vec<AuditEntry>,
    head: Hash32,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flushes one transition's operation log.
    pub fn record(&mut self, sequence_id: SequenceId, correlation_id: &str, log: OperationLog) -> Hash32 {
        let digest = log.digest();

        let mut hasher = blake3::Hasher::new();
        hasher.update(self.head.as_bytes());
        hasher.update(&sequence_id.0.to_le_bytes());
        hasher.update(digest.as_bytes());
        self.head = Hash32(*hasher.finalize().as_bytes());

        self.entries.push(AuditEntry {
            sequence_id,
            correlation_id: correlation_id.to_string(),
            digest,
            operations: log.into_entries(),
        });
        digest
    }

    pub fn head(&self) -> Hash32 {
        self.head
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for a committed sequence id.
    pub fn entry(&self, sequence_id: SequenceId) -> Option<&AuditEntry> {
        self.entries.iter().find(|e| e.sequence_id == sequence_id)
    }
}
