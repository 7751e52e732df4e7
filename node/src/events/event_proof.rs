// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Event Proof - Audit Trail Generation
//!
//! Proofs and audit artifacts derived from the event log (canonical truth).
//!
//! # Guarantee
//! Same genesis + same events → same proof, on any architecture.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use quintet_kernel::proof::{AuditArtifact, ReplayProof};
use quintet_kernel::{EventJournal, Hash32, KernelError, ReplayHarness, TransitionEngine};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::events::event_replay::{read_event_log, ReplayError};
use crate::persistence::SnapshotManager;

#[derive(Error, Debug)]
pub enum ProofError {
    #[error(transparent)]
    Replay(#[from] ReplayError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Kernel error: {0}")]
    Kernel(#[from] KernelError),
}

pub type Result<T> = std::result::Result<T, ProofError>;

/// Replay proof plus the identity of the genesis container it started from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventProof {
    pub replay: ReplayProof,
    /// BLAKE3 of the genesis snapshot file (the container, not the state).
    pub snapshot_hash: Hash32,
    pub committed: u64,
}

impl EventProof {
    /// Two proofs agree on everything replay determines.
    ///
    /// `snapshot_hash` is left out: the same genesis state can be stored in
    /// containers that differ byte for byte.
    pub fn matches(&self, other: &EventProof) -> bool {
        self.replay == other.replay && self.committed == other.committed
    }
}

/// BLAKE3 of the raw log file, header included.
///
/// Equals [`EventJournal::log_hash`] of the parsed entries for any log the
/// writer produced without a torn tail.
pub fn compute_event_log_hash(path: impl AsRef<Path>) -> std::io::Result<Hash32> {
    let mut file = File::open(path)?;
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(Hash32(*hasher.finalize().as_bytes()))
}

/// Replays the log from genesis and binds the result to both inputs.
pub fn generate_proof(genesis_path: impl AsRef<Path>, log_path: impl AsRef<Path>) -> Result<EventProof> {
    let genesis_bytes = std::fs::read(genesis_path.as_ref())?;
    let genesis = SnapshotManager::parse(&genesis_bytes).map_err(ReplayError::from)?;
    let contents = read_event_log(log_path).map_err(ReplayError::from)?;

    let report = ReplayHarness::new(genesis)
        .replay(&contents.entries)
        .map_err(ReplayError::from)?;
    let journal = EventJournal::from_entries(contents.entries);

    let proof = EventProof {
        replay: ReplayProof::new(
            report.genesis_hash,
            journal.log_hash()?,
            report.final_state_hash,
            report.entries_applied,
        ),
        snapshot_hash: Hash32(*blake3::hash(&genesis_bytes).as_bytes()),
        committed: report.committed,
    };
    info!(
        entries = proof.replay.entries,
        final_hash = %proof.replay.final_state_hash.short(),
        "proof generated"
    );
    Ok(proof)
}

/// Writes the engine's audit artifact as canonical JSON.
pub fn export_audit_artifact(engine: &TransitionEngine, tail: usize, path: impl AsRef<Path>) -> Result<AuditArtifact> {
    let artifact = engine.audit_artifact(tail);
    let json = artifact.to_canonical_json()?;
    std::fs::write(path.as_ref(), json)?;
    info!(path = %path.as_ref().display(), seq = artifact.sequence_id.0, "audit artifact exported");
    Ok(artifact)
}
