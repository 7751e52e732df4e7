// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Event Commit - The Safety Wall
//!
//! Every state change of a running node goes through [`EventCommitter`]:
//! 1. The kernel evaluates the submission (all phases, all guards)
//! 2. The resulting log entry is appended to the event log (fsync)
//! 3. The in-memory journal records the entry
//!
//! The kernel keeps the pre-transition state until its own commit point, so
//! a rejected or halting submission leaves the ledger untouched; it is still
//! logged, because replay must reproduce it.
//!
//! # Invariants
//! - Journal == event log on disk, entry for entry
//! - A failed append poisons the committer: the in-memory engine is ahead of
//!   the disk and must be rebuilt from the log before serving again

use std::path::Path;
use std::time::Instant;

use quintet_kernel::incident::QuarantineTarget;
use quintet_kernel::signing::CommitSigner;
use quintet_kernel::{
    ActionBundle, EventJournal, KernelError, LogEntry, TokenStateBundle, TransitionContext, TransitionEngine,
    TransitionOutcome,
};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::NodeConfig;
use crate::events::event_log::{EventLogError, EventLogWriter};
use crate::events::event_replay::{recover_from_event_log, ReplayError};
use crate::persistence::{SnapshotError, SnapshotManager};
use crate::signer::KeyedHashSigner;

#[derive(Error, Debug)]
pub enum CommitError {
    #[error("Event log error: {0}")]
    EventLog(#[from] EventLogError),

    #[error("Kernel error: {0}")]
    Kernel(#[from] KernelError),

    #[error("Recovery failed: {0}")]
    Replay(#[from] ReplayError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("an earlier append failed; recover from the event log before submitting again")]
    Poisoned,

    #[error("event log already exists at {0}")]
    AlreadyInitialized(String),

    #[error("event log holds {log} entries but the journal holds {journal}")]
    LogMismatch { log: u64, journal: u64 },
}

pub type Result<T> = std::result::Result<T, CommitError>;

/// Engine + journal + durable log, kept in lockstep.
pub struct EventCommitter {
    engine: TransitionEngine,
    journal: EventJournal,
    log: EventLogWriter,
    poisoned: bool,
}

impl EventCommitter {
    /// Pairs an engine and journal with an already-open log.
    pub fn new(engine: TransitionEngine, journal: EventJournal, log: EventLogWriter) -> Result<Self> {
        if log.entry_count() != journal.len() as u64 {
            return Err(CommitError::LogMismatch {
                log: log.entry_count(),
                journal: journal.len() as u64,
            });
        }
        Ok(Self {
            engine,
            journal,
            log,
            poisoned: false,
        })
    }

    /// Initializes a fresh data directory: genesis snapshot plus an empty log.
    pub fn create(config: &NodeConfig, genesis: TokenStateBundle) -> Result<Self> {
        if config.event_log_path.exists() {
            return Err(CommitError::AlreadyInitialized(config.event_log_path.display().to_string()));
        }
        let engine = attach_signer(TransitionEngine::new(genesis)?, config);
        SnapshotManager::save(&config.snapshot_path, engine.state())?;
        let log = EventLogWriter::open(&config.event_log_path, config.fsync)?;
        info!(genesis = %engine.state_hash().short(), "data directory initialized");
        Self::new(engine, EventJournal::new(), log)
    }

    /// Restarts from disk: genesis snapshot, then full replay of the log.
    pub fn open(config: &NodeConfig) -> Result<Self> {
        let signer = config
            .signer_key
            .map(|key| Box::new(KeyedHashSigner::new(key)) as Box<dyn CommitSigner + Send + Sync>);
        let recovered = recover_from_event_log(&config.snapshot_path, &config.event_log_path, signer)?;
        // Truncates a torn tail, if any, before the first new append.
        let log = EventLogWriter::open(&config.event_log_path, config.fsync)?;
        Self::new(recovered.engine, recovered.journal, log)
    }

    /// Evaluates one submission and makes its entry durable.
    pub fn submit(&mut self, bundle: ActionBundle, context: TransitionContext) -> Result<TransitionOutcome> {
        self.ensure_healthy()?;
        let started = Instant::now();

        let outcome = self.engine.submit(bundle.clone(), context)?;
        let entry = self
            .journal
            .action_entry(bundle, context, &outcome, self.engine.state_hash());
        self.persist(entry)?;

        record_outcome(&outcome);
        metrics::gauge!("quintet_sequence_id", self.engine.sequence_id().0 as f64);
        metrics::histogram!("quintet_commit_duration_seconds", started.elapsed().as_secs_f64());
        Ok(outcome)
    }

    /// Operator action: resume a halted engine.
    pub fn clear_halt(&mut self, operator: &str) -> Result<()> {
        self.ensure_healthy()?;
        self.engine.clear_halt(operator)?;
        let entry = self.journal.halt_cleared_entry(operator);
        self.persist(entry)
    }

    /// Operator action: lift a quarantine. Logged even when nothing was in
    /// force, so replay sees the same operator history.
    pub fn release_quarantine(&mut self, target: QuarantineTarget) -> Result<bool> {
        self.ensure_healthy()?;
        let released = self.engine.release_quarantine(&target);
        let entry = self.journal.quarantine_released_entry(target);
        self.persist(entry)?;
        Ok(released)
    }

    fn persist(&mut self, entry: LogEntry) -> Result<()> {
        if let Err(e) = self.log.append(&entry) {
            error!(error = %e, seq = entry.sequence_id(), "event append failed; committer poisoned");
            self.poisoned = true;
            return Err(e.into());
        }
        self.journal.append(entry);
        Ok(())
    }

    fn ensure_healthy(&self) -> Result<()> {
        if self.poisoned {
            warn!("submission refused by poisoned committer");
            return Err(CommitError::Poisoned);
        }
        Ok(())
    }

    pub fn engine(&self) -> &TransitionEngine {
        &self.engine
    }

    pub fn journal(&self) -> &EventJournal {
        &self.journal
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub fn log_path(&self) -> &Path {
        self.log.path()
    }

    pub fn into_parts(self) -> (TransitionEngine, EventJournal) {
        (self.engine, self.journal)
    }
}

fn attach_signer(engine: TransitionEngine, config: &NodeConfig) -> TransitionEngine {
    match config.signer_key {
        Some(key) => engine.with_signer(Box::new(KeyedHashSigner::new(key))),
        None => engine,
    }
}

fn record_outcome(outcome: &TransitionOutcome) {
    match outcome {
        TransitionOutcome::Committed(_) => metrics::increment_counter!("quintet_transitions_committed_total"),
        TransitionOutcome::Rejected(_) => metrics::increment_counter!("quintet_transitions_rejected_total"),
        TransitionOutcome::Halted(_) => metrics::increment_counter!("quintet_transitions_halted_total"),
    }
    if let Some(rejection) = outcome.rejection() {
        let decision = rejection.decision.to_string();
        metrics::increment_counter!("quintet_incidents_total", "decision" => decision);
    }
}
