// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Deterministic Replay Harness.
//!
//! Re-executes a recorded event log through a fresh [`TransitionEngine`]
//! started from the genesis bundle, checking after every entry that the
//! recomputed outcome and state hash match what was recorded. The first
//! mismatch is reported with its log position, so divergence is localized
//! without a second pass.
//!
//! Partial replay stops after entry `N` and reports the intermediate hash.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::KernelError;
use crate::event::{LogEntry, Outcome};
use crate::incident::IncidentLog;
use crate::signing::CommitSigner;
use crate::snapshot::hash::Hash32;
use crate::state::action::{ActionBundle, TransitionContext};
use crate::state::bundle::TokenStateBundle;
use crate::state::engine::TransitionEngine;
use crate::types::SequenceId;

/// First point at which replay disagrees with the record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Divergence {
    pub log_position: u64,
    pub expected_outcome: Option<Outcome>,
    pub actual_outcome: Option<Outcome>,
    pub expected_hash: Hash32,
    pub actual_hash: Hash32,
    pub detail: String,
}

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("kernel error during replay: {0}")]
    Kernel(#[from] KernelError),

    #[error("replay diverged at entry {}: {}", .0.log_position, .0.detail)]
    Divergence(Box<Divergence>),

    #[error("log entry out of order: expected {expected}, found {found}")]
    OutOfOrder { expected: u64, found: u64 },

    #[error("cannot stop at entry {until}; log ends at {last}")]
    UntilOutOfRange { until: u64, last: u64 },

    #[error("final state hash {actual} does not match reference {expected}")]
    HashMismatch { expected: Hash32, actual: Hash32 },
}

/// Hash after one replayed entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplayStep {
    pub log_position: u64,
    pub state_sequence_id: SequenceId,
    pub state_hash: Hash32,
    pub outcome: Option<Outcome>,
}

#[derive(Clone, Debug)]
pub struct ReplayReport {
    pub genesis_hash: Hash32,
    pub final_state: TokenStateBundle,
    pub final_state_hash: Hash32,
    pub entries_applied: u64,
    pub committed: u64,
    pub rejected: u64,
    pub halted: u64,
    pub steps: Vec<ReplayStep>,
    /// Every committed bundle in order, when retention is enabled.
    pub retained_states: Vec<TokenStateBundle>,
    pub incidents: IncidentLog,
}

pub struct ReplayHarness {
    genesis: TokenStateBundle,
    retain_states: bool,
    signer: Option<Box<dyn CommitSigner + Send + Sync>>,
}

impl ReplayHarness {
    pub fn new(genesis: TokenStateBundle) -> Self {
        Self {
            genesis,
            retain_states: false,
            signer: None,
        }
    }

    /// Signer handed to the engine returned by [`Self::replay_engine`], so
    /// replayed commits carry the same signatures as the live ones did.
    pub fn with_signer(mut self, signer: Box<dyn CommitSigner + Send + Sync>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Keep every intermediate committed bundle in the report.
    pub fn retain_states(mut self, retain: bool) -> Self {
        self.retain_states = retain;
        self
    }

    pub fn genesis(&self) -> &TokenStateBundle {
        &self.genesis
    }

    pub fn replay(&self, entries: &[LogEntry]) -> Result<ReplayReport, ReplayError> {
        self.run(entries, None, None).map(|(report, _)| report)
    }

    /// Full replay that also hands back the engine, ready to accept the
    /// submission that follows the last entry.
    pub fn replay_engine(mut self, entries: &[LogEntry]) -> Result<(ReplayReport, TransitionEngine), ReplayError> {
        let signer = self.signer.take();
        self.run(entries, None, signer)
    }

    /// Replays entries `1..=until` only.
    pub fn replay_until(&self, entries: &[LogEntry], until: u64) -> Result<ReplayReport, ReplayError> {
        let last = entries.len() as u64;
        if until > last {
            return Err(ReplayError::UntilOutOfRange { until, last });
        }
        self.run(entries, Some(until), None).map(|(report, _)| report)
    }

    /// Full replay, then compare the final hash with `reference`.
    pub fn verify(&self, entries: &[LogEntry], reference: Hash32) -> Result<ReplayReport, ReplayError> {
        let report = self.replay(entries)?;
        check_reference(&report, reference)?;
        Ok(report)
    }

    /// Partial replay to `until`, then compare the intermediate hash.
    pub fn verify_at(&self, entries: &[LogEntry], until: u64, reference: Hash32) -> Result<ReplayReport, ReplayError> {
        let report = self.replay_until(entries, until)?;
        check_reference(&report, reference)?;
        Ok(report)
    }

    /// Runs unrecorded submissions, e.g. to produce a reference hash.
    pub fn replay_actions(&self, actions: &[(ActionBundle, TransitionContext)]) -> Result<ReplayReport, ReplayError> {
        let mut engine = TransitionEngine::new(self.genesis.clone())?;
        let mut report = self.empty_report(&engine);

        for (i, (bundle, context)) in actions.iter().enumerate() {
            let outcome = engine.submit(bundle.clone(), *context)?;
            self.account(&mut report, &engine, i as u64 + 1, Some(outcome.outcome()));
        }
        Ok(self.finish(report, &engine))
    }

    fn run(
        &self,
        entries: &[LogEntry],
        until: Option<u64>,
        signer: Option<Box<dyn CommitSigner + Send + Sync>>,
    ) -> Result<(ReplayReport, TransitionEngine), ReplayError> {
        let mut engine = TransitionEngine::new(self.genesis.clone())?;
        if let Some(signer) = signer {
            engine = engine.with_signer(signer);
        }
        let mut report = self.empty_report(&engine);

        for (i, entry) in entries.iter().enumerate() {
            let expected_position = i as u64 + 1;
            if until.is_some_and(|n| expected_position > n) {
                break;
            }
            if entry.sequence_id() != expected_position {
                return Err(ReplayError::OutOfOrder {
                    expected: expected_position,
                    found: entry.sequence_id(),
                });
            }

            let outcome = match entry {
                LogEntry::Action(record) => {
                    let outcome = engine
                        .submit(record.action_bundle.clone(), record.context)
                        .map_err(|e| {
                            diverged(
                                expected_position,
                                Some(record.outcome),
                                None,
                                record.resulting_state_hash,
                                engine.state_hash(),
                                e.to_string(),
                            )
                        })?
                        .outcome();
                    let actual_hash = engine.state_hash();
                    if outcome != record.outcome || actual_hash != record.resulting_state_hash {
                        return Err(diverged(
                            expected_position,
                            Some(record.outcome),
                            Some(outcome),
                            record.resulting_state_hash,
                            actual_hash,
                            "recorded outcome or state hash differs".to_string(),
                        ));
                    }
                    Some(outcome)
                }
                LogEntry::HaltCleared { operator, .. } => {
                    engine.clear_halt(operator).map_err(|e| {
                        diverged(expected_position, None, None, engine.state_hash(), engine.state_hash(), e.to_string())
                    })?;
                    None
                }
                LogEntry::QuarantineReleased { target, .. } => {
                    if !engine.release_quarantine(target) {
                        warn!(%target, position = expected_position, "released target was not quarantined");
                    }
                    None
                }
            };

            self.account(&mut report, &engine, expected_position, outcome);
        }

        let report = self.finish(report, &engine);
        info!(
            entries = report.entries_applied,
            hash = %report.final_state_hash.short(),
            "replay finished"
        );
        Ok((report, engine))
    }

    fn empty_report(&self, engine: &TransitionEngine) -> ReplayReport {
        ReplayReport {
            genesis_hash: engine.state_hash(),
            final_state: engine.state().clone(),
            final_state_hash: engine.state_hash(),
            entries_applied: 0,
            committed: 0,
            rejected: 0,
            halted: 0,
            steps: Vec::new(),
            retained_states: if self.retain_states {
                vec![engine.state().clone()]
            } else {
                Vec::new()
            },
            incidents: IncidentLog::new(),
        }
    }

    fn account(&self, report: &mut ReplayReport, engine: &TransitionEngine, position: u64, outcome: Option<Outcome>) {
        report.entries_applied += 1;
        match outcome {
            Some(Outcome::Committed) => {
                report.committed += 1;
                if self.retain_states {
                    report.retained_states.push(engine.state().clone());
                }
            }
            Some(Outcome::Rejected) => report.rejected += 1,
            Some(Outcome::Halted) => report.halted += 1,
            None => {}
        }
        report.steps.push(ReplayStep {
            log_position: position,
            state_sequence_id: engine.sequence_id(),
            state_hash: engine.state_hash(),
            outcome,
        });
        debug!(position, hash = %engine.state_hash().short(), "replayed entry");
    }

    fn finish(&self, mut report: ReplayReport, engine: &TransitionEngine) -> ReplayReport {
        report.final_state_hash = engine.state_hash();
        report.final_state = engine.state().clone();
        report.incidents = engine.incidents().clone();
        report
    }
}

impl ReplayReport {
    /// State hash after log position `n`, or genesis for `0`.
    pub fn hash_at(&self, n: u64) -> Option<Hash32> {
        if n == 0 {
            return Some(self.genesis_hash);
        }
        self.steps.iter().find(|s| s.log_position == n).map(|s| s.state_hash)
    }
}

/// First position at which two step sequences disagree.
pub fn first_divergence(left: &[ReplayStep], right: &[ReplayStep]) -> Option<u64> {
    left.iter()
        .zip(right.iter())
        .find(|(a, b)| a.state_hash != b.state_hash || a.outcome != b.outcome)
        .map(|(a, _)| a.log_position)
        .or_else(|| {
            (left.len() != right.len()).then(|| left.len().min(right.len()) as u64 + 1)
        })
}

fn diverged(
    log_position: u64,
    expected_outcome: Option<Outcome>,
    actual_outcome: Option<Outcome>,
    expected_hash: Hash32,
    actual_hash: Hash32,
    detail: String,
) -> ReplayError {
    ReplayError::Divergence(Box::new(Divergence {
        log_position,
        expected_outcome,
        actual_outcome,
        expected_hash,
        actual_hash,
        detail,
    }))
}

fn check_reference(report: &ReplayReport, reference: Hash32) -> Result<(), ReplayError> {
    if report.final_state_hash != reference {
        return Err(ReplayError::HashMismatch {
            expected: reference,
            actual: report.final_state_hash,
        });
    }
    Ok(())
}
