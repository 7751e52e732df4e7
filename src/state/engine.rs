// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! State Transition Engine - the only writer of ledger state.
//!
//! # Protocol
//! ```text
//! PROPOSED
//!   timestamp / quarantine / context firewall / shape / economic bounds
//! GUARD_CHECKED
//!   directional consistency, stability score, admissible band
//! STABILITY_CHECKED
//!   deltas applied to a copy, five tokens per shard as one unit
//! DELTA_APPLIED
//!   conservation, non-negativity, supply ceilings, voting ceiling
//! POST_VALIDATED
//!   next sequence id, prior hash, signature, audit flush
//! COMMITTED
//! ```
//!
//! Failure at any step discards the copy and reaches `REJECTED` or `HALTED`.
//! The canonical bundle is replaced only at the commit boundary.
//!
//! # Invariants
//! - No partial commit: the visible state is either the old bundle or the
//!   fully validated successor.
//! - Sequence ids are assigned here, never by callers.
//! - A halted engine accepts nothing until an operator clears it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::{KernelError, Result};
use crate::event::Outcome;
use crate::fxp::{CertifiedMath, OperationLog};
use crate::guard::violation::{Evidence, ViolationKind, ViolationReport};
use crate::guard::{check_bundle_shape, ContextFirewall, EconomicsGuard, SupplyInvariantChecker};
use crate::incident::{
    Component, IncidentCode, IncidentContext, IncidentDecision, IncidentHandler, IncidentLog, QuarantineTarget,
};
use crate::proof::AuditArtifact;
use crate::signing::{CommitSigner, Signature, SignatureVerifier};
use crate::snapshot::hash::Hash32;
use crate::stability::{StabilityScore, StabilityValidator};
use crate::state::action::{ActionBundle, ActionKind, TransitionContext};
use crate::state::audit::AuditTrail;
use crate::state::bundle::{RewardLedger, TokenStateBundle};
use crate::types::SequenceId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransitionPhase {
    Proposed,
    GuardChecked,
    StabilityChecked,
    DeltaApplied,
    PostValidated,
    Committed,
    Rejected,
    Halted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum EngineStatus {
    Running,
    Halted { code: IncidentCode, at_sequence: SequenceId },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitReceipt {
    pub sequence_id: SequenceId,
    pub state_hash: Hash32,
    pub prior_state_hash: Hash32,
    /// Digest of the transition's operation log.
    pub operation_digest: Hash32,
    pub score: StabilityScore,
    pub signature: Option<Signature>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rejection {
    pub report: ViolationReport,
    /// Phase the transition was in when it failed.
    pub failed_at: TransitionPhase,
    pub decision: IncidentDecision,
    pub incident_index: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransitionOutcome {
    Committed(CommitReceipt),
    Rejected(Rejection),
    Halted(Rejection),
}

impl TransitionOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, TransitionOutcome::Committed(_))
    }

    pub fn outcome(&self) -> Outcome {
        match self {
            TransitionOutcome::Committed(_) => Outcome::Committed,
            TransitionOutcome::Rejected(_) => Outcome::Rejected,
            TransitionOutcome::Halted(_) => Outcome::Halted,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            TransitionOutcome::Committed(_) => None,
            TransitionOutcome::Rejected(r) | TransitionOutcome::Halted(r) => Some(r),
        }
    }

    pub fn violation_kind(&self) -> Option<ViolationKind> {
        self.rejection().map(|r| r.report.kind)
    }
}

struct Candidate {
    next: TokenStateBundle,
    score: StabilityScore,
}

struct Failure {
    report: ViolationReport,
    phase: TransitionPhase,
    component: Component,
}

impl Failure {
    fn new(report: ViolationReport, phase: TransitionPhase, component: Component) -> Self {
        Self { report, phase, component }
    }
}

/// Logs and aborts on an internal-consistency breach.
///
/// Reserved for states that can only arise from a bug or memory corruption;
/// policy violations never reach this path.
#[cold]
pub(crate) fn integrity_abort(what: &str) -> ! {
    error!(what, "integrity failure; aborting");
    panic!("ledger integrity failure: {what}");
}

pub struct TransitionEngine {
    state: TokenStateBundle,
    state_hash: Hash32,
    incidents: IncidentLog,
    audit: AuditTrail,
    quarantined: BTreeSet<QuarantineTarget>,
    status: EngineStatus,
    signer: Option<Box<dyn CommitSigner + Send + Sync>>,
}

impl TransitionEngine {
    /// Starts from a validated state (genesis or a restored snapshot).
    pub fn new(state: TokenStateBundle) -> Result<Self> {
        let mut scratch = OperationLog::new();
        let mut math = CertifiedMath::new(&mut scratch, "engine-init");
        SupplyInvariantChecker::from_parameters(state.parameters())
            .check_state(&state, &mut math)
            .into_result()
            .map_err(|report| KernelError::InvalidGenesis(Box::new(report)))?;

        let state_hash = state.state_hash();
        info!(seq = state.sequence_id().0, hash = %state_hash.short(), "transition engine ready");
        Ok(Self {
            state,
            state_hash,
            incidents: IncidentLog::new(),
            audit: AuditTrail::new(),
            quarantined: BTreeSet::new(),
            status: EngineStatus::Running,
            signer: None,
        })
    }

    pub fn with_signer(mut self, signer: Box<dyn CommitSigner + Send + Sync>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn state(&self) -> &TokenStateBundle {
        &self.state
    }

    pub fn state_hash(&self) -> Hash32 {
        self.state_hash
    }

    pub fn sequence_id(&self) -> SequenceId {
        self.state.sequence_id()
    }

    pub fn incidents(&self) -> &IncidentLog {
        &self.incidents
    }

    pub fn audit(&self) -> &AuditTrail {
        &self.audit
    }

    pub fn status(&self) -> EngineStatus {
        self.status
    }

    pub fn is_halted(&self) -> bool {
        matches!(self.status, EngineStatus::Halted { .. })
    }

    pub fn quarantined(&self) -> impl Iterator<Item = &QuarantineTarget> {
        self.quarantined.iter()
    }

    pub fn is_quarantined(&self, target: &QuarantineTarget) -> bool {
        self.quarantined.contains(target)
    }

    /// Runs one bundle to a terminal phase.
    ///
    /// Policy rejections come back as `Ok(TransitionOutcome::Rejected | Halted)`.
    /// `Err` means the call itself was invalid, e.g. the engine is halted.
    pub fn submit(&mut self, bundle: ActionBundle, context: TransitionContext) -> Result<TransitionOutcome> {
        if let EngineStatus::Halted { code, .. } = self.status {
            return Err(KernelError::EngineHalted { code });
        }
        if self.state.state_hash() != self.state_hash {
            integrity_abort("canonical state no longer matches its recorded hash");
        }

        let action_hash = bundle.action_hash()?;
        let mut oplog = OperationLog::new();
        let evaluation = {
            let mut math = CertifiedMath::new(&mut oplog, &bundle.actor.correlation_id);
            self.evaluate(&bundle, context, &mut math)
        };

        match evaluation {
            Ok(candidate) => Ok(TransitionOutcome::Committed(self.commit(candidate, &bundle, oplog))),
            Err(failure) => Ok(self.reject(failure, &bundle, action_hash)),
        }
    }

    /// Read-only evaluation of a bundle against the current state.
    fn evaluate(
        &self,
        bundle: &ActionBundle,
        context: TransitionContext,
        math: &mut CertifiedMath<'_>,
    ) -> core::result::Result<Candidate, Failure> {
        use TransitionPhase::*;
        let state = &self.state;
        let params = state.parameters();

        // PROPOSED
        if bundle.timestamp < state.last_timestamp() {
            return Err(Failure::new(
                ViolationReport::new(
                    ViolationKind::TimestampRegression,
                    format!(
                        "timestamp {} precedes last accepted {}",
                        bundle.timestamp,
                        state.last_timestamp()
                    ),
                )
                .with_evidence(Evidence::none().actor(&bundle.actor.actor)),
                Proposed,
                Component::TransitionEngine,
            ));
        }
        if let Some(target) = self.quarantined_participant(bundle) {
            return Err(Failure::new(
                ViolationReport::new(ViolationKind::QuarantinedParticipant, format!("{target} is quarantined")),
                Proposed,
                Component::TransitionEngine,
            ));
        }
        ContextFirewall::check(bundle, context)
            .into_result()
            .map_err(|r| Failure::new(r, Proposed, Component::ContextFirewall))?;
        check_bundle_shape(state, bundle)
            .into_result()
            .map_err(|r| Failure::new(r, Proposed, Component::TransitionEngine))?;
        let economics = EconomicsGuard::from_parameters(params);
        economics
            .validate_bundle(state, bundle, math)
            .into_result()
            .map_err(|r| Failure::new(r, Proposed, Component::EconomicsGuard))?;

        // GUARD_CHECKED
        let score = StabilityValidator::from_parameters(params)
            .validate(state, bundle, math)
            .map_err(|r| Failure::new(r, GuardChecked, Component::StabilityValidator))?;

        // STABILITY_CHECKED
        let arith = |e, what: &str| {
            Failure::new(ViolationReport::arithmetic(e, what), StabilityChecked, Component::TransitionEngine)
        };
        let mut next = state.clone();
        for (shard, delta) in &bundle.deltas {
            let current = next.balances_per_shard.get(shard).copied().unwrap_or_default();
            let updated = current.apply_delta(delta, math).map_err(|e| arith(e, "balance update"))?;
            next.balances_per_shard.insert(shard.clone(), updated);
        }
        if bundle.kind == ActionKind::Reward {
            let amount = economics
                .reward_amount(state, bundle, math)
                .map_err(|e| arith(e, "reward amount"))?;
            let window = economics.reward_window(state.rewards(), bundle.timestamp);
            next.rewards = RewardLedger {
                day_index: window.day_index,
                distributed_today: math
                    .add(window.distributed_today, amount)
                    .map_err(|e| arith(e, "daily reward total"))?,
                distributed_total: math
                    .add(window.distributed_total, amount)
                    .map_err(|e| arith(e, "lifetime reward total"))?,
            };
        }
        next.sequence_id = state.sequence_id().next().ok_or_else(|| {
            Failure::new(
                ViolationReport::new(ViolationKind::Arithmetic, "sequence id exhausted"),
                StabilityChecked,
                Component::TransitionEngine,
            )
        })?;
        next.prior_state_hash = self.state_hash;
        next.last_timestamp = bundle.timestamp;
        next.signature = None;

        // DELTA_APPLIED
        let checker = SupplyInvariantChecker::from_parameters(params);
        let post = |r: ViolationReport| Failure::new(r, DeltaApplied, Component::SupplyInvariantChecker);
        checker
            .check_conservation(state, &next, &bundle.allocations, math)
            .into_result()
            .map_err(post)?;
        checker.check_non_negative(&next).into_result().map_err(post)?;
        checker.check_supply_ceilings(&next, math).into_result().map_err(post)?;
        checker
            .check_voting_concentration(&next, math)
            .into_result()
            .map_err(post)?;

        // POST_VALIDATED
        Ok(Candidate { next, score })
    }

    fn quarantined_participant(&self, bundle: &ActionBundle) -> Option<QuarantineTarget> {
        let actor = QuarantineTarget::Actor(bundle.actor.actor.clone());
        if self.quarantined.contains(&actor) {
            return Some(actor);
        }
        bundle
            .targets()
            .into_iter()
            .map(QuarantineTarget::Shard)
            .find(|t| self.quarantined.contains(t))
    }

    fn commit(&mut self, candidate: Candidate, bundle: &ActionBundle, oplog: OperationLog) -> CommitReceipt {
        let mut next = candidate.next;
        let new_hash = next.state_hash();

        if let Some(signer) = &self.signer {
            next.signature = Some(signer.sign(new_hash.as_bytes()));
            if next.state_hash() != new_hash {
                integrity_abort("signing changed the state hash");
            }
        }

        let prior_state_hash = self.state_hash;
        let sequence_id = next.sequence_id();
        let operation_digest = self.audit.record(sequence_id, &bundle.actor.correlation_id, oplog);
        let signature = next.signature.clone();

        // Commit boundary.
        self.state = next;
        self.state_hash = new_hash;

        debug!(
            seq = sequence_id.0,
            hash = %new_hash.short(),
            kind = ?bundle.kind,
            health = %candidate.score.health,
            "transition committed"
        );

        CommitReceipt {
            sequence_id,
            state_hash: new_hash,
            prior_state_hash,
            operation_digest,
            score: candidate.score,
            signature,
        }
    }

    fn reject(&mut self, failure: Failure, bundle: &ActionBundle, action_hash: Hash32) -> TransitionOutcome {
        let ctx = IncidentContext {
            component: failure.component,
            state_hash_before: self.state_hash,
            action_bundle_hash: action_hash,
            sequence_id: self.state.sequence_id(),
            actor: bundle.actor.actor.clone(),
            targets: bundle.targets(),
        };
        let decision = IncidentHandler::handle(&failure.report, &ctx, &mut self.incidents);
        let incident_index = self.incidents.len().saturating_sub(1) as u64;

        warn!(
            seq = self.state.sequence_id().0,
            phase = ?failure.phase,
            kind = %failure.report.kind,
            decision = %decision,
            "transition rejected: {}",
            failure.report.message
        );

        let rejection = Rejection {
            report: failure.report,
            failed_at: failure.phase,
            decision,
            incident_index,
        };

        match decision {
            IncidentDecision::Halt => {
                self.status = EngineStatus::Halted {
                    code: rejection.report.incident_code,
                    at_sequence: self.state.sequence_id(),
                };
                error!(code = %rejection.report.incident_code, "engine halted; operator clearance required");
                TransitionOutcome::Halted(rejection)
            }
            IncidentDecision::Quarantine => {
                if let Some(target) = self.incidents.last().and_then(|r| r.quarantine_target.clone()) {
                    warn!(%target, "participant quarantined");
                    self.quarantined.insert(target);
                }
                TransitionOutcome::Rejected(rejection)
            }
            IncidentDecision::RejectAndContinue => TransitionOutcome::Rejected(rejection),
        }
    }

    /// Operator action: resume after a halt.
    pub fn clear_halt(&mut self, operator: &str) -> Result<()> {
        match self.status {
            EngineStatus::Running => Err(KernelError::NotHalted),
            EngineStatus::Halted { code, .. } => {
                info!(operator, %code, "halt cleared");
                self.status = EngineStatus::Running;
                Ok(())
            }
        }
    }

    /// Operator action: lift a quarantine. Returns whether it was in force.
    pub fn release_quarantine(&mut self, target: &QuarantineTarget) -> bool {
        let released = self.quarantined.remove(target);
        if released {
            info!(%target, "quarantine released");
        }
        released
    }

    /// Checks the current state's signature over its hash.
    pub fn verify_signature(&self, verifier: &dyn SignatureVerifier, public_key: &[u8]) -> bool {
        match self.state.signature() {
            Some(sig) => verifier.verify(public_key, self.state_hash.as_bytes(), sig),
            None => false,
        }
    }

    /// Export for external verification tooling.
    pub fn audit_artifact(&self, tail: usize) -> AuditArtifact {
        AuditArtifact::from_engine(self, tail)
    }
}
