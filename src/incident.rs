// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Critical-incident handling.
//!
//! Every violation kind maps to exactly one decision through a static,
//! exhaustive table ([`policy_for`]). The handler appends a record to the
//! [`IncidentLog`] before returning its decision. The log is write-only
//! audit output; nothing in the transition path reads it back.
//!
//! # Decisions
//! - `HALT`: conservation failures. No further transitions until an
//!   operator clears the halt.
//! - `QUARANTINE`: per-shard or per-actor abuse. The offending participant is
//!   restricted, the rest of the ledger continues.
//! - `REJECT_AND_CONTINUE`: malformed or out-of-policy single requests.

use std::collections::BTreeMap;
use core::fmt;

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::guard::violation::{ViolationClass, ViolationKind, ViolationReport};
use crate::snapshot::hash::Hash32;
use crate::types::{ActorId, SequenceId, ShardId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentDecision {
    Halt,
    Quarantine,
    RejectAndContinue,
}

impl fmt::Display for IncidentDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IncidentDecision::Halt => "HALT",
            IncidentDecision::Quarantine => "QUARANTINE",
            IncidentDecision::RejectAndContinue => "REJECT_AND_CONTINUE",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Numeric incident code, rendered `CIR-0001`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IncidentCode(pub u16);

impl fmt::Display for IncidentCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CIR-{:04}", self.0)
    }
}

/// What a quarantine decision restricts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuarantineScope {
    Shard,
    Actor,
    None,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IncidentPolicy {
    pub code: IncidentCode,
    pub severity: Severity,
    pub decision: IncidentDecision,
    pub scope: QuarantineScope,
}

const fn policy(code: u16, severity: Severity, decision: IncidentDecision, scope: QuarantineScope) -> IncidentPolicy {
    IncidentPolicy {
        code: IncidentCode(code),
        severity,
        decision,
        scope,
    }
}

/// The static violation-to-decision table.
pub const fn policy_for(kind: ViolationKind) -> IncidentPolicy {
    use IncidentDecision::*;
    use QuarantineScope as Q;
    use Severity::*;
    match kind {
        ViolationKind::SupplyConservation => policy(1, Critical, Halt, Q::None),
        ViolationKind::ReserveConservation => policy(2, Critical, Halt, Q::None),
        ViolationKind::VotingPowerCentralization => policy(3, High, Quarantine, Q::Shard),
        ViolationKind::ContextFirewall => policy(4, High, Quarantine, Q::Actor),
        ViolationKind::RewardPerActionExceeded => policy(10, Medium, RejectAndContinue, Q::None),
        ViolationKind::DailyRewardCapExceeded => policy(11, Medium, RejectAndContinue, Q::None),
        ViolationKind::LifetimeRewardCapExceeded => policy(12, Medium, RejectAndContinue, Q::None),
        ViolationKind::AllocationCapExceeded => policy(13, Medium, RejectAndContinue, Q::None),
        ViolationKind::TokenSupplyCapExceeded => policy(14, Medium, RejectAndContinue, Q::None),
        ViolationKind::NegativeBalance => policy(15, Medium, RejectAndContinue, Q::None),
        ViolationKind::CoherenceTooLow => policy(20, Medium, RejectAndContinue, Q::None),
        ViolationKind::DirectionalInconsistency => policy(21, Low, RejectAndContinue, Q::None),
        ViolationKind::ActionCostExceeded => policy(22, Medium, RejectAndContinue, Q::None),
        ViolationKind::StabilityBand => policy(23, Medium, RejectAndContinue, Q::None),
        ViolationKind::Arithmetic => policy(30, Medium, RejectAndContinue, Q::None),
        ViolationKind::MalformedAction => policy(31, Low, RejectAndContinue, Q::None),
        ViolationKind::TimestampRegression => policy(32, Low, RejectAndContinue, Q::None),
        ViolationKind::QuarantinedParticipant => policy(33, Low, RejectAndContinue, Q::None),
    }
}

/// Component that raised a violation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    TransitionEngine,
    ContextFirewall,
    EconomicsGuard,
    SupplyInvariantChecker,
    StabilityValidator,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum QuarantineTarget {
    Shard(ShardId),
    Actor(ActorId),
}

impl fmt::Display for QuarantineTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuarantineTarget::Shard(s) => write!(f, "shard:{s}"),
            QuarantineTarget::Actor(a) => write!(f, "actor:{a}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentRecord {
    pub incident_index: u64,
    pub incident_code: IncidentCode,
    pub violation_kind: ViolationKind,
    pub violating_component: Component,
    pub state_hash_before: Hash32,
    pub action_bundle_hash: Hash32,
    pub decision: IncidentDecision,
    pub quarantine_target: Option<QuarantineTarget>,
    pub sequence_id: SequenceId,
    pub message: String,
}

/// Facts about the transition that produced a violation.
#[derive(Clone, Debug)]
pub struct IncidentContext {
    pub component: Component,
    pub state_hash_before: Hash32,
    pub action_bundle_hash: Hash32,
    pub sequence_id: SequenceId,
    pub actor: ActorId,
    /// Shards the bundle touched, in key order.
    pub targets: Vec<ShardId>,
}

/// Append-only incident log with per-class counters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentLog {
    records: Vec<IncidentRecord>,
    by_class: BTreeMap<ViolationClass, u64>,
    by_decision: BTreeMap<IncidentDecision, u64>,
}

impl IncidentLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[IncidentRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&IncidentRecord> {
        self.records.last()
    }

    /// The most recent `n` records, oldest first.
    pub fn tail(&self, n: usize) -> &[IncidentRecord] {
        let start = self.records.len().saturating_sub(n);
        &self.records[start..]
    }

    pub fn count_for(&self, class: ViolationClass) -> u64 {
        self.by_class.get(&class).copied().unwrap_or(0)
    }

    pub fn decisions(&self, decision: IncidentDecision) -> u64 {
        self.by_decision.get(&decision).copied().unwrap_or(0)
    }

    fn append(&mut self, mut record: IncidentRecord) {
        record.incident_index = self.records.len() as u64;
        *self.by_class.entry(record.violation_kind.class()).or_insert(0) += 1;
        *self.by_decision.entry(record.decision).or_insert(0) += 1;
        self.records.push(record);
    }
}

/// Maps violations to decisions and records them.
pub struct IncidentHandler;

impl IncidentHandler {
    pub fn handle(report: &ViolationReport, ctx: &IncidentContext, log: &mut IncidentLog) -> IncidentDecision {
        let policy = policy_for(report.kind);

        let quarantine_target = match (policy.decision, policy.scope) {
            (IncidentDecision::Quarantine, QuarantineScope::Shard) => match &report.evidence.shard {
                Some(shard) if ctx.targets.contains(shard) => Some(QuarantineTarget::Shard(shard.clone())),
                // The offending shard was only affected by the bundle; its submitter answers for it.
                Some(_) => Some(QuarantineTarget::Actor(ctx.actor.clone())),
                None => ctx.targets.first().cloned().map(QuarantineTarget::Shard),
            },
            (IncidentDecision::Quarantine, QuarantineScope::Actor) => Some(QuarantineTarget::Actor(
                report.evidence.actor.clone().unwrap_or_else(|| ctx.actor.clone()),
            )),
            _ => None,
        };

        // A quarantine with nobody to quarantine degrades to a plain rejection.
        let decision = match (policy.decision, &quarantine_target) {
            (IncidentDecision::Quarantine, None) => IncidentDecision::RejectAndContinue,
            (d, _) => d,
        };

        log.append(IncidentRecord {
            incident_index: 0,
            incident_code: policy.code,
            violation_kind: report.kind,
            violating_component: ctx.component,
            state_hash_before: ctx.state_hash_before,
            action_bundle_hash: ctx.action_bundle_hash,
            decision,
            quarantine_target,
            sequence_id: ctx.sequence_id,
            message: report.message.clone(),
        });

        match decision {
            IncidentDecision::Halt => error!(
                code = %policy.code,
                kind = %report.kind,
                seq = ctx.sequence_id.0,
                "incident: HALT"
            ),
            IncidentDecision::Quarantine => warn!(code = %policy.code, kind = %report.kind, "incident: QUARANTINE"),
            IncidentDecision::RejectAndContinue => {
                warn!(code = %policy.code, kind = %report.kind, "incident: REJECT_AND_CONTINUE")
            }
        }

        decision
    }
}
