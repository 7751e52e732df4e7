// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Violation reports: the only channel through which guards and the
//! stability validator communicate a rejection.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ArithmeticError;
use crate::fxp::FixedPointValue;
use crate::incident::{policy_for, IncidentCode};
use crate::types::{ActorId, ShardId, Token};

/// Every distinguishable reason a transition can be refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Arithmetic,
    MalformedAction,
    TimestampRegression,
    QuarantinedParticipant,
    RewardPerActionExceeded,
    DailyRewardCapExceeded,
    LifetimeRewardCapExceeded,
    AllocationCapExceeded,
    TokenSupplyCapExceeded,
    NegativeBalance,
    SupplyConservation,
    ReserveConservation,
    VotingPowerCentralization,
    ContextFirewall,
    CoherenceTooLow,
    DirectionalInconsistency,
    ActionCostExceeded,
    StabilityBand,
}

/// Coarse error taxonomy the kinds roll up into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationClass {
    ArithmeticError,
    EconomicBoundViolation,
    SupplyConservationViolation,
    VotingPowerCentralizationViolation,
    StabilityBandViolation,
    ContextFirewallViolation,
    PolicyRejection,
}

impl ViolationKind {
    pub const fn class(self) -> ViolationClass {
        match self {
            ViolationKind::Arithmetic => ViolationClass::ArithmeticError,
            ViolationKind::RewardPerActionExceeded
            | ViolationKind::DailyRewardCapExceeded
            | ViolationKind::LifetimeRewardCapExceeded
            | ViolationKind::AllocationCapExceeded
            | ViolationKind::TokenSupplyCapExceeded
            | ViolationKind::NegativeBalance => ViolationClass::EconomicBoundViolation,
            ViolationKind::SupplyConservation | ViolationKind::ReserveConservation => {
                ViolationClass::SupplyConservationViolation
            }
            ViolationKind::VotingPowerCentralization => ViolationClass::VotingPowerCentralizationViolation,
            ViolationKind::CoherenceTooLow
            | ViolationKind::DirectionalInconsistency
            | ViolationKind::ActionCostExceeded
            | ViolationKind::StabilityBand => ViolationClass::StabilityBandViolation,
            ViolationKind::ContextFirewall => ViolationClass::ContextFirewallViolation,
            ViolationKind::MalformedAction
            | ViolationKind::TimestampRegression
            | ViolationKind::QuarantinedParticipant => ViolationClass::PolicyRejection,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ViolationKind::Arithmetic => "arithmetic",
            ViolationKind::MalformedAction => "malformed_action",
            ViolationKind::TimestampRegression => "timestamp_regression",
            ViolationKind::QuarantinedParticipant => "quarantined_participant",
            ViolationKind::RewardPerActionExceeded => "reward_per_action_exceeded",
            ViolationKind::DailyRewardCapExceeded => "daily_reward_cap_exceeded",
            ViolationKind::LifetimeRewardCapExceeded => "lifetime_reward_cap_exceeded",
            ViolationKind::AllocationCapExceeded => "allocation_cap_exceeded",
            ViolationKind::TokenSupplyCapExceeded => "token_supply_cap_exceeded",
            ViolationKind::NegativeBalance => "negative_balance",
            ViolationKind::SupplyConservation => "supply_conservation",
            ViolationKind::ReserveConservation => "reserve_conservation",
            ViolationKind::VotingPowerCentralization => "voting_power_centralization",
            ViolationKind::ContextFirewall => "context_firewall",
            ViolationKind::CoherenceTooLow => "coherence_too_low",
            ViolationKind::DirectionalInconsistency => "directional_inconsistency",
            ViolationKind::ActionCostExceeded => "action_cost_exceeded",
            ViolationKind::StabilityBand => "stability_band",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured facts attached to a violation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    #[serde(default)]
    pub shard: Option<ShardId>,
    #[serde(default)]
    pub actor: Option<ActorId>,
    #[serde(default)]
    pub token: Option<Token>,
    #[serde(default)]
    pub observed: Option<FixedPointValue>,
    #[serde(default)]
    pub limit: Option<FixedPointValue>,
}

impl Evidence {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn shard(mut self, shard: &ShardId) -> Self {
        self.shard = Some(shard.clone());
        self
    }

    pub fn actor(mut self, actor: &ActorId) -> Self {
        self.actor = Some(actor.clone());
        self
    }

    pub fn token(mut self, token: Token) -> Self {
        self.token = Some(token);
        self
    }

    pub fn observed(mut self, value: FixedPointValue) -> Self {
        self.observed = Some(value);
        self
    }

    pub fn limit(mut self, value: FixedPointValue) -> Self {
        self.limit = Some(value);
        self
    }
}

/// Outcome of a single guard check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub passed: bool,
    pub violation_kind: Option<ViolationKind>,
    pub message: String,
    pub evidence: Evidence,
}

impl ValidationResult {
    pub fn pass() -> Self {
        Self {
            passed: true,
            violation_kind: None,
            message: String::new(),
            evidence: Evidence::none(),
        }
    }

    pub fn fail(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            passed: false,
            violation_kind: Some(kind),
            message: message.into(),
            evidence: Evidence::none(),
        }
    }

    /// An arithmetic failure met while evaluating `what`.
    pub fn arithmetic(err: ArithmeticError, what: &str) -> Self {
        Self::fail(ViolationKind::Arithmetic, format!("{what}: {err}"))
    }

    pub fn with_evidence(mut self, evidence: Evidence) -> Self {
        self.evidence = evidence;
        self
    }

    /// Attaches the actor to a failed result that names none.
    pub fn with_actor(mut self, actor: &ActorId) -> Self {
        if !self.passed && self.evidence.actor.is_none() {
            self.evidence.actor = Some(actor.clone());
        }
        self
    }

    pub fn is_pass(&self) -> bool {
        self.passed
    }

    /// Converts into a report; `None` when the check passed.
    pub fn into_report(self) -> Option<ViolationReport> {
        if self.passed {
            return None;
        }
        let kind = self.violation_kind.unwrap_or(ViolationKind::MalformedAction);
        Some(ViolationReport::new(kind, self.message).with_evidence(self.evidence))
    }

    pub fn into_result(self) -> Result<(), ViolationReport> {
        match self.into_report() {
            None => Ok(()),
            Some(report) => Err(report),
        }
    }
}

/// A rejection, carrying the incident code its kind maps to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationReport {
    pub kind: ViolationKind,
    pub message: String,
    pub evidence: Evidence,
    pub incident_code: IncidentCode,
}

impl ViolationReport {
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            evidence: Evidence::none(),
            incident_code: policy_for(kind).code,
        }
    }

    pub fn arithmetic(err: ArithmeticError, what: &str) -> Self {
        Self::new(ViolationKind::Arithmetic, format!("{what}: {err}"))
    }

    pub fn with_evidence(mut self, evidence: Evidence) -> Self {
        self.evidence = evidence;
        self
    }

    pub fn class(&self) -> ViolationClass {
        self.kind.class()
    }
}

impl fmt::Display for ViolationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.incident_code, self.kind, self.message)
    }
}
