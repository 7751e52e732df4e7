// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Stability and action-cost validation.
//!
//! The systemic-health score is computed with certified arithmetic only.
//! Weights and bounds are parameters, fixed at genesis:
//!
//! ```text
//! coherence    = resonance / (resonance + flow)      (1 when both are zero)
//! info_term    = InfoWeight    * effective_information
//! lambda_term  = LambdaWeight  * |lambda_after - lambda_before|
//! entropy_term = EntropyWeight * max(entropy_after - entropy_before, 0)
//! action_cost  = info_term + lambda_term + entropy_term
//! health       = coherence - action_cost
//! ```
//!
//! Every multiplication and division floors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ArithmeticError;
use crate::fxp::{CertifiedMath, FixedPointValue};
use crate::guard::violation::{Evidence, ViolationKind, ViolationReport};
use crate::state::action::{ActionBundle, Direction};
use crate::state::bundle::TokenStateBundle;
use crate::types::{ParamName, Parameters, ShardId, Token};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StabilityPolicy {
    pub min_coherence: FixedPointValue,
    pub health_floor: FixedPointValue,
    pub health_ceiling: FixedPointValue,
    pub max_action_cost: FixedPointValue,
    pub info_weight: FixedPointValue,
    pub lambda_weight: FixedPointValue,
    pub entropy_weight: FixedPointValue,
}

impl StabilityPolicy {
    pub fn from_parameters(params: &Parameters) -> Self {
        Self {
            min_coherence: params.get(ParamName::MinCoherence),
            health_floor: params.get(ParamName::HealthFloor),
            health_ceiling: params.get(ParamName::HealthCeiling),
            max_action_cost: params.get(ParamName::MaxActionCost),
            info_weight: params.get(ParamName::InfoWeight),
            lambda_weight: params.get(ParamName::LambdaWeight),
            entropy_weight: params.get(ParamName::EntropyWeight),
        }
    }
}

/// The score and each of its sub-terms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StabilityScore {
    pub coherence: FixedPointValue,
    pub info_term: FixedPointValue,
    pub lambda_term: FixedPointValue,
    pub entropy_term: FixedPointValue,
    pub action_cost: FixedPointValue,
    pub health: FixedPointValue,
}

pub struct StabilityValidator {
    policy: StabilityPolicy,
}

impl StabilityValidator {
    pub fn new(policy: StabilityPolicy) -> Self {
        Self { policy }
    }

    pub fn from_parameters(params: &Parameters) -> Self {
        Self::new(StabilityPolicy::from_parameters(params))
    }

    pub fn policy(&self) -> &StabilityPolicy {
        &self.policy
    }

    /// Aggregate coherence of the current state.
    pub fn aggregate_coherence(
        &self,
        state: &TokenStateBundle,
        math: &mut CertifiedMath<'_>,
    ) -> Result<FixedPointValue, ArithmeticError> {
        let resonance = state.total(Token::Resonance, math)?;
        let flow = state.total(Token::Flow, math)?;
        let denominator = math.add(resonance, flow)?;
        if denominator.is_zero() {
            return Ok(FixedPointValue::ONE);
        }
        math.div_floor(resonance, denominator)
    }

    /// Rejects bundles whose declared direction signals contradict each other
    /// or the deltas they accompany.
    pub fn check_directional_consistency(&self, bundle: &ActionBundle) -> Result<(), ViolationReport> {
        let mut seen: BTreeMap<(&ShardId, Token), Direction> = BTreeMap::new();

        for signal in &bundle.cost.direction_signals {
            if let Some(previous) = seen.insert((&signal.shard, signal.token), signal.direction) {
                if previous != signal.direction {
                    return Err(ViolationReport::new(
                        ViolationKind::DirectionalInconsistency,
                        format!("both increase and decrease claimed for {} on {}", signal.token, signal.shard),
                    )
                    .with_evidence(Evidence::none().shard(&signal.shard).token(signal.token)));
                }
            }

            let delta = bundle.delta_for(&signal.shard, signal.token);
            let agrees = match signal.direction {
                Direction::Increase => delta.is_positive(),
                Direction::Decrease => delta.is_negative(),
            };
            if !agrees {
                return Err(ViolationReport::new(
                    ViolationKind::DirectionalInconsistency,
                    format!(
                        "declared {:?} for {} on {} but the delta is {delta}",
                        signal.direction, signal.token, signal.shard
                    ),
                )
                .with_evidence(Evidence::none().shard(&signal.shard).token(signal.token).observed(delta)));
            }
        }
        Ok(())
    }

    /// Computes the score without judging it.
    pub fn score(
        &self,
        state: &TokenStateBundle,
        bundle: &ActionBundle,
        math: &mut CertifiedMath<'_>,
    ) -> Result<StabilityScore, ArithmeticError> {
        let p = &self.policy;
        let cost = &bundle.cost;

        let coherence = self.aggregate_coherence(state, math)?;
        let info_term = math.mul(p.info_weight, cost.effective_information)?;

        let lambda_delta = math.sub(cost.lambda_after, cost.lambda_before)?;
        let lambda_delta = math.abs(lambda_delta)?;
        let lambda_term = math.mul(p.lambda_weight, lambda_delta)?;

        let entropy_delta = math.sub(cost.entropy_after, cost.entropy_before)?;
        let entropy_delta = math.clamp(entropy_delta, FixedPointValue::ZERO, FixedPointValue::MAX)?;
        let entropy_term = math.mul(p.entropy_weight, entropy_delta)?;

        let action_cost = math.sum([info_term, lambda_term, entropy_term])?;
        let health = math.sub(coherence, action_cost)?;

        Ok(StabilityScore {
            coherence,
            info_term,
            lambda_term,
            entropy_term,
            action_cost,
            health,
        })
    }

    /// Directional check, then score, then the admissible band.
    pub fn validate(
        &self,
        state: &TokenStateBundle,
        bundle: &ActionBundle,
        math: &mut CertifiedMath<'_>,
    ) -> Result<StabilityScore, ViolationReport> {
        self.check_directional_consistency(bundle)?;

        let score = self
            .score(state, bundle, math)
            .map_err(|e| ViolationReport::arithmetic(e, "stability score"))?;
        let p = &self.policy;

        if score.coherence < p.min_coherence {
            return Err(ViolationReport::new(
                ViolationKind::CoherenceTooLow,
                format!("coherence {} below minimum {}", score.coherence, p.min_coherence),
            )
            .with_evidence(Evidence::none().observed(score.coherence).limit(p.min_coherence)));
        }
        if score.action_cost > p.max_action_cost {
            return Err(ViolationReport::new(
                ViolationKind::ActionCostExceeded,
                format!("action cost {} exceeds {}", score.action_cost, p.max_action_cost),
            )
            .with_evidence(Evidence::none().observed(score.action_cost).limit(p.max_action_cost)));
        }
        if score.health < p.health_floor || score.health > p.health_ceiling {
            let limit = if score.health < p.health_floor {
                p.health_floor
            } else {
                p.health_ceiling
            };
            return Err(ViolationReport::new(
                ViolationKind::StabilityBand,
                format!(
                    "health {} outside [{}, {}]",
                    score.health, p.health_floor, p.health_ceiling
                ),
            )
            .with_evidence(Evidence::none().observed(score.health).limit(limit)));
        }

        Ok(score)
    }
}
