// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Economic bounds: per-action, daily and lifetime reward caps, allocation
//! caps and mintable-token supply ceilings.
//!
//! Every limit comes from the state's parameter table, which is fixed at
//! genesis. A request that would push a running total past its bound is
//! rejected whole; nothing is clamped.

use crate::error::ArithmeticError;
use crate::fxp::{CertifiedMath, FixedPointValue};
use crate::guard::violation::{Evidence, ValidationResult, ViolationKind};
use crate::state::action::{ActionBundle, ActionKind, Allocation};
use crate::state::bundle::{RewardLedger, TokenStateBundle};
use crate::types::{ParamName, Parameters, Token};

/// Reward day window containing `timestamp`.
pub fn day_index(params: &Parameters, timestamp: u64) -> u64 {
    let seconds = params.get(ParamName::SecondsPerDay).raw() / crate::config::SCALE;
    let seconds = u64::try_from(seconds).unwrap_or(u64::MAX).max(1);
    timestamp / seconds
}

#[derive(Clone, Debug)]
pub struct EconomicsGuard {
    max_reward_per_action: FixedPointValue,
    max_daily_reward: FixedPointValue,
    max_lifetime_reward: FixedPointValue,
    max_allocation_per_action: FixedPointValue,
    params: Parameters,
}

impl EconomicsGuard {
    pub fn from_parameters(params: &Parameters) -> Self {
        Self {
            max_reward_per_action: params.get(ParamName::MaxRewardPerAction),
            max_daily_reward: params.get(ParamName::MaxDailyReward),
            max_lifetime_reward: params.get(ParamName::MaxLifetimeReward),
            max_allocation_per_action: params.get(ParamName::MaxAllocationPerAction),
            params: params.clone(),
        }
    }

    /// Checks one reward against the per-action, daily and lifetime caps.
    ///
    /// `daily_total_so_far` must already be reset for a new day window.
    pub fn validate_reward(
        &self,
        amount: FixedPointValue,
        daily_total_so_far: FixedPointValue,
        total_supply_so_far: FixedPointValue,
        math: &mut CertifiedMath<'_>,
    ) -> ValidationResult {
        if !amount.is_positive() {
            return ValidationResult::fail(ViolationKind::MalformedAction, "reward amount must be positive")
                .with_evidence(Evidence::none().token(Token::Reserve).observed(amount));
        }

        if amount > self.max_reward_per_action {
            return ValidationResult::fail(
                ViolationKind::RewardPerActionExceeded,
                format!("reward {amount} exceeds per-action cap {}", self.max_reward_per_action),
            )
            .with_evidence(
                Evidence::none()
                    .token(Token::Reserve)
                    .observed(amount)
                    .limit(self.max_reward_per_action),
            );
        }

        let daily = match math.add(daily_total_so_far, amount) {
            Ok(v) => v,
            Err(e) => return ValidationResult::arithmetic(e, "daily reward total"),
        };
        if daily > self.max_daily_reward {
            return ValidationResult::fail(
                ViolationKind::DailyRewardCapExceeded,
                format!("daily reward total {daily} would exceed cap {}", self.max_daily_reward),
            )
            .with_evidence(Evidence::none().observed(daily).limit(self.max_daily_reward));
        }

        let lifetime = match math.add(total_supply_so_far, amount) {
            Ok(v) => v,
            Err(e) => return ValidationResult::arithmetic(e, "lifetime reward total"),
        };
        if lifetime > self.max_lifetime_reward {
            return ValidationResult::fail(
                ViolationKind::LifetimeRewardCapExceeded,
                format!("lifetime reward total {lifetime} would exceed cap {}", self.max_lifetime_reward),
            )
            .with_evidence(Evidence::none().observed(lifetime).limit(self.max_lifetime_reward));
        }

        ValidationResult::pass()
    }

    /// Checks one mint/burn record. `running_supply` is the token's supply
    /// after every earlier record of the same transition.
    pub fn validate_allocation(
        &self,
        allocation: &Allocation,
        running_supply: FixedPointValue,
        math: &mut CertifiedMath<'_>,
    ) -> ValidationResult {
        let Some(ceiling_param) = ParamName::max_supply_for(allocation.token) else {
            return ValidationResult::fail(ViolationKind::MalformedAction, "reserve supply is fixed")
                .with_evidence(Evidence::none().shard(&allocation.shard).token(allocation.token));
        };

        let magnitude = match math.abs(allocation.amount) {
            Ok(v) => v,
            Err(e) => return ValidationResult::arithmetic(e, "allocation magnitude"),
        };
        if magnitude > self.max_allocation_per_action {
            return ValidationResult::fail(
                ViolationKind::AllocationCapExceeded,
                format!(
                    "allocation of {} {} exceeds per-action cap {}",
                    allocation.amount, allocation.token, self.max_allocation_per_action
                ),
            )
            .with_evidence(
                Evidence::none()
                    .shard(&allocation.shard)
                    .token(allocation.token)
                    .observed(allocation.amount)
                    .limit(self.max_allocation_per_action),
            );
        }

        let ceiling = self.params.get(ceiling_param);
        let after = match math.add(running_supply, allocation.amount) {
            Ok(v) => v,
            Err(e) => return ValidationResult::arithmetic(e, "running supply"),
        };
        if after > ceiling {
            return ValidationResult::fail(
                ViolationKind::TokenSupplyCapExceeded,
                format!("{} supply {after} would exceed ceiling {ceiling}", allocation.token),
            )
            .with_evidence(Evidence::none().token(allocation.token).observed(after).limit(ceiling));
        }

        ValidationResult::pass()
    }

    /// Reward totals for the window `timestamp` falls in.
    pub fn reward_window(&self, ledger: &RewardLedger, timestamp: u64) -> RewardLedger {
        let day = day_index(&self.params, timestamp);
        if day == ledger.day_index {
            *ledger
        } else {
            RewardLedger {
                day_index: day,
                distributed_today: FixedPointValue::ZERO,
                distributed_total: ledger.distributed_total,
            }
        }
    }

    /// Reserve paid to non-treasury shards by a reward bundle.
    pub fn reward_amount(
        &self,
        state: &TokenStateBundle,
        bundle: &ActionBundle,
        math: &mut CertifiedMath<'_>,
    ) -> Result<FixedPointValue, ArithmeticError> {
        math.sum(
            bundle
                .deltas
                .iter()
                .filter(|(shard, _)| *shard != state.treasury())
                .map(|(_, d)| d.reserve),
        )
    }

    /// Kind-specific economic checks on a proposed bundle.
    pub fn validate_bundle(
        &self,
        state: &TokenStateBundle,
        bundle: &ActionBundle,
        math: &mut CertifiedMath<'_>,
    ) -> ValidationResult {
        match bundle.kind {
            ActionKind::Reward => self.validate_reward_bundle(state, bundle, math),
            ActionKind::Allocation => self.validate_allocations(state, bundle, math),
            ActionKind::Transfer | ActionKind::Exchange => ValidationResult::pass(),
        }
    }

    fn validate_reward_bundle(
        &self,
        state: &TokenStateBundle,
        bundle: &ActionBundle,
        math: &mut CertifiedMath<'_>,
    ) -> ValidationResult {
        for (shard, delta) in &bundle.deltas {
            if let Some(token) = delta.touched().find(|t| *t != Token::Reserve) {
                return ValidationResult::fail(ViolationKind::MalformedAction, "rewards pay reserve only")
                    .with_evidence(Evidence::none().shard(shard).token(token));
            }
            if shard != state.treasury() && delta.reserve.is_negative() {
                return ValidationResult::fail(ViolationKind::MalformedAction, "reward cannot debit a recipient")
                    .with_evidence(Evidence::none().shard(shard).observed(delta.reserve));
            }
        }

        let amount = match self.reward_amount(state, bundle, math) {
            Ok(v) => v,
            Err(e) => return ValidationResult::arithmetic(e, "reward amount"),
        };
        let window = self.reward_window(state.rewards(), bundle.timestamp);
        self.validate_reward(amount, window.distributed_today, window.distributed_total, math)
            .with_actor(&bundle.actor.actor)
    }

    fn validate_allocations(
        &self,
        state: &TokenStateBundle,
        bundle: &ActionBundle,
        math: &mut CertifiedMath<'_>,
    ) -> ValidationResult {
        let mut running = match state.totals(math) {
            Ok(t) => t,
            Err(e) => return ValidationResult::arithmetic(e, "current supply"),
        };
        for allocation in &bundle.allocations {
            let current = running.get(allocation.token);
            let result = self.validate_allocation(allocation, current, math);
            if !result.is_pass() {
                return result;
            }
            match math.add(current, allocation.amount) {
                Ok(next) => running = running.with(allocation.token, next),
                Err(e) => return ValidationResult::arithmetic(e, "running supply"),
            }
        }
        ValidationResult::pass()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fxp::OperationLog;
    use crate::types::ShardId;

    fn guard() -> EconomicsGuard {
        EconomicsGuard::from_parameters(&Parameters::defaults())
    }

    #[test]
    fn reward_at_cap_passes_and_above_fails() {
        let mut log = OperationLog::new();
        let mut math = CertifiedMath::new(&mut log, "t");
        let z = FixedPointValue::ZERO;
        assert!(guard().validate_reward(FixedPointValue::from_int(1_000), z, z, &mut math).is_pass());
        let over = guard().validate_reward(FixedPointValue::from_int(1_001), z, z, &mut math);
        assert_eq!(over.violation_kind, Some(ViolationKind::RewardPerActionExceeded));
    }

    #[test]
    fn daily_and_lifetime_caps_use_running_totals() {
        let mut log = OperationLog::new();
        let mut math = CertifiedMath::new(&mut log, "t");
        let amount = FixedPointValue::from_int(500);
        let daily = guard().validate_reward(amount, FixedPointValue::from_int(9_600), FixedPointValue::ZERO, &mut math);
        assert_eq!(daily.violation_kind, Some(ViolationKind::DailyRewardCapExceeded));

        let lifetime = guard().validate_reward(
            amount,
            FixedPointValue::ZERO,
            FixedPointValue::from_int(4_999_600),
            &mut math,
        );
        assert_eq!(lifetime.violation_kind, Some(ViolationKind::LifetimeRewardCapExceeded));
    }

    #[test]
    fn allocation_respects_cap_and_ceiling() {
        let params = Parameters::defaults().with(ParamName::MaxVotingSupply, FixedPointValue::from_int(1_050));
        let guard = EconomicsGuard::from_parameters(&params);
        let mut log = OperationLog::new();
        let mut math = CertifiedMath::new(&mut log, "t");

        let big = Allocation {
            shard: ShardId::new("a"),
            token: Token::Flow,
            amount: FixedPointValue::from_int(100_001),
        };
        let r = guard.validate_allocation(&big, FixedPointValue::ZERO, &mut math);
        assert_eq!(r.violation_kind, Some(ViolationKind::AllocationCapExceeded));

        let mint = Allocation {
            shard: ShardId::new("a"),
            token: Token::Voting,
            amount: FixedPointValue::from_int(51),
        };
        let r = guard.validate_allocation(&mint, FixedPointValue::from_int(1_000), &mut math);
        assert_eq!(r.violation_kind, Some(ViolationKind::TokenSupplyCapExceeded));

        let reserve = Allocation {
            shard: ShardId::new("a"),
            token: Token::Reserve,
            amount: FixedPointValue::ONE,
        };
        let r = guard.validate_allocation(&reserve, FixedPointValue::ZERO, &mut math);
        assert_eq!(r.violation_kind, Some(ViolationKind::MalformedAction));
    }

    #[test]
    fn reward_window_resets_on_new_day() {
        let g = guard();
        let ledger = RewardLedger {
            day_index: 0,
            distributed_today: FixedPointValue::from_int(10),
            distributed_total: FixedPointValue::from_int(50),
        };
        assert_eq!(g.reward_window(&ledger, 86_399), ledger);
        let next = g.reward_window(&ledger, 86_400);
        assert_eq!(next.day_index, 1);
        assert!(next.distributed_today.is_zero());
        assert_eq!(next.distributed_total, FixedPointValue::from_int(50));
    }
}
