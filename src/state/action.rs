// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Proposed transitions.
//!
//! An [`ActionBundle`] is the whole change a caller wants applied: per-shard
//! signed deltas over all five tokens, any mint/burn allocation records, the
//! declared cost inputs for the stability validator, and the injected
//! timestamp. It is always submitted together with a [`TransitionContext`]
//! stating why the change is being attempted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::ACTION_HASH_DOMAIN;
use crate::error::{ArithmeticError, Result};
use crate::fxp::FixedPointValue;
use crate::snapshot::canonical::to_canonical_bytes;
use crate::snapshot::hash::{hash_with_domain, Hash32};
use crate::types::{ActorId, PerShardBalances, ShardId, Token};

/// Why a transition is being attempted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransitionContext {
    UserTransfer,
    RewardDistribution,
    GovernanceAllocation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Reserve paid out of the treasury shard.
    Reward,
    /// Tokens moved between shards; supply unchanged.
    Transfer,
    /// Two shards swap balances as one unit.
    Exchange,
    /// Mint or burn of a mintable token through explicit records.
    Allocation,
}

/// One mint (positive) or burn (negative) entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub shard: ShardId,
    pub token: Token,
    pub amount: FixedPointValue,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Increase,
    Decrease,
}

/// Declared direction of change for one token on one shard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionSignal {
    pub shard: ShardId,
    pub token: Token,
    pub direction: Direction,
}

/// Inputs to the stability score, declared by the caller.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostInputs {
    pub effective_information: FixedPointValue,
    pub lambda_before: FixedPointValue,
    pub lambda_after: FixedPointValue,
    pub entropy_before: FixedPointValue,
    pub entropy_after: FixedPointValue,
    pub direction_signals: Vec<DirectionSignal>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    pub actor: ActorId,
    /// Tags every certified operation performed for this bundle.
    pub correlation_id: String,
}

impl ActorContext {
    pub fn new(actor: impl Into<String>, correlation_id: impl Into<String>) -> Self {
        Self {
            actor: ActorId::new(actor),
            correlation_id: correlation_id.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionBundle {
    pub kind: ActionKind,
    pub deltas: BTreeMap<ShardId, PerShardBalances>,
    #[serde(default)]
    pub allocations: Vec<Allocation>,
    pub actor: ActorContext,
    #[serde(default)]
    pub cost: CostInputs,
    pub timestamp: u64,
}

impl ActionBundle {
    /// Treasury pays each recipient its amount of reserve.
    pub fn reward(
        treasury: &ShardId,
        recipients: &[(ShardId, FixedPointValue)],
        actor: ActorContext,
        timestamp: u64,
    ) -> core::result::Result<Self, ArithmeticError> {
        let mut deltas = BTreeMap::new();
        for (shard, amount) in recipients {
            add_delta(&mut deltas, shard, Token::Reserve, *amount)?;
            add_delta(&mut deltas, treasury, Token::Reserve, amount.checked_neg()?)?;
        }
        Ok(Self::assemble(ActionKind::Reward, deltas, Vec::new(), actor, timestamp))
    }

    pub fn transfer(
        from: &ShardId,
        to: &ShardId,
        token: Token,
        amount: FixedPointValue,
        actor: ActorContext,
        timestamp: u64,
    ) -> core::result::Result<Self, ArithmeticError> {
        let mut deltas = BTreeMap::new();
        add_delta(&mut deltas, from, token, amount.checked_neg()?)?;
        add_delta(&mut deltas, to, token, amount)?;
        Ok(Self::assemble(ActionKind::Transfer, deltas, Vec::new(), actor, timestamp))
    }

    /// `a` gives `a_gives` to `b`, `b` gives `b_gives` to `a`, in one transition.
    pub fn exchange(
        a: &ShardId,
        a_gives: (Token, FixedPointValue),
        b: &ShardId,
        b_gives: (Token, FixedPointValue),
        actor: ActorContext,
        timestamp: u64,
    ) -> core::result::Result<Self, ArithmeticError> {
        let mut deltas = BTreeMap::new();
        add_delta(&mut deltas, a, a_gives.0, a_gives.1.checked_neg()?)?;
        add_delta(&mut deltas, b, a_gives.0, a_gives.1)?;
        add_delta(&mut deltas, b, b_gives.0, b_gives.1.checked_neg()?)?;
        add_delta(&mut deltas, a, b_gives.0, b_gives.1)?;
        Ok(Self::assemble(ActionKind::Exchange, deltas, Vec::new(), actor, timestamp))
    }

    /// Deltas are derived from the allocation records.
    pub fn allocation(
        allocations: Vec<Allocation>,
        actor: ActorContext,
        timestamp: u64,
    ) -> core::result::Result<Self, ArithmeticError> {
        let mut deltas = BTreeMap::new();
        for a in &allocations {
            add_delta(&mut deltas, &a.shard, a.token, a.amount)?;
        }
        Ok(Self::assemble(ActionKind::Allocation, deltas, allocations, actor, timestamp))
    }

    fn assemble(
        kind: ActionKind,
        deltas: BTreeMap<ShardId, PerShardBalances>,
        allocations: Vec<Allocation>,
        actor: ActorContext,
        timestamp: u64,
    ) -> Self {
        Self {
            kind,
            deltas,
            allocations,
            actor,
            cost: CostInputs::default(),
            timestamp,
        }
    }

    pub fn with_cost(mut self, cost: CostInputs) -> Self {
        self.cost = cost;
        self
    }

    /// Shards this bundle touches, in key order.
    pub fn targets(&self) -> Vec<ShardId> {
        let mut targets: Vec<ShardId> = self.deltas.keys().cloned().collect();
        for a in &self.allocations {
            if !targets.contains(&a.shard) {
                targets.push(a.shard.clone());
            }
        }
        targets.sort();
        targets
    }

    /// Whether any delta or allocation moves `token`.
    pub fn touches_token(&self, token: Token) -> bool {
        self.deltas.values().any(|d| !d.get(token).is_zero())
            || self.allocations.iter().any(|a| a.token == token && !a.amount.is_zero())
    }

    pub fn delta_for(&self, shard: &ShardId, token: Token) -> FixedPointValue {
        self.deltas
            .get(shard)
            .map(|d| d.get(token))
            .unwrap_or(FixedPointValue::ZERO)
    }

    /// BLAKE3 over the canonical JSON of the bundle.
    pub fn action_hash(&self) -> Result<Hash32> {
        let bytes = to_canonical_bytes(self)?;
        Ok(hash_with_domain(ACTION_HASH_DOMAIN, &bytes))
    }
}

fn add_delta(
    deltas: &mut BTreeMap<ShardId, PerShardBalances>,
    shard: &ShardId,
    token: Token,
    amount: FixedPointValue,
) -> core::result::Result<(), ArithmeticError> {
    let entry = deltas.entry(shard.clone()).or_insert(PerShardBalances::ZERO);
    let updated = entry.get(token).checked_add(amount)?;
    *entry = entry.with(token, updated);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor() -> ActorContext {
        ActorContext::new("alice", "c-1")
    }

    #[test]
    fn reward_debits_treasury_once_per_recipient() {
        let treasury = ShardId::new("treasury");
        let bundle = ActionBundle::reward(
            &treasury,
            &[
                (ShardId::new("a"), FixedPointValue::from_int(40)),
                (ShardId::new("b"), FixedPointValue::from_int(60)),
            ],
            actor(),
            5,
        )
        .unwrap();
        assert_eq!(bundle.delta_for(&treasury, Token::Reserve), FixedPointValue::from_int(-100));
        assert_eq!(bundle.targets().len(), 3);
    }

    #[test]
    fn exchange_moves_both_legs() {
        let a = ShardId::new("a");
        let b = ShardId::new("b");
        let bundle = ActionBundle::exchange(
            &a,
            (Token::Flow, FixedPointValue::from_int(5)),
            &b,
            (Token::Resonance, FixedPointValue::from_int(2)),
            actor(),
            0,
        )
        .unwrap();
        assert_eq!(bundle.delta_for(&a, Token::Flow), FixedPointValue::from_int(-5));
        assert_eq!(bundle.delta_for(&a, Token::Resonance), FixedPointValue::from_int(2));
        assert_eq!(bundle.delta_for(&b, Token::Flow), FixedPointValue::from_int(5));
        assert!(!bundle.touches_token(Token::Voting));
    }

    #[test]
    fn action_hash_is_stable_and_covers_timestamp() {
        let a = ShardId::new("a");
        let b = ShardId::new("b");
        let one = ActionBundle::transfer(&a, &b, Token::Flow, FixedPointValue::ONE, actor(), 1).unwrap();
        let two = one.clone();
        assert_eq!(one.action_hash().unwrap(), two.action_hash().unwrap());
        let later = ActionBundle { timestamp: 2, ..one.clone() };
        assert_ne!(one.action_hash().unwrap(), later.action_hash().unwrap());
    }
}
