// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! The canonical economic state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ArithmeticError, KernelError, Result};
use crate::fxp::{CertifiedMath, FixedPointValue, OperationLog};
use crate::guard::economics::day_index;
use crate::guard::supply::SupplyInvariantChecker;
use crate::guard::violation::{Evidence, ViolationKind, ViolationReport};
use crate::signing::Signature;
use crate::snapshot::hash::{state_hash, Hash32};
use crate::types::{ParamName, Parameters, PerShardBalances, SequenceId, ShardId, Token};

/// Reward totals carried in state so daily and lifetime caps replay exactly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardLedger {
    /// `timestamp / SecondsPerDay` of the window `distributed_today` covers.
    pub day_index: u64,
    pub distributed_today: FixedPointValue,
    pub distributed_total: FixedPointValue,
}

/// Immutable snapshot of all five token balances across every shard.
///
/// Successors are produced only by the transition engine. The bundle is
/// never mutated once it has been committed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenStateBundle {
    pub(crate) balances_per_shard: BTreeMap<ShardId, PerShardBalances>,
    pub(crate) sequence_id: SequenceId,
    pub(crate) prior_state_hash: Hash32,
    pub(crate) parameters: Parameters,
    pub(crate) treasury: ShardId,
    pub(crate) rewards: RewardLedger,
    pub(crate) last_timestamp: u64,
    #[serde(default)]
    pub(crate) signature: Option<Signature>,
}

/// Genesis description, usually loaded from JSON.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisSpec {
    pub treasury: ShardId,
    pub shards: BTreeMap<ShardId, PerShardBalances>,
    #[serde(default)]
    pub parameters: BTreeMap<ParamName, FixedPointValue>,
    #[serde(default)]
    pub genesis_timestamp: u64,
}

impl TokenStateBundle {
    /// Builds and validates sequence 0.
    ///
    /// The genesis state must already satisfy every state invariant: the
    /// reserve sum equals `TotalReserveSupply`, no balance is negative, no
    /// mintable supply exceeds its ceiling and no shard holds more than the
    /// voting ceiling.
    pub fn genesis(spec: &GenesisSpec) -> Result<Self> {
        let parameters = Parameters::with_overrides(spec.parameters.iter().map(|(k, v)| (*k, *v)));

        if !spec.shards.contains_key(&spec.treasury) {
            return Err(invalid_genesis(
                ViolationReport::new(ViolationKind::MalformedAction, "treasury shard is not part of genesis")
                    .with_evidence(Evidence::none().shard(&spec.treasury)),
            ));
        }
        if parameters.get(ParamName::SecondsPerDay) < FixedPointValue::ONE {
            return Err(invalid_genesis(ViolationReport::new(
                ViolationKind::MalformedAction,
                "SecondsPerDay must be at least one second",
            )));
        }

        let bundle = Self {
            balances_per_shard: spec.shards.clone(),
            sequence_id: SequenceId::GENESIS,
            prior_state_hash: Hash32::ZERO,
            treasury: spec.treasury.clone(),
            rewards: RewardLedger {
                day_index: day_index(&parameters, spec.genesis_timestamp),
                ..RewardLedger::default()
            },
            last_timestamp: spec.genesis_timestamp,
            parameters,
            signature: None,
        };

        let mut scratch = OperationLog::new();
        let mut math = CertifiedMath::new(&mut scratch, "genesis");
        SupplyInvariantChecker::from_parameters(&bundle.parameters)
            .check_state(&bundle, &mut math)
            .into_result()
            .map_err(invalid_genesis)?;

        Ok(bundle)
    }

    pub fn balances(&self) -> &BTreeMap<ShardId, PerShardBalances> {
        &self.balances_per_shard
    }

    pub fn shard(&self, id: &ShardId) -> Option<&PerShardBalances> {
        self.balances_per_shard.get(id)
    }

    pub fn contains_shard(&self, id: &ShardId) -> bool {
        self.balances_per_shard.contains_key(id)
    }

    pub fn sequence_id(&self) -> SequenceId {
        self.sequence_id
    }

    pub fn prior_state_hash(&self) -> Hash32 {
        self.prior_state_hash
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn param(&self, name: ParamName) -> FixedPointValue {
        self.parameters.get(name)
    }

    pub fn treasury(&self) -> &ShardId {
        &self.treasury
    }

    pub fn rewards(&self) -> &RewardLedger {
        &self.rewards
    }

    pub fn last_timestamp(&self) -> u64 {
        self.last_timestamp
    }

    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    /// Canonical BLAKE3 hash; see [`state_hash`].
    pub fn state_hash(&self) -> Hash32 {
        state_hash(self)
    }

    /// Sum of one token across all shards, through certified arithmetic.
    pub fn total(&self, token: Token, math: &mut CertifiedMath<'_>) -> core::result::Result<FixedPointValue, ArithmeticError> {
        math.sum(self.balances_per_shard.values().map(|b| b.get(token)))
    }

    /// Per-token totals across all shards.
    pub fn totals(&self, math: &mut CertifiedMath<'_>) -> core::result::Result<PerShardBalances, ArithmeticError> {
        let mut totals = PerShardBalances::ZERO;
        for token in Token::ALL {
            totals = totals.with(token, self.total(token, math)?);
        }
        Ok(totals)
    }

    /// Totals without an operation log, for reporting.
    pub fn totals_unlogged(&self) -> core::result::Result<PerShardBalances, ArithmeticError> {
        let mut scratch = OperationLog::new();
        let mut math = CertifiedMath::new(&mut scratch, "report");
        self.totals(&mut math)
    }
}

fn invalid_genesis(report: ViolationReport) -> KernelError {
    KernelError::InvalidGenesis(Box::new(report))
}
