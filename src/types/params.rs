// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! System parameters: table-driven economic constants fixed at genesis.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::fxp::FixedPointValue;
use crate::types::token::Token;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ParamName {
    TotalReserveSupply,
    MaxRewardPerAction,
    MaxDailyReward,
    MaxLifetimeReward,
    MaxAllocationPerAction,
    MaxFlowSupply,
    MaxAttractorSupply,
    MaxResonanceSupply,
    MaxVotingSupply,
    VotingPowerCeiling,
    MinCoherence,
    HealthFloor,
    HealthCeiling,
    MaxActionCost,
    InfoWeight,
    LambdaWeight,
    EntropyWeight,
    SecondsPerDay,
}

impl ParamName {
    pub const ALL: [ParamName; 18] = [
        ParamName::TotalReserveSupply,
        ParamName::MaxRewardPerAction,
        ParamName::MaxDailyReward,
        ParamName::MaxLifetimeReward,
        ParamName::MaxAllocationPerAction,
        ParamName::MaxFlowSupply,
        ParamName::MaxAttractorSupply,
        ParamName::MaxResonanceSupply,
        ParamName::MaxVotingSupply,
        ParamName::VotingPowerCeiling,
        ParamName::MinCoherence,
        ParamName::HealthFloor,
        ParamName::HealthCeiling,
        ParamName::MaxActionCost,
        ParamName::InfoWeight,
        ParamName::LambdaWeight,
        ParamName::EntropyWeight,
        ParamName::SecondsPerDay,
    ];

    /// Stable code used in state hashing.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Pinned reference value.
    pub const fn default_value(self) -> FixedPointValue {
        match self {
            ParamName::TotalReserveSupply => FixedPointValue::from_int(10_000_000),
            ParamName::MaxRewardPerAction => FixedPointValue::from_int(1_000),
            ParamName::MaxDailyReward => FixedPointValue::from_int(10_000),
            ParamName::MaxLifetimeReward => FixedPointValue::from_int(5_000_000),
            ParamName::MaxAllocationPerAction => FixedPointValue::from_int(100_000),
            ParamName::MaxFlowSupply
            | ParamName::MaxAttractorSupply
            | ParamName::MaxResonanceSupply
            | ParamName::MaxVotingSupply => FixedPointValue::from_int(1_000_000_000),
            ParamName::VotingPowerCeiling => FixedPointValue::milli(250),
            ParamName::MinCoherence => FixedPointValue::milli(100),
            ParamName::HealthFloor => FixedPointValue::ZERO,
            ParamName::HealthCeiling => FixedPointValue::ONE,
            ParamName::MaxActionCost => FixedPointValue::milli(500),
            // 0.000001
            ParamName::InfoWeight => FixedPointValue::from_raw(1_000_000_000_000),
            ParamName::LambdaWeight => FixedPointValue::milli(100),
            ParamName::EntropyWeight => FixedPointValue::milli(50),
            ParamName::SecondsPerDay => FixedPointValue::from_int(86_400),
        }
    }

    /// Supply ceiling parameter for a mintable token.
    pub const fn max_supply_for(token: Token) -> Option<ParamName> {
        match token {
            Token::Reserve => None,
            Token::Flow => Some(ParamName::MaxFlowSupply),
            Token::Attractor => Some(ParamName::MaxAttractorSupply),
            Token::Resonance => Some(ParamName::MaxResonanceSupply),
            Token::Voting => Some(ParamName::MaxVotingSupply),
        }
    }
}

/// Read-only parameter table carried by every state bundle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters(BTreeMap<ParamName, FixedPointValue>);

impl Parameters {
    pub fn defaults() -> Self {
        Parameters(ParamName::ALL.into_iter().map(|p| (p, p.default_value())).collect())
    }

    /// Defaults with the given entries replaced.
    pub fn with_overrides<I>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (ParamName, FixedPointValue)>,
    {
        let mut params = Self::defaults();
        params.0.extend(overrides);
        params
    }

    pub fn with(mut self, name: ParamName, value: FixedPointValue) -> Self {
        self.0.insert(name, value);
        self
    }

    /// Value of `name`; a table missing the entry falls back to the pinned default.
    pub fn get(&self, name: ParamName) -> FixedPointValue {
        self.0.get(&name).copied().unwrap_or_else(|| name.default_value())
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParamName, FixedPointValue)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self::defaults()
    }
}
