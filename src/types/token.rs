// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! The five ledger tokens and the per-shard balance record.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ArithmeticError;
use crate::fxp::{CertifiedMath, FixedPointValue};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Token {
    /// Fixed-supply reserve token.
    Reserve = 0,
    /// Flow token.
    Flow = 1,
    /// Reputation / attractor token.
    Attractor = 2,
    /// Resonance token.
    Resonance = 3,
    /// Node-voting token.
    Voting = 4,
}

impl Token {
    /// Canonical order; hashing and iteration always follow it.
    pub const ALL: [Token; 5] = [
        Token::Reserve,
        Token::Flow,
        Token::Attractor,
        Token::Resonance,
        Token::Voting,
    ];

    /// Tokens whose supply may change through logged allocations.
    pub const MINTABLE: [Token; 4] = [Token::Flow, Token::Attractor, Token::Resonance, Token::Voting];

    pub const fn is_mintable(self) -> bool {
        !matches!(self, Token::Reserve)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Token::Reserve => "reserve",
            Token::Flow => "flow",
            Token::Attractor => "attractor",
            Token::Resonance => "resonance",
            Token::Voting => "voting",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All five balances of one shard. Also used as a signed delta.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerShardBalances {
    #[serde(default)]
    pub reserve: FixedPointValue,
    #[serde(default)]
    pub flow: FixedPointValue,
    #[serde(default)]
    pub attractor: FixedPointValue,
    #[serde(default)]
    pub resonance: FixedPointValue,
    #[serde(default)]
    pub voting: FixedPointValue,
}

impl PerShardBalances {
    pub const ZERO: PerShardBalances = PerShardBalances {
        reserve: FixedPointValue::ZERO,
        flow: FixedPointValue::ZERO,
        attractor: FixedPointValue::ZERO,
        resonance: FixedPointValue::ZERO,
        voting: FixedPointValue::ZERO,
    };

    pub const fn get(&self, token: Token) -> FixedPointValue {
        match token {
            Token::Reserve => self.reserve,
            Token::Flow => self.flow,
            Token::Attractor => self.attractor,
            Token::Resonance => self.resonance,
            Token::Voting => self.voting,
        }
    }

    /// Copy with one token replaced.
    pub fn with(mut self, token: Token, value: FixedPointValue) -> Self {
        match token {
            Token::Reserve => self.reserve = value,
            Token::Flow => self.flow = value,
            Token::Attractor => self.attractor = value,
            Token::Resonance => self.resonance = value,
            Token::Voting => self.voting = value,
        }
        self
    }

    /// `(token, value)` pairs in canonical token order.
    pub fn iter(&self) -> impl Iterator<Item = (Token, FixedPointValue)> + '_ {
        Token::ALL.into_iter().map(move |t| (t, self.get(t)))
    }

    pub fn is_zero(&self) -> bool {
        self.iter().all(|(_, v)| v.is_zero())
    }

    /// Tokens with a non-zero entry.
    pub fn touched(&self) -> impl Iterator<Item = Token> + '_ {
        self.iter().filter(|(_, v)| !v.is_zero()).map(|(t, _)| t)
    }

    /// Applies a signed delta to all five balances as one unit.
    ///
    /// Either every token is updated and the new record is returned, or the
    /// first arithmetic failure is returned and `self` is untouched.
    pub fn apply_delta(
        &self,
        delta: &PerShardBalances,
        math: &mut CertifiedMath<'_>,
    ) -> Result<PerShardBalances, ArithmeticError> {
        Ok(PerShardBalances {
            reserve: math.add(self.reserve, delta.reserve)?,
            flow: math.add(self.flow, delta.flow)?,
            attractor: math.add(self.attractor, delta.attractor)?,
            resonance: math.add(self.resonance, delta.resonance)?,
            voting: math.add(self.voting, delta.voting)?,
        })
    }

    /// Sum of the five entries (used for directional checks on deltas).
    pub fn net(&self, math: &mut CertifiedMath<'_>) -> Result<FixedPointValue, ArithmeticError> {
        math.sum(self.iter().map(|(_, v)| v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fxp::OperationLog;

    #[test]
    fn apply_delta_updates_every_token() {
        let base = PerShardBalances::ZERO
            .with(Token::Reserve, FixedPointValue::from_int(10))
            .with(Token::Voting, FixedPointValue::from_int(3));
        let delta = PerShardBalances::ZERO
            .with(Token::Reserve, FixedPointValue::from_int(-4))
            .with(Token::Flow, FixedPointValue::from_int(2));

        let mut log = OperationLog::new();
        let mut math = CertifiedMath::new(&mut log, "t");
        let next = base.apply_delta(&delta, &mut math).unwrap();

        assert_eq!(next.reserve, FixedPointValue::from_int(6));
        assert_eq!(next.flow, FixedPointValue::from_int(2));
        assert_eq!(next.voting, FixedPointValue::from_int(3));
        assert_eq!(log.len(), 5);
    }

    #[test]
    fn apply_delta_fails_whole_on_overflow() {
        let base = PerShardBalances::ZERO.with(Token::Voting, FixedPointValue::MAX);
        let delta = PerShardBalances::ZERO
            .with(Token::Reserve, FixedPointValue::ONE)
            .with(Token::Voting, FixedPointValue::ONE);
        let mut log = OperationLog::new();
        let mut math = CertifiedMath::new(&mut log, "t");
        assert!(base.apply_delta(&delta, &mut math).is_err());
        assert_eq!(base.reserve, FixedPointValue::ZERO);
    }

    #[test]
    fn touched_lists_nonzero_tokens_in_order() {
        let delta = PerShardBalances::ZERO
            .with(Token::Voting, FixedPointValue::ONE)
            .with(Token::Flow, FixedPointValue::ONE);
        let touched: Vec<Token> = delta.touched().collect();
        assert_eq!(touched, vec![Token::Flow, Token::Voting]);
    }
}
