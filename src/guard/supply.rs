// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Supply and voting-power invariants.
//!
//! # Invariants
//! - The reserve summed over all shards equals `TotalReserveSupply`.
//! - For every mintable token, `next_total - previous_total` equals the sum
//!   of the allocation records of the same transition, to the last raw unit.
//! - No balance is negative; flow is checked explicitly.
//! - No shard holds more than `VotingPowerCeiling` of the voting supply.
//! - No mintable supply exceeds its ceiling.

use crate::fxp::{CertifiedMath, FixedPointValue};
use crate::guard::violation::{Evidence, ValidationResult, ViolationKind};
use crate::state::action::Allocation;
use crate::state::bundle::TokenStateBundle;
use crate::types::{ParamName, Parameters, Token};

#[derive(Clone, Debug)]
pub struct SupplyInvariantChecker {
    total_reserve_supply: FixedPointValue,
    voting_ceiling: FixedPointValue,
    params: Parameters,
}

macro_rules! try_arith {
    ($expr:expr, $what:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => return ValidationResult::arithmetic(e, $what),
        }
    };
}

impl SupplyInvariantChecker {
    pub fn from_parameters(params: &Parameters) -> Self {
        Self {
            total_reserve_supply: params.get(ParamName::TotalReserveSupply),
            voting_ceiling: params.get(ParamName::VotingPowerCeiling),
            params: params.clone(),
        }
    }

    pub fn check_reserve_total(&self, state: &TokenStateBundle, math: &mut CertifiedMath<'_>) -> ValidationResult {
        let total = try_arith!(state.total(Token::Reserve, math), "reserve total");
        if total != self.total_reserve_supply {
            return ValidationResult::fail(
                ViolationKind::ReserveConservation,
                format!("reserve total {total} differs from fixed supply {}", self.total_reserve_supply),
            )
            .with_evidence(
                Evidence::none()
                    .token(Token::Reserve)
                    .observed(total)
                    .limit(self.total_reserve_supply),
            );
        }
        ValidationResult::pass()
    }

    /// Conservation between a state and its proposed successor.
    pub fn check_conservation(
        &self,
        previous: &TokenStateBundle,
        next: &TokenStateBundle,
        allocations: &[Allocation],
        math: &mut CertifiedMath<'_>,
    ) -> ValidationResult {
        let reserve = self.check_reserve_total(next, math);
        if !reserve.is_pass() {
            return reserve;
        }

        for token in Token::MINTABLE {
            let before = try_arith!(previous.total(token, math), "previous supply");
            let after = try_arith!(next.total(token, math), "next supply");
            let change = try_arith!(math.sub(after, before), "supply change");
            let allocated = try_arith!(
                math.sum(allocations.iter().filter(|a| a.token == token).map(|a| a.amount)),
                "allocated total"
            );
            if change != allocated {
                return ValidationResult::fail(
                    ViolationKind::SupplyConservation,
                    format!("{token} supply moved by {change} but allocations account for {allocated}"),
                )
                .with_evidence(Evidence::none().token(token).observed(change).limit(allocated));
            }
        }

        ValidationResult::pass()
    }

    /// No shard's voting balance may exceed the ceiling share of the total.
    ///
    /// Compared exactly as `voting > floor(ceiling * total)`; the reported
    /// share is `floor(voting / total)`. The first offending shard in key
    /// order is reported.
    pub fn check_voting_concentration(
        &self,
        state: &TokenStateBundle,
        math: &mut CertifiedMath<'_>,
    ) -> ValidationResult {
        let total = try_arith!(state.total(Token::Voting, math), "voting total");
        if !total.is_positive() {
            return ValidationResult::pass();
        }
        let allowed = try_arith!(math.mul(self.voting_ceiling, total), "voting allowance");

        for (shard, balances) in state.balances() {
            if balances.voting > allowed {
                let share = try_arith!(math.div_floor(balances.voting, total), "voting share");
                return ValidationResult::fail(
                    ViolationKind::VotingPowerCentralization,
                    format!(
                        "shard {shard} holds {share} of voting supply, ceiling is {}",
                        self.voting_ceiling
                    ),
                )
                .with_evidence(
                    Evidence::none()
                        .shard(shard)
                        .token(Token::Voting)
                        .observed(share)
                        .limit(self.voting_ceiling),
                );
            }
        }
        ValidationResult::pass()
    }

    pub fn check_non_negative(&self, state: &TokenStateBundle) -> ValidationResult {
        for (shard, balances) in state.balances() {
            // Flow is reported ahead of the other tokens.
            let order = [Token::Flow, Token::Reserve, Token::Attractor, Token::Resonance, Token::Voting];
            for token in order {
                let value = balances.get(token);
                if value.is_negative() {
                    return ValidationResult::fail(
                        ViolationKind::NegativeBalance,
                        format!("shard {shard} would hold negative {token} balance {value}"),
                    )
                    .with_evidence(
                        Evidence::none()
                            .shard(shard)
                            .token(token)
                            .observed(value)
                            .limit(FixedPointValue::ZERO),
                    );
                }
            }
        }
        ValidationResult::pass()
    }

    pub fn check_supply_ceilings(&self, state: &TokenStateBundle, math: &mut CertifiedMath<'_>) -> ValidationResult {
        for token in Token::MINTABLE {
            let Some(param) = ParamName::max_supply_for(token) else {
                continue;
            };
            let ceiling = self.params.get(param);
            let total = try_arith!(state.total(token, math), "token supply");
            if total > ceiling {
                return ValidationResult::fail(
                    ViolationKind::TokenSupplyCapExceeded,
                    format!("{token} supply {total} exceeds ceiling {ceiling}"),
                )
                .with_evidence(Evidence::none().token(token).observed(total).limit(ceiling));
            }
        }
        ValidationResult::pass()
    }

    /// Every state-level invariant, in severity order.
    pub fn check_state(&self, state: &TokenStateBundle, math: &mut CertifiedMath<'_>) -> ValidationResult {
        let reserve = self.check_reserve_total(state, math);
        if !reserve.is_pass() {
            return reserve;
        }
        let non_negative = self.check_non_negative(state);
        if !non_negative.is_pass() {
            return non_negative;
        }
        let ceilings = self.check_supply_ceilings(state, math);
        if !ceilings.is_pass() {
            return ceilings;
        }
        self.check_voting_concentration(state, math)
    }
}
