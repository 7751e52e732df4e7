// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::fxp::{CertifiedMath, OperationLog};
use crate::guard::violation::{ViolationClass, ViolationKind};
use crate::guard::{check_bundle_shape, EconomicsGuard, SupplyInvariantChecker};
use crate::state::action::{ActionBundle, Allocation};
use crate::tests::fixtures::*;
use crate::types::{ParamName, Token};

#[test]
fn test_reserve_total_must_match_fixed_supply() {
    let mut state = genesis();
    let checker = SupplyInvariantChecker::from_parameters(state.parameters());
    let mut log = OperationLog::new();
    let mut math = CertifiedMath::new(&mut log, "t");
    assert!(checker.check_reserve_total(&state, &mut math).is_pass());

    let a = state.balances_per_shard.get_mut(&shard("shard-a")).unwrap();
    a.reserve = a.reserve.checked_add(fx(1)).unwrap();
    let result = checker.check_reserve_total(&state, &mut math);
    assert_eq!(result.violation_kind, Some(ViolationKind::ReserveConservation));
    assert_eq!(result.evidence.observed, Some(fx(10_000_001)));
}

#[test]
fn test_conservation_accepts_exactly_logged_allocations() {
    let previous = genesis();
    let mut next = previous.clone();
    let checker = SupplyInvariantChecker::from_parameters(previous.parameters());
    let mut log = OperationLog::new();
    let mut math = CertifiedMath::new(&mut log, "t");

    let b = next.balances_per_shard.get_mut(&shard("shard-b")).unwrap();
    b.attractor = b.attractor.checked_add(fx(25)).unwrap();

    let exact = [Allocation {
        shard: shard("shard-b"),
        token: Token::Attractor,
        amount: fx(25),
    }];
    assert!(checker.check_conservation(&previous, &next, &exact, &mut math).is_pass());

    let short = [Allocation {
        shard: shard("shard-b"),
        token: Token::Attractor,
        amount: crate::FixedPointValue::from_raw(fx(25).raw() - 1),
    }];
    let result = checker.check_conservation(&previous, &next, &short, &mut math);
    assert_eq!(result.violation_kind, Some(ViolationKind::SupplyConservation));
    assert_eq!(result.evidence.token, Some(Token::Attractor));

    let none = checker.check_conservation(&previous, &next, &[], &mut math);
    assert_eq!(none.violation_kind.map(|k| k.class()), Some(ViolationClass::SupplyConservationViolation));
}

#[test]
fn test_negative_flow_is_reported_first() {
    let mut state = genesis();
    let c = state.balances_per_shard.get_mut(&shard("shard-c")).unwrap();
    c.flow = fx(-1);
    c.attractor = fx(-1);
    let checker = SupplyInvariantChecker::from_parameters(state.parameters());
    let result = checker.check_non_negative(&state);
    assert_eq!(result.violation_kind, Some(ViolationKind::NegativeBalance));
    assert_eq!(result.evidence.token, Some(Token::Flow));
    assert_eq!(result.evidence.shard, Some(shard("shard-c")));
}

#[test]
fn test_voting_exactly_at_ceiling_passes() {
    let mut state = genesis();
    // Total stays at 1,000; shard-a holds exactly 25%.
    state.balances_per_shard.get_mut(&shard("shard-a")).unwrap().voting = fx(250);
    state.balances_per_shard.get_mut(&shard("shard-b")).unwrap().voting = fx(150);
    let checker = SupplyInvariantChecker::from_parameters(state.parameters());
    let mut log = OperationLog::new();
    let mut math = CertifiedMath::new(&mut log, "t");
    assert!(checker.check_voting_concentration(&state, &mut math).is_pass());

    state.balances_per_shard.get_mut(&shard("shard-a")).unwrap().voting = fx(251);
    state.balances_per_shard.get_mut(&shard("shard-b")).unwrap().voting = fx(149);
    let result = checker.check_voting_concentration(&state, &mut math);
    assert_eq!(result.violation_kind, Some(ViolationKind::VotingPowerCentralization));
    assert_eq!(result.evidence.shard, Some(shard("shard-a")));
    assert_eq!(result.evidence.observed, Some(crate::FixedPointValue::milli(251)));
}

#[test]
fn test_zero_voting_supply_is_not_centralized() {
    let mut state = genesis();
    for balances in state.balances_per_shard.values_mut() {
        balances.voting = fx(0);
    }
    let checker = SupplyInvariantChecker::from_parameters(state.parameters());
    let mut log = OperationLog::new();
    let mut math = CertifiedMath::new(&mut log, "t");
    assert!(checker.check_voting_concentration(&state, &mut math).is_pass());
}

#[test]
fn test_reward_bundle_checks_use_day_window() {
    let mut state = genesis();
    state.rewards.day_index = 0;
    state.rewards.distributed_today = fx(9_950);
    let guard = EconomicsGuard::from_parameters(state.parameters());
    let mut log = OperationLog::new();
    let mut math = CertifiedMath::new(&mut log, "t");

    let same_day = reward("shard-a", fx(100), 100);
    let result = guard.validate_bundle(&state, &same_day, &mut math);
    assert_eq!(result.violation_kind, Some(ViolationKind::DailyRewardCapExceeded));
    assert_eq!(result.evidence.actor.as_ref().map(|a| a.as_str()), Some("distributor"));

    let next_day = reward("shard-a", fx(100), 86_400);
    assert!(guard.validate_bundle(&state, &next_day, &mut math).is_pass());
}

#[test]
fn test_reward_may_not_touch_other_tokens() {
    let state = genesis();
    let mut bundle = reward("shard-a", fx(10), 1);
    let a = bundle.deltas.get_mut(&shard("shard-a")).unwrap();
    a.flow = fx(1);
    let guard = EconomicsGuard::from_parameters(state.parameters());
    let mut log = OperationLog::new();
    let mut math = CertifiedMath::new(&mut log, "t");
    let result = guard.validate_bundle(&state, &bundle, &mut math);
    assert_eq!(result.violation_kind, Some(ViolationKind::MalformedAction));
}

#[test]
fn test_allocation_running_supply_accumulates_within_bundle() {
    let mut spec = genesis_spec();
    spec.parameters.insert(ParamName::MaxResonanceSupply, fx(1_600));
    let state = crate::state::bundle::TokenStateBundle::genesis(&spec).unwrap();
    let guard = EconomicsGuard::from_parameters(state.parameters());
    let mut log = OperationLog::new();
    let mut math = CertifiedMath::new(&mut log, "t");

    // Supply is 1,500; each record alone fits, together they do not.
    let records = vec![
        Allocation { shard: shard("shard-a"), token: Token::Resonance, amount: fx(60) },
        Allocation { shard: shard("shard-b"), token: Token::Resonance, amount: fx(60) },
    ];
    let bundle = ActionBundle::allocation(records, actor("gov"), 1).unwrap();
    let result = guard.validate_bundle(&state, &bundle, &mut math);
    assert_eq!(result.violation_kind, Some(ViolationKind::TokenSupplyCapExceeded));
}

#[test]
fn test_shape_rejects_unknown_shard_and_empty_bundle() {
    let state = genesis();
    let stray = reward("nowhere", fx(1), 1);
    let result = check_bundle_shape(&state, &stray);
    assert_eq!(result.violation_kind, Some(ViolationKind::MalformedAction));
    assert_eq!(result.evidence.shard, Some(shard("nowhere")));

    let mut empty = reward("shard-a", fx(1), 1);
    empty.deltas.clear();
    assert_eq!(
        check_bundle_shape(&state, &empty).violation_kind,
        Some(ViolationKind::MalformedAction)
    );
}

#[test]
fn test_shape_requires_non_allocations_to_net_to_zero() {
    let state = genesis();
    let balanced = ActionBundle::transfer(&shard("shard-a"), &shard("shard-b"), Token::Flow, fx(5), actor("alice"), 1)
        .unwrap();
    assert!(check_bundle_shape(&state, &balanced).is_pass());

    let mut skewed = balanced.clone();
    skewed.deltas.get_mut(&shard("shard-a")).unwrap().flow = fx(-4);
    let result = check_bundle_shape(&state, &skewed);
    assert_eq!(result.violation_kind, Some(ViolationKind::MalformedAction));
    assert_eq!(result.evidence.token, Some(Token::Flow));
    assert_eq!(result.evidence.observed, Some(fx(1)));
    assert_eq!(result.evidence.actor.as_ref().map(|a| a.as_str()), Some("alice"));

    // Allocations change supply by construction.
    assert!(check_bundle_shape(&state, &mint("shard-c", Token::Resonance, fx(10), 1)).is_pass());
}

#[test]
fn test_shape_rejects_overflowing_deltas() {
    let state = genesis();
    let mut bundle = ActionBundle::transfer(&shard("shard-a"), &shard("shard-b"), Token::Flow, fx(5), actor("alice"), 1)
        .unwrap();
    bundle.deltas.get_mut(&shard("shard-a")).unwrap().flow = crate::fxp::FixedPointValue::MAX;
    bundle.deltas.get_mut(&shard("shard-b")).unwrap().flow = crate::fxp::FixedPointValue::MAX;
    let result = check_bundle_shape(&state, &bundle);
    assert_eq!(result.violation_kind, Some(ViolationKind::MalformedAction));
    assert_eq!(result.evidence.token, Some(Token::Flow));
}
