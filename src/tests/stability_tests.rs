// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::fxp::{CertifiedMath, FixedPointValue, OperationLog};
use crate::guard::violation::ViolationKind;
use crate::stability::StabilityValidator;
use crate::state::action::{ActionBundle, CostInputs, Direction, DirectionSignal};
use crate::tests::fixtures::*;
use crate::types::Token;

fn transfer(amount: i64) -> ActionBundle {
    ActionBundle::transfer(&shard("shard-a"), &shard("shard-b"), Token::Flow, fx(amount), actor("alice"), 1)
        .unwrap()
}

fn reference_cost() -> CostInputs {
    CostInputs {
        effective_information: fx(100_000),
        lambda_before: fx(1),
        lambda_after: FixedPointValue::parse("1.5").unwrap(),
        entropy_before: fx(2),
        entropy_after: FixedPointValue::parse("2.4").unwrap(),
        direction_signals: Vec::new(),
    }
}

#[test]
fn test_reference_score_vector() {
    let state = genesis();
    let validator = StabilityValidator::from_parameters(state.parameters());
    let mut log = OperationLog::new();
    let mut math = CertifiedMath::new(&mut log, "score");

    let bundle = transfer(5).with_cost(reference_cost());
    let score = validator.validate(&state, &bundle, &mut math).unwrap();

    assert_eq!(score.coherence, FixedPointValue::milli(300));
    assert_eq!(score.info_term, FixedPointValue::milli(100));
    assert_eq!(score.lambda_term, FixedPointValue::milli(50));
    assert_eq!(score.entropy_term, FixedPointValue::milli(20));
    assert_eq!(score.action_cost, FixedPointValue::milli(170));
    assert_eq!(score.health, FixedPointValue::milli(130));
    assert!(!log.is_empty());
}

#[test]
fn test_entropy_decrease_costs_nothing() {
    let state = genesis();
    let validator = StabilityValidator::from_parameters(state.parameters());
    let mut log = OperationLog::new();
    let mut math = CertifiedMath::new(&mut log, "score");

    let cost = CostInputs {
        entropy_before: fx(3),
        entropy_after: fx(1),
        // |0.5 - 1.5| counts the same as |1.5 - 0.5|
        lambda_before: FixedPointValue::parse("1.5").unwrap(),
        lambda_after: FixedPointValue::parse("0.5").unwrap(),
        ..CostInputs::default()
    };
    let score = validator.score(&state, &transfer(1).with_cost(cost), &mut math).unwrap();
    assert_eq!(score.entropy_term, FixedPointValue::ZERO);
    assert_eq!(score.lambda_term, FixedPointValue::milli(100));
}

#[test]
fn test_negative_health_is_outside_band() {
    let state = genesis();
    let validator = StabilityValidator::from_parameters(state.parameters());
    let mut log = OperationLog::new();
    let mut math = CertifiedMath::new(&mut log, "score");

    // Cost 0.45 is under the action-cost limit, but 0.3 - 0.45 < 0.
    let cost = CostInputs {
        effective_information: fx(450_000),
        ..CostInputs::default()
    };
    let report = validator.validate(&state, &transfer(1).with_cost(cost), &mut math).unwrap_err();
    assert_eq!(report.kind, ViolationKind::StabilityBand);
    assert_eq!(report.evidence.observed, Some(FixedPointValue::milli(-150)));
    assert_eq!(report.evidence.limit, Some(FixedPointValue::ZERO));
}

#[test]
fn test_action_cost_limit_checked_before_band() {
    let state = genesis();
    let validator = StabilityValidator::from_parameters(state.parameters());
    let mut log = OperationLog::new();
    let mut math = CertifiedMath::new(&mut log, "score");

    let cost = CostInputs {
        effective_information: fx(1_000_000),
        ..CostInputs::default()
    };
    let report = validator.validate(&state, &transfer(1).with_cost(cost), &mut math).unwrap_err();
    assert_eq!(report.kind, ViolationKind::ActionCostExceeded);
}

#[test]
fn test_low_coherence_rejected() {
    let mut state = genesis();
    for balances in state.balances_per_shard.values_mut() {
        balances.resonance = FixedPointValue::ZERO;
    }
    let validator = StabilityValidator::from_parameters(state.parameters());
    let mut log = OperationLog::new();
    let mut math = CertifiedMath::new(&mut log, "score");

    let report = validator.validate(&state, &transfer(1), &mut math).unwrap_err();
    assert_eq!(report.kind, ViolationKind::CoherenceTooLow);
}

#[test]
fn test_empty_supply_counts_as_fully_coherent() {
    let mut state = genesis();
    for balances in state.balances_per_shard.values_mut() {
        balances.resonance = FixedPointValue::ZERO;
        balances.flow = FixedPointValue::ZERO;
    }
    let validator = StabilityValidator::from_parameters(state.parameters());
    let mut log = OperationLog::new();
    let mut math = CertifiedMath::new(&mut log, "score");
    assert_eq!(validator.aggregate_coherence(&state, &mut math).unwrap(), FixedPointValue::ONE);
}

#[test]
fn test_conflicting_direction_signals() {
    let state = genesis();
    let validator = StabilityValidator::from_parameters(state.parameters());
    let signal = |direction| DirectionSignal {
        shard: shard("shard-b"),
        token: Token::Flow,
        direction,
    };

    let agreeing = transfer(5).with_cost(CostInputs {
        direction_signals: vec![signal(Direction::Increase)],
        ..CostInputs::default()
    });
    assert!(validator.check_directional_consistency(&agreeing).is_ok());

    let conflicting = transfer(5).with_cost(CostInputs {
        direction_signals: vec![signal(Direction::Increase), signal(Direction::Decrease)],
        ..CostInputs::default()
    });
    let report = validator.check_directional_consistency(&conflicting).unwrap_err();
    assert_eq!(report.kind, ViolationKind::DirectionalInconsistency);

    let contradicting = transfer(5).with_cost(CostInputs {
        direction_signals: vec![signal(Direction::Decrease)],
        ..CostInputs::default()
    });
    let report = validator.check_directional_consistency(&contradicting).unwrap_err();
    assert_eq!(report.evidence.observed, Some(fx(5)));

    let mut log = OperationLog::new();
    let mut math = CertifiedMath::new(&mut log, "score");
    assert_eq!(
        validator.validate(&state, &contradicting, &mut math).unwrap_err().kind,
        ViolationKind::DirectionalInconsistency
    );
}
