// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! End-to-end ledger scenarios against the shared four-shard genesis.

use std::collections::BTreeMap;

use crate::error::KernelError;
use crate::event::{EventJournal, Outcome};
use crate::guard::violation::ViolationKind;
use crate::incident::{IncidentDecision, QuarantineTarget};
use crate::state::action::{ActionBundle, Allocation, TransitionContext};
use crate::state::bundle::{GenesisSpec, TokenStateBundle};
use crate::tests::fixtures::*;
use crate::types::{ActorId, PerShardBalances, SequenceId, Token};

#[test]
fn test_simple_reward_commits() {
    let mut engine = engine();
    let mut journal = EventJournal::new();

    let outcome = submit_recorded(
        &mut engine,
        &mut journal,
        reward("shard-a", fx(100), 60),
        TransitionContext::RewardDistribution,
    );
    assert!(outcome.is_committed());

    let state = engine.state();
    assert_eq!(state.shard(&shard("shard-a")).unwrap().reserve, fx(250_100));
    assert_eq!(state.shard(&treasury()).unwrap().reserve, fx(8_999_900));
    assert_eq!(state.totals_unlogged().unwrap().reserve, fx(10_000_000));
    assert_eq!(state.sequence_id(), SequenceId(1));
    assert_eq!(journal.len(), 1);
}

#[test]
fn test_reward_over_per_action_cap_rejected() {
    let mut engine = engine();
    let hash = engine.state_hash();

    let outcome = engine.submit(reward("shard-a", fx(1_001), 60), TransitionContext::RewardDistribution).unwrap();
    assert_eq!(outcome.outcome(), Outcome::Rejected);
    assert_eq!(outcome.violation_kind(), Some(ViolationKind::RewardPerActionExceeded));
    assert_eq!(outcome.rejection().unwrap().decision, IncidentDecision::RejectAndContinue);
    assert_eq!(engine.state_hash(), hash);
    assert!(!engine.is_halted());
}

#[test]
fn test_centralized_genesis_refused() {
    let holding = |voting: i64| PerShardBalances {
        reserve: fx(0),
        voting: fx(voting),
        ..PerShardBalances::ZERO
    };
    let mut shards = BTreeMap::new();
    shards.insert(shard("shard-a"), holding(300));
    shards.insert(shard("shard-b"), holding(350));
    shards.insert(
        treasury(),
        PerShardBalances {
            reserve: fx(10_000_000),
            ..holding(350)
        },
    );
    let spec = GenesisSpec {
        treasury: treasury(),
        shards,
        parameters: BTreeMap::new(),
        genesis_timestamp: 0,
    };

    match TokenStateBundle::genesis(&spec) {
        Err(KernelError::InvalidGenesis(report)) => {
            assert_eq!(report.kind, ViolationKind::VotingPowerCentralization);
            assert_eq!(report.evidence.shard, Some(shard("shard-a")));
        }
        other => panic!("expected invalid genesis, got {other:?}"),
    }
}

#[test]
fn test_voting_concentration_quarantines_shard() {
    let mut engine = engine();
    let hash = engine.state_hash();

    // shard-a would hold 260 of 1,000 voting.
    let grab = ActionBundle::transfer(&shard("shard-b"), &shard("shard-a"), Token::Voting, fx(60), actor("gov"), 1)
        .unwrap();
    let outcome = engine.submit(grab, TransitionContext::GovernanceAllocation).unwrap();
    let rejection = outcome.rejection().unwrap();
    assert_eq!(rejection.report.kind, ViolationKind::VotingPowerCentralization);
    assert_eq!(rejection.decision, IncidentDecision::Quarantine);
    assert_eq!(engine.state_hash(), hash);

    let target = QuarantineTarget::Shard(shard("shard-a"));
    assert!(engine.is_quarantined(&target));

    // Anything touching shard-a is refused; other shards carry on.
    let touching = reward("shard-a", fx(5), 2);
    assert_eq!(
        engine.submit(touching, TransitionContext::RewardDistribution).unwrap().violation_kind(),
        Some(ViolationKind::QuarantinedParticipant)
    );
    assert!(engine
        .submit(reward("shard-c", fx(5), 2), TransitionContext::RewardDistribution)
        .unwrap()
        .is_committed());

    assert!(engine.release_quarantine(&target));
    assert!(!engine.release_quarantine(&target));
    assert!(engine
        .submit(reward("shard-a", fx(5), 3), TransitionContext::RewardDistribution)
        .unwrap()
        .is_committed());
}

#[test]
fn test_context_firewall_quarantines_actor() {
    let mut engine = engine();

    let sneaky = ActionBundle::transfer(&shard("shard-a"), &shard("shard-b"), Token::Voting, fx(10), actor("mallory"), 1)
        .unwrap();
    let outcome = engine.submit(sneaky, TransitionContext::UserTransfer).unwrap();
    assert_eq!(outcome.violation_kind(), Some(ViolationKind::ContextFirewall));
    assert_eq!(outcome.rejection().unwrap().decision, IncidentDecision::Quarantine);
    assert!(engine.is_quarantined(&QuarantineTarget::Actor(ActorId::new("mallory"))));

    let honest_looking =
        ActionBundle::transfer(&shard("shard-a"), &shard("shard-b"), Token::Flow, fx(1), actor("mallory"), 2).unwrap();
    assert_eq!(
        engine.submit(honest_looking, TransitionContext::UserTransfer).unwrap().violation_kind(),
        Some(ViolationKind::QuarantinedParticipant)
    );

    let other = ActionBundle::transfer(&shard("shard-a"), &shard("shard-b"), Token::Flow, fx(1), actor("alice"), 2).unwrap();
    assert!(engine.submit(other, TransitionContext::UserTransfer).unwrap().is_committed());
}

#[test]
fn test_reward_under_wrong_context_rejected() {
    let mut engine = engine();
    let outcome = engine.submit(reward("shard-a", fx(10), 1), TransitionContext::UserTransfer).unwrap();
    assert_eq!(outcome.violation_kind(), Some(ViolationKind::ContextFirewall));
}

#[test]
fn test_unbalanced_reward_rejected_as_malformed() {
    let mut engine = engine();
    let mut bundle = reward("shard-a", fx(100), 1);
    bundle.deltas.get_mut(&treasury()).unwrap().reserve = fx(-50);

    let outcome = engine.submit(bundle, TransitionContext::RewardDistribution).unwrap();
    assert_eq!(outcome.violation_kind(), Some(ViolationKind::MalformedAction));
    assert_eq!(outcome.rejection().unwrap().decision, IncidentDecision::RejectAndContinue);
    assert!(!engine.is_halted());
    assert_eq!(engine.state().totals_unlogged().unwrap().reserve, fx(10_000_000));
}

#[test]
fn test_reserve_minted_through_allocation_halts() {
    let mut engine = engine();
    let mut bundle = mint("shard-c", Token::Resonance, fx(100), 1);
    bundle.deltas.get_mut(&shard("shard-c")).unwrap().reserve = fx(50);

    let outcome = engine.submit(bundle, TransitionContext::GovernanceAllocation).unwrap();
    assert_eq!(outcome.outcome(), Outcome::Halted);
    assert_eq!(outcome.violation_kind(), Some(ViolationKind::ReserveConservation));
    assert!(engine.is_halted());
}

#[test]
fn test_governance_mint_and_burn() {
    let mut engine = engine();
    let records = vec![
        Allocation {
            shard: shard("shard-c"),
            token: Token::Resonance,
            amount: fx(500),
        },
        Allocation {
            shard: shard("shard-d"),
            token: Token::Flow,
            amount: fx(-200),
        },
    ];
    let bundle = ActionBundle::allocation(records, actor("gov"), 1).unwrap();

    let denied = engine.submit(bundle.clone(), TransitionContext::UserTransfer).unwrap();
    assert_eq!(denied.violation_kind(), Some(ViolationKind::ContextFirewall));

    let mut engine = crate::tests::fixtures::engine();
    assert!(engine.submit(bundle, TransitionContext::GovernanceAllocation).unwrap().is_committed());
    let totals = engine.state().totals_unlogged().unwrap();
    assert_eq!(totals.resonance, fx(2_000));
    assert_eq!(totals.flow, fx(3_300));
    assert_eq!(totals.reserve, fx(10_000_000));
}

#[test]
fn test_allocation_over_per_action_cap_rejected() {
    let mut engine = engine();
    let records = vec![Allocation {
        shard: shard("shard-c"),
        token: Token::Attractor,
        amount: fx(100_001),
    }];
    let bundle = ActionBundle::allocation(records, actor("gov"), 1).unwrap();
    let outcome = engine.submit(bundle, TransitionContext::GovernanceAllocation).unwrap();
    assert_eq!(outcome.violation_kind(), Some(ViolationKind::AllocationCapExceeded));
}

#[test]
fn test_burn_elsewhere_quarantines_submitter_not_bystander() {
    let mut engine = engine();

    // shard-a ends at 240 of 1,000: within the ceiling.
    let grant = ActionBundle::transfer(&shard("shard-d"), &shard("shard-a"), Token::Voting, fx(40), actor("gov"), 1)
        .unwrap();
    assert!(engine.submit(grant, TransitionContext::GovernanceAllocation).unwrap().is_committed());

    // Burning on shard-b alone lifts shard-a to 240 of 900.
    let burn = vec![Allocation {
        shard: shard("shard-b"),
        token: Token::Voting,
        amount: fx(-100),
    }];
    let bundle = ActionBundle::allocation(burn, actor("gov"), 2).unwrap();
    let outcome = engine.submit(bundle, TransitionContext::GovernanceAllocation).unwrap();
    assert_eq!(outcome.violation_kind(), Some(ViolationKind::VotingPowerCentralization));
    assert_eq!(outcome.rejection().unwrap().decision, IncidentDecision::Quarantine);

    assert!(!engine.is_quarantined(&QuarantineTarget::Shard(shard("shard-a"))));
    assert!(engine.is_quarantined(&QuarantineTarget::Actor(ActorId::new("gov"))));
    assert!(engine
        .submit(reward("shard-a", fx(5), 3), TransitionContext::RewardDistribution)
        .unwrap()
        .is_committed());
}
