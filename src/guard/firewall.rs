// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Transition-context firewall.
//!
//! A capability check on why a transition is attempted. The permitted
//! contexts per action kind and per token are a static table; the firewall
//! runs before any delta is computed.

use crate::guard::violation::{Evidence, ValidationResult, ViolationKind};
use crate::state::action::{ActionBundle, ActionKind, TransitionContext};
use crate::types::Token;

pub struct ContextFirewall;

impl ContextFirewall {
    /// Contexts under which an action kind may be submitted.
    pub const fn permits_kind(kind: ActionKind, context: TransitionContext) -> bool {
        use TransitionContext::*;
        match kind {
            ActionKind::Reward => matches!(context, RewardDistribution),
            ActionKind::Transfer | ActionKind::Exchange => matches!(context, UserTransfer | GovernanceAllocation),
            ActionKind::Allocation => matches!(context, GovernanceAllocation),
        }
    }

    /// Contexts under which a token may move at all.
    pub const fn permits_token(token: Token, context: TransitionContext) -> bool {
        match token {
            Token::Voting => matches!(context, TransitionContext::GovernanceAllocation),
            Token::Reserve | Token::Flow | Token::Attractor | Token::Resonance => true,
        }
    }

    pub fn check(bundle: &ActionBundle, context: TransitionContext) -> ValidationResult {
        let actor = &bundle.actor.actor;

        if !Self::permits_kind(bundle.kind, context) {
            return ValidationResult::fail(
                ViolationKind::ContextFirewall,
                format!("{:?} is not permitted under {:?}", bundle.kind, context),
            )
            .with_evidence(Evidence::none().actor(actor));
        }

        for token in Token::ALL {
            if bundle.touches_token(token) && !Self::permits_token(token, context) {
                return ValidationResult::fail(
                    ViolationKind::ContextFirewall,
                    format!("{token} may not move under {context:?}"),
                )
                .with_evidence(Evidence::none().actor(actor).token(token));
            }
        }

        ValidationResult::pass()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fxp::FixedPointValue;
    use crate::state::action::ActorContext;
    use crate::types::ShardId;

    #[test]
    fn voting_transfer_needs_governance_context() {
        let bundle = ActionBundle::transfer(
            &ShardId::new("a"),
            &ShardId::new("b"),
            Token::Voting,
            FixedPointValue::from_int(10),
            ActorContext::new("mallory", "c"),
            0,
        )
        .unwrap();

        let denied = ContextFirewall::check(&bundle, TransitionContext::UserTransfer);
        assert_eq!(denied.violation_kind, Some(ViolationKind::ContextFirewall));
        assert_eq!(denied.evidence.token, Some(Token::Voting));

        assert!(ContextFirewall::check(&bundle, TransitionContext::GovernanceAllocation).is_pass());
    }

    #[test]
    fn kind_table() {
        assert!(ContextFirewall::permits_kind(ActionKind::Reward, TransitionContext::RewardDistribution));
        assert!(!ContextFirewall::permits_kind(ActionKind::Reward, TransitionContext::UserTransfer));
        assert!(!ContextFirewall::permits_kind(ActionKind::Allocation, TransitionContext::UserTransfer));
        assert!(ContextFirewall::permits_kind(ActionKind::Exchange, TransitionContext::UserTransfer));
    }
}
