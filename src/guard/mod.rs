// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Constitutional guards.
//!
//! Pure validation functions. Each takes a read-only view of the state and a
//! proposed bundle and returns a [`ValidationResult`]; none of them mutate
//! anything but the caller's operation log.

pub mod economics;
pub mod firewall;
pub mod supply;
pub mod violation;

pub use economics::EconomicsGuard;
pub use firewall::ContextFirewall;
pub use supply::SupplyInvariantChecker;
pub use violation::{Evidence, ValidationResult, ViolationClass, ViolationKind, ViolationReport};

use crate::state::action::{ActionBundle, ActionKind};
use crate::fxp::FixedPointValue;
use crate::state::bundle::TokenStateBundle;
use crate::types::token::Token;

/// Structural checks every bundle must pass before any arithmetic.
pub fn check_bundle_shape(state: &TokenStateBundle, bundle: &ActionBundle) -> ValidationResult {
    if bundle.deltas.values().all(|d| d.is_zero()) && bundle.allocations.is_empty() {
        return ValidationResult::fail(ViolationKind::MalformedAction, "bundle changes nothing");
    }

    for shard in bundle.targets() {
        if !state.contains_shard(&shard) {
            return ValidationResult::fail(ViolationKind::MalformedAction, format!("unknown shard {shard}"))
                .with_evidence(Evidence::none().shard(&shard));
        }
    }

    match bundle.kind {
        ActionKind::Allocation => {
            if bundle.allocations.is_empty() {
                return ValidationResult::fail(ViolationKind::MalformedAction, "allocation without records");
            }
        }
        ActionKind::Reward | ActionKind::Transfer | ActionKind::Exchange => {
            if !bundle.allocations.is_empty() {
                return ValidationResult::fail(
                    ViolationKind::MalformedAction,
                    format!("{:?} may not carry allocation records", bundle.kind),
                );
            }
        }
    }

    if bundle.kind == ActionKind::Exchange && bundle.deltas.len() != 2 {
        return ValidationResult::fail(ViolationKind::MalformedAction, "exchange must involve exactly two shards");
    }

    // Only allocations may change supply; everything else moves value between shards.
    if bundle.kind != ActionKind::Allocation {
        for token in Token::ALL {
            let net = bundle
                .deltas
                .values()
                .try_fold(FixedPointValue::ZERO, |acc, d| acc.checked_add(d.get(token)));
            match net {
                Ok(net) if net.is_zero() => {}
                Ok(net) => {
                    return ValidationResult::fail(
                        ViolationKind::MalformedAction,
                        format!("{:?} does not net to zero in {token}", bundle.kind),
                    )
                    .with_evidence(Evidence::none().actor(&bundle.actor.actor).token(token).observed(net));
                }
                Err(_) => {
                    return ValidationResult::fail(
                        ViolationKind::MalformedAction,
                        format!("{token} deltas overflow"),
                    )
                    .with_evidence(Evidence::none().actor(&bundle.actor.actor).token(token));
                }
            }
        }
    }

    ValidationResult::pass()
}
