// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Ledger vocabulary: identifiers, tokens, balances and parameters.

pub mod id;
pub mod params;
pub mod token;

pub use id::{ActorId, SequenceId, ShardId};
pub use params::{ParamName, Parameters};
pub use token::{PerShardBalances, Token};
