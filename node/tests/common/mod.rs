// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;

use quintet_kernel::state::{ActorContext, Allocation};
use quintet_kernel::types::{PerShardBalances, ShardId, Token};
use quintet_kernel::{ActionBundle, FixedPointValue, GenesisSpec, TokenStateBundle};
use quintet_node::NodeConfig;

pub fn fx(units: i64) -> FixedPointValue {
    FixedPointValue::from_int(units)
}

pub fn shard(name: &str) -> ShardId {
    ShardId::new(name)
}

/// Four member shards and a treasury, voting spread evenly.
pub fn genesis() -> TokenStateBundle {
    let member = PerShardBalances {
        reserve: fx(250_000),
        flow: fx(700),
        attractor: fx(100),
        resonance: fx(300),
        voting: fx(200),
    };
    let mut shards = BTreeMap::new();
    for name in ["shard-a", "shard-b", "shard-c", "shard-d"] {
        shards.insert(shard(name), member);
    }
    shards.insert(
        shard("treasury"),
        PerShardBalances {
            reserve: fx(9_000_000),
            ..member
        },
    );
    let spec = GenesisSpec {
        treasury: shard("treasury"),
        shards,
        parameters: BTreeMap::new(),
        genesis_timestamp: 0,
    };
    TokenStateBundle::genesis(&spec).unwrap()
}

pub fn config(dir: &Path) -> NodeConfig {
    NodeConfig {
        fsync: false,
        ..NodeConfig::in_dir(dir)
    }
}

pub fn reward(to: &str, amount: i64, ts: u64) -> ActionBundle {
    ActionBundle::reward(
        &shard("treasury"),
        &[(shard(to), fx(amount))],
        ActorContext::new("distributor", format!("reward-{ts}")),
        ts,
    )
    .unwrap()
}

pub fn flow_transfer(from: &str, to: &str, amount: i64, ts: u64) -> ActionBundle {
    ActionBundle::transfer(
        &shard(from),
        &shard(to),
        Token::Flow,
        fx(amount),
        ActorContext::new("alice", format!("transfer-{ts}")),
        ts,
    )
    .unwrap()
}

/// Governance mint of resonance to one shard.
pub fn mint(to: &str, amount: i64, ts: u64) -> ActionBundle {
    let record = Allocation {
        shard: shard(to),
        token: Token::Resonance,
        amount: fx(amount),
    };
    ActionBundle::allocation(vec![record], ActorContext::new("gov", format!("mint-{ts}")), ts).unwrap()
}
