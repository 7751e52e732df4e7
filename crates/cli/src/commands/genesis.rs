// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::path::Path;

use anyhow::Context;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use quintet_kernel::{GenesisSpec, Hash32, TokenStateBundle};
use quintet_node::{EventCommitter, NodeConfig};

/// Validates a JSON genesis description and initializes a data directory
/// (`genesis.bin` plus an empty `events.jsonl`).
pub fn run(spec_path: &str, dir: &Path) -> anyhow::Result<Hash32> {
    let raw = std::fs::read_to_string(spec_path).with_context(|| format!("reading {spec_path}"))?;
    let spec: GenesisSpec = serde_json::from_str(&raw).context("parsing genesis description")?;
    let state = TokenStateBundle::genesis(&spec)?;

    std::fs::create_dir_all(dir)?;
    let committer = EventCommitter::create(&NodeConfig::in_dir(dir), state)?;
    let state = committer.engine().state();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Shard", "Reserve", "Flow", "Attractor", "Resonance", "Voting"]);
    for (shard, balances) in state.balances() {
        let mut row = vec![shard.to_string()];
        row.extend(balances.iter().map(|(_, value)| value.to_string()));
        table.add_row(row);
    }

    println!("\nGenesis\n");
    println!("{table}\n");
    println!("State Hash: {}", state.state_hash());
    println!("Directory:  {}\n", dir.display());
    Ok(state.state_hash())
}
