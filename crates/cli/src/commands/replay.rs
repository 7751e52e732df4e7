// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use anyhow::{anyhow, bail};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use quintet_kernel::{Hash32, ReplayHarness, ReplayReport};

use super::load_inputs;

/// Replays the log (optionally only up to entry `until`) and prints the
/// resulting state hash. With `expect`, a different hash is an error.
pub fn run(genesis_path: &str, log_path: &str, until: Option<u64>, expect: Option<String>) -> anyhow::Result<ReplayReport> {
    let (genesis, entries) = load_inputs(genesis_path, log_path)?;
    let harness = ReplayHarness::new(genesis);

    let report = match until {
        Some(n) => harness.replay_until(&entries, n)?,
        None => harness.replay(&entries)?,
    };

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Metric", "Value"]);

    table.add_row(vec!["Log Entries", &entries.len().to_string()]);
    table.add_row(vec!["Replayed Entries", &report.entries_applied.to_string()]);
    table.add_row(vec!["Committed", &report.committed.to_string()]);
    table.add_row(vec!["Rejected", &report.rejected.to_string()]);
    table.add_row(vec!["Halted", &report.halted.to_string()]);
    table.add_row(vec!["Incidents", &report.incidents.len().to_string()]);
    table.add_row(vec!["Sequence Id", &report.final_state.sequence_id().to_string()]);
    table.add_row(vec!["Genesis Hash", &report.genesis_hash.to_string()]);
    table.add_row(vec!["State Hash", &report.final_state_hash.to_string()]);

    println!("\nReplay Report");
    println!("-------------");
    println!("{table}\n");

    if let Some(expected) = expect {
        let expected = Hash32::from_hex(&expected).ok_or_else(|| anyhow!("--expect is not a 64-digit hex hash"))?;
        if expected != report.final_state_hash {
            println!("❌ MISMATCH\n");
            bail!("state hash {} does not match expected {}", report.final_state_hash, expected);
        }
        println!("✅ MATCHES EXPECTED HASH\n");
    }

    Ok(report)
}
