// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use anyhow::Context;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use quintet_kernel::LogEntry;
use quintet_node::events::read_event_log;

/// Lists every log entry in order. Needs no genesis: it shows what was
/// recorded, not what replay would produce.
pub fn run(log_path: &str) -> anyhow::Result<usize> {
    let contents = read_event_log(log_path).with_context(|| format!("reading event log {log_path}"))?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Timestamp", "Entry", "Detail", "Outcome", "State Hash"]);

    for entry in &contents.entries {
        let row = match entry {
            LogEntry::Action(record) => vec![
                record.sequence_id.to_string(),
                record.action_bundle.timestamp.to_string(),
                format!("{:?} / {:?}", record.action_bundle.kind, record.context),
                record.action_bundle.actor.actor.to_string(),
                match record.violation_kind {
                    Some(kind) => format!("{:?} ({kind:?})", record.outcome),
                    None => format!("{:?}", record.outcome),
                },
                record.resulting_state_hash.short(),
            ],
            LogEntry::HaltCleared { sequence_id, operator } => vec![
                sequence_id.to_string(),
                String::new(),
                entry.entry_type().to_string(),
                operator.clone(),
                String::new(),
                String::new(),
            ],
            LogEntry::QuarantineReleased { sequence_id, target } => vec![
                sequence_id.to_string(),
                String::new(),
                entry.entry_type().to_string(),
                target.to_string(),
                String::new(),
                String::new(),
            ],
        };
        table.add_row(row);
    }

    if contents.torn_tail {
        println!("\n⚠️  WARNING: incomplete final entry ignored.");
    }
    println!("\nEvent Timeline\n");
    println!("{table}\n");

    Ok(contents.entries.len())
}
