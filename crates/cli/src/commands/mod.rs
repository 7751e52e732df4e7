// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod export;
pub mod genesis;
pub mod replay;
pub mod timeline;
pub mod verify;

use anyhow::Context;
use quintet_kernel::{LogEntry, TokenStateBundle};
use quintet_node::events::read_event_log;
use quintet_node::persistence::SnapshotManager;

/// Genesis snapshot and every complete entry of the log.
pub(crate) fn load_inputs(genesis_path: &str, log_path: &str) -> anyhow::Result<(TokenStateBundle, Vec<LogEntry>)> {
    let genesis = SnapshotManager::load(genesis_path.as_ref())
        .with_context(|| format!("loading genesis snapshot {genesis_path}"))?;
    let contents = read_event_log(log_path).with_context(|| format!("reading event log {log_path}"))?;
    if contents.torn_tail {
        println!("\n⚠️  WARNING: incomplete final entry ignored.\n");
    }
    Ok((genesis, contents.entries))
}
