// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::path::Path;

use anyhow::Context;
use quintet_kernel::proof::AuditArtifact;
use quintet_kernel::ReplayHarness;
use quintet_node::events::export_audit_artifact;

use super::load_inputs;

/// Replays the log and writes the resulting audit artifact as canonical JSON.
pub fn run(genesis_path: &str, log_path: &str, out: &Path, tail: usize) -> anyhow::Result<AuditArtifact> {
    let (genesis, entries) = load_inputs(genesis_path, log_path)?;
    let (_, engine) = ReplayHarness::new(genesis).replay_engine(&entries)?;

    let artifact =
        export_audit_artifact(&engine, tail, out).with_context(|| format!("writing {}", out.display()))?;

    println!("\nAudit artifact written to {}", out.display());
    println!("Sequence Id: {}", artifact.sequence_id);
    println!("State Hash:  {}", artifact.state_hash);
    println!("Incidents:   {} (tail)\n", artifact.incident_log_tail.len());
    Ok(artifact)
}
