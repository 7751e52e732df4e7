// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use anyhow::Context;
use quintet_kernel::ReplayError;
use quintet_node::events::{generate_proof, EventProof, ProofError};

/// Full replay of the log, checking every recorded outcome and hash.
/// Prints the proof on success and the first divergent entry on failure.
pub fn run(genesis_path: &str, log_path: &str) -> anyhow::Result<EventProof> {
    match generate_proof(genesis_path, log_path) {
        Ok(proof) => {
            println!("\n✅ VERIFIED\n");
            println!("Entries:        {}", proof.replay.entries);
            println!("Committed:      {}", proof.committed);
            println!("Genesis Hash:   {}", proof.replay.genesis_hash);
            println!("Event Log Hash: {}", proof.replay.event_log_hash);
            println!("Final Hash:     {}\n", proof.replay.final_state_hash);
            println!("{}\n", serde_json::to_string_pretty(&proof)?);
            Ok(proof)
        }
        Err(ProofError::Replay(quintet_node::events::ReplayError::Replay(ReplayError::Divergence(d)))) => {
            println!("\n❌ DIVERGED\n");
            println!("Entry:          {}", d.log_position);
            println!("Expected Hash:  {}", d.expected_hash);
            println!("Found Hash:     {}", d.actual_hash);
            println!("Detail:         {}\n", d.detail);
            Err(anyhow::anyhow!("replay diverged at entry {}", d.log_position))
        }
        Err(e) => Err(e).context("verification failed"),
    }
}
