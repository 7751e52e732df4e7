// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
mod common;

use common::{config, flow_transfer, genesis, reward};
use quintet_kernel::proof::AuditArtifact;
use quintet_kernel::{EventJournal, TransitionContext};
use quintet_node::events::{
    compute_event_log_hash, export_audit_artifact, generate_proof, read_event_log, CommitError, ReplayError,
};
use quintet_node::EventCommitter;
use tempfile::tempdir;

fn populated(dir: &std::path::Path) -> quintet_node::NodeConfig {
    let cfg = config(dir);
    let mut committer = EventCommitter::create(&cfg, genesis()).unwrap();
    for ts in 1..=4 {
        committer.submit(reward("shard-b", 25, ts), TransitionContext::RewardDistribution).unwrap();
        committer
            .submit(flow_transfer("shard-a", "shard-c", 5, ts), TransitionContext::UserTransfer)
            .unwrap();
    }
    cfg
}

#[test]
fn test_edited_log_fails_recovery_at_entry() {
    let dir = tempdir().unwrap();
    let cfg = populated(dir.path());

    // Line 0 is the header; line 3 holds entry 3 (a reward of 25).
    let text = std::fs::read_to_string(&cfg.event_log_path).unwrap();
    let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
    assert!(lines[3].contains("\"25\""));
    lines[3] = lines[3].replacen("\"25\"", "\"26\"", 1).replacen("\"-25\"", "\"-26\"", 1);
    std::fs::write(&cfg.event_log_path, lines.join("\n") + "\n").unwrap();

    match EventCommitter::open(&cfg) {
        Err(CommitError::Replay(ReplayError::Replay(quintet_kernel::ReplayError::Divergence(d)))) => {
            assert_eq!(d.log_position, 3);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("edited log recovered"),
    }
}

#[test]
fn test_corrupt_line_fails_closed() {
    let dir = tempdir().unwrap();
    let cfg = populated(dir.path());

    let text = std::fs::read_to_string(&cfg.event_log_path).unwrap();
    let mut lines: Vec<&str> = text.lines().collect();
    lines[2] = "{garbage";
    std::fs::write(&cfg.event_log_path, lines.join("\n") + "\n").unwrap();

    assert!(matches!(EventCommitter::open(&cfg), Err(CommitError::Replay(ReplayError::Log(_)))));
}

#[test]
fn test_proof_binds_log_and_state() {
    let dir = tempdir().unwrap();
    let cfg = populated(dir.path());
    let committer = EventCommitter::open(&cfg).unwrap();

    let proof = generate_proof(&cfg.snapshot_path, &cfg.event_log_path).unwrap();
    assert_eq!(proof.replay.final_state_hash, committer.engine().state_hash());
    assert_eq!(proof.replay.entries, 8);
    assert_eq!(proof.committed, 8);

    // File hash and canonical journal hash agree.
    let file_hash = compute_event_log_hash(&cfg.event_log_path).unwrap();
    assert_eq!(proof.replay.event_log_hash, file_hash);
    assert_eq!(committer.journal().log_hash().unwrap(), file_hash);

    // A copy elsewhere proves the same thing.
    let other = tempdir().unwrap();
    let copy = config(other.path());
    std::fs::copy(&cfg.snapshot_path, &copy.snapshot_path).unwrap();
    std::fs::copy(&cfg.event_log_path, &copy.event_log_path).unwrap();
    assert!(generate_proof(&copy.snapshot_path, &copy.event_log_path).unwrap().matches(&proof));
}

#[test]
fn test_log_entries_parse_back_to_journal() {
    let dir = tempdir().unwrap();
    let cfg = populated(dir.path());
    let contents = read_event_log(&cfg.event_log_path).unwrap();
    assert!(!contents.torn_tail);

    let committer = EventCommitter::open(&cfg).unwrap();
    assert_eq!(&EventJournal::from_entries(contents.entries), committer.journal());
}

#[test]
fn test_audit_artifact_export() {
    let dir = tempdir().unwrap();
    let cfg = populated(dir.path());
    let committer = EventCommitter::open(&cfg).unwrap();

    let out = dir.path().join("audit.json");
    let artifact = export_audit_artifact(committer.engine(), cfg.incident_tail, &out).unwrap();
    let parsed: AuditArtifact = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(parsed, artifact);
    assert_eq!(parsed.state_hash, committer.engine().state_hash());
    assert_eq!(parsed.sequence_id.0, 8);
    assert!(parsed.incident_log_tail.is_empty());
}
