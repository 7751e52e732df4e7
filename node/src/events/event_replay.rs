// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Event Replay - Authoritative Recovery
//!
//! This module enforces the recovery contract:
//! **Event Log ALWAYS wins. The engine is rebuilt from genesis + log.**
//!
//! # Recovery Protocol
//! 1. Load the genesis snapshot (CRC and state hash checked)
//! 2. Load the event log (header checked, every line parsed)
//! 3. Replay every entry through a fresh engine, verifying each recorded
//!    outcome and state hash
//! 4. Hand the replayed engine back as the live one
//!
//! # Invariants
//! - Torn final line → dropped with a warning
//! - Unparseable line anywhere else → fail closed
//! - Recorded hash ≠ replayed hash → fail closed, with the log position

use std::path::Path;
use std::time::Instant;

use quintet_kernel::signing::CommitSigner;
use quintet_kernel::{EventJournal, EventLogHeader, LogEntry, ReplayHarness, ReplayReport, TokenStateBundle, TransitionEngine};
use thiserror::Error;
use tracing::{info, warn};

use crate::events::event_log::EventLogError;
use crate::persistence::{SnapshotError, SnapshotManager};

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("event log: {0}")]
    Log(#[from] EventLogError),

    #[error("genesis snapshot: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Replay(#[from] quintet_kernel::ReplayError),
}

pub type Result<T> = std::result::Result<T, ReplayError>;

/// Parsed event log file.
#[derive(Debug, Clone)]
pub struct LogContents {
    pub header: EventLogHeader,
    pub entries: Vec<LogEntry>,
    /// Byte length of the header plus every complete entry line.
    pub valid_len: u64,
    /// Whether a partial final line was dropped.
    pub torn_tail: bool,
}

pub fn read_event_log(path: impl AsRef<Path>) -> std::result::Result<LogContents, EventLogError> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_event_log(&bytes)
}

/// Parses log bytes.
///
/// Every line but the last must end in `\n` by construction. A final
/// segment without one is the remains of an interrupted append and is
/// dropped; everything before it must parse.
pub fn parse_event_log(bytes: &[u8]) -> std::result::Result<LogContents, EventLogError> {
    let mut offset = 0usize;
    let mut header: Option<EventLogHeader> = None;
    let mut entries = Vec::new();
    let mut torn_tail = false;

    for (line_no, segment) in bytes.split_inclusive(|b| *b == b'\n').enumerate() {
        let Some(line) = segment.strip_suffix(b"\n") else {
            if header.is_none() {
                return Err(EventLogError::InvalidHeader("header line is incomplete".into()));
            }
            warn!(offset, len = segment.len(), "ignoring incomplete entry at end of log");
            torn_tail = true;
            break;
        };

        match &header {
            None => {
                let parsed: EventLogHeader =
                    serde_json::from_slice(line).map_err(|e| EventLogError::InvalidHeader(e.to_string()))?;
                parsed
                    .validate()
                    .map_err(|e| EventLogError::InvalidHeader(e.to_string()))?;
                header = Some(parsed);
            }
            Some(_) => {
                let entry: LogEntry = serde_json::from_slice(line).map_err(|e| EventLogError::Corrupted {
                    line: line_no + 1,
                    reason: e.to_string(),
                })?;
                entries.push(entry);
            }
        }
        offset += segment.len();
    }

    let header = header.ok_or_else(|| EventLogError::InvalidHeader("empty log".into()))?;
    Ok(LogContents {
        header,
        entries,
        valid_len: offset as u64,
        torn_tail,
    })
}

/// A live engine rebuilt from disk.
pub struct Recovered {
    pub engine: TransitionEngine,
    pub journal: EventJournal,
    pub report: ReplayReport,
}

/// Full recovery from a genesis snapshot and an event log.
pub fn recover_from_event_log(
    genesis_path: impl AsRef<Path>,
    log_path: impl AsRef<Path>,
    signer: Option<Box<dyn CommitSigner + Send + Sync>>,
) -> Result<Recovered> {
    info!(log = %log_path.as_ref().display(), "starting recovery from event log");

    let genesis = SnapshotManager::load(genesis_path.as_ref())?;
    let contents = read_event_log(log_path)?;
    recover_from_entries(genesis, contents.entries, signer)
}

/// Replays already-loaded entries on top of `genesis`.
pub fn recover_from_entries(
    genesis: TokenStateBundle,
    entries: Vec<LogEntry>,
    signer: Option<Box<dyn CommitSigner + Send + Sync>>,
) -> Result<Recovered> {
    let started = Instant::now();
    let harness = match signer {
        Some(signer) => ReplayHarness::new(genesis).with_signer(signer),
        None => ReplayHarness::new(genesis),
    };
    let (report, engine) = harness.replay_engine(&entries)?;
    metrics::histogram!("quintet_replay_duration_seconds", started.elapsed().as_secs_f64());

    info!(
        entries = report.entries_applied,
        hash = %report.final_state_hash.short(),
        halted = engine.is_halted(),
        "recovery complete"
    );

    Ok(Recovered {
        engine,
        journal: EventJournal::from_entries(entries),
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "{\"schema\":\"quintet-event-log\",\"version\":1}\n";

    #[test]
    fn test_header_only_log_is_empty() {
        let contents = parse_event_log(HEADER.as_bytes()).unwrap();
        assert!(contents.entries.is_empty());
        assert_eq!(contents.valid_len, HEADER.len() as u64);
    }

    #[test]
    fn test_other_schema_version_refused() {
        let log = "{\"schema\":\"quintet-event-log\",\"version\":9}\n";
        assert!(matches!(parse_event_log(log.as_bytes()), Err(EventLogError::InvalidHeader(_))));
        assert!(matches!(parse_event_log(b""), Err(EventLogError::InvalidHeader(_))));
    }

    #[test]
    fn test_corrupt_middle_line_fails_closed() {
        let log = format!(
            "{HEADER}{{\"entry\":\"halt_cleared\",\"operator\":\"a\",\"sequence_id\":1}}\nnot json\n{{\"entry\":\"halt_cleared\",\"operator\":\"b\",\"sequence_id\":3}}\n"
        );
        match parse_event_log(log.as_bytes()) {
            Err(EventLogError::Corrupted { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected corruption, got {other:?}"),
        }
    }

    #[test]
    fn test_torn_tail_tolerated() {
        let log = format!("{HEADER}{{\"entry\":\"halt_cleared\",\"operator\":\"a\",\"sequence_id\":1}}\n{{\"entry\":\"ha");
        let contents = parse_event_log(log.as_bytes()).unwrap();
        assert_eq!(contents.entries.len(), 1);
        assert!(contents.torn_tail);
        assert!(contents.valid_len < log.len() as u64);
    }
}
