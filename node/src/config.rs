// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::path::{Path, PathBuf};

use quintet_kernel::config::DEFAULT_INCIDENT_TAIL;

pub struct NodeConfig {
    pub event_log_path: PathBuf,
    pub snapshot_path: PathBuf,
    /// Key for the reference keyed-hash signer. `None` commits unsigned.
    pub signer_key: Option<[u8; 32]>,
    /// fsync after every appended entry.
    pub fsync: bool,
    /// Incident records included in exported audit artifacts.
    pub incident_tail: usize,
}

impl NodeConfig {
    /// Default file names under `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            event_log_path: dir.join("events.jsonl"),
            snapshot_path: dir.join("genesis.bin"),
            ..Self::default()
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            event_log_path: PathBuf::from("events.jsonl"),
            snapshot_path: PathBuf::from("genesis.bin"),
            signer_key: None,
            fsync: true,
            incident_tail: DEFAULT_INCIDENT_TAIL,
        }
    }
}
