// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Append-Only Event Log Writer
//!
//! This is the CANONICAL durability layer.
//! - Every entry is flushed (and by default fsync'd) before `append` returns
//! - No truncation or rewriting, except dropping a torn final line on open
//! - Canonical JSON, so the file hash is reproducible from the entries alone
//!
//! # File Format
//! ```text
//! {"schema":"quintet-event-log","version":1}
//! {"action_bundle":{...},"context":"USER_TRANSFER","entry":"action",...}
//! {"entry":"halt_cleared","operator":"ops","sequence_id":2}
//! ```

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use quintet_kernel::snapshot::to_canonical_json;
use quintet_kernel::{EventLogHeader, LogEntry};
use thiserror::Error;
use tracing::{debug, warn};

use crate::events::event_replay::read_event_log;

#[derive(Error, Debug)]
pub enum EventLogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("entry {found} appended where {expected} was due")]
    OutOfOrder { expected: u64, found: u64 },

    #[error("event log corrupted at line {line}: {reason}")]
    Corrupted { line: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, EventLogError>;

pub struct EventLogWriter {
    path: PathBuf,
    file: BufWriter<File>,
    entry_count: u64,
    fsync: bool,
}

impl EventLogWriter {
    /// Open or create an event log file.
    ///
    /// An existing file is validated end to end. A torn final line left by a
    /// crash mid-write is cut off so the next append starts on a clean line.
    pub fn open(path: impl AsRef<Path>, fsync: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let existing = path.exists() && std::fs::metadata(&path)?.len() > 0;

        let entry_count = if existing {
            let contents = read_event_log(&path)?;
            if contents.torn_tail {
                warn!(path = %path.display(), keep = contents.valid_len, "truncating torn event log tail");
                let file = OpenOptions::new().write(true).open(&path)?;
                file.set_len(contents.valid_len)?;
                file.sync_all()?;
            }
            contents.entries.len() as u64
        } else {
            0
        };

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        if !existing {
            let header = to_canonical_json(&EventLogHeader::current())
                .map_err(|e| EventLogError::Serialization(e.to_string()))?;
            file.write_all(header.as_bytes())?;
            file.write_all(b"\n")?;
            file.sync_all()?; // fsync header
        }

        Ok(Self {
            path,
            file: BufWriter::new(file),
            entry_count,
            fsync,
        })
    }

    /// Appends one entry. Only returns `Ok` after the line reached the OS
    /// (and the disk, when fsync is on).
    pub fn append(&mut self, entry: &LogEntry) -> Result<()> {
        let expected = self.entry_count + 1;
        if entry.sequence_id() != expected {
            return Err(EventLogError::OutOfOrder {
                expected,
                found: entry.sequence_id(),
            });
        }

        let mut line = entry
            .to_canonical_json()
            .map_err(|e| EventLogError::Serialization(e.to_string()))?
            .into_bytes();
        line.push(b'\n');

        self.file.write_all(&line)?;
        self.file.flush()?;
        if self.fsync {
            self.file.get_ref().sync_data()?;
        }

        self.entry_count = expected;
        debug!(seq = expected, kind = entry.entry_type(), "event appended");
        Ok(())
    }

    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
