// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Binary state snapshots.
//!
//! # File Format
//! ```text
//! [MAGIC: u32][VERSION: u32][PAYLOAD_LEN: u64][STATE_HASH: 32 bytes][PAYLOAD][CRC32: u32]
//! ```
//! The payload is the bincode encoding of a `TokenStateBundle`. The CRC
//! covers everything before it. After decoding, the state hash is recomputed
//! and compared with the header, so a snapshot that parses but describes a
//! different state is refused.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crc32fast::Hasher;
use quintet_kernel::{Hash32, TokenStateBundle};
use thiserror::Error;
use tracing::{info, warn};

const MAGIC: u32 = 0x514E_5454; // QNTT
const SCHEMA_VERSION: u32 = 1;
const HEADER_LEN: usize = 4 + 4 + 8 + 32;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding failed: {0}")]
    Encode(String),

    #[error("snapshot payload does not decode: {0}")]
    Decode(String),

    #[error("snapshot too short ({0} bytes)")]
    TooShort(usize),

    #[error("snapshot checksum mismatch")]
    ChecksumMismatch,

    #[error("not a snapshot file (bad magic)")]
    BadMagic,

    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),

    #[error("snapshot header claims {claimed} payload bytes, found {found}")]
    Truncated { claimed: u64, found: u64 },

    #[error("snapshot state hash {actual} does not match header {expected}")]
    HashMismatch { expected: Hash32, actual: Hash32 },
}

pub type Result<T> = std::result::Result<T, SnapshotError>;

pub struct SnapshotManager;

impl SnapshotManager {
    pub fn encode(state: &TokenStateBundle) -> Result<Vec<u8>> {
        let payload = bincode::serde::encode_to_vec(state, bincode::config::standard())
            .map_err(|e| SnapshotError::Encode(e.to_string()))?;

        let mut buf = Vec::with_capacity(HEADER_LEN + payload.len() + 4);
        buf.extend_from_slice(&MAGIC.to_le_bytes());
        buf.extend_from_slice(&SCHEMA_VERSION.to_le_bytes());
        buf.extend_from_slice(&(payload.len() as u64).to_le_bytes());
        buf.extend_from_slice(state.state_hash().as_bytes());
        buf.extend_from_slice(&payload);

        let mut hasher = Hasher::new();
        hasher.update(&buf);
        buf.extend_from_slice(&hasher.finalize().to_le_bytes());
        Ok(buf)
    }

    pub fn parse(buffer: &[u8]) -> Result<TokenStateBundle> {
        if buffer.len() < HEADER_LEN + 4 {
            return Err(SnapshotError::TooShort(buffer.len()));
        }

        // Check Trailer
        let (content, trailer) = buffer.split_at(buffer.len() - 4);
        let mut hasher = Hasher::new();
        hasher.update(content);
        if hasher.finalize() != read_u32(trailer, 0) {
            return Err(SnapshotError::ChecksumMismatch);
        }

        if read_u32(content, 0) != MAGIC {
            return Err(SnapshotError::BadMagic);
        }
        let version = read_u32(content, 4);
        if version != SCHEMA_VERSION {
            return Err(SnapshotError::UnsupportedVersion(version));
        }

        let claimed = read_u64(content, 8);
        let found = (content.len() - HEADER_LEN) as u64;
        if claimed != found {
            return Err(SnapshotError::Truncated { claimed, found });
        }

        let mut expected = [0u8; 32];
        expected.copy_from_slice(&content[16..HEADER_LEN]);
        let expected = Hash32(expected);

        let (state, _): (TokenStateBundle, usize) =
            bincode::serde::decode_from_slice(&content[HEADER_LEN..], bincode::config::standard())
                .map_err(|e| SnapshotError::Decode(e.to_string()))?;

        let actual = state.state_hash();
        if actual != expected {
            return Err(SnapshotError::HashMismatch { expected, actual });
        }
        Ok(state)
    }

    /// Writes atomically via a temp file; the previous snapshot is kept as `.prev`.
    pub fn save(path: &Path, state: &TokenStateBundle) -> Result<u64> {
        let bytes = Self::encode(state)?;
        let tmp_path = path.with_extension("tmp");
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }

        // ROTATION LOGIC: Keep one previous version
        if path.exists() {
            let prev_path = path.with_extension("prev");
            if let Err(e) = std::fs::rename(path, &prev_path) {
                warn!(error = %e, "could not rotate previous snapshot");
            }
        }
        std::fs::rename(&tmp_path, path)?;

        metrics::gauge!("quintet_snapshot_size_bytes", bytes.len() as f64);
        info!(path = %path.display(), seq = state.sequence_id().0, hash = %state.state_hash().short(), "snapshot saved");
        Ok(bytes.len() as u64)
    }

    pub fn load(path: &Path) -> Result<TokenStateBundle> {
        let bytes = std::fs::read(path)?;
        Self::parse(&bytes)
    }
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(raw)
}

fn read_u64(bytes: &[u8], at: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[at..at + 8]);
    u64::from_le_bytes(raw)
}
