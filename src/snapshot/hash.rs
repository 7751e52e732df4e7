// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Canonical BLAKE3 hashing of ledger state.
//!
//! BLAKE3 is the only hash used for state, action and audit digests.
//! Same state gives the same hash on every architecture.

use core::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

use crate::config::STATE_HASH_DOMAIN;
use crate::snapshot::canonical::{from_hex, to_hex};
use crate::state::bundle::TokenStateBundle;
use crate::types::token::Token;

/// 32-byte BLAKE3 digest. Hex string in JSON, raw bytes elsewhere.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Hash32(pub [u8; 32]);

impl Hash32 {
    pub const ZERO: Hash32 = Hash32([0u8; 32]);

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = from_hex(s)?;
        let arr: [u8; 32] = bytes.try_into().ok()?;
        Some(Hash32(arr))
    }

    /// First 8 bytes in hex, for log lines.
    pub fn short(&self) -> String {
        to_hex(&self.0[..8])
    }
}

impl fmt::Display for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash32({})", self.short())
    }
}

impl Serialize for Hash32 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Hash32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Hash32::from_hex(&s).ok_or_else(|| de::Error::custom("expected 64 hex characters"))
        } else {
            <[u8; 32]>::deserialize(deserializer).map(Hash32)
        }
    }
}

/// Canonical hash of a state bundle.
///
/// # Hash Input Structure
/// ```text
/// domain tag "quintet/state/v1"
/// sequence_id (u64 LE)
/// prior_state_hash (32 bytes)
/// treasury (u32 LE length + UTF-8)
/// last_timestamp (u64 LE)
/// rewards: day_index (u64 LE), distributed_today (i128 LE), distributed_total (i128 LE)
/// parameter count (u32 LE), then per parameter in key order:
///   code (u8), value (i128 LE)
/// shard count (u32 LE), then per shard in key order:
///   id (u32 LE length + UTF-8)
///   reserve, flow, attractor, resonance, voting (i128 LE each)
/// ```
///
/// The commit signature is excluded, so signing never changes the hash.
pub fn state_hash(state: &TokenStateBundle) -> Hash32 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(STATE_HASH_DOMAIN);

    hasher.update(&state.sequence_id().0.to_le_bytes());
    hasher.update(state.prior_state_hash().as_bytes());
    update_str(&mut hasher, state.treasury().as_str());
    hasher.update(&state.last_timestamp().to_le_bytes());

    let rewards = state.rewards();
    hasher.update(&rewards.day_index.to_le_bytes());
    hasher.update(&rewards.distributed_today.to_le_bytes());
    hasher.update(&rewards.distributed_total.to_le_bytes());

    hasher.update(&(state.parameters().len() as u32).to_le_bytes());
    for (name, value) in state.parameters().iter() {
        hasher.update(&[name.code()]);
        hasher.update(&value.to_le_bytes());
    }

    hasher.update(&(state.balances().len() as u32).to_le_bytes());
    for (shard, balances) in state.balances() {
        update_str(&mut hasher, shard.as_str());
        for token in Token::ALL {
            hasher.update(&balances.get(token).to_le_bytes());
        }
    }

    Hash32(*hasher.finalize().as_bytes())
}

/// Domain-separated hash of arbitrary bytes.
pub fn hash_with_domain(domain: &[u8], data: &[u8]) -> Hash32 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(domain);
    hasher.update(data);
    Hash32(*hasher.finalize().as_bytes())
}

/// Plain BLAKE3 of a byte slice, for files and logs.
pub fn hash_bytes(data: &[u8]) -> Hash32 {
    Hash32(*blake3::hash(data).as_bytes())
}

fn update_str(hasher: &mut blake3::Hasher, s: &str) {
    hasher.update(&(s.len() as u32).to_le_bytes());
    hasher.update(s.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip() {
        let h = hash_bytes(b"quintet");
        assert_eq!(Hash32::from_hex(&h.to_hex()), Some(h));
        assert_eq!(h.to_hex().len(), 64);
        assert!(Hash32::from_hex("abc").is_none());
    }

    #[test]
    fn domain_separates() {
        assert_ne!(hash_with_domain(b"a", b"x"), hash_with_domain(b"b", b"x"));
    }
}
