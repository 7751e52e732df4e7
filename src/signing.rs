// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Signing capability consumed at commit boundaries.
//!
//! The kernel never implements a signature primitive. It signs the committed
//! state hash through an injected [`CommitSigner`] and stores the result in
//! the bundle's `signature` field, which is excluded from the state hash.

use core::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

use crate::snapshot::canonical::{from_hex, to_hex};

/// Opaque signature bytes. Hex string in JSON.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Signature(pub Vec<u8>);

impl Signature {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", to_hex(&self.0))
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&to_hex(&self.0))
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            from_hex(&s).map(Signature).ok_or_else(|| de::Error::custom("invalid hex signature"))
        } else {
            Vec::<u8>::deserialize(deserializer).map(Signature)
        }
    }
}

/// Produces signatures over committed state hashes.
///
/// For replay to reproduce signatures, `sign` must be deterministic for a
/// given key and input. Signatures never feed the state hash either way.
pub trait CommitSigner {
    fn public_key(&self) -> Vec<u8>;
    fn sign(&self, data: &[u8]) -> Signature;
}

pub trait SignatureVerifier {
    fn verify(&self, public_key: &[u8], data: &[u8], signature: &Signature) -> bool;
}
