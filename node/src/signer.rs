// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Reference signing capability.
//!
//! A BLAKE3 keyed hash over the committed state hash. It is deterministic,
//! so a replay with the same key reproduces every stored signature. It is a
//! MAC, not a public-key signature: the "public key" is the key itself.

use quintet_kernel::signing::{CommitSigner, Signature, SignatureVerifier};

pub struct KeyedHashSigner {
    key: [u8; 32],
}

impl KeyedHashSigner {
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Derives a key from a passphrase.
    pub fn from_passphrase(passphrase: &str) -> Self {
        Self::new(blake3::derive_key("quintet-node commit signer v1", passphrase.as_bytes()))
    }
}

impl CommitSigner for KeyedHashSigner {
    fn public_key(&self) -> Vec<u8> {
        self.key.to_vec()
    }

    fn sign(&self, data: &[u8]) -> Signature {
        Signature(blake3::keyed_hash(&self.key, data).as_bytes().to_vec())
    }
}

impl SignatureVerifier for KeyedHashSigner {
    fn verify(&self, public_key: &[u8], data: &[u8], signature: &Signature) -> bool {
        let Ok(key) = <[u8; 32]>::try_from(public_key) else {
            return false;
        };
        let expected = blake3::keyed_hash(&key, data);
        // blake3::Hash equality is constant-time.
        match <[u8; 32]>::try_from(signature.as_bytes()) {
            Ok(sig) => expected == blake3::Hash::from(sig),
            Err(_) => false,
        }
    }
}
