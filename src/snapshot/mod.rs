// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod canonical;
pub mod hash;

pub use canonical::{to_canonical_bytes, to_canonical_json};
pub use hash::{hash_bytes, hash_with_domain, state_hash, Hash32};
