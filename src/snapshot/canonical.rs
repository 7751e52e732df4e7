// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Canonical JSON encoding.
//!
//! Values are routed through `serde_json::Value`, whose object map is a
//! `BTreeMap` (the `preserve_order` feature is never enabled in this
//! workspace), so every object comes out with sorted keys and no whitespace.

use serde::Serialize;

use crate::error::{KernelError, Result};

pub fn to_canonical_json<T: Serialize>(value: &T) -> Result<String> {
    let tree = serde_json::to_value(value)?;
    serde_json::to_string(&tree).map_err(KernelError::from)
}

pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    to_canonical_json(value).map(String::into_bytes)
}

pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

pub fn from_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(s.get(i..i + 2)?, 16).ok())
        .collect()
}
