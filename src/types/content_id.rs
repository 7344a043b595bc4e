// src/types/content_id.rs
use super::ValidationError;
use ::cid::Cid as CidV1;
use multihash::Multihash;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Multihash code for sha2-256.
const SHA2_256: u64 = 0x12;

/// Multicodec code for raw bytes.
const RAW_CODEC: u64 = 0x55;

/// Length of the on-chain hash in bytes.
const BYTES32_LEN: usize = 32;

/// A content identifier as the gateways address it.
///
/// The value is kept textual: documents reference each other by the
/// string form, and only the on-chain path ever needs to build one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cid(String);

impl Cid {
    /// Wraps a CID string taken from a document link.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.contains(char::is_whitespace) || trimmed.contains('/') {
            return Err(ValidationError::InvalidCid(value));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Derives the CIDv1 (raw codec, sha2-256, base32 lower with a `b`
    /// prefix) for a 32-byte hash given as hex, with or without `0x`.
    pub fn from_bytes32(hash_hex: &str) -> Result<Self, ValidationError> {
        let clean = hash_hex
            .strip_prefix("0x")
            .or_else(|| hash_hex.strip_prefix("0X"))
            .unwrap_or(hash_hex);

        let digest = hex::decode(clean).map_err(|e| ValidationError::InvalidHash {
            input: hash_hex.to_string(),
            reason: e.to_string(),
        })?;
        if digest.len() != BYTES32_LEN {
            return Err(ValidationError::InvalidHash {
                input: hash_hex.to_string(),
                reason: format!("expected {} bytes, got {}", BYTES32_LEN, digest.len()),
            });
        }

        let mh = Multihash::<64>::wrap(SHA2_256, &digest).map_err(|e| {
            ValidationError::InvalidHash {
                input: hash_hex.to_string(),
                reason: format!("multihash wrap failed: {}", e),
            }
        })?;

        Ok(Self(CidV1::new_v1(RAW_CODEC, mh).to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Cid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
