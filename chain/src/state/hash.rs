use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use thiserror::Error;

/// Length in bytes of every digest used by the chain.
pub const HASH_LENGTH: usize = 32;

/// A 32-byte Keccak-256 digest (block hash, transaction hash, combined hash).
///
/// Serialized as a `0x`-prefixed lowercase hex string, which is also the form
/// that ends up inside the hashed pre-image of a block header.
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    rkyv::Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
)]
pub struct Hash(pub [u8; HASH_LENGTH]);

/// Errors raised when parsing a [`Hash`] from text.
#[derive(Debug, Error, PartialEq)]
pub enum HashParseError {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("hash must be 32 bytes, got {0}")]
    Length(usize),
}

impl Hash {
    /// The all-zero hash, used as the parent of genesis.
    pub const ZERO: Hash = Hash([0u8; HASH_LENGTH]);

    /// Parses a hex string, with or without the `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, HashParseError> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped)?;
        if bytes.len() != HASH_LENGTH {
            return Err(HashParseError::Length(bytes.len()));
        }
        let mut arr = [0u8; HASH_LENGTH];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; HASH_LENGTH] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// First four bytes in hex, for compact log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

/// Keccak-256 of `data`.
pub fn keccak256(data: impl AsRef<[u8]>) -> Hash {
    Hash(Keccak256::digest(data.as_ref()).into())
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl FromStr for Hash {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Hash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Hash::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
