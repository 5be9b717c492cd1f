use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    crypto::signature::{self, SIGNATURE_LENGTH},
    state::hash::{Hash, keccak256},
};

/// [`Transaction`] is a signed message gossiped between nodes.
///
/// The payload `data` is the only semantic content. `from` is the address
/// of the signer as claimed by the author; validity never depends on it, the
/// signature alone is checked. Field order is the canonical JSON layout and
/// therefore part of the transaction hash.
#[derive(
    Clone,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    rkyv::Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
)]
pub struct Transaction {
    /// Address derived from the signer's public key
    pub from: String,
    /// Arbitrary, non-blank payload
    pub data: String,
    /// 65-byte recoverable signature `r || s || v` over `keccak256(data)`
    #[serde(rename = "sig", with = "base64_bytes")]
    pub signature: Vec<u8>,
}

/// Reasons a transaction is refused by the mempool.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("transaction payload is empty")]
    EmptyPayload,

    #[error("invalid signature length: expected 65 bytes, got {0}")]
    SignatureLength(usize),

    #[error("malformed signature: {0:?}")]
    MalformedSignature(libsecp256k1::Error),

    #[error("public key recovery failed: {0:?}")]
    Recovery(libsecp256k1::Error),

    #[error("signature does not verify against the recovered public key")]
    InvalidSignature,
}

impl Transaction {
    pub fn new(from: String, data: String, signature: Vec<u8>) -> Self {
        Self {
            from,
            data,
            signature,
        }
    }

    /// Serializes the transaction to its canonical JSON form.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserializes a transaction from JSON bytes.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Content hash of the transaction: keccak256 of the canonical JSON.
    pub fn hash(&self) -> Result<Hash, serde_json::Error> {
        Ok(keccak256(self.to_json()?))
    }

    /// The digest the signature commits to.
    #[inline]
    pub fn digest(&self) -> Hash {
        keccak256(self.data.as_bytes())
    }

    /// Checks payload, signature length and signature authenticity.
    pub fn verify(&self) -> Result<(), TransactionError> {
        if self.data.trim().is_empty() {
            return Err(TransactionError::EmptyPayload);
        }
        if self.signature.len() != SIGNATURE_LENGTH {
            return Err(TransactionError::SignatureLength(self.signature.len()));
        }
        signature::verify_recoverable(&self.digest(), &self.signature).map(|_| ())
    }

    pub fn pretty(&self) -> String {
        serde_json::to_string_pretty(self)
            .unwrap_or_else(|e| format!("Error pretty printing transaction: {e}"))
    }
}

/// Serde adapter encoding raw bytes as standard base64 strings.
mod base64_bytes {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s).map_err(serde::de::Error::custom)
    }
}
